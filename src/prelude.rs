//! # jarscope Prelude
//!
//! Convenient re-exports of the types most code using this library touches. Import the
//! module to get the class model, the instruction model, and the pass pipeline in one
//! line:
//!
//! ```rust
//! use jarscope::prelude::*;
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all jarscope operations
pub use crate::Error;

/// The result type used throughout jarscope
pub use crate::Result;

// ================================================================================================
// Class Model
// ================================================================================================

/// The per-class model the passes read and mutate
pub use crate::metadata::ClassModel;

/// Field and method table entries
pub use crate::metadata::{Field, FieldInitializer, LocalVariable, Method};

/// Inner/outer class links and the synthesized-accessor table
pub use crate::metadata::{Accessor, CapturedField, InnerClassInfo, OuterClass};

/// Constant pool and its index newtype
pub use crate::metadata::{ConstantEntry, ConstantPool, MemberRef, PoolIndex};

/// Access flag sets
pub use crate::metadata::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};

/// Descriptor parsing
pub use crate::metadata::{
    parse_class_literal_name, parse_type_descriptor, PrimitiveKind, TypeDescriptor,
};

// ================================================================================================
// Instruction Model
// ================================================================================================

/// An instruction node and its payload
pub use crate::ir::{Instruction, InstructionKind, Opcode};

/// Expression building blocks
pub use crate::ir::{
    ArrayElement, BinaryOp, Comparison, ConstValue, Conversion, IncrementPosition, InvokeKind,
    TempId, UnaryOp,
};

// ================================================================================================
// Reconstruction Pipeline
// ================================================================================================

/// The fixed-order pass runner
pub use crate::reconstruct::{ReconstructionPass, ReconstructionSummary, Reconstructor};
