//! Class-level metadata model consumed and mutated by the reconstruction passes.
//!
//! This module is the concrete surface of the external collaborator the passes depend on:
//! the constant pool, the field and method tables, access flags, inner/outer class links,
//! and the synthesized-accessor table. Passes resolve field/method references through
//! [`ConstantPool`], append new constants when synthesizing nodes (class literals,
//! `getClass()` call sites), and set synthetic/final access flags on members they have
//! fully consumed.
//!
//! The model is deliberately small enough to fabricate in unit tests: a pass can be
//! exercised against a hand-built [`ClassModel`] without any class-file parsing.

mod access;
mod class;
mod descriptor;
mod pool;

pub use access::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};
pub use class::{
    Accessor, CapturedField, ClassModel, Field, FieldInitializer, InnerClassInfo, LocalVariable,
    Method, OuterClass,
};
pub use descriptor::{parse_class_literal_name, parse_type_descriptor, PrimitiveKind, TypeDescriptor};
pub use pool::{ConstantEntry, ConstantPool, MemberRef, PoolIndex};
