// Copyright 2025 The jarscope authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # jarscope
//!
//! A framework for reconstructing source-level expressions from JVM bytecode method
//! bodies.
//!
//! Compilers lower many single source constructs into several cooperating
//! instructions: an assignment chain becomes a value duplicate plus a store per
//! target, `x++` becomes duplicate-store-consume, `new` splits into allocation and
//! `<init>`, pre-1.5 `.class` literals expand into a whole cached-lookup conditional,
//! and inner classes grow synthetic fields and `access$N` bridges. `jarscope` takes a
//! method body as a flat list of expression trees, recognizes those idioms, and
//! rewrites each back into the single node the source contained, preserving the
//! byte-offset and line-number provenance that later decompilation stages depend on.
//!
//! ## Quick Start
//!
//! ```rust
//! use jarscope::ir::{ConstValue, Instruction, InstructionKind};
//! use jarscope::metadata::{ClassModel, MethodAccessFlags};
//! use jarscope::reconstruct::Reconstructor;
//!
//! # fn main() -> jarscope::Result<()> {
//! let mut class = ClassModel::new("pkg/Example");
//! let method = class.add_method("run", "()V", MethodAccessFlags::PUBLIC);
//! class.methods[method].body = vec![Instruction::new(
//!     0,
//!     Some(1),
//!     InstructionKind::LocalStore {
//!         index: 1,
//!         value: Box::new(Instruction::new(
//!             0,
//!             Some(1),
//!             InstructionKind::Const(ConstValue::Int(42)),
//!         )),
//!     },
//! )];
//!
//! let summary = Reconstructor::new().run(&mut class)?;
//! println!("{} method rewrites", summary.method_rewrites);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`ir`] - The instruction model: expression trees with provenance, plus the
//!   comparison, search, and substitution utilities the passes are built from
//! - [`metadata`] - The class model: constant pool, field and method tables,
//!   descriptors, and inner/outer class links
//! - [`reconstruct`] - The fixed-order pass pipeline and the passes themselves
//! - [`prelude`] - Convenient imports for common usage
//!
//! ## Temporaries
//!
//! Stack duplication survives in the flat form as `DupStore`/`DupLoad` pairs linked by
//! an opaque temporary handle. The single crate-wide soundness rule is that no
//! `DupLoad` may outlive its `DupStore`: a pass retiring a duplicate must substitute
//! every consumer first. Debug builds verify the rule after every rewriting pass.

#[macro_use]
pub(crate) mod error;

pub mod ir;
pub mod metadata;
pub mod prelude;
pub mod reconstruct;


pub use error::Error;

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
