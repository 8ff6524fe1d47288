//! The built-in reconstruction passes.
//!
//! One file per idiom family; see the [pipeline order](crate::reconstruct) for how they
//! compose. Each pass follows the same cursor discipline: locate an anchor instruction,
//! scan forward for its cooperating instructions, confirm the match with structural and
//! positional checks, synthesize one replacement node carrying the union of source
//! positions, splice the list, and rewind the cursor so the scan stays correct after
//! the list shrinks.

mod class_literal;
mod compound_assignment;
mod constructor_call;
mod field_initializers;
mod increment;
mod lvalue;
mod multi_assignment;
mod outer_class;
mod this_alias;

pub use class_literal::{Jdk118ClassLiteralPass, Jdk14ClassLiteralPass};
pub use compound_assignment::CompoundAssignmentPass;
pub use constructor_call::{DupConstructorCallPass, SimpleConstructorCallPass};
pub use field_initializers::{
    DexEnumValuesPass, InstanceFieldInitializerPass, StaticFieldInitializerPass,
};
pub use increment::{CompoundToIncrementPass, PostIncrementPass, PreIncrementPass};
pub use multi_assignment::MultiAssignmentPass;
pub use outer_class::OuterClassPass;
pub use this_alias::ThisAliasPass;
