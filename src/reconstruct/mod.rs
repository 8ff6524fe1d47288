//! Reconstruction pipeline: fixed-order peephole passes over method bodies.
//!
//! Each pass recognizes one multi-instruction idiom emitted by a specific
//! bytecode-producing toolchain, confirms structural identity between the cooperating
//! subtrees, and splices the instruction list while preserving the byte-offset and
//! source-line provenance later stages depend on.
//!
//! # Pipeline Order
//!
//! Passes are not commutative; the order below is part of the contract. The more
//! specific `dup`-based idioms (increments, constructor calls, class literals) must
//! consume their shapes before the general multi-assignment pass collapses any
//! remaining `DupStore`/`DupLoad` pair, and the class-level passes run only after every
//! method body is in its final expression shape.
//!
//! | # | Pass | Idiom |
//! |---|------|-------|
//! | 1 | [`ThisAliasPass`] | duplicated `this` reference |
//! | 2 | [`Jdk118ClassLiteralPass`] | pre-1.5 `.class` idiom, 1.1.8 shape |
//! | 3 | [`Jdk14ClassLiteralPass`] | pre-1.5 `.class` idiom, 1.4 shape |
//! | 4 | [`DupConstructorCallPass`] | `dup`-separated allocate-then-`<init>` |
//! | 5 | [`SimpleConstructorCallPass`] | adjacent allocate-then-`<init>` |
//! | 6 | [`PreIncrementPass`] | `++x` / `--x` |
//! | 7 | [`PostIncrementPass`] | `x++` / `x--` |
//! | 8 | [`MultiAssignmentPass`] | `a = b = c` / `a OP= b` via `dup` |
//! | 9 | [`CompoundAssignmentPass`] | `a OP= b` without `dup` |
//! | 10 | [`CompoundToIncrementPass`] | `x += 1` to `x++` |
//! | 11 | [`OuterClassPass`] | `Outer.this`, `access$N` (class-level) |
//! | 12 | [`InstanceFieldInitializerPass`] | constructor assignment hoisting (class-level) |
//! | 13 | [`StaticFieldInitializerPass`] | `<clinit>` assignment hoisting (class-level) |
//! | 14 | [`DexEnumValuesPass`] | dex `ENUM$VALUES` array (class-level) |
//!
//! The whole pipeline for one class runs on one thread; list mutation is in-place and
//! every pass re-derives its cursor and length after a removal.

pub(crate) mod passes;

use log::{debug, trace};

pub use passes::{
    CompoundAssignmentPass, CompoundToIncrementPass, DexEnumValuesPass, DupConstructorCallPass,
    InstanceFieldInitializerPass, Jdk118ClassLiteralPass, Jdk14ClassLiteralPass,
    MultiAssignmentPass, OuterClassPass, PostIncrementPass, PreIncrementPass,
    SimpleConstructorCallPass, StaticFieldInitializerPass, ThisAliasPass,
};

use crate::{
    ir::{Instruction, InstructionKind, TempId},
    metadata::ClassModel,
    Result,
};

/// A reconstruction pass.
///
/// Method-level passes rewrite one instruction list at a time and may consult or mutate
/// class-wide state (constant pool, synthetic flags, import registry) through the class
/// model. Class-level passes see the whole class at once (field-initializer hoisting,
/// outer-reference rewriting).
///
/// A pass that finds nothing to do returns `Ok(false)` and leaves the list unchanged;
/// failing to match is the normal outcome, not an error.
pub trait ReconstructionPass: Send + Sync {
    /// Unique name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Runs the pass on one method body.
    ///
    /// The body has been taken out of `class.methods[method_index]` for the duration of
    /// the call, so the pass may freely mutate both.
    ///
    /// Returns `true` if any rewrite occurred.
    ///
    /// # Errors
    ///
    /// Returns an error only for damaged models (unresolvable pool indices); pattern
    /// mismatches are not errors.
    fn run_on_method(
        &self,
        body: &mut Vec<Instruction>,
        method_index: usize,
        class: &mut ClassModel,
    ) -> Result<bool>;

    /// Runs a class-level pass over the entire class.
    ///
    /// Returns `true` if any rewrite occurred.
    ///
    /// # Errors
    ///
    /// Returns an error only for damaged models.
    fn run_on_class(&self, _class: &mut ClassModel) -> Result<bool> {
        Ok(false)
    }

    /// `true` for passes that operate on the whole class instead of per method.
    fn is_class_level(&self) -> bool {
        false
    }
}

/// Counts accumulated over one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructionSummary {
    /// Number of (pass, method) combinations that rewrote something.
    pub method_rewrites: usize,
    /// Number of class-level passes that rewrote something.
    pub class_rewrites: usize,
}

/// The fixed-order pass runner for one class.
///
/// See the [module documentation](self) for the pipeline order.
pub struct Reconstructor {
    passes: Vec<Box<dyn ReconstructionPass>>,
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconstructor {
    /// Creates the runner with the standard pass pipeline.
    #[must_use]
    pub fn new() -> Self {
        let passes: Vec<Box<dyn ReconstructionPass>> = vec![
            Box::new(ThisAliasPass),
            Box::new(Jdk118ClassLiteralPass),
            Box::new(Jdk14ClassLiteralPass),
            Box::new(DupConstructorCallPass),
            Box::new(SimpleConstructorCallPass),
            Box::new(PreIncrementPass),
            Box::new(PostIncrementPass),
            Box::new(MultiAssignmentPass),
            Box::new(CompoundAssignmentPass),
            Box::new(CompoundToIncrementPass),
            Box::new(OuterClassPass),
            Box::new(InstanceFieldInitializerPass),
            Box::new(StaticFieldInitializerPass),
            Box::new(DexEnumValuesPass),
        ];
        Reconstructor { passes }
    }

    /// Runs the pipeline over every method of the class.
    ///
    /// # Errors
    ///
    /// Propagates model errors from the passes; pattern mismatches never error.
    pub fn run(&self, class: &mut ClassModel) -> Result<ReconstructionSummary> {
        let mut summary = ReconstructionSummary::default();
        for pass in &self.passes {
            if pass.is_class_level() {
                if pass.run_on_class(class)? {
                    debug!("pass {} rewrote class-level state", pass.name());
                    summary.class_rewrites += 1;
                }
                continue;
            }
            for method_index in 0..class.methods.len() {
                // The body leaves its slot so the pass can hold it and the class
                // model mutably at the same time.
                let mut body = std::mem::take(&mut class.methods[method_index].body);
                let changed = pass.run_on_method(&mut body, method_index, class);
                class.methods[method_index].body = body;
                if changed? {
                    trace!(
                        "pass {} rewrote method #{method_index}",
                        pass.name()
                    );
                    summary.method_rewrites += 1;
                    #[cfg(debug_assertions)]
                    verify_no_dangling_temps(&class.methods[method_index].body)?;
                }
            }
        }
        Ok(summary)
    }
}

/// Checks the temporary-soundness invariant over one instruction list.
///
/// Every `DupLoad` must reference a `DupStore` still present in the list; a pass that
/// removed a `DupStore` without substituting all consumers is defective.
///
/// # Errors
///
/// Returns [`Error::DanglingTemporary`](crate::Error::DanglingTemporary) naming the
/// first dangling reference found.
pub fn verify_no_dangling_temps(body: &[Instruction]) -> Result<()> {
    fn collect_stores(node: &Instruction, stores: &mut Vec<TempId>) {
        if let InstructionKind::DupStore { temp, .. } = node.kind {
            stores.push(temp);
        }
        for child in node.children() {
            collect_stores(child, stores);
        }
    }

    fn check_loads(node: &Instruction, stores: &[TempId]) -> Result<()> {
        if let InstructionKind::DupLoad { temp } = node.kind {
            if !stores.contains(&temp) {
                return Err(crate::Error::DanglingTemporary {
                    temp,
                    offset: node.offset,
                });
            }
        }
        for child in node.children() {
            check_loads(child, stores)?;
        }
        Ok(())
    }

    let mut stores = Vec::new();
    for entry in body {
        collect_stores(entry, &mut stores);
    }
    for entry in body {
        check_loads(entry, &stores)?;
    }
    Ok(())
}
