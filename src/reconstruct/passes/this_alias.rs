//! Alias-of-`this` elimination.
//!
//! Some toolchains duplicate the `this` reference once and reuse the temporary for
//! several later member accesses:
//!
//! ```text
//! DupStore#t( aload_0 ); ...; GetField(DupLoad#t, f); ...; Invoke(DupLoad#t, m)
//! ```
//!
//! Since `this` is free to re-read, the temporary is eliminated by substituting the
//! `this` load directly at every consumption site.
//!
//! The one shape that must be left alone is the `synchronized(this)` lock idiom, where
//! the duplicated `this` feeds a `monitorenter` two instructions later; that pattern
//! belongs to the downstream `synchronized`-statement reconstruction.

use crate::{
    ir::{rewrite, search, Instruction, InstructionKind},
    metadata::ClassModel,
    reconstruct::ReconstructionPass,
    Result,
};

/// Substitutes `this` loads for duplicated-`this` temporaries.
pub struct ThisAliasPass;

impl ReconstructionPass for ThisAliasPass {
    fn name(&self) -> &'static str {
        "this-alias"
    }

    fn run_on_method(
        &self,
        body: &mut Vec<Instruction>,
        method_index: usize,
        class: &mut ClassModel,
    ) -> Result<bool> {
        if class.methods[method_index].is_static() {
            // Slot 0 is an ordinary parameter in static methods.
            return Ok(false);
        }

        let mut changed = false;
        let mut i = 0;
        while i < body.len() {
            let Some((temp, this_load)) = match_duplicated_this(&body[i]) else {
                i += 1;
                continue;
            };

            // synchronized(this): DupStore; astore lockvar; monitorenter DupLoad.
            let feeds_monitor = body.get(i + 2).is_some_and(|entry| {
                matches!(
                    &entry.kind,
                    InstructionKind::MonitorEnter { object } if object.is_dup_load_of(temp)
                )
            });
            if feeds_monitor || search::count_consumers(body, i + 1, temp) < 2 {
                i += 1;
                continue;
            }

            for entry in body.iter_mut().skip(i + 1) {
                rewrite::replace_in_list_entry(entry, temp, &this_load);
            }
            if search::count_consumers(body, i + 1, temp) == 0 {
                body.remove(i);
                changed = true;
            } else {
                i += 1;
            }
        }
        Ok(changed)
    }
}

fn match_duplicated_this(entry: &Instruction) -> Option<(crate::ir::TempId, Instruction)> {
    match &entry.kind {
        InstructionKind::DupStore { temp, value }
            if matches!(value.kind, InstructionKind::LocalLoad { index: 0 }) =>
        {
            Some((*temp, value.as_ref().clone()))
        }
        _ => None,
    }
}
