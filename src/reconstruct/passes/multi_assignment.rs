//! Multi-assignment and `dup`-carried compound assignment reconstruction.
//!
//! A chained assignment duplicates the produced value once per extra target:
//!
//! ```text
//! a = b = expr
//! --------------------
//! DupStore#t( expr )
//! store b, DupLoad#t
//! store a, DupLoad#t
//! ```
//!
//! Three outcomes, decided by the shape of the duplicated expression and by source
//! lines:
//!
//! * the expression is `target OP rhs` where `target` re-reads the first store's
//!   location: the whole shape is one compound assignment, `a = (b OP= rhs)`;
//! * the duplicate and the second consumer share a source line: the first store folds
//!   into an `Assignment` node substituted at the second consumer, `a = (b = expr)`;
//! * they sit on different lines: the shape came from two separate statements, so the
//!   produced expression is substituted at both sites and no nesting is synthesized.
//!
//! Runs after the increment and constructor passes so the remaining duplicates really
//! are assignments.

use crate::{
    ir::{compare, rewrite, search, Instruction, InstructionKind, TempId},
    metadata::ClassModel,
    reconstruct::passes::lvalue::{match_store, set_store_value},
    reconstruct::ReconstructionPass,
    Result,
};

/// Reconstructs `a = b = c`, `a = (b OP= c)`, and split two-statement duplicates.
pub struct MultiAssignmentPass;

impl ReconstructionPass for MultiAssignmentPass {
    fn name(&self) -> &'static str {
        "multi-assignment"
    }

    fn run_on_method(
        &self,
        body: &mut Vec<Instruction>,
        _method_index: usize,
        _class: &mut ClassModel,
    ) -> Result<bool> {
        let mut changed = false;
        let mut i = 0;
        while i < body.len() {
            if collapse(body, i) {
                changed = true;
            } else {
                i += 1;
            }
        }
        Ok(changed)
    }
}

/// Collapses one duplicated assignment anchored at `i`. Returns `true` if the list was
/// rewritten; the cursor stays valid for a rescan at `i`.
fn collapse(body: &mut Vec<Instruction>, i: usize) -> bool {
    let InstructionKind::DupStore { temp, value } = &body[i].kind else {
        return false;
    };
    let temp = *temp;
    let produced = value.as_ref().clone();

    let Some(j) = search::find_first_consumer(body, i + 1, temp) else {
        return false;
    };
    let Some((target, stored)) = match_store(&body[j]) else {
        return false;
    };
    // The first consumer must store the bare duplicate; a deeper use means the
    // duplicate feeds some other expression and this is not an assignment chain.
    if !stored.is_dup_load_of(temp) || search::count_uses(&body[j], temp) != 1 {
        return false;
    }
    let Some(k) = search::find_first_consumer(body, j + 1, temp) else {
        return false;
    };
    if search::count_uses(&body[k], temp) != 1
        || search::count_consumers(body, i + 1, temp) != 2
    {
        return false;
    }

    if let InstructionKind::Binary { op, left, right } = &produced.kind {
        if compare::structurally_equal(left, &target) {
            // a = (b OP= rhs); the compound node carries the anchor store's line.
            let node = Instruction::new(
                body[i].offset,
                body[j].line,
                InstructionKind::CompoundAssignment {
                    op: *op,
                    target: Box::new(target),
                    value: right.clone(),
                },
            );
            return splice_nested(body, i, j, k, temp, &node);
        }
    }

    if body[i].line.is_some() && body[i].line == body[k].line {
        // a = (b = expr)
        let node = Instruction::new(
            body[i].offset,
            body[i].line,
            InstructionKind::Assignment {
                target: Box::new(target),
                value: Box::new(produced),
            },
        );
        return splice_nested(body, i, j, k, temp, &node);
    }

    // Two statements: keep the first store, re-materialize the expression at both
    // sites.
    rewrite::replace_in_list_entry(&mut body[k], temp, &produced);
    set_store_value(&mut body[j], produced);
    body.remove(i);
    true
}

/// Substitutes `node` at the second consumer and removes the duplicate and the first
/// store, which `node` now subsumes.
fn splice_nested(
    body: &mut Vec<Instruction>,
    i: usize,
    j: usize,
    k: usize,
    temp: TempId,
    node: &Instruction,
) -> bool {
    rewrite::replace_in_list_entry(&mut body[k], temp, node);
    debug_assert!(j > i && k > j);
    body.remove(j);
    body.remove(i);
    true
}
