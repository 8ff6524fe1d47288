//! Compound-assignment reconstruction for the duplicate-free store shapes.
//!
//! `x OP= rhs` in statement position needs no duplicate of the produced value; it
//! compiles to a store whose value re-reads the store's own target:
//!
//! ```text
//! store x, (load x OP rhs)
//! ```
//!
//! for all four target forms (local, field, static field, array element). Receiver and
//! index subexpressions still go through duplicate temporaries, because `o` in
//! `o.f += rhs` is evaluated once:
//!
//! ```text
//! DupStore#t( o )
//! PutField( DupLoad#t, f, GetField(DupLoad#t, f) OP rhs )
//! ```
//!
//! Structural comparison treats `DupLoad`s of the same temporary as equal, so the
//! rewrite is uniform; afterwards, any receiver temporary wholly owned by the new node
//! is resolved by substituting its stored expression and dropping the `DupStore`.

use crate::{
    ir::{compare, rewrite, search, Instruction, InstructionKind, TempId},
    metadata::ClassModel,
    reconstruct::passes::lvalue::{match_store, unwrap_convert},
    reconstruct::ReconstructionPass,
    Result,
};

/// Reconstructs statement-position `x OP= rhs` stores.
pub struct CompoundAssignmentPass;

impl ReconstructionPass for CompoundAssignmentPass {
    fn name(&self) -> &'static str {
        "compound-assignment"
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
            match rewrite_store(body, i) {
                Some(next) => {
                    changed = true;
                    i = next;
                }
                None => i += 1,
            }
        }
        Ok(changed)
    }
}

/// Rewrites the store at `i` if it has the self-referencing shape. Returns the cursor
/// position to resume from.
fn rewrite_store(body: &mut Vec<Instruction>, i: usize) -> Option<usize> {
    let (target_read, stored) = match_store(&body[i])?;
    let InstructionKind::Binary { op, left, right } = &unwrap_convert(stored).kind else {
        return None;
    };
    if !compare::structurally_equal(left, &target_read) {
        return None;
    }

    let node = Instruction::new(
        body[i].offset,
        body[i].line,
        InstructionKind::CompoundAssignment {
            op: *op,
            target: left.clone(),
            value: right.clone(),
        },
    );
    let temps = collect_temps(&node);
    body[i] = node;

    // Resolve receiver and index temporaries the compound node now wholly owns.
    let mut i = i;
    for temp in temps {
        let Some(d) = search::find_dup_store(body, i, temp) else {
            continue;
        };
        if search::count_consumers(body, d + 1, temp) != search::count_uses(&body[i], temp) {
            continue;
        }
        let InstructionKind::DupStore { value, .. } = &body[d].kind else {
            continue;
        };
        let replacement = value.as_ref().clone();
        rewrite::replace_in_list_entry(&mut body[i], temp, &replacement);
        body.remove(d);
        i -= 1;
    }
    Some(i + 1)
}

fn collect_temps(node: &Instruction) -> Vec<TempId> {
    fn walk(node: &Instruction, out: &mut Vec<TempId>) {
        if let InstructionKind::DupLoad { temp } = node.kind {
            if !out.contains(&temp) {
                out.push(temp);
            }
        }
        for child in node.children() {
            walk(child, out);
        }
    }
    let mut out = Vec::new();
    walk(node, &mut out);
    out
}
