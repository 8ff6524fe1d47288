//! Pre- and post-increment reconstruction.
//!
//! An increment whose value is consumed compiles to a duplicate of the old or new
//! value, a store, and the consuming expression:
//!
//! ```text
//! x++ as an expression            ++x as an expression
//! -----------------------------   -----------------------------
//! DupStore#t( load x )            DupStore#t( load x + 1 )
//! store x, DupLoad#t + 1          store x, DupLoad#t
//! ... DupLoad#t ...               ... DupLoad#t ...
//! ```
//!
//! Both shapes collapse to a single `Increment` node substituted at the consumption
//! site. The target may be a local, a field, a static field, or an array element; the
//! duplicated expression and the store target must be structurally identical.
//!
//! Statement-position increments need no duplicate; those arrive as `x += 1` from the
//! compound-assignment passes and are normalized by [`CompoundToIncrementPass`].

use crate::{
    ir::{
        compare, rewrite, search, BinaryOp, ConstValue, IncrementPosition, Instruction,
        InstructionKind, TempId,
    },
    metadata::ClassModel,
    reconstruct::passes::lvalue::{is_lvalue_read, match_store, unwrap_convert},
    reconstruct::ReconstructionPass,
    Result,
};

/// Reconstructs `++x` / `--x` expressions.
pub struct PreIncrementPass;

/// Reconstructs `x++` / `x--` expressions.
pub struct PostIncrementPass;

/// Rewrites statement-position `x += 1` / `x -= 1` to `x++` / `x--`.
pub struct CompoundToIncrementPass;

impl ReconstructionPass for PreIncrementPass {
    fn name(&self) -> &'static str {
        "pre-increment"
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
            if collapse_pre(body, i) {
                changed = true;
            } else {
                i += 1;
            }
        }
        Ok(changed)
    }
}

impl ReconstructionPass for PostIncrementPass {
    fn name(&self) -> &'static str {
        "post-increment"
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
            if collapse_post(body, i) {
                changed = true;
            } else {
                i += 1;
            }
        }
        Ok(changed)
    }
}

impl ReconstructionPass for CompoundToIncrementPass {
    fn name(&self) -> &'static str {
        "compound-to-increment"
    }

    fn run_on_method(
        &self,
        body: &mut Vec<Instruction>,
        _method_index: usize,
        _class: &mut ClassModel,
    ) -> Result<bool> {
        let mut changed = false;
        for entry in body.iter_mut() {
            let InstructionKind::CompoundAssignment { op, target, value } = &entry.kind else {
                continue;
            };
            let InstructionKind::Const(constant) = &value.kind else {
                continue;
            };
            let Some(amount) = increment_amount(*op, constant) else {
                continue;
            };
            let target = target.clone();
            entry.kind = InstructionKind::Increment {
                target,
                amount,
                position: IncrementPosition::Post,
            };
            changed = true;
        }
        Ok(changed)
    }
}

/// Collapses one `x++` shape anchored at `i`. Returns `true` if the list was rewritten;
/// the cursor stays valid for a rescan at `i`.
fn collapse_post(body: &mut Vec<Instruction>, i: usize) -> bool {
    let InstructionKind::DupStore { temp, value } = &body[i].kind else {
        return false;
    };
    let temp = *temp;
    if !is_lvalue_read(value) {
        return false;
    }
    let old_value = value.as_ref().clone();

    let Some(j) = search::find_first_consumer(body, i + 1, temp) else {
        return false;
    };
    let Some((target, stored)) = match_store(&body[j]) else {
        return false;
    };
    if !compare::structurally_equal(&target, &old_value) {
        return false;
    }
    let InstructionKind::Binary { op, left, right } = &unwrap_convert(stored).kind else {
        return false;
    };
    if !left.is_dup_load_of(temp) {
        return false;
    }
    let InstructionKind::Const(constant) = &right.kind else {
        return false;
    };
    let Some(amount) = increment_amount(*op, constant) else {
        return false;
    };
    // One consumption inside the store, one at the expression site, nothing else.
    if search::count_uses(&body[j], temp) != 1
        || search::count_consumers(body, i + 1, temp) != 2
    {
        return false;
    }
    let Some(k) = search::find_first_consumer(body, j + 1, temp) else {
        return false;
    };

    let increment = Instruction::new(
        body[i].offset,
        body[i].line,
        InstructionKind::Increment {
            target: Box::new(old_value),
            amount,
            position: IncrementPosition::Post,
        },
    );
    splice(body, i, j, k, temp, &increment);
    true
}

/// Collapses one `++x` shape anchored at `i`.
fn collapse_pre(body: &mut Vec<Instruction>, i: usize) -> bool {
    let InstructionKind::DupStore { temp, value } = &body[i].kind else {
        return false;
    };
    let temp = *temp;
    let InstructionKind::Binary { op, left, right } = &unwrap_convert(value).kind else {
        return false;
    };
    if !is_lvalue_read(left) {
        return false;
    }
    let InstructionKind::Const(constant) = &right.kind else {
        return false;
    };
    let Some(amount) = increment_amount(*op, constant) else {
        return false;
    };
    let target_expr = left.as_ref().clone();

    let Some(j) = search::find_first_consumer(body, i + 1, temp) else {
        return false;
    };
    let Some((target, stored)) = match_store(&body[j]) else {
        return false;
    };
    if !stored.is_dup_load_of(temp) || !compare::structurally_equal(&target, &target_expr) {
        return false;
    }
    if search::count_consumers(body, i + 1, temp) != 2 {
        return false;
    }
    let Some(k) = search::find_first_consumer(body, j + 1, temp) else {
        return false;
    };

    let increment = Instruction::new(
        body[i].offset,
        body[i].line,
        InstructionKind::Increment {
            target: Box::new(target_expr),
            amount,
            position: IncrementPosition::Pre,
        },
    );
    splice(body, i, j, k, temp, &increment);
    true
}

/// Substitutes the increment at the consumer and removes the anchor pair.
fn splice(
    body: &mut Vec<Instruction>,
    i: usize,
    j: usize,
    k: usize,
    temp: TempId,
    increment: &Instruction,
) {
    rewrite::replace_in_list_entry(&mut body[k], temp, increment);
    debug_assert!(j > i && k > j);
    body.remove(j);
    body.remove(i);
}

fn increment_amount(op: BinaryOp, constant: &ConstValue) -> Option<i32> {
    let step = if constant.is_one() {
        1
    } else if constant.is_minus_one() {
        -1
    } else {
        return None;
    };
    match op {
        BinaryOp::Add => Some(step),
        BinaryOp::Sub => Some(-step),
        _ => None,
    }
}
