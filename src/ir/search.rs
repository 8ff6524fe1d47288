//! Subtree and list-window search utilities.
//!
//! Small, shared helpers the reconstruction passes use to locate cooperating
//! instructions: the first node of a given opcode within a subtree, the consumers of a
//! `DupStore` temporary within a list window, the owning `DupStore` of a `DupLoad`, and
//! the local-variable reads that disqualify a field-initializer expression.

use crate::ir::{Instruction, InstructionKind, Opcode, TempId};

/// Finds the first node with the given opcode in a subtree, depth-first pre-order.
#[must_use]
pub fn find_by_opcode<'a>(root: &'a Instruction, opcode: Opcode) -> Option<&'a Instruction> {
    if root.opcode() == opcode {
        return Some(root);
    }
    root.children()
        .into_iter()
        .find_map(|child| find_by_opcode(child, opcode))
}

/// `true` if any node in the subtree is a `DupLoad` of the given temporary.
#[must_use]
pub fn uses_temp(root: &Instruction, temp: TempId) -> bool {
    root.is_dup_load_of(temp) || root.children().iter().any(|child| uses_temp(child, temp))
}

/// Finds the first instruction at or after `from` that consumes the given temporary.
#[must_use]
pub fn find_first_consumer(list: &[Instruction], from: usize, temp: TempId) -> Option<usize> {
    (from..list.len()).find(|&i| uses_temp(&list[i], temp))
}

/// Counts `DupLoad` occurrences of the given temporary within one subtree.
#[must_use]
pub fn count_uses(root: &Instruction, temp: TempId) -> usize {
    let own = usize::from(root.is_dup_load_of(temp));
    own + root
        .children()
        .iter()
        .map(|child| count_uses(child, temp))
        .sum::<usize>()
}

/// Counts `DupLoad` occurrences of the given temporary at or after `from`.
#[must_use]
pub fn count_consumers(list: &[Instruction], from: usize, temp: TempId) -> usize {
    list[from..].iter().map(|i| count_uses(i, temp)).sum()
}

/// Finds the owning `DupStore` of a temporary, scanning backward from `before`
/// (exclusive).
#[must_use]
pub fn find_dup_store(list: &[Instruction], before: usize, temp: TempId) -> Option<usize> {
    list[..before.min(list.len())]
        .iter()
        .rposition(|i| matches!(i.kind, InstructionKind::DupStore { temp: t, .. } if t == temp))
}

/// `true` if the subtree reads any local variable slot other than `allowed`.
///
/// The field-initializer passes use this to reject expressions that depend on locals or
/// parameters: a static initializer value may read no local at all (`allowed = None`),
/// an instance initializer value may read only `this` (`allowed = Some(0)`).
#[must_use]
pub fn reads_local_other_than(root: &Instruction, allowed: Option<u16>) -> bool {
    if let InstructionKind::LocalLoad { index } = root.kind {
        if Some(index) != allowed {
            return true;
        }
    }
    root.children()
        .iter()
        .any(|child| reads_local_other_than(child, allowed))
}
