//! Store-instruction helpers shared by the assignment and increment passes.
//!
//! Several idioms anchor on "a store whose target re-reads as the duplicated
//! expression". The helpers here map each store form (local, field, static field,
//! array element) to the read expression of its target, so callers can compare it
//! structurally against the duplicated subtree.

use crate::ir::{Instruction, InstructionKind};

/// Maps a store instruction to the read form of its target plus its stored value.
///
/// The synthesized target expression carries the store's own offset and line.
pub(crate) fn match_store(entry: &Instruction) -> Option<(Instruction, &Instruction)> {
    match &entry.kind {
        InstructionKind::LocalStore { index, value } => Some((
            Instruction::new(
                entry.offset,
                entry.line,
                InstructionKind::LocalLoad { index: *index },
            ),
            value,
        )),
        InstructionKind::PutField {
            object,
            field,
            value,
        } => Some((
            Instruction::new(
                entry.offset,
                entry.line,
                InstructionKind::GetField {
                    object: object.clone(),
                    field: *field,
                },
            ),
            value,
        )),
        InstructionKind::PutStatic { field, value } => Some((
            Instruction::new(
                entry.offset,
                entry.line,
                InstructionKind::GetStatic { field: *field },
            ),
            value,
        )),
        InstructionKind::ArrayStore {
            array,
            index,
            value,
        } => Some((
            Instruction::new(
                entry.offset,
                entry.line,
                InstructionKind::ArrayLoad {
                    array: array.clone(),
                    index: index.clone(),
                },
            ),
            value,
        )),
        _ => None,
    }
}

/// Replaces the stored value of a store instruction. Returns `false` when the entry is
/// not a store.
pub(crate) fn set_store_value(entry: &mut Instruction, new_value: Instruction) -> bool {
    match &mut entry.kind {
        InstructionKind::LocalStore { value, .. }
        | InstructionKind::PutField { value, .. }
        | InstructionKind::PutStatic { value, .. }
        | InstructionKind::ArrayStore { value, .. } => {
            *value = Box::new(new_value);
            true
        }
        _ => false,
    }
}

/// `true` for expressions that read a storable location.
pub(crate) fn is_lvalue_read(node: &Instruction) -> bool {
    matches!(
        node.kind,
        InstructionKind::LocalLoad { .. }
            | InstructionKind::GetField { .. }
            | InstructionKind::GetStatic { .. }
            | InstructionKind::ArrayLoad { .. }
    )
}

/// Strips one widening or narrowing conversion wrapper, if present.
pub(crate) fn unwrap_convert(node: &Instruction) -> &Instruction {
    match &node.kind {
        InstructionKind::Convert { value, .. } => value,
        _ => node,
    }
}
