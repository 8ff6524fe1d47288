//! Temporary-substitution utilities.
//!
//! A pass that has synthesized a replacement for a `DupStore` value substitutes it at
//! every consuming `DupLoad` before removing the `DupStore`. The functions here perform
//! that substitution within one subtree or one list entry and report where replacement
//! occurred, which the caller needs to decide whether the temporary became dead.

use crate::ir::{Instruction, TempId};

/// Outcome of a substitution over one subtree or list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Replaced {
    /// Number of `DupLoad` nodes replaced.
    pub count: usize,
    /// Offset of the node enclosing the last replacement, if any occurred below the
    /// root. `None` with a non-zero count means the root itself was the `DupLoad`.
    pub enclosing_offset: Option<u32>,
}

/// Replaces every `DupLoad` of `temp` within the subtree with a clone of `replacement`.
///
/// The root itself is never replaced; use [`replace_in_list_entry`] for list positions
/// where the whole entry may be the `DupLoad`.
pub fn replace_dup_loads(
    root: &mut Instruction,
    temp: TempId,
    replacement: &Instruction,
) -> Replaced {
    let mut result = Replaced::default();
    let root_offset = root.offset;
    for child in root.children_mut() {
        if child.is_dup_load_of(temp) {
            *child = replacement.clone();
            result.count += 1;
            result.enclosing_offset = Some(root_offset);
        } else {
            let inner = replace_dup_loads(child, temp, replacement);
            result.count += inner.count;
            if inner.count > 0 {
                result.enclosing_offset = inner.enclosing_offset;
            }
        }
    }
    result
}

/// Replaces `DupLoad`s of `temp` within one list entry, including the case where the
/// entry itself is the `DupLoad`.
pub fn replace_in_list_entry(
    entry: &mut Instruction,
    temp: TempId,
    replacement: &Instruction,
) -> Replaced {
    if entry.is_dup_load_of(temp) {
        *entry = replacement.clone();
        return Replaced {
            count: 1,
            enclosing_offset: None,
        };
    }
    replace_dup_loads(entry, temp, replacement)
}

/// Asserts that no `DupLoad` of `temp` survives anywhere in the subtree.
///
/// Used by passes before removing a `DupStore`; see the dangling-reference rule in the
/// crate documentation.
#[must_use]
pub fn fully_substituted(root: &Instruction, temp: TempId) -> bool {
    !crate::ir::search::uses_temp(root, temp)
}
