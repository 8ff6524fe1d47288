//! Structural comparison of instruction subtrees.
//!
//! Two subtrees are structurally equal when they have the same opcode tags and operands
//! all the way down, ignoring node identity (byte offsets) and line numbers. Passes use
//! this to confirm that two distinct occurrences denote "the same value" - for example
//! the `GetField` read and the `PutField` write base of a `this.f += x` idiom, or the
//! array and index expressions of an `arr[i] OP= x` idiom.
//!
//! `DupLoad` nodes compare by temporary handle: two loads of the same temporary denote
//! the same computed value by construction.

use crate::ir::{Instruction, InstructionKind};

/// Deep equality over two instruction subtrees, ignoring offsets and line numbers.
#[must_use]
pub fn structurally_equal(a: &Instruction, b: &Instruction) -> bool {
    match (&a.kind, &b.kind) {
        (InstructionKind::Const(u), InstructionKind::Const(v)) => u == v,
        (
            InstructionKind::LocalLoad { index: u },
            InstructionKind::LocalLoad { index: v },
        ) => u == v,
        (
            InstructionKind::LocalStore { index: u, .. },
            InstructionKind::LocalStore { index: v, .. },
        ) => u == v && children_equal(a, b),
        (
            InstructionKind::GetField { field: u, .. },
            InstructionKind::GetField { field: v, .. },
        )
        | (
            InstructionKind::PutField { field: u, .. },
            InstructionKind::PutField { field: v, .. },
        )
        | (
            InstructionKind::GetStatic { field: u },
            InstructionKind::GetStatic { field: v },
        )
        | (
            InstructionKind::PutStatic { field: u, .. },
            InstructionKind::PutStatic { field: v, .. },
        ) => u == v && children_equal(a, b),
        (InstructionKind::ArrayLoad { .. }, InstructionKind::ArrayLoad { .. })
        | (InstructionKind::ArrayStore { .. }, InstructionKind::ArrayStore { .. })
        | (InstructionKind::Pop { .. }, InstructionKind::Pop { .. })
        | (InstructionKind::MonitorEnter { .. }, InstructionKind::MonitorEnter { .. })
        | (InstructionKind::MonitorExit { .. }, InstructionKind::MonitorExit { .. })
        | (InstructionKind::Return { .. }, InstructionKind::Return { .. })
        | (InstructionKind::Assignment { .. }, InstructionKind::Assignment { .. }) => {
            children_equal(a, b)
        }
        (
            InstructionKind::Binary { op: u, .. },
            InstructionKind::Binary { op: v, .. },
        ) => u == v && children_equal(a, b),
        (
            InstructionKind::Unary { op: u, .. },
            InstructionKind::Unary { op: v, .. },
        ) => u == v && children_equal(a, b),
        (
            InstructionKind::Convert { conv: u, .. },
            InstructionKind::Convert { conv: v, .. },
        ) => u == v && children_equal(a, b),
        (
            InstructionKind::Cast { class: u, .. },
            InstructionKind::Cast { class: v, .. },
        ) => u == v && children_equal(a, b),
        (
            InstructionKind::Invoke {
                kind: uk,
                method: um,
                ..
            },
            InstructionKind::Invoke {
                kind: vk,
                method: vm,
                ..
            },
        ) => uk == vk && um == vm && children_equal(a, b),
        (InstructionKind::New { class: u }, InstructionKind::New { class: v })
        | (
            InstructionKind::ClassLiteral { class: u },
            InstructionKind::ClassLiteral { class: v },
        )
        | (
            InstructionKind::OuterThis { class: u },
            InstructionKind::OuterThis { class: v },
        ) => u == v,
        (
            InstructionKind::InvokeNew {
                class: uc,
                method: um,
                ..
            },
            InstructionKind::InvokeNew {
                class: vc,
                method: vm,
                ..
            },
        ) => uc == vc && um == vm && children_equal(a, b),
        (
            InstructionKind::NewArray { element: u, .. },
            InstructionKind::NewArray { element: v, .. },
        )
        | (
            InstructionKind::NewInitArray { element: u, .. },
            InstructionKind::NewInitArray { element: v, .. },
        ) => u == v && children_equal(a, b),
        (
            InstructionKind::If {
                comparison: uc,
                target: ut,
                ..
            },
            InstructionKind::If {
                comparison: vc,
                target: vt,
                ..
            },
        ) => uc == vc && ut == vt && children_equal(a, b),
        (InstructionKind::Goto { target: u }, InstructionKind::Goto { target: v }) => u == v,
        (
            InstructionKind::Increment {
                amount: ua,
                position: up,
                ..
            },
            InstructionKind::Increment {
                amount: va,
                position: vp,
                ..
            },
        ) => ua == va && up == vp && children_equal(a, b),
        (
            InstructionKind::CompoundAssignment { op: u, .. },
            InstructionKind::CompoundAssignment { op: v, .. },
        ) => u == v && children_equal(a, b),
        (
            InstructionKind::DupStore { temp: u, .. },
            InstructionKind::DupStore { temp: v, .. },
        ) => u == v && children_equal(a, b),
        (
            InstructionKind::DupLoad { temp: u },
            InstructionKind::DupLoad { temp: v },
        ) => u == v,
        (
            InstructionKind::TernaryOpStore { .. },
            InstructionKind::TernaryOpStore { .. },
        ) => children_equal(a, b),
        _ => false,
    }
}

fn children_equal(a: &Instruction, b: &Instruction) -> bool {
    let left = a.children();
    let right = b.children();
    left.len() == right.len()
        && left
            .iter()
            .zip(right.iter())
            .all(|(l, r)| structurally_equal(l, r))
}
