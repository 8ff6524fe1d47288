//! Field-initializer extraction.
//!
//! Declared initializers do not survive compilation as such: instance initializers are
//! copied into the head of every constructor, static ones into `<clinit>`. These
//! class-level passes reverse that, moving assignments back onto the field table so the
//! printed declarations read `int n = 2 * SIZE;` instead of a constructor full of
//! stores.
//!
//! Hoisting is conservative. A static value may read no local variable at all.
//! Instance hoisting requires the same assignment, on the same source line, at the
//! head of every constructor: compilers copy declared initializers verbatim, so
//! line-bounded agreement across all constructors is the evidence that an assignment
//! was one, and a value that differs in any constructor never hoists. With a single
//! constructor there is no agreement to test, so its run hoists only up to the first
//! value that reads a local other than `this`. A constructor that delegates to
//! `this(...)` carries no copied initializers, so its (empty) run suppresses hoisting
//! for the whole class, unless it is the only constructor.
//!
//! [`DexEnumValuesPass`] handles the dex-specific tail of an enum's `<clinit>`, where
//! the compiler assembles the `ENUM$VALUES` array element by element.

use crate::{
    ir::{compare, search, ConstValue, Instruction, InstructionKind, InvokeKind},
    metadata::{ClassAccessFlags, ClassModel, FieldInitializer, MethodAccessFlags},
    reconstruct::ReconstructionPass,
    Result,
};

/// Hoists `<clinit>` assignments onto static field declarations.
pub struct StaticFieldInitializerPass;

/// Hoists constructor-head assignments onto instance field declarations.
pub struct InstanceFieldInitializerPass;

/// Rebuilds the dex enum `ENUM$VALUES` array initializer.
pub struct DexEnumValuesPass;

impl ReconstructionPass for StaticFieldInitializerPass {
    fn name(&self) -> &'static str {
        "static-field-initializer"
    }

    fn run_on_method(
        &self,
        _body: &mut Vec<Instruction>,
        _method_index: usize,
        _class: &mut ClassModel,
    ) -> Result<bool> {
        Ok(false)
    }

    fn is_class_level(&self) -> bool {
        true
    }

    fn run_on_class(&self, class: &mut ClassModel) -> Result<bool> {
        let Some(clinit) = (0..class.methods.len()).find(|&i| class.is_class_initializer(i))
        else {
            return Ok(false);
        };
        let mut body = std::mem::take(&mut class.methods[clinit].body);
        let result = hoist_static_run(&mut body, clinit, class);
        class.methods[clinit].body = body;
        result
    }
}

/// Hoists from both ends of `<clinit>` toward the middle.
///
/// Compilers emit declared initializers as a prefix, but an explicit `static { }` block
/// sits between declarations that precede and follow it in the source, so the suffix is
/// scanned too.
fn hoist_static_run(
    body: &mut Vec<Instruction>,
    clinit: usize,
    class: &mut ClassModel,
) -> Result<bool> {
    let mut changed = false;

    let mut i = 0;
    while i < body.len() {
        match classify_static_entry(&body[i], class)? {
            StaticEntry::Hoist(field_index) => {
                hoist_static(body, i, field_index, clinit, class);
                changed = true;
            }
            StaticEntry::Skip => i += 1,
            StaticEntry::Stop => break,
        }
    }
    let stop = i;

    let mut end = body.len();
    while end > stop {
        let entry = &body[end - 1];
        if matches!(entry.kind, InstructionKind::Return { value: None }) {
            end -= 1;
            continue;
        }
        match classify_static_entry(entry, class)? {
            StaticEntry::Hoist(field_index) => {
                hoist_static(body, end - 1, field_index, clinit, class);
                end -= 1;
                changed = true;
            }
            StaticEntry::Skip => end -= 1,
            StaticEntry::Stop => break,
        }
    }
    Ok(changed)
}

enum StaticEntry {
    Hoist(usize),
    Skip,
    Stop,
}

fn classify_static_entry(entry: &Instruction, class: &ClassModel) -> Result<StaticEntry> {
    let InstructionKind::PutStatic { field, value } = &entry.kind else {
        return Ok(StaticEntry::Stop);
    };
    let Some(field_index) = class.own_field_index(*field)? else {
        return Ok(StaticEntry::Stop);
    };
    if class.fields[field_index].initializer.is_some() {
        return Ok(StaticEntry::Stop);
    }
    // A value that reads a local belongs to explicit initializer-block code; step over
    // it and keep looking.
    if search::reads_local_other_than(value, None) {
        return Ok(StaticEntry::Skip);
    }
    Ok(StaticEntry::Hoist(field_index))
}

fn hoist_static(
    body: &mut Vec<Instruction>,
    i: usize,
    field_index: usize,
    clinit: usize,
    class: &mut ClassModel,
) {
    let entry = body.remove(i);
    let InstructionKind::PutStatic { value, .. } = entry.kind else {
        unreachable!("classified as a static store");
    };
    class.fields[field_index].initializer = Some(FieldInitializer {
        value: *value,
        declared_in: clinit,
    });
}

impl ReconstructionPass for InstanceFieldInitializerPass {
    fn name(&self) -> &'static str {
        "instance-field-initializer"
    }

    fn run_on_method(
        &self,
        _body: &mut Vec<Instruction>,
        _method_index: usize,
        _class: &mut ClassModel,
    ) -> Result<bool> {
        Ok(false)
    }

    fn is_class_level(&self) -> bool {
        true
    }

    fn run_on_class(&self, class: &mut ClassModel) -> Result<bool> {
        let constructors: Vec<usize> = class
            .constructors()
            .into_iter()
            .filter(|&i| {
                !class.methods[i]
                    .access
                    .contains(MethodAccessFlags::SYNTHETIC)
            })
            .collect();
        if constructors.is_empty() {
            return Ok(false);
        }

        // Each constructor's run of candidate assignments after its delegation call.
        let mut runs = Vec::with_capacity(constructors.len());
        for &ctor in &constructors {
            runs.push(initializer_run(ctor, class)?);
        }

        let prefix = if constructors.len() == 1 {
            runs[0]
                .assignments
                .iter()
                .take_while(|(_, value, _)| !search::reads_local_other_than(value, Some(0)))
                .count()
        } else {
            common_prefix(&runs)
        };
        if prefix == 0 {
            return Ok(false);
        }

        for slot in 0..prefix {
            let (field_index, value, _) = runs[0].assignments[slot].clone();
            class.fields[field_index].initializer = Some(FieldInitializer {
                value,
                declared_in: constructors[0],
            });
        }
        for (run, &ctor) in runs.iter().zip(&constructors) {
            let start = run.start;
            class.methods[ctor].body.drain(start..start + prefix);
        }
        Ok(true)
    }
}

/// One constructor's candidate assignments: `(field index, value, line)` for each
/// consecutive `this.f = value` after the delegation call.
struct InitializerRun {
    /// Body index of the first candidate.
    start: usize,
    assignments: Vec<(usize, Instruction, Option<u16>)>,
}

fn initializer_run(ctor: usize, class: &ClassModel) -> Result<InitializerRun> {
    let body = &class.methods[ctor].body;
    let own_name = class.name()?.to_string();

    let Some(delegation) = body.iter().position(|entry| {
        matches!(
            &entry.kind,
            InstructionKind::Invoke {
                kind: InvokeKind::Special,
                object: Some(object),
                ..
            } if matches!(object.kind, InstructionKind::LocalLoad { index: 0 })
        )
    }) else {
        return Ok(InitializerRun {
            start: 0,
            assignments: Vec::new(),
        });
    };
    let InstructionKind::Invoke { method, .. } = &body[delegation].kind else {
        return Ok(InitializerRun {
            start: 0,
            assignments: Vec::new(),
        });
    };
    // `this(...)` re-runs the other constructor's copies; it carries none itself.
    if class.pool.method_ref(*method)?.class_name == own_name {
        return Ok(InitializerRun {
            start: delegation + 1,
            assignments: Vec::new(),
        });
    }

    let start = delegation + 1;
    let mut assignments = Vec::new();
    for entry in &body[start..] {
        let InstructionKind::PutField {
            object,
            field,
            value,
        } = &entry.kind
        else {
            break;
        };
        if !matches!(object.kind, InstructionKind::LocalLoad { index: 0 }) {
            break;
        }
        let Some(field_index) = class.own_field_index(*field)? else {
            break;
        };
        if class.fields[field_index].initializer.is_some() {
            break;
        }
        assignments.push((field_index, value.as_ref().clone(), entry.line));
    }
    Ok(InitializerRun { start, assignments })
}

/// Length of the longest prefix on which every run agrees: same field, structurally
/// equal value, same source line.
fn common_prefix(runs: &[InitializerRun]) -> usize {
    let shortest = runs
        .iter()
        .map(|run| run.assignments.len())
        .min()
        .unwrap_or(0);
    (0..shortest)
        .take_while(|&slot| {
            let (field, value, line) = &runs[0].assignments[slot];
            runs[1..].iter().all(|run| {
                let (other_field, other_value, other_line) = &run.assignments[slot];
                other_field == field
                    && other_line == line
                    && compare::structurally_equal(other_value, value)
            })
        })
        .count()
}

impl ReconstructionPass for DexEnumValuesPass {
    fn name(&self) -> &'static str {
        "dex-enum-values"
    }

    fn run_on_method(
        &self,
        _body: &mut Vec<Instruction>,
        _method_index: usize,
        _class: &mut ClassModel,
    ) -> Result<bool> {
        Ok(false)
    }

    fn is_class_level(&self) -> bool {
        true
    }

    fn run_on_class(&self, class: &mut ClassModel) -> Result<bool> {
        if !class.access.contains(ClassAccessFlags::ENUM) {
            return Ok(false);
        }
        let Some(clinit) = (0..class.methods.len()).find(|&i| class.is_class_initializer(i))
        else {
            return Ok(false);
        };
        let mut body = std::mem::take(&mut class.methods[clinit].body);
        let result = rebuild_values_array(&mut body, clinit, class);
        class.methods[clinit].body = body;
        result
    }
}

/// Collapses the element-by-element `ENUM$VALUES` assembly at the tail of `<clinit>`.
fn rebuild_values_array(
    body: &mut Vec<Instruction>,
    clinit: usize,
    class: &mut ClassModel,
) -> Result<bool> {
    let Some(store) = find_values_store(body, class)? else {
        return Ok(false);
    };
    let (p, field_index, slot) = store;

    // Walk backward over the element stores.
    let mut elements = Vec::new();
    let mut q = p;
    while q > 0 {
        let InstructionKind::ArrayStore {
            array,
            index,
            value,
        } = &body[q - 1].kind
        else {
            break;
        };
        if !matches!(array.kind, InstructionKind::LocalLoad { index } if index == slot) {
            break;
        }
        let InstructionKind::Const(ConstValue::Int(position)) = index.kind else {
            break;
        };
        if search::reads_local_other_than(value, None) {
            return Ok(false);
        }
        elements.push((position, value.as_ref().clone()));
        q -= 1;
    }

    // The allocation right above the run fixes the expected element count.
    if q == 0 {
        return Ok(false);
    }
    let InstructionKind::LocalStore { index, value } = &body[q - 1].kind else {
        return Ok(false);
    };
    if *index != slot {
        return Ok(false);
    }
    let InstructionKind::NewArray { element, count } = &value.kind else {
        return Ok(false);
    };
    let InstructionKind::Const(ConstValue::Int(expected)) = count.kind else {
        return Ok(false);
    };
    if expected < 0 || elements.len() != expected as usize {
        return Ok(false);
    }
    elements.reverse();
    if elements
        .iter()
        .enumerate()
        .any(|(n, (position, _))| *position != n as i32)
    {
        return Ok(false);
    }

    let initializer = Instruction::new(
        body[q - 1].offset,
        body[q - 1].line,
        InstructionKind::NewInitArray {
            element: element.clone(),
            values: elements.into_iter().map(|(_, value)| value).collect(),
        },
    );
    class.fields[field_index].initializer = Some(FieldInitializer {
        value: initializer,
        declared_in: clinit,
    });
    body.drain(q - 1..=p);
    Ok(true)
}

/// Finds `PutStatic $VALUES, load slot` and yields its position, the field's table
/// index, and the local slot holding the array.
fn find_values_store(
    body: &[Instruction],
    class: &ClassModel,
) -> Result<Option<(usize, usize, u16)>> {
    for (p, entry) in body.iter().enumerate().rev() {
        let InstructionKind::PutStatic { field, value } = &entry.kind else {
            continue;
        };
        let Some(field_index) = class.own_field_index(*field)? else {
            continue;
        };
        let name = class.field_name(field_index)?;
        if name != "$VALUES" && name != "ENUM$VALUES" {
            continue;
        }
        let InstructionKind::LocalLoad { index } = value.kind else {
            continue;
        };
        return Ok(Some((p, field_index, index)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ArrayElement, BinaryOp};
    use crate::metadata::{FieldAccessFlags, PoolIndex};
    use crate::test::build;

    fn static_class() -> (ClassModel, PoolIndex, PoolIndex) {
        let mut class = ClassModel::new("pkg/Foo");
        class.add_field("SIZE", "I", FieldAccessFlags::STATIC | FieldAccessFlags::FINAL);
        class.add_field("total", "I", FieldAccessFlags::STATIC);
        class.add_method("<clinit>", "()V", MethodAccessFlags::STATIC);
        let size = class.pool.add_field_ref("pkg/Foo", "SIZE", "I");
        let total = class.pool.add_field_ref("pkg/Foo", "total", "I");
        (class, size, total)
    }

    #[test]
    fn test_static_prefix_is_hoisted() {
        let (mut class, size, total) = static_class();
        class.methods[0].body = vec![
            build::put_static(0, 3, size, build::int(0, 3, 64)),
            build::put_static(3, 4, total, build::int(3, 4, 0)),
            build::ret(6, 4),
        ];
        let changed = StaticFieldInitializerPass.run_on_class(&mut class).unwrap();
        assert!(changed);
        assert_eq!(class.methods[0].body.len(), 1);
        let init = class.fields[0].initializer.as_ref().unwrap();
        assert!(matches!(
            init.value.kind,
            InstructionKind::Const(ConstValue::Int(64))
        ));
        assert_eq!(init.declared_in, 0);
        assert!(class.fields[1].initializer.is_some());
    }

    #[test]
    fn test_local_reading_value_is_stepped_over() {
        let (mut class, size, total) = static_class();
        // total's value depends on a loop local: not a declared initializer, but SIZE
        // behind it still is (scanned from the far end).
        class.methods[0].body = vec![
            build::put_static(0, 5, total, build::local_load(0, 5, 0)),
            build::put_static(3, 6, size, build::int(3, 6, 64)),
            build::ret(6, 6),
        ];
        let changed = StaticFieldInitializerPass.run_on_class(&mut class).unwrap();
        assert!(changed);
        assert!(class.fields[0].initializer.is_some());
        assert!(class.fields[1].initializer.is_none());
        assert_eq!(class.methods[0].body.len(), 2);
    }

    #[test]
    fn test_foreign_store_stops_the_scan() {
        let (mut class, size, _) = static_class();
        let foreign = class.pool.add_field_ref("pkg/Other", "x", "I");
        class.methods[0].body = vec![
            build::put_static(0, 5, foreign, build::int(0, 5, 1)),
            build::put_static(3, 6, size, build::int(3, 6, 64)),
        ];
        // Forward scan stops at the foreign store; backward scan still takes SIZE.
        let changed = StaticFieldInitializerPass.run_on_class(&mut class).unwrap();
        assert!(changed);
        assert!(class.fields[0].initializer.is_some());
        assert_eq!(class.methods[0].body.len(), 1);
    }

    fn ctor_class() -> (ClassModel, PoolIndex, PoolIndex) {
        let mut class = ClassModel::new("pkg/Foo");
        class.add_field("n", "I", FieldAccessFlags::PRIVATE);
        let n = class.pool.add_field_ref("pkg/Foo", "n", "I");
        let super_init = class.pool.add_method_ref("java/lang/Object", "<init>", "()V");
        (class, n, super_init)
    }

    fn super_call(super_init: PoolIndex) -> Instruction {
        build::invoke(
            0,
            1,
            InvokeKind::Special,
            super_init,
            Some(build::local_load(0, 1, 0)),
            vec![],
        )
    }

    #[test]
    fn test_instance_initializer_common_to_all_constructors() {
        let (mut class, n, super_init) = ctor_class();
        for descriptor in ["()V", "(I)V"] {
            let ctor = class.add_method("<init>", descriptor, MethodAccessFlags::PUBLIC);
            class.methods[ctor].body = vec![
                super_call(super_init),
                build::put_field(4, 2, build::local_load(4, 2, 0), n, build::int(4, 2, 7)),
                build::ret(7, 3),
            ];
        }
        let changed = InstanceFieldInitializerPass
            .run_on_class(&mut class)
            .unwrap();
        assert!(changed);
        let init = class.fields[0].initializer.as_ref().unwrap();
        assert!(matches!(
            init.value.kind,
            InstructionKind::Const(ConstValue::Int(7))
        ));
        for method in &class.methods {
            assert_eq!(method.body.len(), 2);
        }
    }

    #[test]
    fn test_differing_values_suppress_hoisting() {
        let (mut class, n, super_init) = ctor_class();
        for (descriptor, value) in [("()V", 7), ("(I)V", 9)] {
            let ctor = class.add_method("<init>", descriptor, MethodAccessFlags::PUBLIC);
            class.methods[ctor].body = vec![
                super_call(super_init),
                build::put_field(4, 2, build::local_load(4, 2, 0), n, build::int(4, 2, value)),
            ];
        }
        let changed = InstanceFieldInitializerPass
            .run_on_class(&mut class)
            .unwrap();
        assert!(!changed);
        assert!(class.fields[0].initializer.is_none());
    }

    #[test]
    fn test_this_delegation_suppresses_hoisting() {
        let (mut class, n, super_init) = ctor_class();
        let this_init = class.pool.add_method_ref("pkg/Foo", "<init>", "()V");
        let first = class.add_method("<init>", "()V", MethodAccessFlags::PUBLIC);
        class.methods[first].body = vec![
            super_call(super_init),
            build::put_field(4, 2, build::local_load(4, 2, 0), n, build::int(4, 2, 7)),
        ];
        let second = class.add_method("<init>", "(I)V", MethodAccessFlags::PUBLIC);
        class.methods[second].body = vec![build::invoke(
            0,
            5,
            InvokeKind::Special,
            this_init,
            Some(build::local_load(0, 5, 0)),
            vec![],
        )];
        let changed = InstanceFieldInitializerPass
            .run_on_class(&mut class)
            .unwrap();
        assert!(!changed);
        assert!(class.fields[0].initializer.is_none());
    }

    #[test]
    fn test_single_constructor_hoists_whole_run() {
        let (mut class, n, super_init) = ctor_class();
        class.add_field("label", "Ljava/lang/String;", FieldAccessFlags::PRIVATE);
        let label = class
            .pool
            .add_field_ref("pkg/Foo", "label", "Ljava/lang/String;");
        let text = class.pool.add_string("none");
        let ctor = class.add_method("<init>", "()V", MethodAccessFlags::PUBLIC);
        class.methods[ctor].body = vec![
            super_call(super_init),
            build::put_field(4, 2, build::local_load(4, 2, 0), n, build::int(4, 2, 7)),
            build::put_field(
                7,
                3,
                build::local_load(7, 3, 0),
                label,
                build::string(7, 3, text),
            ),
            build::ret(10, 4),
        ];
        let changed = InstanceFieldInitializerPass
            .run_on_class(&mut class)
            .unwrap();
        assert!(changed);
        assert!(class.fields[0].initializer.is_some());
        assert!(class.fields[1].initializer.is_some());
        assert_eq!(class.methods[ctor].body.len(), 2);
    }

    #[test]
    fn test_single_constructor_stops_at_parameter_value() {
        let (mut class, n, super_init) = ctor_class();
        class.add_field("m", "I", FieldAccessFlags::PRIVATE);
        let m = class.pool.add_field_ref("pkg/Foo", "m", "I");
        let ctor = class.add_method("<init>", "(I)V", MethodAccessFlags::PUBLIC);
        class.methods[ctor].body = vec![
            super_call(super_init),
            build::put_field(4, 2, build::local_load(4, 2, 0), n, build::int(4, 2, 7)),
            // Parameter-valued: an ordinary constructor statement, not an initializer.
            build::put_field(
                7,
                9,
                build::local_load(7, 9, 0),
                m,
                build::local_load(7, 9, 1),
            ),
        ];
        let changed = InstanceFieldInitializerPass
            .run_on_class(&mut class)
            .unwrap();
        assert!(changed);
        assert!(class.fields[0].initializer.is_some());
        assert!(class.fields[1].initializer.is_none());
        assert_eq!(class.methods[ctor].body.len(), 2);
    }

    #[test]
    fn test_enum_values_array_is_rebuilt() {
        let mut class = ClassModel::new("pkg/Color");
        class.access |= ClassAccessFlags::ENUM;
        class.add_field("RED", "Lpkg/Color;", FieldAccessFlags::STATIC);
        class.add_field("ENUM$VALUES", "[Lpkg/Color;", FieldAccessFlags::STATIC);
        class.add_method("<clinit>", "()V", MethodAccessFlags::STATIC);
        let red = class.pool.add_field_ref("pkg/Color", "RED", "Lpkg/Color;");
        let values = class
            .pool
            .add_field_ref("pkg/Color", "ENUM$VALUES", "[Lpkg/Color;");
        let color = class.pool.add_class("pkg/Color");

        class.methods[0].body = vec![
            build::local_store(
                0,
                1,
                0,
                build::new_array(0, 1, ArrayElement::Class(color), build::int(0, 1, 2)),
            ),
            build::array_store(
                4,
                1,
                build::local_load(4, 1, 0),
                build::int(4, 1, 0),
                build::get_static(4, 1, red),
            ),
            build::array_store(
                8,
                1,
                build::local_load(8, 1, 0),
                build::int(8, 1, 1),
                build::get_static(8, 1, red),
            ),
            build::put_static(12, 1, values, build::local_load(12, 1, 0)),
            build::ret(15, 1),
        ];
        let changed = DexEnumValuesPass.run_on_class(&mut class).unwrap();
        assert!(changed);
        let init = class.fields[1].initializer.as_ref().unwrap();
        let InstructionKind::NewInitArray { values, .. } = &init.value.kind else {
            panic!("expected array initializer, got {:?}", init.value.kind);
        };
        assert_eq!(values.len(), 2);
        assert_eq!(class.methods[0].body.len(), 1);
    }

    #[test]
    fn test_enum_with_gap_in_indices_is_left_alone() {
        let mut class = ClassModel::new("pkg/Color");
        class.access |= ClassAccessFlags::ENUM;
        class.add_field("ENUM$VALUES", "[Lpkg/Color;", FieldAccessFlags::STATIC);
        class.add_method("<clinit>", "()V", MethodAccessFlags::STATIC);
        let values = class
            .pool
            .add_field_ref("pkg/Color", "ENUM$VALUES", "[Lpkg/Color;");
        let color = class.pool.add_class("pkg/Color");
        class.methods[0].body = vec![
            build::local_store(
                0,
                1,
                0,
                build::new_array(0, 1, ArrayElement::Class(color), build::int(0, 1, 2)),
            ),
            build::array_store(
                4,
                1,
                build::local_load(4, 1, 0),
                build::int(4, 1, 1),
                build::int(4, 1, 0),
            ),
            build::put_static(12, 1, values, build::local_load(12, 1, 0)),
        ];
        let snapshot = class.methods[0].body.clone();
        let changed = DexEnumValuesPass.run_on_class(&mut class).unwrap();
        assert!(!changed);
        assert_eq!(class.methods[0].body, snapshot);
    }

    #[test]
    fn test_non_enum_class_is_ignored() {
        let mut class = ClassModel::new("pkg/Foo");
        assert!(!DexEnumValuesPass.run_on_class(&mut class).unwrap());
    }

    #[test]
    fn test_binary_initializer_value_survives_hoisting() {
        let (mut class, size, total) = static_class();
        class.methods[0].body = vec![build::put_static(
            0,
            3,
            total,
            build::binary(
                0,
                3,
                BinaryOp::Mul,
                build::get_static(0, 3, size),
                build::int(3, 3, 2),
            ),
        )];
        let changed = StaticFieldInitializerPass.run_on_class(&mut class).unwrap();
        assert!(changed);
        let init = class.fields[1].initializer.as_ref().unwrap();
        assert!(matches!(init.value.kind, InstructionKind::Binary { .. }));
    }
}
