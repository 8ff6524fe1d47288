//! Constructor-call fusion.
//!
//! Object construction arrives split into allocation and initialization:
//!
//! ```text
//! DupStore#t( New C )                    Invoke special C.<init>( New C, args )
//! Invoke special C.<init>(DupLoad#t, a)  -- adjacent form, result discarded
//! ... DupLoad#t ...
//! ```
//!
//! Both forms fuse into a single `InvokeNew` expression node, substituted at every
//! consumption site in the duplicated form. `super(...)` and `this(...)` delegation
//! keeps its `Invoke` shape, since its receiver is `this`, not a fresh allocation.
//!
//! After fusing a call to a known inner class's constructor, any argument that loads a
//! named local is recorded against the inner class's captured-field table, and the
//! local is flagged to print as `final`.

use crate::{
    ir::{rewrite, search, Instruction, InstructionKind, InvokeKind},
    metadata::{ClassModel, PoolIndex},
    reconstruct::ReconstructionPass,
    Result,
};

/// Fuses `dup`-separated allocate-then-initialize pairs.
pub struct DupConstructorCallPass;

/// Fuses adjacent allocate-then-initialize calls.
pub struct SimpleConstructorCallPass;

impl ReconstructionPass for DupConstructorCallPass {
    fn name(&self) -> &'static str {
        "dup-constructor-call"
    }

    fn run_on_method(
        &self,
        body: &mut Vec<Instruction>,
        method_index: usize,
        class: &mut ClassModel,
    ) -> Result<bool> {
        let mut changed = false;
        let mut i = 0;
        while i < body.len() {
            if fuse_duplicated(body, i, method_index, class)? {
                changed = true;
            } else {
                i += 1;
            }
        }
        Ok(changed)
    }
}

impl ReconstructionPass for SimpleConstructorCallPass {
    fn name(&self) -> &'static str {
        "simple-constructor-call"
    }

    fn run_on_method(
        &self,
        body: &mut Vec<Instruction>,
        method_index: usize,
        class: &mut ClassModel,
    ) -> Result<bool> {
        let mut changed = false;
        for entry in body.iter_mut() {
            changed |= fuse_adjacent(entry, method_index, class)?;
        }
        Ok(changed)
    }
}

/// Fuses one `DupStore(New C)` anchor at `i`. Returns `true` if the list was rewritten.
fn fuse_duplicated(
    body: &mut Vec<Instruction>,
    i: usize,
    method_index: usize,
    class: &mut ClassModel,
) -> Result<bool> {
    let InstructionKind::DupStore { temp, value } = &body[i].kind else {
        return Ok(false);
    };
    let temp = *temp;
    let InstructionKind::New { class: new_class } = value.kind else {
        return Ok(false);
    };

    let Some(j) = search::find_first_consumer(body, i + 1, temp) else {
        return Ok(false);
    };
    let Some((method, args)) = match_init_call(&body[j], class)? else {
        return Ok(false);
    };
    let InstructionKind::Invoke { object, .. } = &body[j].kind else {
        return Ok(false);
    };
    let receives_temp = object
        .as_ref()
        .is_some_and(|object| object.is_dup_load_of(temp));
    // The receiver must be the sole use inside the call; an argument reading the
    // temporary would mean the object escapes before initialization.
    if !receives_temp || search::count_uses(&body[j], temp) != 1 {
        return Ok(false);
    }
    if search::count_consumers(body, j + 1, temp) == 0 {
        return Ok(false);
    }

    let fused = Instruction::new(
        body[i].offset,
        body[i].line,
        InstructionKind::InvokeNew {
            class: new_class,
            method,
            args: args.clone(),
        },
    );
    for entry in body.iter_mut().skip(j + 1) {
        rewrite::replace_in_list_entry(entry, temp, &fused);
    }
    body.remove(j);
    body.remove(i);
    note_captured_locals(class, method_index, new_class, &args)?;
    Ok(true)
}

/// Recursively fuses adjacent `Invoke special <init>(New C, ...)` nodes in a subtree.
fn fuse_adjacent(
    node: &mut Instruction,
    method_index: usize,
    class: &mut ClassModel,
) -> Result<bool> {
    let mut changed = false;
    for child in node.children_mut() {
        changed |= fuse_adjacent(child, method_index, class)?;
    }

    let Some((method, _)) = match_init_call(node, class)? else {
        return Ok(changed);
    };
    let InstructionKind::Invoke { object, args, .. } = &mut node.kind else {
        return Ok(changed);
    };
    let Some(receiver) = object.as_deref() else {
        return Ok(changed);
    };
    let InstructionKind::New { class: new_class } = receiver.kind else {
        return Ok(changed);
    };

    let args = std::mem::take(args);
    let offset = receiver.offset;
    let line = receiver.line;
    *node = Instruction::new(
        offset,
        line,
        InstructionKind::InvokeNew {
            class: new_class,
            method,
            args: args.clone(),
        },
    );
    note_captured_locals(class, method_index, new_class, &args)?;
    Ok(true)
}

/// Matches an `<init>` invocation and yields its method reference and arguments.
fn match_init_call(
    entry: &Instruction,
    class: &ClassModel,
) -> Result<Option<(PoolIndex, Vec<Instruction>)>> {
    let InstructionKind::Invoke {
        kind: InvokeKind::Special,
        method,
        args,
        ..
    } = &entry.kind
    else {
        return Ok(None);
    };
    if class.pool.method_ref(*method)?.name != "<init>" {
        return Ok(None);
    }
    Ok(Some((*method, args.clone())))
}

/// Records captured locals for a fused inner-class constructor call.
fn note_captured_locals(
    class: &mut ClassModel,
    method_index: usize,
    constructed: PoolIndex,
    args: &[Instruction],
) -> Result<()> {
    let constructed_name = class.pool.class_name(constructed)?.to_string();
    let Some(inner) = class.inner_class(&constructed_name) else {
        return Ok(());
    };

    let captures: Vec<(usize, u16)> = class.inner_classes[inner]
        .fields
        .iter()
        .enumerate()
        .filter_map(|(position, field)| {
            let parameter = field.from_parameter?;
            let arg = args.get(usize::from(parameter))?;
            let InstructionKind::LocalLoad { index } = arg.kind else {
                return None;
            };
            Some((position, index))
        })
        .collect();

    for (position, local_index) in captures {
        let Some(name) = class.methods[method_index]
            .local(local_index)
            .map(|local| local.name.clone())
        else {
            continue;
        };
        class.inner_classes[inner].fields[position].captured_local = Some(name);
        if let Some(local) = class.methods[method_index].local_mut(local_index) {
            local.is_final = true;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{CapturedField, InnerClassInfo, LocalVariable, MethodAccessFlags};
    use crate::test::build;

    fn class() -> ClassModel {
        let mut class = ClassModel::new("pkg/Foo");
        class.add_method("m", "()V", MethodAccessFlags::PUBLIC);
        class
    }

    #[test]
    fn test_duplicated_construction_fuses_at_consumer() {
        let mut class = class();
        let list = class.pool.add_class("java/util/ArrayList");
        let init = class
            .pool
            .add_method_ref("java/util/ArrayList", "<init>", "(I)V");
        let mut body = vec![
            build::dup_store(0, 5, 1, build::new_object(0, 5, list)),
            build::invoke(
                4,
                5,
                InvokeKind::Special,
                init,
                Some(build::dup_load(4, 5, 1)),
                vec![build::int(4, 5, 16)],
            ),
            build::local_store(7, 5, 1, build::dup_load(7, 5, 1)),
        ];
        let changed = DupConstructorCallPass
            .run_on_method(&mut body, 0, &mut class)
            .unwrap();
        assert!(changed);
        assert_eq!(body.len(), 1);
        let InstructionKind::LocalStore { value, .. } = &body[0].kind else {
            panic!("expected store, got {:?}", body[0].kind);
        };
        let InstructionKind::InvokeNew {
            class: fused_class,
            args,
            ..
        } = &value.kind
        else {
            panic!("expected fused constructor call, got {:?}", value.kind);
        };
        assert_eq!(*fused_class, list);
        assert_eq!(args.len(), 1);
        assert_eq!(value.offset, 0);
        assert_eq!(value.line, Some(5));
    }

    #[test]
    fn test_delegating_super_call_is_preserved() {
        let mut class = class();
        let init = class.pool.add_method_ref("java/lang/Object", "<init>", "()V");
        let mut body = vec![build::invoke(
            0,
            3,
            InvokeKind::Special,
            init,
            Some(build::local_load(0, 3, 0)),
            vec![],
        )];
        let snapshot = body.clone();
        assert!(!DupConstructorCallPass
            .run_on_method(&mut body, 0, &mut class)
            .unwrap());
        assert!(!SimpleConstructorCallPass
            .run_on_method(&mut body, 0, &mut class)
            .unwrap());
        assert_eq!(body, snapshot);
    }

    #[test]
    fn test_adjacent_construction_fuses_in_place() {
        let mut class = class();
        let thread = class.pool.add_class("java/lang/Thread");
        let init = class.pool.add_method_ref("java/lang/Thread", "<init>", "()V");
        let start = class.pool.add_method_ref("java/lang/Thread", "start", "()V");
        // new Thread().start();
        let construction = build::invoke(
            0,
            9,
            InvokeKind::Special,
            init,
            Some(build::new_object(0, 9, thread)),
            vec![],
        );
        let mut body = vec![build::invoke(
            4,
            9,
            InvokeKind::Virtual,
            start,
            Some(construction),
            vec![],
        )];
        let changed = SimpleConstructorCallPass
            .run_on_method(&mut body, 0, &mut class)
            .unwrap();
        assert!(changed);
        let InstructionKind::Invoke { object, .. } = &body[0].kind else {
            panic!("expected outer call");
        };
        let receiver = object.as_deref().unwrap();
        assert!(matches!(receiver.kind, InstructionKind::InvokeNew { .. }));
        assert_eq!(receiver.offset, 0);
    }

    #[test]
    fn test_captured_local_is_recorded_and_final() {
        let mut class = class();
        class.methods[0].locals.push(LocalVariable {
            index: 2,
            name: "count".to_string(),
            is_final: false,
        });
        class.inner_classes.push(InnerClassInfo {
            name: "pkg/Foo$1".to_string(),
            fields: vec![CapturedField {
                name: "val$count".to_string(),
                from_parameter: Some(0),
                captured_local: None,
            }],
        });
        let anon = class.pool.add_class("pkg/Foo$1");
        let init = class.pool.add_method_ref("pkg/Foo$1", "<init>", "(I)V");
        let mut body = vec![
            build::dup_store(0, 11, 1, build::new_object(0, 11, anon)),
            build::invoke(
                4,
                11,
                InvokeKind::Special,
                init,
                Some(build::dup_load(4, 11, 1)),
                vec![build::local_load(4, 11, 2)],
            ),
            build::local_store(7, 11, 3, build::dup_load(7, 11, 1)),
        ];
        let changed = DupConstructorCallPass
            .run_on_method(&mut body, 0, &mut class)
            .unwrap();
        assert!(changed);
        assert_eq!(
            class.inner_classes[0].fields[0].captured_local.as_deref(),
            Some("count")
        );
        assert!(class.methods[0].local(2).unwrap().is_final);
    }

    #[test]
    fn test_unconsumed_duplicate_is_left_alone() {
        let mut class = class();
        let list = class.pool.add_class("java/util/ArrayList");
        let init = class
            .pool
            .add_method_ref("java/util/ArrayList", "<init>", "()V");
        let mut body = vec![
            build::dup_store(0, 5, 1, build::new_object(0, 5, list)),
            build::invoke(
                4,
                5,
                InvokeKind::Special,
                init,
                Some(build::dup_load(4, 5, 1)),
                vec![],
            ),
        ];
        let snapshot = body.clone();
        let changed = DupConstructorCallPass
            .run_on_method(&mut body, 0, &mut class)
            .unwrap();
        assert!(!changed);
        assert_eq!(body, snapshot);
    }
}
