//! Outer-class reference reconstruction for inner classes.
//!
//! Compilers lower the implicit link from an inner class to its enclosing instance
//! into ordinary members:
//!
//! * a synthetic `this$N` field, stored from a hidden leading constructor parameter;
//! * `Outer.this` reads, compiled as `this.this$N` chains;
//! * `access$N` static bridge methods on the outer class, standing in for direct
//!   access to its private members.
//!
//! This class-level pass undoes all three for a class whose model carries an
//! [`OuterClass`] link: the hidden parameter and its field store disappear from
//! constructors, `this$N` chains collapse to an `OuterThis` node, and bridge calls are
//! rewritten to the member access they perform, using the outer class's accessor table.

use crate::{
    ir::{Instruction, InstructionKind, InvokeKind},
    metadata::{Accessor, ClassModel, OuterClass, PoolIndex},
    reconstruct::ReconstructionPass,
    Result,
};

/// Rewrites synthetic outer-instance plumbing back to source form.
pub struct OuterClassPass;

impl ReconstructionPass for OuterClassPass {
    fn name(&self) -> &'static str {
        "outer-class"
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
        let Some(outer) = class.outer.clone() else {
            return Ok(false);
        };
        let outer_class = class.pool.add_class(&outer.name);
        class.register_reference(&outer.name);

        let mut changed = false;
        for method_index in 0..class.methods.len() {
            let mut body = std::mem::take(&mut class.methods[method_index].body);
            let result = rewrite_method(
                &mut body,
                method_index,
                class,
                &outer,
                outer_class,
            );
            class.methods[method_index].body = body;
            changed |= result?;
        }
        Ok(changed)
    }
}

fn rewrite_method(
    body: &mut Vec<Instruction>,
    method_index: usize,
    class: &mut ClassModel,
    outer: &OuterClass,
    outer_class: PoolIndex,
) -> Result<bool> {
    let mut changed = false;
    if class.is_constructor(method_index) && strip_outer_parameter_store(body, class, outer)? {
        for entry in body.iter_mut() {
            replace_outer_parameter(entry, outer_class);
        }
        changed = true;
    }
    for entry in body.iter_mut() {
        changed |= rewrite_tree(entry, true, class, outer, outer_class)?;
    }
    Ok(changed)
}

/// Removes `this.this$N = <hidden parameter>` from a constructor body. Returns `true`
/// if the store was present, which marks the leading parameter as the outer instance.
fn strip_outer_parameter_store(
    body: &mut Vec<Instruction>,
    class: &ClassModel,
    outer: &OuterClass,
) -> Result<bool> {
    for (i, entry) in body.iter().enumerate() {
        let InstructionKind::PutField {
            object,
            field,
            value,
        } = &entry.kind
        else {
            continue;
        };
        if !matches!(object.kind, InstructionKind::LocalLoad { index: 0 })
            || !matches!(value.kind, InstructionKind::LocalLoad { index: 1 })
        {
            continue;
        }
        if class.pool.field_ref(*field)?.name == outer.this_field {
            body.remove(i);
            return Ok(true);
        }
    }
    Ok(false)
}

/// Replaces loads of the hidden constructor parameter (slot 1) with `Outer.this`.
fn replace_outer_parameter(node: &mut Instruction, outer_class: PoolIndex) {
    if matches!(node.kind, InstructionKind::LocalLoad { index: 1 }) {
        node.kind = InstructionKind::OuterThis { class: outer_class };
        return;
    }
    for child in node.children_mut() {
        replace_outer_parameter(child, outer_class);
    }
}

/// Rewrites `this$N` chains and `access$N` bridge calls within one subtree.
///
/// Children are handled first so a chain collapses innermost-out and a bridge call's
/// arguments are already in source form when they move into the rewritten node.
fn rewrite_tree(
    node: &mut Instruction,
    statement: bool,
    class: &mut ClassModel,
    outer: &OuterClass,
    outer_class: PoolIndex,
) -> Result<bool> {
    let mut changed = false;
    for child in node.children_mut() {
        changed |= rewrite_tree(child, false, class, outer, outer_class)?;
    }
    if collapse_outer_field(node, class)? {
        return Ok(true);
    }
    if rewrite_bridge_call(node, statement, class, outer)? {
        return Ok(true);
    }
    Ok(changed)
}

/// Collapses `this.this$N` (and already-collapsed chains) into `OuterThis`.
fn collapse_outer_field(node: &mut Instruction, class: &mut ClassModel) -> Result<bool> {
    let InstructionKind::GetField { object, field } = &node.kind else {
        return Ok(false);
    };
    if !matches!(
        object.kind,
        InstructionKind::LocalLoad { index: 0 } | InstructionKind::OuterThis { .. }
    ) {
        return Ok(false);
    }
    let member = class.pool.field_ref(*field)?;
    if !member.name.starts_with("this$") {
        return Ok(false);
    }
    // The field's descriptor names the enclosing class this link leads to.
    let descriptor = member.descriptor.to_string();
    let Some(name) = descriptor
        .strip_prefix('L')
        .and_then(|d| d.strip_suffix(';'))
        .map(str::to_string)
    else {
        return Ok(false);
    };
    class.register_reference(&name);
    node.kind = InstructionKind::OuterThis {
        class: class.pool.add_class(&name),
    };
    Ok(true)
}

/// Rewrites one `access$N` bridge call into the access it performs.
fn rewrite_bridge_call(
    node: &mut Instruction,
    statement: bool,
    class: &mut ClassModel,
    outer: &OuterClass,
) -> Result<bool> {
    let InstructionKind::Invoke {
        kind: InvokeKind::Static,
        method,
        object: None,
        args,
    } = &mut node.kind
    else {
        return Ok(false);
    };
    let bridge = class.pool.method_ref(*method)?;
    if bridge.class_name != outer.name {
        return Ok(false);
    }
    let Some(accessor) = outer.accessors.get(bridge.name) else {
        return Ok(false);
    };
    let bridge_descriptor = bridge.descriptor.to_string();

    let mut args = std::mem::take(args);
    let replacement = match accessor {
        Accessor::FieldGet {
            name,
            descriptor,
            is_static,
        } => {
            let field = class.pool.add_field_ref(&outer.name, name, descriptor);
            if *is_static {
                InstructionKind::GetStatic { field }
            } else {
                let object = first_arg(&mut args, node.offset)?;
                InstructionKind::GetField {
                    object: Box::new(object),
                    field,
                }
            }
        }
        Accessor::FieldPut {
            name,
            descriptor,
            is_static,
        } => {
            let field = class.pool.add_field_ref(&outer.name, name, descriptor);
            if *is_static {
                let value = first_arg(&mut args, node.offset)?;
                store_or_assignment(
                    statement,
                    InstructionKind::GetStatic { field },
                    value,
                    node,
                )
            } else {
                let object = first_arg(&mut args, node.offset)?;
                let value = first_arg(&mut args, node.offset)?;
                store_or_assignment(
                    statement,
                    InstructionKind::GetField {
                        object: Box::new(object),
                        field,
                    },
                    value,
                    node,
                )
            }
        }
        Accessor::MethodInvoke {
            name,
            descriptor,
            is_static,
        } => {
            let target = class.pool.add_method_ref(&outer.name, name, descriptor);
            if *is_static {
                InstructionKind::Invoke {
                    kind: InvokeKind::Static,
                    method: target,
                    object: None,
                    args,
                }
            } else {
                let object = first_arg(&mut args, node.offset)?;
                InstructionKind::Invoke {
                    kind: InvokeKind::Special,
                    method: target,
                    object: Some(Box::new(object)),
                    args,
                }
            }
        }
        Accessor::ConstructorInvoke { class_name } => {
            let constructed = class.pool.add_class(class_name);
            let init = class
                .pool
                .add_method_ref(class_name, "<init>", &bridge_descriptor);
            InstructionKind::InvokeNew {
                class: constructed,
                method: init,
                args,
            }
        }
    };
    node.kind = replacement;
    Ok(true)
}

/// Turns a field-put bridge into a plain store in statement position, or a nested
/// assignment expression otherwise.
fn store_or_assignment(
    statement: bool,
    target_read: InstructionKind,
    value: Instruction,
    node: &Instruction,
) -> InstructionKind {
    if statement {
        match target_read {
            InstructionKind::GetStatic { field } => InstructionKind::PutStatic {
                field,
                value: Box::new(value),
            },
            InstructionKind::GetField { object, field } => InstructionKind::PutField {
                object,
                field,
                value: Box::new(value),
            },
            _ => unreachable!("target reads are field reads"),
        }
    } else {
        InstructionKind::Assignment {
            target: Box::new(Instruction::new(node.offset, node.line, target_read)),
            value: Box::new(value),
        }
    }
}

fn first_arg(args: &mut Vec<Instruction>, offset: u32) -> Result<Instruction> {
    if args.is_empty() {
        return Err(malformed_error!(
            "Bridge method call at offset {} is missing arguments",
            offset
        ));
    }
    Ok(args.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MethodAccessFlags;
    use crate::test::build;
    use std::collections::HashMap;

    fn inner_class(accessors: HashMap<String, Accessor>) -> ClassModel {
        let mut class = ClassModel::new("pkg/Outer$Inner");
        class.outer = Some(OuterClass {
            name: "pkg/Outer".to_string(),
            this_field: "this$0".to_string(),
            accessors,
        });
        class
    }

    #[test]
    fn test_constructor_loses_hidden_parameter_plumbing() {
        let mut class = inner_class(HashMap::new());
        let this0 = class
            .pool
            .add_field_ref("pkg/Outer$Inner", "this$0", "Lpkg/Outer;");
        let super_init = class.pool.add_method_ref("java/lang/Object", "<init>", "()V");
        let ctor = class.add_method("<init>", "(Lpkg/Outer;)V", MethodAccessFlags::PUBLIC);
        class.methods[ctor].body = vec![
            build::put_field(
                0,
                1,
                build::local_load(0, 1, 0),
                this0,
                build::local_load(0, 1, 1),
            ),
            build::invoke(
                4,
                1,
                InvokeKind::Special,
                super_init,
                Some(build::local_load(4, 1, 0)),
                vec![],
            ),
            build::pop(8, 2, build::local_load(8, 2, 1)),
        ];
        let changed = OuterClassPass.run_on_class(&mut class).unwrap();
        assert!(changed);
        let body = &class.methods[ctor].body;
        assert_eq!(body.len(), 2);
        let InstructionKind::Pop { value } = &body[1].kind else {
            panic!("expected trailing statement");
        };
        let InstructionKind::OuterThis { class: outer } = value.kind else {
            panic!("expected outer-this, got {:?}", value.kind);
        };
        assert_eq!(class.pool.class_name(outer).unwrap(), "pkg/Outer");
    }

    #[test]
    fn test_nested_this_chain_collapses() {
        let mut class = inner_class(HashMap::new());
        class.add_method("m", "()V", MethodAccessFlags::PUBLIC);
        let this1 = class
            .pool
            .add_field_ref("pkg/Outer$Inner", "this$1", "Lpkg/Mid;");
        let this0 = class.pool.add_field_ref("pkg/Mid", "this$0", "Lpkg/Outer;");
        // this.this$1.this$0
        class.methods[0].body = vec![build::pop(
            0,
            5,
            build::get_field(
                0,
                5,
                build::get_field(0, 5, build::local_load(0, 5, 0), this1),
                this0,
            ),
        )];
        let changed = OuterClassPass.run_on_class(&mut class).unwrap();
        assert!(changed);
        let InstructionKind::Pop { value } = &class.methods[0].body[0].kind else {
            panic!("expected statement");
        };
        let InstructionKind::OuterThis { class: outer } = value.kind else {
            panic!("expected collapsed chain, got {:?}", value.kind);
        };
        assert_eq!(class.pool.class_name(outer).unwrap(), "pkg/Outer");
        assert!(class.referenced_types().contains("pkg/Outer"));
    }

    #[test]
    fn test_field_get_bridge_becomes_field_read() {
        let mut accessors = HashMap::new();
        accessors.insert(
            "access$0".to_string(),
            Accessor::FieldGet {
                name: "count".to_string(),
                descriptor: "I".to_string(),
                is_static: false,
            },
        );
        let mut class = inner_class(accessors);
        class.add_method("m", "()V", MethodAccessFlags::PUBLIC);
        let bridge = class
            .pool
            .add_method_ref("pkg/Outer", "access$0", "(Lpkg/Outer;)I");
        let this0 = class
            .pool
            .add_field_ref("pkg/Outer$Inner", "this$0", "Lpkg/Outer;");
        // access$0(this.this$0)
        class.methods[0].body = vec![build::local_store(
            0,
            6,
            1,
            build::invoke(
                0,
                6,
                InvokeKind::Static,
                bridge,
                None,
                vec![build::get_field(0, 6, build::local_load(0, 6, 0), this0)],
            ),
        )];
        let changed = OuterClassPass.run_on_class(&mut class).unwrap();
        assert!(changed);
        let InstructionKind::LocalStore { value, .. } = &class.methods[0].body[0].kind else {
            panic!("expected store");
        };
        let InstructionKind::GetField { object, field } = &value.kind else {
            panic!("expected field read, got {:?}", value.kind);
        };
        assert!(matches!(object.kind, InstructionKind::OuterThis { .. }));
        let member = class.pool.field_ref(*field).unwrap();
        assert_eq!(member.name, "count");
        assert_eq!(member.class_name, "pkg/Outer");
    }

    #[test]
    fn test_field_put_bridge_forms() {
        let mut accessors = HashMap::new();
        accessors.insert(
            "access$1".to_string(),
            Accessor::FieldPut {
                name: "total".to_string(),
                descriptor: "I".to_string(),
                is_static: true,
            },
        );
        let mut class = inner_class(accessors);
        class.add_method("m", "()V", MethodAccessFlags::PUBLIC);
        let bridge = class.pool.add_method_ref("pkg/Outer", "access$1", "(I)I");
        class.methods[0].body = vec![
            // Statement position: access$1(5);
            build::invoke(
                0,
                7,
                InvokeKind::Static,
                bridge,
                None,
                vec![build::int(0, 7, 5)],
            ),
            // Nested: x = access$1(6);
            build::local_store(
                4,
                8,
                1,
                build::invoke(
                    4,
                    8,
                    InvokeKind::Static,
                    bridge,
                    None,
                    vec![build::int(4, 8, 6)],
                ),
            ),
        ];
        let changed = OuterClassPass.run_on_class(&mut class).unwrap();
        assert!(changed);
        assert!(matches!(
            class.methods[0].body[0].kind,
            InstructionKind::PutStatic { .. }
        ));
        let InstructionKind::LocalStore { value, .. } = &class.methods[0].body[1].kind else {
            panic!("expected store");
        };
        let InstructionKind::Assignment { target, .. } = &value.kind else {
            panic!("expected nested assignment, got {:?}", value.kind);
        };
        assert!(matches!(target.kind, InstructionKind::GetStatic { .. }));
    }

    #[test]
    fn test_method_bridge_becomes_direct_call() {
        let mut accessors = HashMap::new();
        accessors.insert(
            "access$2".to_string(),
            Accessor::MethodInvoke {
                name: "refresh".to_string(),
                descriptor: "(I)V".to_string(),
                is_static: false,
            },
        );
        let mut class = inner_class(accessors);
        class.add_method("m", "()V", MethodAccessFlags::PUBLIC);
        let bridge = class
            .pool
            .add_method_ref("pkg/Outer", "access$2", "(Lpkg/Outer;I)V");
        let this0 = class
            .pool
            .add_field_ref("pkg/Outer$Inner", "this$0", "Lpkg/Outer;");
        class.methods[0].body = vec![build::invoke(
            0,
            9,
            InvokeKind::Static,
            bridge,
            None,
            vec![
                build::get_field(0, 9, build::local_load(0, 9, 0), this0),
                build::int(0, 9, 3),
            ],
        )];
        let changed = OuterClassPass.run_on_class(&mut class).unwrap();
        assert!(changed);
        let InstructionKind::Invoke {
            kind: InvokeKind::Special,
            method,
            object: Some(object),
            args,
        } = &class.methods[0].body[0].kind
        else {
            panic!(
                "expected direct call, got {:?}",
                class.methods[0].body[0].kind
            );
        };
        assert_eq!(class.pool.method_ref(*method).unwrap().name, "refresh");
        assert!(matches!(object.kind, InstructionKind::OuterThis { .. }));
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_unknown_bridge_is_left_alone() {
        let mut class = inner_class(HashMap::new());
        class.add_method("m", "()V", MethodAccessFlags::PUBLIC);
        let bridge = class.pool.add_method_ref("pkg/Outer", "access$9", "()I");
        class.methods[0].body = vec![build::pop(
            0,
            4,
            build::invoke(0, 4, InvokeKind::Static, bridge, None, vec![]),
        )];
        let snapshot = class.methods[0].body.clone();
        let changed = OuterClassPass.run_on_class(&mut class).unwrap();
        assert!(!changed);
        assert_eq!(class.methods[0].body, snapshot);
    }

    #[test]
    fn test_top_level_class_is_untouched() {
        let mut class = ClassModel::new("pkg/Plain");
        class.add_method("m", "()V", MethodAccessFlags::PUBLIC);
        assert!(!OuterClassPass.run_on_class(&mut class).unwrap());
    }
}
