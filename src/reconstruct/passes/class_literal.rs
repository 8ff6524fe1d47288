//! Pre-1.5 `.class` literal reconstruction.
//!
//! Before `ldc` could load class constants, `T.class` compiled to a lazily-initialized
//! static cache field plus a synthetic `class$(String)` helper:
//!
//! ```text
//! JDK 1.4 shape                              JDK 1.1.8 shape
//! ------------------------------------       ------------------------------------
//! [0] if nonnull GetStatic F -> else         [0] if nonnull GetStatic F -> else
//! [1] DupStore#t( class$("pkg.Name") )       [1] PutStatic F, class$("pkg.Name")
//! [2] PutStatic F, DupLoad#t                 [2] TernaryOpStore GetStatic F, @[4]
//! [3] TernaryOpStore DupLoad#t, @[5]         [3] goto end
//! [4] goto end                               [4] GetStatic F        (else value)
//! [5] GetStatic F        (else value)        [5] ... consumer ...
//! ```
//!
//! `F` must be a static field of this class named `class$...` with descriptor
//! `Ljava/lang/Class;`, and the helper must be `class$(Ljava/lang/String;)Ljava/lang/Class;`.
//! The whole window collapses to one expression node: a `ClassLiteral` for plain names,
//! or `new T[0].getClass()` for the array form, which had no direct literal syntax
//! either. The cache field and the helper are marked synthetic so they drop out of the
//! printed class, and the named type is registered for import tracking.

use log::{trace, warn};

use crate::{
    ir::{ArrayElement, Comparison, ConstValue, Instruction, InstructionKind, InvokeKind, TempId},
    metadata::{
        parse_class_literal_name, ClassModel, FieldAccessFlags, PoolIndex, TypeDescriptor,
    },
    reconstruct::ReconstructionPass,
    Result,
};

/// Reconstructs the JDK 1.1.8 `.class` caching shape.
pub struct Jdk118ClassLiteralPass;

/// Reconstructs the JDK 1.4 `.class` caching shape.
pub struct Jdk14ClassLiteralPass;

const HELPER_NAME: &str = "class$";
const HELPER_DESCRIPTOR: &str = "(Ljava/lang/String;)Ljava/lang/Class;";
const CACHE_DESCRIPTOR: &str = "Ljava/lang/Class;";

/// One matched window, ready to splice.
struct Window {
    /// Own field-table index of the cache field.
    field_index: usize,
    /// Pool index of the type-name string.
    name: PoolIndex,
    /// Number of list entries the window spans.
    span: usize,
}

impl ReconstructionPass for Jdk14ClassLiteralPass {
    fn name(&self) -> &'static str {
        "jdk14-class-literal"
    }

    fn run_on_method(
        &self,
        body: &mut Vec<Instruction>,
        _method_index: usize,
        class: &mut ClassModel,
    ) -> Result<bool> {
        scan(body, class, match_jdk14)
    }
}

impl ReconstructionPass for Jdk118ClassLiteralPass {
    fn name(&self) -> &'static str {
        "jdk118-class-literal"
    }

    fn run_on_method(
        &self,
        body: &mut Vec<Instruction>,
        _method_index: usize,
        class: &mut ClassModel,
    ) -> Result<bool> {
        scan(body, class, match_jdk118)
    }
}

fn scan(
    body: &mut Vec<Instruction>,
    class: &mut ClassModel,
    matcher: fn(&[Instruction], usize, &ClassModel) -> Result<Option<Window>>,
) -> Result<bool> {
    let mut changed = false;
    let mut i = 0;
    while i < body.len() {
        let Some(window) = matcher(body, i, class)? else {
            i += 1;
            continue;
        };
        changed |= splice(body, i, &window, class)?;
        i += 1;
    }
    Ok(changed)
}

fn match_jdk14(body: &[Instruction], i: usize, class: &ClassModel) -> Result<Option<Window>> {
    if i + 5 >= body.len() {
        return Ok(None);
    }
    let Some(cache) = match_cache_check(&body[i], class)? else {
        return Ok(None);
    };
    let (field_ref, field_index) = cache;

    let InstructionKind::DupStore { temp, value } = &body[i + 1].kind else {
        return Ok(None);
    };
    let Some(name) = match_helper_call(value, class)? else {
        return Ok(None);
    };
    if !is_cache_write(&body[i + 2], field_ref, *temp)
        || !is_ternary_store_of_dup(&body[i + 3], *temp, body[i + 5].offset)
        || !matches!(body[i + 4].kind, InstructionKind::Goto { .. })
        || !is_cache_read(&body[i + 5], field_ref)
    {
        return Ok(None);
    }
    Ok(Some(Window {
        field_index,
        name,
        span: 6,
    }))
}

fn match_jdk118(body: &[Instruction], i: usize, class: &ClassModel) -> Result<Option<Window>> {
    // The window is five entries; its value is consumed by whatever follows, which
    // must therefore exist.
    if i + 5 >= body.len() {
        return Ok(None);
    }
    let Some((field_ref, field_index)) = match_cache_check(&body[i], class)? else {
        return Ok(None);
    };

    let InstructionKind::PutStatic { field, value } = &body[i + 1].kind else {
        return Ok(None);
    };
    if *field != field_ref {
        return Ok(None);
    }
    let Some(name) = match_helper_call(value, class)? else {
        return Ok(None);
    };

    let ternary_ok = matches!(
        &body[i + 2].kind,
        InstructionKind::TernaryOpStore {
            value,
            second_value_offset,
        } if *second_value_offset == body[i + 4].offset
            && matches!(&value.kind, InstructionKind::GetStatic { field } if *field == field_ref)
    );
    if !ternary_ok
        || !matches!(body[i + 3].kind, InstructionKind::Goto { .. })
        || !is_cache_read(&body[i + 4], field_ref)
    {
        return Ok(None);
    }
    Ok(Some(Window {
        field_index,
        name,
        span: 5,
    }))
}

/// Matches `if nonnull GetStatic F` where `F` is this class's `class$...` cache field.
fn match_cache_check(
    entry: &Instruction,
    class: &ClassModel,
) -> Result<Option<(PoolIndex, usize)>> {
    let InstructionKind::If {
        comparison: Comparison::NonNull,
        operand,
        ..
    } = &entry.kind
    else {
        return Ok(None);
    };
    let InstructionKind::GetStatic { field } = operand.kind else {
        return Ok(None);
    };
    let Some(index) = class.own_field_index(field)? else {
        return Ok(None);
    };
    let is_cache = class.field_name(index)?.starts_with(HELPER_NAME)
        && class.field_descriptor(index)? == CACHE_DESCRIPTOR
        && class.fields[index].access.contains(FieldAccessFlags::STATIC);
    Ok(is_cache.then_some((field, index)))
}

/// Matches `class$("name")` and yields the name's string pool index.
fn match_helper_call(node: &Instruction, class: &ClassModel) -> Result<Option<PoolIndex>> {
    let InstructionKind::Invoke {
        kind: InvokeKind::Static,
        method,
        object: None,
        args,
    } = &node.kind
    else {
        return Ok(None);
    };
    let helper = class.pool.method_ref(*method)?;
    if helper.name != HELPER_NAME || helper.descriptor != HELPER_DESCRIPTOR {
        return Ok(None);
    }
    let [argument] = args.as_slice() else {
        return Ok(None);
    };
    let InstructionKind::Const(ConstValue::Str(name)) = argument.kind else {
        return Ok(None);
    };
    Ok(Some(name))
}

fn is_cache_write(entry: &Instruction, field_ref: PoolIndex, temp: TempId) -> bool {
    matches!(
        &entry.kind,
        InstructionKind::PutStatic { field, value }
            if *field == field_ref && value.is_dup_load_of(temp)
    )
}

fn is_ternary_store_of_dup(entry: &Instruction, temp: TempId, else_offset: u32) -> bool {
    matches!(
        &entry.kind,
        InstructionKind::TernaryOpStore {
            value,
            second_value_offset,
        } if value.is_dup_load_of(temp) && *second_value_offset == else_offset
    )
}

fn is_cache_read(entry: &Instruction, field_ref: PoolIndex) -> bool {
    matches!(entry.kind, InstructionKind::GetStatic { field } if field == field_ref)
}

/// Replaces the window with its literal node and retires the synthetic cache machinery.
///
/// Returns `false` without touching the list when the cached name is not a valid class
/// literal, which signals a damaged model rather than a decompilable idiom.
fn splice(
    body: &mut Vec<Instruction>,
    i: usize,
    window: &Window,
    class: &mut ClassModel,
) -> Result<bool> {
    let name = class.pool.string_value(window.name)?.to_string();
    let Some(node) = literal_node(class, body[i].offset, body[i].line, &name)? else {
        return Ok(false);
    };
    trace!("collapsing .class idiom for '{name}'");
    body[i] = node;
    body.drain(i + 1..i + window.span);

    class.mark_field_synthetic(window.field_index);
    if let Some(helper) = class.find_method(HELPER_NAME) {
        class.mark_method_synthetic(helper);
    }
    Ok(true)
}

/// Builds the expression a `class$("name")` cache stands for.
fn literal_node(
    class: &mut ClassModel,
    offset: u32,
    line: Option<u16>,
    name: &str,
) -> Result<Option<Instruction>> {
    match parse_class_literal_name(name)? {
        TypeDescriptor::Object(internal) => {
            class.register_reference(&internal);
            let literal = class.pool.add_class(&internal);
            Ok(Some(Instruction::new(
                offset,
                line,
                InstructionKind::ClassLiteral { class: literal },
            )))
        }
        TypeDescriptor::Array(element) => {
            // No literal syntax existed for array classes either; the established
            // rendition is `new T[0].getClass()`.
            let element = array_element(class, &element);
            let get_class =
                class
                    .pool
                    .add_method_ref("java/lang/Object", "getClass", "()Ljava/lang/Class;");
            let allocation = Instruction::new(
                offset,
                line,
                InstructionKind::NewArray {
                    element,
                    count: Box::new(Instruction::new(
                        offset,
                        line,
                        InstructionKind::Const(ConstValue::Int(0)),
                    )),
                },
            );
            Ok(Some(Instruction::new(
                offset,
                line,
                InstructionKind::Invoke {
                    kind: InvokeKind::Virtual,
                    method: get_class,
                    object: Some(Box::new(allocation)),
                    args: Vec::new(),
                },
            )))
        }
        TypeDescriptor::Primitive(_) => {
            // Primitive `.class` never compiled through the `class$` cache; seeing one
            // here means the model is damaged upstream. Leave the window alone.
            warn!("primitive type name '{name}' in class$ helper call at offset {offset}");
            Ok(None)
        }
    }
}

fn array_element(class: &mut ClassModel, element: &TypeDescriptor) -> ArrayElement {
    match element {
        TypeDescriptor::Primitive(kind) => ArrayElement::Primitive(*kind),
        TypeDescriptor::Object(internal) => {
            class.register_reference(internal);
            ArrayElement::Class(class.pool.add_class(internal))
        }
        TypeDescriptor::Array(_) => {
            // Multi-dimensional element: the class constant holds the descriptor form.
            ArrayElement::Class(class.pool.add_class(&descriptor_string(element)))
        }
    }
}

fn descriptor_string(descriptor: &TypeDescriptor) -> String {
    match descriptor {
        TypeDescriptor::Primitive(kind) => match kind {
            crate::metadata::PrimitiveKind::Boolean => "Z".to_string(),
            crate::metadata::PrimitiveKind::Byte => "B".to_string(),
            crate::metadata::PrimitiveKind::Char => "C".to_string(),
            crate::metadata::PrimitiveKind::Short => "S".to_string(),
            crate::metadata::PrimitiveKind::Int => "I".to_string(),
            crate::metadata::PrimitiveKind::Long => "J".to_string(),
            crate::metadata::PrimitiveKind::Float => "F".to_string(),
            crate::metadata::PrimitiveKind::Double => "D".to_string(),
        },
        TypeDescriptor::Object(internal) => format!("L{internal};"),
        TypeDescriptor::Array(element) => format!("[{}", descriptor_string(element)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MethodAccessFlags;
    use crate::test::build;

    fn caching_class() -> (ClassModel, PoolIndex, PoolIndex) {
        let mut class = ClassModel::new("pkg/Foo");
        class.add_field(
            "class$java$lang$String",
            CACHE_DESCRIPTOR,
            FieldAccessFlags::STATIC,
        );
        class.add_method(HELPER_NAME, HELPER_DESCRIPTOR, MethodAccessFlags::STATIC);
        class.add_method("m", "()V", MethodAccessFlags::PUBLIC);
        let field = class
            .pool
            .add_field_ref("pkg/Foo", "class$java$lang$String", CACHE_DESCRIPTOR);
        let helper = class
            .pool
            .add_method_ref("pkg/Foo", HELPER_NAME, HELPER_DESCRIPTOR);
        (class, field, helper)
    }

    fn helper_call(class: &mut ClassModel, helper: PoolIndex, name: &str) -> Instruction {
        let name = class.pool.add_string(name);
        build::invoke(
            3,
            17,
            InvokeKind::Static,
            helper,
            None,
            vec![build::string(3, 17, name)],
        )
    }

    fn jdk14_window(class: &mut ClassModel, field: PoolIndex, helper: PoolIndex) -> Vec<Instruction> {
        let call = helper_call(class, helper, "java.lang.String");
        vec![
            build::if_cmp(0, 17, Comparison::NonNull, build::get_static(0, 17, field), 14),
            build::dup_store(3, 17, 1, call),
            build::put_static(6, 17, field, build::dup_load(6, 17, 1)),
            build::ternary_op_store(9, 17, build::dup_load(9, 17, 1), 14),
            build::goto(11, 17, 17),
            build::get_static(14, 17, field),
        ]
    }

    #[test]
    fn test_jdk14_window_collapses_to_literal() {
        let (mut class, field, helper) = caching_class();
        let mut body = jdk14_window(&mut class, field, helper);
        let changed = Jdk14ClassLiteralPass
            .run_on_method(&mut body, 2, &mut class)
            .unwrap();
        assert!(changed);
        assert_eq!(body.len(), 1);
        let InstructionKind::ClassLiteral { class: literal } = body[0].kind else {
            panic!("expected class literal, got {:?}", body[0].kind);
        };
        assert_eq!(class.pool.class_name(literal).unwrap(), "java/lang/String");
        assert_eq!(body[0].offset, 0);

        assert!(class.fields[0].access.contains(FieldAccessFlags::SYNTHETIC));
        assert!(class.methods[0]
            .access
            .contains(MethodAccessFlags::SYNTHETIC));
        assert!(class.referenced_types().contains("java/lang/String"));
    }

    #[test]
    fn test_jdk118_window_collapses_and_keeps_consumer() {
        let (mut class, field, helper) = caching_class();
        let call = helper_call(&mut class, helper, "java.lang.String");
        let mut body = vec![
            build::if_cmp(0, 17, Comparison::NonNull, build::get_static(0, 17, field), 12),
            build::put_static(3, 17, field, call),
            build::ternary_op_store(6, 17, build::get_static(6, 17, field), 12),
            build::goto(9, 17, 15),
            build::get_static(12, 17, field),
            build::local_store(15, 17, 1, build::int(15, 17, 0)),
        ];
        let changed = Jdk118ClassLiteralPass
            .run_on_method(&mut body, 2, &mut class)
            .unwrap();
        assert!(changed);
        assert_eq!(body.len(), 2);
        assert!(matches!(body[0].kind, InstructionKind::ClassLiteral { .. }));
        assert!(matches!(body[1].kind, InstructionKind::LocalStore { .. }));
    }

    #[test]
    fn test_array_name_becomes_get_class_on_empty_array() {
        let (mut class, field, helper) = caching_class();
        let mut body = {
            let call = helper_call(&mut class, helper, "[Ljava.lang.String;");
            vec![
                build::if_cmp(0, 17, Comparison::NonNull, build::get_static(0, 17, field), 14),
                build::dup_store(3, 17, 1, call),
                build::put_static(6, 17, field, build::dup_load(6, 17, 1)),
                build::ternary_op_store(9, 17, build::dup_load(9, 17, 1), 14),
                build::goto(11, 17, 17),
                build::get_static(14, 17, field),
            ]
        };
        let changed = Jdk14ClassLiteralPass
            .run_on_method(&mut body, 2, &mut class)
            .unwrap();
        assert!(changed);
        assert_eq!(body.len(), 1);
        let InstructionKind::Invoke { object, method, .. } = &body[0].kind else {
            panic!("expected getClass call, got {:?}", body[0].kind);
        };
        assert_eq!(class.pool.method_ref(*method).unwrap().name, "getClass");
        let receiver = object.as_deref().unwrap();
        let InstructionKind::NewArray { element, count } = &receiver.kind else {
            panic!("expected array allocation");
        };
        assert!(matches!(element, ArrayElement::Class(_)));
        assert!(matches!(count.kind, InstructionKind::Const(ConstValue::Int(0))));
    }

    #[test]
    fn test_foreign_cache_field_is_rejected() {
        let (mut class, _, helper) = caching_class();
        let foreign = class
            .pool
            .add_field_ref("pkg/Other", "class$x", CACHE_DESCRIPTOR);
        let mut body = jdk14_window(&mut class, foreign, helper);
        let snapshot = body.clone();
        let changed = Jdk14ClassLiteralPass
            .run_on_method(&mut body, 2, &mut class)
            .unwrap();
        assert!(!changed);
        assert_eq!(body, snapshot);
    }

    #[test]
    fn test_misrouted_ternary_back_reference_is_rejected() {
        let (mut class, field, helper) = caching_class();
        let mut body = jdk14_window(&mut class, field, helper);
        let InstructionKind::TernaryOpStore {
            second_value_offset,
            ..
        } = &mut body[3].kind
        else {
            panic!("fixture changed");
        };
        *second_value_offset = 99;
        let changed = Jdk14ClassLiteralPass
            .run_on_method(&mut body, 2, &mut class)
            .unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_truncated_window_is_rejected() {
        let (mut class, field, helper) = caching_class();
        let mut body = jdk14_window(&mut class, field, helper);
        body.truncate(4);
        let changed = Jdk14ClassLiteralPass
            .run_on_method(&mut body, 2, &mut class)
            .unwrap();
        assert!(!changed);
    }
}
