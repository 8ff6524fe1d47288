//! Field-descriptor parsing.
//!
//! The class-literal passes receive type names as the string argument of the synthetic
//! `class$(String)` helper, which uses source-style dotted names (`java.lang.String`) and,
//! for arrays, dotted descriptors (`[Ljava.lang.String;`). The dex-enum pass reads plain
//! field descriptors. Both funnel through [`TypeDescriptor`].

use crate::Result;

/// The eight JVM primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `boolean` / `Z`
    Boolean,
    /// `byte` / `B`
    Byte,
    /// `char` / `C`
    Char,
    /// `short` / `S`
    Short,
    /// `int` / `I`
    Int,
    /// `long` / `J`
    Long,
    /// `float` / `F`
    Float,
    /// `double` / `D`
    Double,
}

impl PrimitiveKind {
    /// Maps a descriptor character to its primitive kind.
    #[must_use]
    pub fn from_descriptor_char(c: char) -> Option<PrimitiveKind> {
        match c {
            'Z' => Some(PrimitiveKind::Boolean),
            'B' => Some(PrimitiveKind::Byte),
            'C' => Some(PrimitiveKind::Char),
            'S' => Some(PrimitiveKind::Short),
            'I' => Some(PrimitiveKind::Int),
            'J' => Some(PrimitiveKind::Long),
            'F' => Some(PrimitiveKind::Float),
            'D' => Some(PrimitiveKind::Double),
            _ => None,
        }
    }

    /// The Java source keyword for this primitive.
    #[must_use]
    pub fn java_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }
}

/// A parsed field descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// A primitive type.
    Primitive(PrimitiveKind),
    /// An object type, holding the internal class name (`java/lang/String`).
    Object(String),
    /// An array type.
    Array(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Internal class name if this is an object type.
    #[must_use]
    pub fn internal_name(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Element type if this is an array type.
    #[must_use]
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Array(element) => Some(element),
            _ => None,
        }
    }
}

/// Parses a field descriptor such as `I`, `Ljava/lang/String;`, or `[[D`.
///
/// # Errors
///
/// Returns [`Error::Malformed`](crate::Error::Malformed) if the descriptor is empty,
/// truncated, or has trailing characters.
pub fn parse_type_descriptor(descriptor: &str) -> Result<TypeDescriptor> {
    let mut chars = descriptor.chars();
    let parsed = parse_inner(&mut chars, descriptor)?;
    if chars.next().is_some() {
        return Err(malformed_error!(
            "Trailing characters in descriptor '{}'",
            descriptor
        ));
    }
    Ok(parsed)
}

fn parse_inner(chars: &mut std::str::Chars<'_>, full: &str) -> Result<TypeDescriptor> {
    match chars.next() {
        Some('[') => Ok(TypeDescriptor::Array(Box::new(parse_inner(chars, full)?))),
        Some('L') => {
            let mut name = String::new();
            let mut terminated = false;
            for c in chars.by_ref() {
                if c == ';' {
                    terminated = true;
                    break;
                }
                name.push(c);
            }
            if !terminated || name.is_empty() {
                return Err(malformed_error!("Invalid class name in descriptor '{}'", full));
            }
            Ok(TypeDescriptor::Object(name))
        }
        Some(c) => PrimitiveKind::from_descriptor_char(c)
            .map(TypeDescriptor::Primitive)
            .ok_or_else(|| malformed_error!("Invalid descriptor character '{}' in '{}'", c, full)),
        None => Err(malformed_error!("Empty descriptor '{}'", full)),
    }
}

/// Parses the type name passed to the synthetic `class$(String)` helper.
///
/// Plain names are dotted source names (`java.lang.String`); array names are dotted
/// descriptors (`[Ljava.lang.String;`, `[I`). The result uses internal (slash) names.
///
/// # Errors
///
/// Returns [`Error::Malformed`](crate::Error::Malformed) if an array name is not a valid
/// descriptor.
pub fn parse_class_literal_name(name: &str) -> Result<TypeDescriptor> {
    if name.starts_with('[') {
        parse_type_descriptor(&name.replace('.', "/"))
    } else {
        Ok(TypeDescriptor::Object(name.replace('.', "/")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitive() {
        assert_eq!(
            parse_type_descriptor("I").unwrap(),
            TypeDescriptor::Primitive(PrimitiveKind::Int)
        );
        assert_eq!(
            parse_type_descriptor("D").unwrap(),
            TypeDescriptor::Primitive(PrimitiveKind::Double)
        );
    }

    #[test]
    fn test_parse_object() {
        assert_eq!(
            parse_type_descriptor("Ljava/lang/String;").unwrap(),
            TypeDescriptor::Object("java/lang/String".to_string())
        );
    }

    #[test]
    fn test_parse_nested_array() {
        let parsed = parse_type_descriptor("[[D").unwrap();
        let TypeDescriptor::Array(inner) = parsed else {
            panic!("expected array");
        };
        assert_eq!(
            *inner,
            TypeDescriptor::Array(Box::new(TypeDescriptor::Primitive(PrimitiveKind::Double)))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_type_descriptor("").is_err());
        assert!(parse_type_descriptor("X").is_err());
        assert!(parse_type_descriptor("II").is_err());
        assert!(parse_type_descriptor("L;").is_err());
    }

    #[test]
    fn test_class_literal_plain_name() {
        assert_eq!(
            parse_class_literal_name("java.lang.String").unwrap(),
            TypeDescriptor::Object("java/lang/String".to_string())
        );
    }

    #[test]
    fn test_class_literal_array_names() {
        assert_eq!(
            parse_class_literal_name("[Ljava.lang.String;").unwrap(),
            TypeDescriptor::Array(Box::new(TypeDescriptor::Object(
                "java/lang/String".to_string()
            )))
        );
        assert_eq!(
            parse_class_literal_name("[I").unwrap(),
            TypeDescriptor::Array(Box::new(TypeDescriptor::Primitive(PrimitiveKind::Int)))
        );
    }
}
