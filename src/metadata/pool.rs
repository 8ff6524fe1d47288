//! Constant pool model with deduplicating insertion and typed lookup.
//!
//! The pool holds the subset of entry kinds the reconstruction passes touch: `Utf8`,
//! `Class`, `String`, `NameAndType`, `FieldRef`, and `MethodRef`. Passes resolve a
//! field/method reference index to its owning type, name, and descriptor via
//! [`ConstantPool::field_ref`] / [`ConstantPool::method_ref`], and append new constants
//! when synthesizing nodes (a class-literal reference, a `getClass()` call site).
//!
//! Index 0 is reserved by the class-file format and never resolves; all `add_*`
//! operations deduplicate, so adding an existing constant returns the existing index.

use std::collections::HashMap;
use std::fmt;

use crate::Result;

/// Index of an entry in a [`ConstantPool`].
///
/// A thin wrapper over the raw `u16` the class-file format uses, kept distinct from
/// local-variable indices and byte offsets so the two cannot be confused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolIndex(pub u16);

impl fmt::Display for PoolIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single constant-pool entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantEntry {
    /// Placeholder occupying the reserved index 0.
    Reserved,
    /// A modified-UTF-8 string.
    Utf8(String),
    /// A class reference; `name` points at a `Utf8` entry holding the internal name.
    Class {
        /// Internal name of the class, e.g. `java/lang/String`
        name: PoolIndex,
    },
    /// A string literal; `utf8` points at the `Utf8` entry holding the content.
    String {
        /// Content of the literal
        utf8: PoolIndex,
    },
    /// A name-and-descriptor pair.
    NameAndType {
        /// Member name
        name: PoolIndex,
        /// Member descriptor
        descriptor: PoolIndex,
    },
    /// A field reference.
    FieldRef {
        /// Owning class
        class: PoolIndex,
        /// Name and descriptor of the field
        name_and_type: PoolIndex,
    },
    /// A method reference.
    MethodRef {
        /// Owning class
        class: PoolIndex,
        /// Name and descriptor of the method
        name_and_type: PoolIndex,
    },
}

impl ConstantEntry {
    /// Short kind name used in error reporting.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConstantEntry::Reserved => "Reserved",
            ConstantEntry::Utf8(_) => "Utf8",
            ConstantEntry::Class { .. } => "Class",
            ConstantEntry::String { .. } => "String",
            ConstantEntry::NameAndType { .. } => "NameAndType",
            ConstantEntry::FieldRef { .. } => "FieldRef",
            ConstantEntry::MethodRef { .. } => "MethodRef",
        }
    }
}

/// A resolved field or method reference.
///
/// Borrowed view produced by [`ConstantPool::field_ref`] and [`ConstantPool::method_ref`];
/// all three components point into the pool's `Utf8` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRef<'a> {
    /// Internal name of the owning class.
    pub class_name: &'a str,
    /// Member name.
    pub name: &'a str,
    /// Member descriptor.
    pub descriptor: &'a str,
}

/// The constant pool of one class.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<ConstantEntry>,
    utf8_cache: HashMap<String, PoolIndex>,
}

impl ConstantPool {
    /// Creates an empty pool with the reserved entry at index 0.
    #[must_use]
    pub fn new() -> Self {
        ConstantPool {
            entries: vec![ConstantEntry::Reserved],
            utf8_cache: HashMap::new(),
        }
    }

    /// Number of entries, counting the reserved slot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the pool holds nothing beyond the reserved slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    fn push(&mut self, entry: ConstantEntry) -> PoolIndex {
        let index = PoolIndex(u16::try_from(self.entries.len()).unwrap_or(u16::MAX));
        self.entries.push(entry);
        index
    }

    fn find(&self, entry: &ConstantEntry) -> Option<PoolIndex> {
        self.entries
            .iter()
            .position(|e| e == entry)
            .map(|i| PoolIndex(u16::try_from(i).unwrap_or(u16::MAX)))
    }

    /// Adds a UTF-8 constant, returning the existing index if already present.
    pub fn add_utf8(&mut self, value: &str) -> PoolIndex {
        if let Some(&index) = self.utf8_cache.get(value) {
            return index;
        }
        let index = self.push(ConstantEntry::Utf8(value.to_string()));
        self.utf8_cache.insert(value.to_string(), index);
        index
    }

    /// Adds a class constant for the given internal name (e.g. `java/lang/String`).
    pub fn add_class(&mut self, internal_name: &str) -> PoolIndex {
        let name = self.add_utf8(internal_name);
        let entry = ConstantEntry::Class { name };
        self.find(&entry).unwrap_or_else(|| self.push(entry))
    }

    /// Adds a string-literal constant.
    pub fn add_string(&mut self, value: &str) -> PoolIndex {
        let utf8 = self.add_utf8(value);
        let entry = ConstantEntry::String { utf8 };
        self.find(&entry).unwrap_or_else(|| self.push(entry))
    }

    /// Adds a name-and-type constant.
    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> PoolIndex {
        let name = self.add_utf8(name);
        let descriptor = self.add_utf8(descriptor);
        let entry = ConstantEntry::NameAndType { name, descriptor };
        self.find(&entry).unwrap_or_else(|| self.push(entry))
    }

    /// Adds a field reference.
    pub fn add_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> PoolIndex {
        let class = self.add_class(class);
        let name_and_type = self.add_name_and_type(name, descriptor);
        let entry = ConstantEntry::FieldRef {
            class,
            name_and_type,
        };
        self.find(&entry).unwrap_or_else(|| self.push(entry))
    }

    /// Adds a method reference.
    pub fn add_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> PoolIndex {
        let class = self.add_class(class);
        let name_and_type = self.add_name_and_type(name, descriptor);
        let entry = ConstantEntry::MethodRef {
            class,
            name_and_type,
        };
        self.find(&entry).unwrap_or_else(|| self.push(entry))
    }

    /// Returns the entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPoolIndex`](crate::Error::InvalidPoolIndex) for index 0 or
    /// an index past the end of the pool.
    pub fn entry(&self, index: PoolIndex) -> Result<&ConstantEntry> {
        if index.0 == 0 {
            return Err(crate::Error::InvalidPoolIndex { index: index.0 });
        }
        self.entries
            .get(index.0 as usize)
            .ok_or(crate::Error::InvalidPoolIndex { index: index.0 })
    }

    /// Resolves a `Utf8` entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is invalid or the entry is not `Utf8`.
    pub fn utf8(&self, index: PoolIndex) -> Result<&str> {
        match self.entry(index)? {
            ConstantEntry::Utf8(value) => Ok(value),
            _ => Err(crate::Error::UnexpectedPoolEntry {
                index: index.0,
                expected: "Utf8",
            }),
        }
    }

    /// Resolves a `Class` entry to its internal name.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is invalid or the entry is not `Class`.
    pub fn class_name(&self, index: PoolIndex) -> Result<&str> {
        match self.entry(index)? {
            ConstantEntry::Class { name } => self.utf8(*name),
            _ => Err(crate::Error::UnexpectedPoolEntry {
                index: index.0,
                expected: "Class",
            }),
        }
    }

    /// Resolves a `String` entry to its content.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is invalid or the entry is not `String`.
    pub fn string_value(&self, index: PoolIndex) -> Result<&str> {
        match self.entry(index)? {
            ConstantEntry::String { utf8 } => self.utf8(*utf8),
            _ => Err(crate::Error::UnexpectedPoolEntry {
                index: index.0,
                expected: "String",
            }),
        }
    }

    fn member_ref(&self, index: PoolIndex, class: PoolIndex, nat: PoolIndex) -> Result<MemberRef> {
        let class_name = self.class_name(class)?;
        match self.entry(nat)? {
            ConstantEntry::NameAndType { name, descriptor } => Ok(MemberRef {
                class_name,
                name: self.utf8(*name)?,
                descriptor: self.utf8(*descriptor)?,
            }),
            _ => Err(crate::Error::UnexpectedPoolEntry {
                index: index.0,
                expected: "NameAndType",
            }),
        }
    }

    /// Resolves a `FieldRef` entry to owning class, name, and descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is invalid or the entry is not `FieldRef`.
    pub fn field_ref(&self, index: PoolIndex) -> Result<MemberRef> {
        match self.entry(index)? {
            ConstantEntry::FieldRef {
                class,
                name_and_type,
            } => self.member_ref(index, *class, *name_and_type),
            _ => Err(crate::Error::UnexpectedPoolEntry {
                index: index.0,
                expected: "FieldRef",
            }),
        }
    }

    /// Resolves a `MethodRef` entry to owning class, name, and descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is invalid or the entry is not `MethodRef`.
    pub fn method_ref(&self, index: PoolIndex) -> Result<MemberRef> {
        match self.entry(index)? {
            ConstantEntry::MethodRef {
                class,
                name_and_type,
            } => self.member_ref(index, *class, *name_and_type),
            _ => Err(crate::Error::UnexpectedPoolEntry {
                index: index.0,
                expected: "MethodRef",
            }),
        }
    }
}
