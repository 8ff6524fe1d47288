//! The per-class model the reconstruction passes read and mutate.
//!
//! [`ClassModel`] bundles the constant pool with the field and method tables, the
//! inner/outer class links, and the synthesized-accessor table. It is the unit the
//! pipeline processes: every pass receives one `&mut ClassModel` (with the method body
//! under rewrite taken out of its slot for the duration, so the two mutable borrows
//! never alias).
//!
//! Fields carry the reconstructed declared-initializer slot ([`FieldInitializer`]) that
//! the field-initializer passes fill and the printer later consumes.

use std::collections::{BTreeSet, HashMap};

use crate::{
    ir::Instruction,
    metadata::{ClassAccessFlags, ConstantPool, FieldAccessFlags, MethodAccessFlags, PoolIndex},
    Result,
};

/// A field's reconstructed declared initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInitializer {
    /// The initializer expression, e.g. the right-hand side of `int f = 2 * n;`.
    pub value: Instruction,
    /// Index of the method the assignment was hoisted from (`<clinit>` or a constructor).
    pub declared_in: usize,
}

/// One field of the class.
#[derive(Debug, Clone)]
pub struct Field {
    /// `Utf8` pool index of the field name.
    pub name: PoolIndex,
    /// `Utf8` pool index of the field descriptor.
    pub descriptor: PoolIndex,
    /// Access flags.
    pub access: FieldAccessFlags,
    /// Reconstructed declared initializer, if a pass hoisted one.
    pub initializer: Option<FieldInitializer>,
}

/// A named local variable slot of one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    /// Slot index.
    pub index: u16,
    /// Source name.
    pub name: String,
    /// Set when a pass determines the local must print as `final` (captured by an
    /// anonymous class).
    pub is_final: bool,
}

/// One method of the class.
#[derive(Debug, Clone)]
pub struct Method {
    /// `Utf8` pool index of the method name.
    pub name: PoolIndex,
    /// `Utf8` pool index of the method descriptor.
    pub descriptor: PoolIndex,
    /// Access flags.
    pub access: MethodAccessFlags,
    /// The flat instruction list of the body.
    pub body: Vec<Instruction>,
    /// Named local variable slots.
    pub locals: Vec<LocalVariable>,
}

impl Method {
    /// `true` for `static` methods.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.access.contains(MethodAccessFlags::STATIC)
    }

    /// Looks up a named local variable slot.
    #[must_use]
    pub fn local(&self, index: u16) -> Option<&LocalVariable> {
        self.locals.iter().find(|l| l.index == index)
    }

    /// Mutable lookup of a named local variable slot.
    pub fn local_mut(&mut self, index: u16) -> Option<&mut LocalVariable> {
        self.locals.iter_mut().find(|l| l.index == index)
    }
}

/// What a synthesized `access$N` method does on behalf of an inner class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// Reads a field; first argument is the receiver unless `is_static`.
    FieldGet {
        /// Field name.
        name: String,
        /// Field descriptor.
        descriptor: String,
        /// `true` for static fields.
        is_static: bool,
    },
    /// Writes a field; last argument is the stored value.
    FieldPut {
        /// Field name.
        name: String,
        /// Field descriptor.
        descriptor: String,
        /// `true` for static fields.
        is_static: bool,
    },
    /// Invokes a private method; first argument is the receiver unless `is_static`.
    MethodInvoke {
        /// Method name.
        name: String,
        /// Method descriptor.
        descriptor: String,
        /// `true` for static methods.
        is_static: bool,
    },
    /// Invokes a private constructor.
    ConstructorInvoke {
        /// Internal name of the constructed class.
        class_name: String,
    },
}

/// Handle to the enclosing class of an inner class.
///
/// Carries only what the outer-reference pass needs: the outer class name, the name of
/// the synthetic outer-this field the compiler injected, and the outer class's
/// synthesized-accessor table keyed by accessor method name.
#[derive(Debug, Clone, Default)]
pub struct OuterClass {
    /// Internal name of the outer class.
    pub name: String,
    /// Name of the synthetic outer-instance field, e.g. `this$0`.
    pub this_field: String,
    /// Accessor table: `access$N` method name to what it does.
    pub accessors: HashMap<String, Accessor>,
}

/// A field of an inner class that an earlier stage flagged as supplied by a constructor
/// parameter (an anonymous class's captured variable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedField {
    /// Field name inside the inner class, e.g. `val$count`.
    pub name: String,
    /// Constructor parameter position supplying the value, counting from 0 in the
    /// argument list of the `<init>` call.
    pub from_parameter: Option<u16>,
    /// Source name of the captured local, resolved by the constructor-call post-step.
    pub captured_local: Option<String>,
}

/// Descriptor of one known inner class of this class.
#[derive(Debug, Clone, Default)]
pub struct InnerClassInfo {
    /// Internal name of the inner class.
    pub name: String,
    /// Captured-field records flagged by an earlier stage.
    pub fields: Vec<CapturedField>,
}

/// The class under reconstruction.
#[derive(Debug, Clone)]
pub struct ClassModel {
    /// The constant pool; passes append new constants when synthesizing nodes.
    pub pool: ConstantPool,
    /// `Class` pool index of this class.
    pub this_class: PoolIndex,
    /// Class access flags.
    pub access: ClassAccessFlags,
    /// Field table.
    pub fields: Vec<Field>,
    /// Method table.
    pub methods: Vec<Method>,
    /// Enclosing class, for inner classes.
    pub outer: Option<OuterClass>,
    /// Known inner classes of this class.
    pub inner_classes: Vec<InnerClassInfo>,
    referenced_types: BTreeSet<String>,
}

impl ClassModel {
    /// Creates an empty class with the given internal name.
    #[must_use]
    pub fn new(internal_name: &str) -> Self {
        let mut pool = ConstantPool::new();
        let this_class = pool.add_class(internal_name);
        ClassModel {
            pool,
            this_class,
            access: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            fields: Vec::new(),
            methods: Vec::new(),
            outer: None,
            inner_classes: Vec::new(),
            referenced_types: BTreeSet::new(),
        }
    }

    /// Internal name of this class.
    ///
    /// # Errors
    ///
    /// Returns an error if `this_class` does not resolve, which indicates a damaged model.
    pub fn name(&self) -> Result<&str> {
        self.pool.class_name(self.this_class)
    }

    /// Adds a field, interning its name and descriptor, and returns its table index.
    pub fn add_field(
        &mut self,
        name: &str,
        descriptor: &str,
        access: FieldAccessFlags,
    ) -> usize {
        let name = self.pool.add_utf8(name);
        let descriptor = self.pool.add_utf8(descriptor);
        self.fields.push(Field {
            name,
            descriptor,
            access,
            initializer: None,
        });
        self.fields.len() - 1
    }

    /// Adds a method with an empty body and returns its table index.
    pub fn add_method(
        &mut self,
        name: &str,
        descriptor: &str,
        access: MethodAccessFlags,
    ) -> usize {
        let name = self.pool.add_utf8(name);
        let descriptor = self.pool.add_utf8(descriptor);
        self.methods.push(Method {
            name,
            descriptor,
            access,
            body: Vec::new(),
            locals: Vec::new(),
        });
        self.methods.len() - 1
    }

    /// Name of the field at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the field's name index does not resolve.
    pub fn field_name(&self, index: usize) -> Result<&str> {
        self.pool.utf8(self.fields[index].name)
    }

    /// Descriptor of the field at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the field's descriptor index does not resolve.
    pub fn field_descriptor(&self, index: usize) -> Result<&str> {
        self.pool.utf8(self.fields[index].descriptor)
    }

    /// Name of the method at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the method's name index does not resolve.
    pub fn method_name(&self, index: usize) -> Result<&str> {
        self.pool.utf8(self.methods[index].name)
    }

    /// Finds a field table index by name.
    #[must_use]
    pub fn find_field(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| self.pool.utf8(f.name).is_ok_and(|n| n == name))
    }

    /// Finds a method table index by name.
    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<usize> {
        self.methods
            .iter()
            .position(|m| self.pool.utf8(m.name).is_ok_and(|n| n == name))
    }

    /// `true` if the method at `index` is a constructor.
    #[must_use]
    pub fn is_constructor(&self, index: usize) -> bool {
        self.pool
            .utf8(self.methods[index].name)
            .is_ok_and(|n| n == "<init>")
    }

    /// `true` if the method at `index` is the class initializer.
    #[must_use]
    pub fn is_class_initializer(&self, index: usize) -> bool {
        self.pool
            .utf8(self.methods[index].name)
            .is_ok_and(|n| n == "<clinit>")
    }

    /// Table indices of all constructors.
    #[must_use]
    pub fn constructors(&self) -> Vec<usize> {
        (0..self.methods.len())
            .filter(|&i| self.is_constructor(i))
            .collect()
    }

    /// Resolves a `FieldRef` pool index to this class's own field table, if the
    /// reference targets this class.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool index does not resolve to a `FieldRef`.
    pub fn own_field_index(&self, field_ref: PoolIndex) -> Result<Option<usize>> {
        let member = self.pool.field_ref(field_ref)?;
        if member.class_name != self.name()? {
            return Ok(None);
        }
        Ok(self.fields.iter().position(|f| {
            self.pool.utf8(f.name).is_ok_and(|n| n == member.name)
                && self
                    .pool
                    .utf8(f.descriptor)
                    .is_ok_and(|d| d == member.descriptor)
        }))
    }

    /// Marks the field at `index` as compiler-synthesized.
    pub fn mark_field_synthetic(&mut self, index: usize) {
        self.fields[index].access |= FieldAccessFlags::SYNTHETIC;
    }

    /// Marks the method at `index` as compiler-synthesized.
    pub fn mark_method_synthetic(&mut self, index: usize) {
        self.methods[index].access |= MethodAccessFlags::SYNTHETIC;
    }

    /// Records a referenced type for import tracking.
    pub fn register_reference(&mut self, internal_name: &str) {
        self.referenced_types.insert(internal_name.to_string());
    }

    /// Types referenced by reconstructed nodes, in sorted order.
    #[must_use]
    pub fn referenced_types(&self) -> &BTreeSet<String> {
        &self.referenced_types
    }

    /// Looks up a known inner class by internal name.
    #[must_use]
    pub fn inner_class(&self, internal_name: &str) -> Option<usize> {
        self.inner_classes
            .iter()
            .position(|i| i.name == internal_name)
    }
}
