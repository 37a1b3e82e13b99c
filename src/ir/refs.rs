//! Interned symbol references: strings, prototypes, method and field refs.
//!
//! Instructions never embed strings or signatures directly; they carry
//! `Copy` ids into the [`RefPool`], which keeps instruction values cheap to
//! clone, compare and hash. That property is what makes canonical sequences
//! usable as grouping keys: once registers are renamed, two structurally
//! identical runs compare equal bit for bit.

use std::collections::HashMap;

use super::types::TypeId;

/// Index of an interned string literal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StringId(pub(crate) u32);

impl StringId {
    /// Returns the underlying index as a `usize`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for StringId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StringId({})", self.0)
    }
}

/// Index of an interned method prototype.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtoId(pub(crate) u32);

impl ProtoId {
    /// Returns the underlying index as a `usize`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for ProtoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProtoId({})", self.0)
    }
}

/// Index of an interned method reference.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodRefId(pub(crate) u32);

impl MethodRefId {
    /// Returns the underlying index as a `usize`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for MethodRefId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MethodRefId({})", self.0)
    }
}

/// Index of an interned field reference.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldRefId(pub(crate) u32);

impl FieldRefId {
    /// Returns the underlying index as a `usize`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for FieldRefId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FieldRefId({})", self.0)
    }
}

/// A method prototype: return type plus ordered parameter types.
///
/// The receiver of instance methods is not part of the prototype; invoke
/// instructions pass it as their first argument register.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Proto {
    /// The return type, `void` for procedures.
    pub return_type: TypeId,
    /// The declared parameter types, in order.
    pub params: Vec<TypeId>,
}

/// A reference to a method, resolved or external.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    /// The type that declares the method.
    pub owner: TypeId,
    /// The method name.
    pub name: String,
    /// The method prototype.
    pub proto: ProtoId,
}

/// A reference to a field, resolved or external.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    /// The type that declares the field.
    pub owner: TypeId,
    /// The field name.
    pub name: String,
    /// The declared field type.
    pub field_type: TypeId,
}

/// Interning pool for strings, prototypes and member references.
///
/// All `intern_*` operations are idempotent: interning the same value twice
/// returns the same id.
#[derive(Debug, Clone, Default)]
pub struct RefPool {
    strings: Vec<String>,
    string_ids: HashMap<String, StringId>,
    protos: Vec<Proto>,
    proto_ids: HashMap<Proto, ProtoId>,
    method_refs: Vec<MethodRef>,
    method_ref_ids: HashMap<(TypeId, String, ProtoId), MethodRefId>,
    field_refs: Vec<FieldRef>,
    field_ref_ids: HashMap<(TypeId, String, TypeId), FieldRefId>,
}

impl RefPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a string literal.
    pub fn intern_string(&mut self, value: &str) -> StringId {
        if let Some(&id) = self.string_ids.get(value) {
            return id;
        }
        let id = StringId(u32::try_from(self.strings.len()).unwrap_or(u32::MAX));
        self.strings.push(value.to_string());
        self.string_ids.insert(value.to_string(), id);
        id
    }

    /// Returns an interned string.
    #[must_use]
    pub fn string(&self, id: StringId) -> &str {
        &self.strings[id.index()]
    }

    /// Interns a prototype.
    pub fn intern_proto(&mut self, return_type: TypeId, params: Vec<TypeId>) -> ProtoId {
        let proto = Proto {
            return_type,
            params,
        };
        if let Some(&id) = self.proto_ids.get(&proto) {
            return id;
        }
        let id = ProtoId(u32::try_from(self.protos.len()).unwrap_or(u32::MAX));
        self.protos.push(proto.clone());
        self.proto_ids.insert(proto, id);
        id
    }

    /// Returns an interned prototype.
    #[must_use]
    pub fn proto(&self, id: ProtoId) -> &Proto {
        &self.protos[id.index()]
    }

    /// Interns a method reference.
    pub fn intern_method_ref(&mut self, owner: TypeId, name: &str, proto: ProtoId) -> MethodRefId {
        let key = (owner, name.to_string(), proto);
        if let Some(&id) = self.method_ref_ids.get(&key) {
            return id;
        }
        let id = MethodRefId(u32::try_from(self.method_refs.len()).unwrap_or(u32::MAX));
        self.method_refs.push(MethodRef {
            owner,
            name: name.to_string(),
            proto,
        });
        self.method_ref_ids.insert(key, id);
        id
    }

    /// Returns an interned method reference.
    #[must_use]
    pub fn method_ref(&self, id: MethodRefId) -> &MethodRef {
        &self.method_refs[id.index()]
    }

    /// Interns a field reference.
    pub fn intern_field_ref(
        &mut self,
        owner: TypeId,
        name: &str,
        field_type: TypeId,
    ) -> FieldRefId {
        let key = (owner, name.to_string(), field_type);
        if let Some(&id) = self.field_ref_ids.get(&key) {
            return id;
        }
        let id = FieldRefId(u32::try_from(self.field_refs.len()).unwrap_or(u32::MAX));
        self.field_refs.push(FieldRef {
            owner,
            name: name.to_string(),
            field_type,
        });
        self.field_ref_ids.insert(key, id);
        id
    }

    /// Returns an interned field reference.
    #[must_use]
    pub fn field_ref(&self, id: FieldRefId) -> &FieldRef {
        &self.field_refs[id.index()]
    }
}
