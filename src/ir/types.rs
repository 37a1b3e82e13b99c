//! Interned type descriptors and the assignability lattice.
//!
//! Every type a program mentions is interned once into the [`TypeTable`] and
//! addressed by a [`TypeId`]. Reference types carry an optional supertype
//! link forming a chain up to `java.lang.Object`; assignability walks that
//! chain. Primitive types and `void` are pre-registered, as are the
//! well-known reference types the outliner reasons about directly
//! (`java.lang.Object`, `java.lang.String`, `java.lang.Class`).
//!
//! Descriptors use the dex convention: `V`, `I`, `Z`, ... for `void` and
//! primitives, `Lpkg/Name;` for reference types.

use std::collections::HashMap;

use strum::{Display, EnumIter, IntoEnumIterator};

use crate::{Error, Result};

/// Descriptor of the root reference type.
pub const OBJECT_DESCRIPTOR: &str = "Ljava/lang/Object;";
/// Descriptor of the built-in string type.
pub const STRING_DESCRIPTOR: &str = "Ljava/lang/String;";
/// Descriptor of the built-in class-literal type.
pub const CLASS_DESCRIPTOR: &str = "Ljava/lang/Class;";

/// Index of an interned type in a [`TypeTable`].
///
/// `TypeId`s are cheap `Copy` handles; two ids from the same table compare
/// equal iff they denote the same descriptor.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Returns the underlying index as a `usize`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// The primitive value types of the register machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
pub enum PrimitiveType {
    /// `Z` - boolean
    Boolean,
    /// `B` - byte
    Byte,
    /// `S` - short
    Short,
    /// `C` - char
    Char,
    /// `I` - int
    Int,
    /// `J` - long
    Long,
    /// `F` - float
    Float,
    /// `D` - double
    Double,
}

impl PrimitiveType {
    /// Returns the single-character dex descriptor for this primitive.
    #[must_use]
    pub const fn descriptor(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "Z",
            PrimitiveType::Byte => "B",
            PrimitiveType::Short => "S",
            PrimitiveType::Char => "C",
            PrimitiveType::Int => "I",
            PrimitiveType::Long => "J",
            PrimitiveType::Float => "F",
            PrimitiveType::Double => "D",
        }
    }
}

/// Classification of an interned type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// The `void` return type. Never a register type.
    Void,
    /// A primitive value type.
    Primitive(PrimitiveType),
    /// A reference type with an optional supertype link.
    Reference,
}

/// One interned type entry.
#[derive(Debug, Clone)]
struct TypeEntry {
    descriptor: String,
    kind: TypeKind,
    super_type: Option<TypeId>,
}

/// The program-wide table of interned types.
///
/// Constructed with `void`, all primitives and the well-known reference
/// types already present. Reference types are interned by descriptor;
/// re-interning an existing descriptor returns the original id and keeps
/// the original supertype link.
///
/// # Examples
///
/// ```rust
/// use dexoutline::ir::TypeTable;
///
/// let mut types = TypeTable::new();
/// let obj = types.object();
/// let printer = types.intern_reference("Lio/Printer;", obj);
///
/// assert!(types.is_assignable(printer, obj));
/// assert!(!types.is_assignable(obj, printer));
/// assert_eq!(types.descriptor(printer), "Lio/Printer;");
/// ```
#[derive(Debug, Clone)]
pub struct TypeTable {
    entries: Vec<TypeEntry>,
    by_descriptor: HashMap<String, TypeId>,
    void: TypeId,
    object: TypeId,
    string: TypeId,
    class: TypeId,
}

impl TypeTable {
    /// Creates a table with `void`, the primitives and the well-known
    /// reference types pre-registered.
    #[must_use]
    pub fn new() -> Self {
        let mut table = Self {
            entries: Vec::new(),
            by_descriptor: HashMap::new(),
            void: TypeId(0),
            object: TypeId(0),
            string: TypeId(0),
            class: TypeId(0),
        };

        table.void = table.insert("V", TypeKind::Void, None);
        for prim in PrimitiveType::iter() {
            table.insert(prim.descriptor(), TypeKind::Primitive(prim), None);
        }

        table.object = table.insert(OBJECT_DESCRIPTOR, TypeKind::Reference, None);
        let object = table.object;
        table.string = table.insert(STRING_DESCRIPTOR, TypeKind::Reference, Some(object));
        table.class = table.insert(CLASS_DESCRIPTOR, TypeKind::Reference, Some(object));
        table
    }

    fn insert(&mut self, descriptor: &str, kind: TypeKind, super_type: Option<TypeId>) -> TypeId {
        let id = TypeId(u32::try_from(self.entries.len()).unwrap_or(u32::MAX));
        self.entries.push(TypeEntry {
            descriptor: descriptor.to_string(),
            kind,
            super_type,
        });
        self.by_descriptor.insert(descriptor.to_string(), id);
        id
    }

    /// Interns a reference type under `descriptor` with the given supertype.
    ///
    /// Returns the existing id (keeping the original supertype link) if the
    /// descriptor was interned before.
    pub fn intern_reference(&mut self, descriptor: &str, super_type: TypeId) -> TypeId {
        if let Some(&id) = self.by_descriptor.get(descriptor) {
            return id;
        }
        self.insert(descriptor, TypeKind::Reference, Some(super_type))
    }

    /// Looks up a type by its descriptor.
    #[must_use]
    pub fn lookup(&self, descriptor: &str) -> Option<TypeId> {
        self.by_descriptor.get(descriptor).copied()
    }

    /// Looks up a type by descriptor, reporting an error when absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeNotFound`] if the descriptor was never interned.
    pub fn require(&self, descriptor: &str) -> Result<TypeId> {
        self.lookup(descriptor)
            .ok_or_else(|| Error::TypeNotFound(descriptor.to_string()))
    }

    /// Returns the descriptor of an interned type.
    #[must_use]
    pub fn descriptor(&self, id: TypeId) -> &str {
        &self.entries[id.index()].descriptor
    }

    /// Returns the kind of an interned type.
    #[must_use]
    pub fn kind(&self, id: TypeId) -> TypeKind {
        self.entries[id.index()].kind
    }

    /// Returns the supertype of a reference type, `None` for the root and
    /// for non-reference types.
    #[must_use]
    pub fn super_type(&self, id: TypeId) -> Option<TypeId> {
        self.entries[id.index()].super_type
    }

    /// Returns `true` if `id` is a reference type.
    #[must_use]
    pub fn is_reference(&self, id: TypeId) -> bool {
        matches!(self.entries[id.index()].kind, TypeKind::Reference)
    }

    /// The `void` type.
    #[must_use]
    pub const fn void(&self) -> TypeId {
        self.void
    }

    /// The `java.lang.Object` type.
    #[must_use]
    pub const fn object(&self) -> TypeId {
        self.object
    }

    /// The `java.lang.String` type.
    #[must_use]
    pub const fn string(&self) -> TypeId {
        self.string
    }

    /// The `java.lang.Class` type.
    #[must_use]
    pub const fn class(&self) -> TypeId {
        self.class
    }

    /// Returns the id of a primitive type.
    ///
    /// # Panics
    ///
    /// Never panics; all primitives are pre-registered.
    #[must_use]
    pub fn primitive(&self, prim: PrimitiveType) -> TypeId {
        self.by_descriptor[prim.descriptor()]
    }

    /// The `int` primitive, the most common register type.
    #[must_use]
    pub fn int(&self) -> TypeId {
        self.primitive(PrimitiveType::Int)
    }

    /// Returns `true` if a value of type `from` may flow where a `to` is
    /// expected.
    ///
    /// Primitives and `void` are assignable only to themselves. A reference
    /// type is assignable to every type on its supertype chain, including
    /// itself.
    #[must_use]
    pub fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        if from == to {
            return true;
        }
        if !self.is_reference(from) || !self.is_reference(to) {
            return false;
        }
        let mut current = self.super_type(from);
        while let Some(ty) = current {
            if ty == to {
                return true;
            }
            current = self.super_type(ty);
        }
        false
    }

    /// Number of interned types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty. Always `false` in practice
    /// since well-known types are pre-registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}
