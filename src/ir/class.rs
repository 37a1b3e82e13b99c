//! Classes: the method-owning units of a program.

use bitflags::bitflags;

use super::method::MethodId;
use super::types::TypeId;

bitflags! {
    /// Class access flags, after the dex `access_flags` encoding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClassFlags: u32 {
        /// Visible everywhere.
        const PUBLIC = 0x0001;
        /// Not extendable.
        const FINAL = 0x0010;
        /// An interface declaration.
        const INTERFACE = 0x0200;
        /// Not instantiable.
        const ABSTRACT = 0x0400;
        /// Generated by a tool rather than present in source.
        const SYNTHETIC = 0x1000;
    }
}

/// Index of a class in the program's class arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A class definition.
///
/// The class's own type and its supertype are interned [`TypeId`]s; the
/// descriptor is resolved through the program's type table. Method bodies
/// live in the program-wide method arena, the class only lists its members.
#[derive(Debug, Clone)]
pub struct Class {
    type_id: TypeId,
    super_type: TypeId,
    flags: ClassFlags,
    methods: Vec<MethodId>,
}

impl Class {
    /// Creates a class with no methods yet.
    #[must_use]
    pub fn new(type_id: TypeId, super_type: TypeId, flags: ClassFlags) -> Self {
        Self {
            type_id,
            super_type,
            flags,
            methods: Vec::new(),
        }
    }

    /// The class's own type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The direct supertype.
    #[must_use]
    pub const fn super_type(&self) -> TypeId {
        self.super_type
    }

    /// The access flags.
    #[must_use]
    pub const fn flags(&self) -> ClassFlags {
        self.flags
    }

    /// The member methods, in registration order.
    #[must_use]
    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }

    pub(crate) fn push_method(&mut self, id: MethodId) {
        self.methods.push(id);
    }
}
