//! The register-based program model.
//!
//! This module defines everything a pass operates on: interned types
//! ([`TypeTable`]), symbol references ([`RefPool`]), instructions ([`Insn`])
//! and terminators, basic blocks, methods, classes, and the owning
//! [`Program`]. All cross-references are `Copy` arena-index newtypes
//! ([`TypeId`], [`MethodId`], [`BlockId`], ...), so instructions can be
//! cloned, compared and hashed cheaply and graphs can be mutated without
//! invalidating ids.
//!
//! Programs are assembled through the fluent builders in [`build`], which
//! validate graph invariants once at [`build::ProgramBuilder::build`].
//!
//! # Example
//!
//! ```rust
//! use dexoutline::ir::build::ProgramBuilder;
//! use dexoutline::ir::Reg;
//!
//! let mut builder = ProgramBuilder::new();
//! let string = builder.string_type();
//! let void = builder.void_type();
//! let printer = builder.reference_type("Lio/Printer;");
//! let println = builder.extern_method(printer, "println", void, &[string]);
//!
//! let mut class = builder.class("LMain;")?;
//! class
//!     .method("greet")
//!     .block(|b| {
//!         b.const_string(Reg(0), "hello");
//!         b.invoke_static(println, &[Reg(0)]);
//!         b.ret();
//!     })
//!     .build()?;
//!
//! let program = builder.build()?;
//! assert_eq!(program.method_count(), 1);
//! # Ok::<(), dexoutline::Error>(())
//! ```

mod block;
pub mod build;
mod class;
mod insn;
mod method;
mod program;
mod refs;
mod types;

pub use block::{BasicBlock, BlockId, CatchEdge};
pub use class::{Class, ClassFlags, ClassId};
pub use insn::{BinaryOp, CmpOp, Insn, InvokeKind, Opcode, Reg, Terminator, UnaryOp};
pub use method::{Method, MethodFlags, MethodId};
pub use program::Program;
pub use refs::{
    FieldRef, FieldRefId, MethodRef, MethodRefId, Proto, ProtoId, RefPool, StringId,
};
pub use types::{
    PrimitiveType, TypeId, TypeKind, TypeTable, CLASS_DESCRIPTOR, OBJECT_DESCRIPTOR,
    STRING_DESCRIPTOR,
};
