//! Fluent builders for assembling programs.
//!
//! [`ProgramBuilder`] is the public construction surface for hosts and
//! tests: it interns types and external references, registers classes, and
//! hands out [`MethodBuilder`]s whose `block` closures emit instructions
//! through a [`BlockBuilder`]. Graph invariants are checked once, when
//! [`ProgramBuilder::build`] validates the finished program.
//!
//! # Examples
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
//! let mut class = builder.class("LMain;").unwrap();
//! class
//!     .method("greet")
//!     .block(|b| {
//!         b.const_string(Reg(0), "hello");
//!         b.invoke_static(println, &[Reg(0)]);
//!         b.ret();
//!     })
//!     .build()
//!     .unwrap();
//!
//! let program = builder.build().unwrap();
//! assert_eq!(program.method_count(), 1);
//! ```

use super::block::{BasicBlock, BlockId, CatchEdge};
use super::class::{ClassFlags, ClassId};
use super::insn::{BinaryOp, CmpOp, Insn, InvokeKind, Reg, Terminator, UnaryOp};
use super::method::{Method, MethodFlags, MethodId};
use super::program::Program;
use super::refs::{FieldRefId, MethodRefId};
use super::types::TypeId;
use crate::Result;

/// Builder for a whole [`Program`].
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    /// Creates a builder over an empty program.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: Program::new(),
        }
    }

    /// The `java.lang.Object` type.
    #[must_use]
    pub fn object_type(&self) -> TypeId {
        self.program.types().object()
    }

    /// The `java.lang.String` type.
    #[must_use]
    pub fn string_type(&self) -> TypeId {
        self.program.types().string()
    }

    /// The `int` primitive type.
    #[must_use]
    pub fn int_type(&self) -> TypeId {
        self.program.types().int()
    }

    /// The `void` type.
    #[must_use]
    pub fn void_type(&self) -> TypeId {
        self.program.types().void()
    }

    /// Interns a reference type extending `java.lang.Object`.
    pub fn reference_type(&mut self, descriptor: &str) -> TypeId {
        let object = self.program.types().object();
        self.program.types_mut().intern_reference(descriptor, object)
    }

    /// Interns a reference type with an explicit supertype.
    pub fn reference_type_extending(&mut self, descriptor: &str, super_type: TypeId) -> TypeId {
        self.program
            .types_mut()
            .intern_reference(descriptor, super_type)
    }

    /// Interns a reference to a method outside the program.
    pub fn extern_method(
        &mut self,
        owner: TypeId,
        name: &str,
        return_type: TypeId,
        params: &[TypeId],
    ) -> MethodRefId {
        let proto = self.program.intern_proto(return_type, params.to_vec());
        self.program.intern_method_ref(owner, name, proto)
    }

    /// Interns a reference to a field outside the program.
    pub fn extern_field(&mut self, owner: TypeId, name: &str, field_type: TypeId) -> FieldRefId {
        self.program.intern_field_ref(owner, name, field_type)
    }

    /// Registers a public class extending `java.lang.Object`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DuplicateClass`] if the descriptor is taken.
    pub fn class(&mut self, descriptor: &str) -> Result<ClassBuilder<'_>> {
        let object = self.program.types().object();
        self.class_with(descriptor, object, ClassFlags::PUBLIC)
    }

    /// Registers a class with explicit supertype and flags.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DuplicateClass`] if the descriptor is taken.
    pub fn class_with(
        &mut self,
        descriptor: &str,
        super_type: TypeId,
        flags: ClassFlags,
    ) -> Result<ClassBuilder<'_>> {
        let id = self.program.add_class(descriptor, super_type, flags)?;
        Ok(ClassBuilder { builder: self, id })
    }

    /// Validates and returns the finished program.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedGraph`] for the first graph
    /// invariant violation across all methods.
    pub fn build(self) -> Result<Program> {
        self.program.validate()?;
        Ok(self.program)
    }
}

/// Builder scoped to one registered class.
#[derive(Debug)]
pub struct ClassBuilder<'a> {
    builder: &'a mut ProgramBuilder,
    id: ClassId,
}

impl ClassBuilder<'_> {
    /// The id of the class under construction.
    #[must_use]
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Starts a method. Defaults: `PUBLIC | STATIC`, `void` return, no
    /// parameters, register count inferred from the emitted instructions.
    pub fn method(&mut self, name: &str) -> MethodBuilder<'_> {
        let void = self.builder.program.types().void();
        MethodBuilder {
            program: &mut self.builder.program,
            class: self.id,
            name: name.to_string(),
            flags: MethodFlags::PUBLIC | MethodFlags::STATIC,
            return_type: void,
            param_types: Vec::new(),
            param_regs: Vec::new(),
            registers: None,
            blocks: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct BlockParts {
    insns: Vec<Insn>,
    terminator: Option<Terminator>,
    catches: Vec<CatchEdge>,
}

/// Builder for one method body.
///
/// `block` appends basic blocks in arena order; the first block is the
/// entry. Every block must set exactly one terminator before
/// [`MethodBuilder::build`] runs.
#[derive(Debug)]
pub struct MethodBuilder<'a> {
    program: &'a mut Program,
    class: ClassId,
    name: String,
    flags: MethodFlags,
    return_type: TypeId,
    param_types: Vec<TypeId>,
    param_regs: Vec<Reg>,
    registers: Option<u16>,
    blocks: Vec<BlockParts>,
}

impl MethodBuilder<'_> {
    /// Replaces the access flags.
    #[must_use]
    pub fn flags(mut self, flags: MethodFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the return type.
    #[must_use]
    pub fn returns(mut self, return_type: TypeId) -> Self {
        self.return_type = return_type;
        self
    }

    /// Declares a parameter of the given type arriving in `reg`.
    #[must_use]
    pub fn param(mut self, param_type: TypeId, reg: Reg) -> Self {
        self.param_types.push(param_type);
        self.param_regs.push(reg);
        self
    }

    /// Sets the frame's register count explicitly.
    ///
    /// When absent, the count is inferred as one past the highest register
    /// mentioned anywhere in the body.
    #[must_use]
    pub fn registers(mut self, registers: u16) -> Self {
        self.registers = Some(registers);
        self
    }

    /// Appends one basic block, built by the closure.
    #[must_use]
    pub fn block<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut BlockBuilder),
    {
        self.blocks.push(BlockParts::default());
        let parts = self.blocks.last_mut().unwrap_or_else(|| unreachable!());
        let mut block_builder = BlockBuilder {
            program: self.program,
            parts,
        };
        f(&mut block_builder);
        self
    }

    /// Assembles the method and registers it with the program.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedGraph`] if the body has no blocks
    /// or a block is missing its terminator. Cross-block invariants are
    /// checked later by [`ProgramBuilder::build`].
    pub fn build(self) -> Result<MethodId> {
        if self.blocks.is_empty() {
            return Err(malformed_error!("method '{}' has no blocks", self.name));
        }

        let mut blocks = Vec::with_capacity(self.blocks.len());
        for (index, parts) in self.blocks.into_iter().enumerate() {
            let Some(terminator) = parts.terminator else {
                return Err(malformed_error!(
                    "method '{}': block b{index} has no terminator",
                    self.name
                ));
            };
            blocks.push(BasicBlock::new(parts.insns, terminator, parts.catches));
        }

        let registers = match self.registers {
            Some(n) => n,
            None => infer_register_count(&blocks, &self.param_regs),
        };

        let proto = self.program.intern_proto(self.return_type, self.param_types);
        let id = self.program.add_method(Method::new(
            self.name,
            self.class,
            self.flags,
            proto,
            registers,
            self.param_regs,
            blocks,
        ));
        Ok(id)
    }
}

fn infer_register_count(blocks: &[BasicBlock], params: &[Reg]) -> u16 {
    let mut max: Option<u16> = None;
    let mut touch = |reg: Reg| {
        max = Some(max.map_or(reg.0, |m| m.max(reg.0)));
    };
    for reg in params {
        touch(*reg);
    }
    for block in blocks {
        for insn in block.insns() {
            for reg in insn.uses() {
                touch(reg);
            }
            if let Some(def) = insn.def() {
                touch(def);
            }
        }
        for reg in block.terminator().uses() {
            touch(reg);
        }
    }
    max.map_or(0, |m| m + 1)
}

/// Instruction emitter for one block under construction.
pub struct BlockBuilder<'a> {
    program: &'a mut Program,
    parts: &'a mut BlockParts,
}

impl BlockBuilder<'_> {
    /// Emits `const dest, #value`.
    pub fn const_int(&mut self, dest: Reg, value: i32) -> &mut Self {
        self.parts.insns.push(Insn::ConstInt { dest, value });
        self
    }

    /// Emits `const-string dest, "value"`, interning the literal.
    pub fn const_string(&mut self, dest: Reg, value: &str) -> &mut Self {
        let value = self.program.intern_string(value);
        self.parts.insns.push(Insn::ConstString { dest, value });
        self
    }

    /// Emits `const-class dest, class`.
    pub fn const_class(&mut self, dest: Reg, class: TypeId) -> &mut Self {
        self.parts.insns.push(Insn::ConstClass { dest, class });
        self
    }

    /// Emits `move dest, src`.
    pub fn move_(&mut self, dest: Reg, src: Reg) -> &mut Self {
        self.parts.insns.push(Insn::Move { dest, src });
        self
    }

    /// Emits `move-result dest`.
    pub fn move_result(&mut self, dest: Reg) -> &mut Self {
        self.parts.insns.push(Insn::MoveResult { dest });
        self
    }

    /// Emits `check-cast reg, class`.
    pub fn check_cast(&mut self, reg: Reg, class: TypeId) -> &mut Self {
        self.parts.insns.push(Insn::CheckCast { reg, class });
        self
    }

    /// Emits `instance-of dest, src, class`.
    pub fn instance_of(&mut self, dest: Reg, src: Reg, class: TypeId) -> &mut Self {
        self.parts.insns.push(Insn::InstanceOf { dest, src, class });
        self
    }

    /// Emits `new-instance dest, class`.
    pub fn new_instance(&mut self, dest: Reg, class: TypeId) -> &mut Self {
        self.parts.insns.push(Insn::NewInstance { dest, class });
        self
    }

    /// Emits `invoke-static {args}, method`.
    pub fn invoke_static(&mut self, method: MethodRefId, args: &[Reg]) -> &mut Self {
        self.parts.insns.push(Insn::Invoke {
            kind: InvokeKind::Static,
            method,
            args: args.to_vec(),
        });
        self
    }

    /// Emits `invoke-virtual {receiver, args..}, method`.
    pub fn invoke_virtual(&mut self, method: MethodRefId, args: &[Reg]) -> &mut Self {
        self.parts.insns.push(Insn::Invoke {
            kind: InvokeKind::Virtual,
            method,
            args: args.to_vec(),
        });
        self
    }

    /// Emits `invoke-direct {receiver, args..}, method`.
    pub fn invoke_direct(&mut self, method: MethodRefId, args: &[Reg]) -> &mut Self {
        self.parts.insns.push(Insn::Invoke {
            kind: InvokeKind::Direct,
            method,
            args: args.to_vec(),
        });
        self
    }

    /// Emits `iget dest, object, field`.
    pub fn iget(&mut self, dest: Reg, object: Reg, field: FieldRefId) -> &mut Self {
        self.parts.insns.push(Insn::InstanceGet {
            dest,
            object,
            field,
        });
        self
    }

    /// Emits `iput src, object, field`.
    pub fn iput(&mut self, src: Reg, object: Reg, field: FieldRefId) -> &mut Self {
        self.parts.insns.push(Insn::InstancePut { src, object, field });
        self
    }

    /// Emits `sget dest, field`.
    pub fn sget(&mut self, dest: Reg, field: FieldRefId) -> &mut Self {
        self.parts.insns.push(Insn::StaticGet { dest, field });
        self
    }

    /// Emits `sput src, field`.
    pub fn sput(&mut self, src: Reg, field: FieldRefId) -> &mut Self {
        self.parts.insns.push(Insn::StaticPut { src, field });
        self
    }

    /// Emits a unary `int` operation.
    pub fn unop(&mut self, op: UnaryOp, dest: Reg, src: Reg) -> &mut Self {
        self.parts.insns.push(Insn::UnaryOp { op, dest, src });
        self
    }

    /// Emits a binary `int` operation.
    pub fn binop(&mut self, op: BinaryOp, dest: Reg, lhs: Reg, rhs: Reg) -> &mut Self {
        self.parts.insns.push(Insn::BinaryOp { op, dest, lhs, rhs });
        self
    }

    /// Emits a binary `int` operation with a literal right operand.
    pub fn binop_lit(&mut self, op: BinaryOp, dest: Reg, src: Reg, literal: i32) -> &mut Self {
        self.parts.insns.push(Insn::BinaryOpLit {
            op,
            dest,
            src,
            literal,
        });
        self
    }

    /// Emits a pre-built instruction.
    pub fn raw(&mut self, insn: Insn) -> &mut Self {
        self.parts.insns.push(insn);
        self
    }

    /// Terminates the block with `goto target`.
    pub fn goto_(&mut self, target: usize) -> &mut Self {
        self.parts.terminator = Some(Terminator::Goto {
            target: BlockId::new(target),
        });
        self
    }

    /// Terminates the block with a two-register conditional branch.
    pub fn branch(
        &mut self,
        op: CmpOp,
        lhs: Reg,
        rhs: Reg,
        then_target: usize,
        else_target: usize,
    ) -> &mut Self {
        self.parts.terminator = Some(Terminator::Branch {
            op,
            lhs,
            rhs: Some(rhs),
            then_target: BlockId::new(then_target),
            else_target: BlockId::new(else_target),
        });
        self
    }

    /// Terminates the block with a compare-to-zero conditional branch.
    pub fn branch_z(&mut self, op: CmpOp, lhs: Reg, then_target: usize, else_target: usize) -> &mut Self {
        self.parts.terminator = Some(Terminator::Branch {
            op,
            lhs,
            rhs: None,
            then_target: BlockId::new(then_target),
            else_target: BlockId::new(else_target),
        });
        self
    }

    /// Terminates the block with a switch.
    pub fn switch(&mut self, src: Reg, arms: &[(i32, usize)], default: usize) -> &mut Self {
        self.parts.terminator = Some(Terminator::Switch {
            src,
            targets: arms
                .iter()
                .map(|&(value, target)| (value, BlockId::new(target)))
                .collect(),
            default: BlockId::new(default),
        });
        self
    }

    /// Terminates the block with `return-void`.
    pub fn ret(&mut self) -> &mut Self {
        self.parts.terminator = Some(Terminator::Return { src: None });
        self
    }

    /// Terminates the block with `return src`.
    pub fn ret_val(&mut self, src: Reg) -> &mut Self {
        self.parts.terminator = Some(Terminator::Return { src: Some(src) });
        self
    }

    /// Terminates the block with `throw src`.
    pub fn throw_(&mut self, src: Reg) -> &mut Self {
        self.parts.terminator = Some(Terminator::Throw { src });
        self
    }

    /// Adds an outgoing catch edge. Order of addition is handler order.
    pub fn catch_(&mut self, exception: Option<TypeId>, handler: usize) -> &mut Self {
        self.parts.catches.push(CatchEdge {
            exception,
            handler: BlockId::new(handler),
        });
        self
    }
}
