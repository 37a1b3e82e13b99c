//! The register-machine instruction set.
//!
//! Instructions ([`Insn`]) are straight-line: they read and write registers
//! but never transfer control. Control transfer lives exclusively in each
//! basic block's [`Terminator`]. This split keeps instruction runs (the
//! outliner's unit of work) free of control flow by construction.
//!
//! The set is closed and every register-carrying operation is an exhaustive
//! match, so register accessors ([`Insn::uses`], [`Insn::def`],
//! [`Insn::map_registers`]) cannot silently miss a new variant.
//!
//! Sizes reported by [`Insn::code_units`] approximate the encoded width of
//! the corresponding dex format and feed the outliner's benefit model.

use strum::Display;

use super::block::BlockId;
use super::refs::{FieldRefId, MethodRefId, StringId};
use super::types::TypeId;

/// A virtual register of a method frame.
///
/// Registers are untyped slots; the same register may hold values of
/// different types at different program points.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reg(pub u16);

impl Reg {
    /// Returns the register number as a `usize`, for indexing bit sets.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reg({})", self.0)
    }
}

impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u16> for Reg {
    fn from(value: u16) -> Self {
        Reg(value)
    }
}

/// Dispatch kind of an invoke instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InvokeKind {
    /// Static dispatch, no receiver.
    Static,
    /// Virtual dispatch; the first argument is the receiver.
    Virtual,
    /// Direct (non-virtual instance) dispatch; the first argument is the
    /// receiver. Used for constructors and private methods.
    Direct,
}

/// Unary arithmetic and logic operators over `int` registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation.
    NegInt,
    /// Bitwise complement.
    NotInt,
}

/// Binary arithmetic and logic operators over `int` registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BinaryOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division. Throws on a zero divisor.
    Div,
    /// Remainder. Throws on a zero divisor.
    Rem,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise exclusive or.
    Xor,
    /// Shift left.
    Shl,
    /// Arithmetic shift right.
    Shr,
    /// Logical shift right.
    Ushr,
}

/// Comparison operators of conditional branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CmpOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Signed less than.
    Lt,
    /// Signed greater or equal.
    Ge,
    /// Signed greater than.
    Gt,
    /// Signed less or equal.
    Le,
}

/// Discriminant of an [`Insn`], displayed as the dex-style mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum Opcode {
    /// `const`
    #[strum(serialize = "const")]
    ConstInt,
    /// `const-string`
    #[strum(serialize = "const-string")]
    ConstString,
    /// `const-class`
    #[strum(serialize = "const-class")]
    ConstClass,
    /// `move`
    #[strum(serialize = "move")]
    Move,
    /// `move-result`
    #[strum(serialize = "move-result")]
    MoveResult,
    /// `check-cast`
    #[strum(serialize = "check-cast")]
    CheckCast,
    /// `instance-of`
    #[strum(serialize = "instance-of")]
    InstanceOf,
    /// `new-instance`
    #[strum(serialize = "new-instance")]
    NewInstance,
    /// `invoke-*`
    #[strum(serialize = "invoke")]
    Invoke,
    /// `iget`
    #[strum(serialize = "iget")]
    InstanceGet,
    /// `iput`
    #[strum(serialize = "iput")]
    InstancePut,
    /// `sget`
    #[strum(serialize = "sget")]
    StaticGet,
    /// `sput`
    #[strum(serialize = "sput")]
    StaticPut,
    /// `neg-int` / `not-int`
    #[strum(serialize = "unop")]
    UnaryOp,
    /// `add-int`, `sub-int`, ...
    #[strum(serialize = "binop")]
    BinaryOp,
    /// `add-int/lit`, `mul-int/lit`, ...
    #[strum(serialize = "binop/lit")]
    BinaryOpLit,
}

/// One straight-line instruction.
///
/// All symbol operands are `Copy` interning ids, so whole instructions can
/// be cloned, compared and hashed cheaply. The derived `Ord` provides the
/// stable tie-break ordering used when ranking outlining candidates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Insn {
    /// Loads an integer constant.
    ConstInt {
        /// Destination register.
        dest: Reg,
        /// The constant value.
        value: i32,
    },
    /// Loads an interned string literal.
    ConstString {
        /// Destination register.
        dest: Reg,
        /// The interned literal.
        value: StringId,
    },
    /// Loads a class literal.
    ConstClass {
        /// Destination register.
        dest: Reg,
        /// The referenced type.
        class: TypeId,
    },
    /// Copies one register to another.
    Move {
        /// Destination register.
        dest: Reg,
        /// Source register.
        src: Reg,
    },
    /// Binds the result of the immediately preceding invoke.
    ///
    /// Must directly follow an [`Insn::Invoke`] in the same block; the
    /// graph validator enforces the pairing.
    MoveResult {
        /// Destination register.
        dest: Reg,
    },
    /// Asserts that a register holds a reference assignable to `class`.
    ///
    /// Refines the register's type on success, throws on failure. The
    /// register is read, not redefined.
    CheckCast {
        /// The checked register.
        reg: Reg,
        /// The asserted type.
        class: TypeId,
    },
    /// Tests whether a register holds a reference assignable to `class`.
    InstanceOf {
        /// Destination register, receives the boolean result.
        dest: Reg,
        /// The tested register.
        src: Reg,
        /// The tested-against type.
        class: TypeId,
    },
    /// Allocates a new, uninitialized instance.
    NewInstance {
        /// Destination register.
        dest: Reg,
        /// The instantiated type.
        class: TypeId,
    },
    /// Calls a method. For [`InvokeKind::Virtual`] and
    /// [`InvokeKind::Direct`], `args[0]` is the receiver.
    Invoke {
        /// Dispatch kind.
        kind: InvokeKind,
        /// The invoked method.
        method: MethodRefId,
        /// Argument registers, receiver first for instance dispatch.
        args: Vec<Reg>,
    },
    /// Reads an instance field.
    InstanceGet {
        /// Destination register.
        dest: Reg,
        /// Register holding the object reference.
        object: Reg,
        /// The accessed field.
        field: FieldRefId,
    },
    /// Writes an instance field.
    InstancePut {
        /// Register holding the stored value.
        src: Reg,
        /// Register holding the object reference.
        object: Reg,
        /// The accessed field.
        field: FieldRefId,
    },
    /// Reads a static field.
    StaticGet {
        /// Destination register.
        dest: Reg,
        /// The accessed field.
        field: FieldRefId,
    },
    /// Writes a static field.
    StaticPut {
        /// Register holding the stored value.
        src: Reg,
        /// The accessed field.
        field: FieldRefId,
    },
    /// Unary `int` operation.
    UnaryOp {
        /// The operator.
        op: UnaryOp,
        /// Destination register.
        dest: Reg,
        /// Source register.
        src: Reg,
    },
    /// Binary `int` operation.
    BinaryOp {
        /// The operator.
        op: BinaryOp,
        /// Destination register.
        dest: Reg,
        /// Left operand register.
        lhs: Reg,
        /// Right operand register.
        rhs: Reg,
    },
    /// Binary `int` operation with a literal right operand.
    BinaryOpLit {
        /// The operator.
        op: BinaryOp,
        /// Destination register.
        dest: Reg,
        /// Left operand register.
        src: Reg,
        /// Literal right operand.
        literal: i32,
    },
}

impl Insn {
    /// Returns the discriminant of this instruction.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        match self {
            Insn::ConstInt { .. } => Opcode::ConstInt,
            Insn::ConstString { .. } => Opcode::ConstString,
            Insn::ConstClass { .. } => Opcode::ConstClass,
            Insn::Move { .. } => Opcode::Move,
            Insn::MoveResult { .. } => Opcode::MoveResult,
            Insn::CheckCast { .. } => Opcode::CheckCast,
            Insn::InstanceOf { .. } => Opcode::InstanceOf,
            Insn::NewInstance { .. } => Opcode::NewInstance,
            Insn::Invoke { .. } => Opcode::Invoke,
            Insn::InstanceGet { .. } => Opcode::InstanceGet,
            Insn::InstancePut { .. } => Opcode::InstancePut,
            Insn::StaticGet { .. } => Opcode::StaticGet,
            Insn::StaticPut { .. } => Opcode::StaticPut,
            Insn::UnaryOp { .. } => Opcode::UnaryOp,
            Insn::BinaryOp { .. } => Opcode::BinaryOp,
            Insn::BinaryOpLit { .. } => Opcode::BinaryOpLit,
        }
    }

    /// Returns the registers read by this instruction, in operand order.
    ///
    /// [`Insn::CheckCast`] reads (and retypes) its register but defines
    /// nothing; the checked register appears here.
    #[must_use]
    pub fn uses(&self) -> Vec<Reg> {
        match self {
            Insn::ConstInt { .. }
            | Insn::ConstString { .. }
            | Insn::ConstClass { .. }
            | Insn::MoveResult { .. }
            | Insn::NewInstance { .. }
            | Insn::StaticGet { .. } => Vec::new(),
            Insn::Move { src, .. }
            | Insn::InstanceOf { src, .. }
            | Insn::StaticPut { src, .. }
            | Insn::UnaryOp { src, .. }
            | Insn::BinaryOpLit { src, .. } => vec![*src],
            Insn::CheckCast { reg, .. } => vec![*reg],
            Insn::Invoke { args, .. } => args.clone(),
            Insn::InstanceGet { object, .. } => vec![*object],
            Insn::InstancePut { src, object, .. } => vec![*src, *object],
            Insn::BinaryOp { lhs, rhs, .. } => vec![*lhs, *rhs],
        }
    }

    /// Returns the register defined by this instruction, if any.
    #[must_use]
    pub fn def(&self) -> Option<Reg> {
        match self {
            Insn::ConstInt { dest, .. }
            | Insn::ConstString { dest, .. }
            | Insn::ConstClass { dest, .. }
            | Insn::Move { dest, .. }
            | Insn::MoveResult { dest }
            | Insn::InstanceOf { dest, .. }
            | Insn::NewInstance { dest, .. }
            | Insn::InstanceGet { dest, .. }
            | Insn::StaticGet { dest, .. }
            | Insn::UnaryOp { dest, .. }
            | Insn::BinaryOp { dest, .. }
            | Insn::BinaryOpLit { dest, .. } => Some(*dest),
            Insn::CheckCast { .. }
            | Insn::Invoke { .. }
            | Insn::InstancePut { .. }
            | Insn::StaticPut { .. } => None,
        }
    }

    /// Rewrites every register operand through `f`, uses and defs alike.
    pub fn map_registers<F>(&mut self, mut f: F)
    where
        F: FnMut(Reg) -> Reg,
    {
        match self {
            Insn::ConstInt { dest, .. }
            | Insn::ConstString { dest, .. }
            | Insn::ConstClass { dest, .. }
            | Insn::MoveResult { dest }
            | Insn::NewInstance { dest, .. }
            | Insn::StaticGet { dest, .. } => {
                *dest = f(*dest);
            }
            Insn::Move { dest, src } => {
                *src = f(*src);
                *dest = f(*dest);
            }
            Insn::CheckCast { reg, .. } => {
                *reg = f(*reg);
            }
            Insn::InstanceOf { dest, src, .. } | Insn::UnaryOp { dest, src, .. } => {
                *src = f(*src);
                *dest = f(*dest);
            }
            Insn::Invoke { args, .. } => {
                for arg in args {
                    *arg = f(*arg);
                }
            }
            Insn::InstanceGet { dest, object, .. } => {
                *object = f(*object);
                *dest = f(*dest);
            }
            Insn::InstancePut { src, object, .. } => {
                *src = f(*src);
                *object = f(*object);
            }
            Insn::StaticPut { src, .. } => {
                *src = f(*src);
            }
            Insn::BinaryOp { dest, lhs, rhs, .. } => {
                *lhs = f(*lhs);
                *rhs = f(*rhs);
                *dest = f(*dest);
            }
            Insn::BinaryOpLit { dest, src, .. } => {
                *src = f(*src);
                *dest = f(*dest);
            }
        }
    }

    /// Estimated encoded size in code units, after the dex formats.
    #[must_use]
    pub fn code_units(&self) -> u32 {
        match self {
            Insn::Move { .. } | Insn::MoveResult { .. } | Insn::UnaryOp { .. } => 1,
            Insn::ConstInt { .. }
            | Insn::ConstString { .. }
            | Insn::ConstClass { .. }
            | Insn::CheckCast { .. }
            | Insn::InstanceOf { .. }
            | Insn::NewInstance { .. }
            | Insn::InstanceGet { .. }
            | Insn::InstancePut { .. }
            | Insn::StaticGet { .. }
            | Insn::StaticPut { .. }
            | Insn::BinaryOp { .. }
            | Insn::BinaryOpLit { .. } => 2,
            Insn::Invoke { .. } => 3,
        }
    }

    /// Returns `true` if executing this instruction may raise an exception.
    ///
    /// Drives the big-block suffix rule: unprotected code may only join a
    /// protected region when outlining it cannot introduce a new handler
    /// for it, which is the case exactly when it cannot throw.
    #[must_use]
    pub fn can_throw(&self) -> bool {
        match self {
            Insn::Invoke { .. }
            | Insn::CheckCast { .. }
            | Insn::NewInstance { .. }
            | Insn::InstanceGet { .. }
            | Insn::InstancePut { .. }
            | Insn::StaticGet { .. }
            | Insn::StaticPut { .. } => true,
            Insn::BinaryOp { op, .. } | Insn::BinaryOpLit { op, .. } => {
                matches!(op, BinaryOp::Div | BinaryOp::Rem)
            }
            Insn::ConstInt { .. }
            | Insn::ConstString { .. }
            | Insn::ConstClass { .. }
            | Insn::Move { .. }
            | Insn::MoveResult { .. }
            | Insn::InstanceOf { .. }
            | Insn::UnaryOp { .. } => false,
        }
    }

    /// Returns `true` for invoke instructions.
    #[must_use]
    pub fn is_invoke(&self) -> bool {
        matches!(self, Insn::Invoke { .. })
    }

    /// Returns `true` for `move-result`.
    #[must_use]
    pub fn is_move_result(&self) -> bool {
        matches!(self, Insn::MoveResult { .. })
    }
}

impl std::fmt::Display for Insn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Insn::ConstInt { dest, value } => write!(f, "const {dest}, #{value}"),
            Insn::ConstString { dest, value } => {
                write!(f, "const-string {dest}, string@{}", value.index())
            }
            Insn::ConstClass { dest, class } => write!(f, "const-class {dest}, {class}"),
            Insn::Move { dest, src } => write!(f, "move {dest}, {src}"),
            Insn::MoveResult { dest } => write!(f, "move-result {dest}"),
            Insn::CheckCast { reg, class } => write!(f, "check-cast {reg}, {class}"),
            Insn::InstanceOf { dest, src, class } => {
                write!(f, "instance-of {dest}, {src}, {class}")
            }
            Insn::NewInstance { dest, class } => write!(f, "new-instance {dest}, {class}"),
            Insn::Invoke { kind, method, args } => {
                let kind = match kind {
                    InvokeKind::Static => "static",
                    InvokeKind::Virtual => "virtual",
                    InvokeKind::Direct => "direct",
                };
                write!(f, "invoke-{kind} {{")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, "}}, method@{}", method.index())
            }
            Insn::InstanceGet {
                dest,
                object,
                field,
            } => write!(f, "iget {dest}, {object}, field@{}", field.index()),
            Insn::InstancePut { src, object, field } => {
                write!(f, "iput {src}, {object}, field@{}", field.index())
            }
            Insn::StaticGet { dest, field } => write!(f, "sget {dest}, field@{}", field.index()),
            Insn::StaticPut { src, field } => write!(f, "sput {src}, field@{}", field.index()),
            Insn::UnaryOp { op, dest, src } => {
                let op = match op {
                    UnaryOp::NegInt => "neg-int",
                    UnaryOp::NotInt => "not-int",
                };
                write!(f, "{op} {dest}, {src}")
            }
            Insn::BinaryOp { op, dest, lhs, rhs } => {
                write!(f, "{} {dest}, {lhs}, {rhs}", binop_mnemonic(*op))
            }
            Insn::BinaryOpLit {
                op,
                dest,
                src,
                literal,
            } => write!(f, "{}/lit {dest}, {src}, #{literal}", binop_mnemonic(*op)),
        }
    }
}

fn binop_mnemonic(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "add-int",
        BinaryOp::Sub => "sub-int",
        BinaryOp::Mul => "mul-int",
        BinaryOp::Div => "div-int",
        BinaryOp::Rem => "rem-int",
        BinaryOp::And => "and-int",
        BinaryOp::Or => "or-int",
        BinaryOp::Xor => "xor-int",
        BinaryOp::Shl => "shl-int",
        BinaryOp::Shr => "shr-int",
        BinaryOp::Ushr => "ushr-int",
    }
}

/// The control-transfer operation closing a basic block.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Terminator {
    /// Unconditional jump.
    Goto {
        /// The jump target.
        target: BlockId,
    },
    /// Conditional two-way branch. A `rhs` of `None` compares against zero.
    Branch {
        /// The comparison operator.
        op: CmpOp,
        /// Left operand register.
        lhs: Reg,
        /// Right operand register, `None` for the compare-to-zero forms.
        rhs: Option<Reg>,
        /// Target when the comparison holds.
        then_target: BlockId,
        /// Target when the comparison fails.
        else_target: BlockId,
    },
    /// Multi-way dispatch on an `int` register.
    Switch {
        /// The scrutinized register.
        src: Reg,
        /// `(case value, target)` pairs.
        targets: Vec<(i32, BlockId)>,
        /// Target when no case matches.
        default: BlockId,
    },
    /// Returns from the method, with an optional value.
    Return {
        /// The returned register, `None` for `void` methods.
        src: Option<Reg>,
    },
    /// Throws the exception held in a register.
    Throw {
        /// Register holding the thrown reference.
        src: Reg,
    },
}

impl Terminator {
    /// Returns the registers read by this terminator.
    #[must_use]
    pub fn uses(&self) -> Vec<Reg> {
        match self {
            Terminator::Goto { .. } | Terminator::Return { src: None } => Vec::new(),
            Terminator::Branch { lhs, rhs, .. } => match rhs {
                Some(rhs) => vec![*lhs, *rhs],
                None => vec![*lhs],
            },
            Terminator::Switch { src, .. }
            | Terminator::Return { src: Some(src) }
            | Terminator::Throw { src } => vec![*src],
        }
    }

    /// Returns the normal (non-exceptional) successor blocks.
    #[must_use]
    pub fn targets(&self) -> Vec<BlockId> {
        match self {
            Terminator::Goto { target } => vec![*target],
            Terminator::Branch {
                then_target,
                else_target,
                ..
            } => vec![*then_target, *else_target],
            Terminator::Switch {
                targets, default, ..
            } => {
                let mut out: Vec<BlockId> = targets.iter().map(|(_, t)| *t).collect();
                out.push(*default);
                out
            }
            Terminator::Return { .. } | Terminator::Throw { .. } => Vec::new(),
        }
    }

    /// Returns `true` for the unconditional jump.
    #[must_use]
    pub fn is_goto(&self) -> bool {
        matches!(self, Terminator::Goto { .. })
    }
}

impl std::fmt::Display for Terminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Terminator::Goto { target } => write!(f, "goto {target}"),
            Terminator::Branch {
                op,
                lhs,
                rhs,
                then_target,
                else_target,
            } => {
                let op = match op {
                    CmpOp::Eq => "eq",
                    CmpOp::Ne => "ne",
                    CmpOp::Lt => "lt",
                    CmpOp::Ge => "ge",
                    CmpOp::Gt => "gt",
                    CmpOp::Le => "le",
                };
                match rhs {
                    Some(rhs) => {
                        write!(f, "if-{op} {lhs}, {rhs}, {then_target} else {else_target}")
                    }
                    None => write!(f, "if-{op}z {lhs}, {then_target} else {else_target}"),
                }
            }
            Terminator::Switch { src, default, .. } => {
                write!(f, "switch {src}, default {default}")
            }
            Terminator::Return { src: Some(src) } => write!(f, "return {src}"),
            Terminator::Return { src: None } => write!(f, "return-void"),
            Terminator::Throw { src } => write!(f, "throw {src}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_invoke() -> Insn {
        Insn::Invoke {
            kind: InvokeKind::Static,
            method: MethodRefId(7),
            args: vec![Reg(3), Reg(1)],
        }
    }

    #[test]
    fn test_uses_and_def() {
        let insn = Insn::BinaryOp {
            op: BinaryOp::Add,
            dest: Reg(0),
            lhs: Reg(1),
            rhs: Reg(2),
        };
        assert_eq!(insn.uses(), vec![Reg(1), Reg(2)]);
        assert_eq!(insn.def(), Some(Reg(0)));

        let invoke = sample_invoke();
        assert_eq!(invoke.uses(), vec![Reg(3), Reg(1)]);
        assert_eq!(invoke.def(), None);

        let cast = Insn::CheckCast {
            reg: Reg(5),
            class: TypeId(2),
        };
        assert_eq!(cast.uses(), vec![Reg(5)]);
        assert_eq!(cast.def(), None);
    }

    #[test]
    fn test_map_registers_covers_all_operands() {
        let mut insn = Insn::InstancePut {
            src: Reg(1),
            object: Reg(2),
            field: FieldRefId(0),
        };
        insn.map_registers(|r| Reg(r.0 + 10));
        assert_eq!(
            insn,
            Insn::InstancePut {
                src: Reg(11),
                object: Reg(12),
                field: FieldRefId(0),
            }
        );

        let mut invoke = sample_invoke();
        invoke.map_registers(|r| Reg(r.0 * 2));
        assert_eq!(invoke.uses(), vec![Reg(6), Reg(2)]);
    }

    #[test]
    fn test_can_throw() {
        assert!(sample_invoke().can_throw());
        assert!(Insn::CheckCast {
            reg: Reg(0),
            class: TypeId(0)
        }
        .can_throw());
        assert!(Insn::BinaryOp {
            op: BinaryOp::Div,
            dest: Reg(0),
            lhs: Reg(1),
            rhs: Reg(2)
        }
        .can_throw());
        assert!(!Insn::BinaryOp {
            op: BinaryOp::Add,
            dest: Reg(0),
            lhs: Reg(1),
            rhs: Reg(2)
        }
        .can_throw());
        assert!(!Insn::Move {
            dest: Reg(0),
            src: Reg(1)
        }
        .can_throw());
    }

    #[test]
    fn test_terminator_uses_and_targets() {
        let branch = Terminator::Branch {
            op: CmpOp::Eq,
            lhs: Reg(0),
            rhs: None,
            then_target: BlockId(1),
            else_target: BlockId(2),
        };
        assert_eq!(branch.uses(), vec![Reg(0)]);
        assert_eq!(branch.targets(), vec![BlockId(1), BlockId(2)]);

        let ret = Terminator::Return { src: Some(Reg(4)) };
        assert_eq!(ret.uses(), vec![Reg(4)]);
        assert!(ret.targets().is_empty());

        assert!(Terminator::Goto {
            target: BlockId(0)
        }
        .is_goto());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Insn::ConstInt {
                dest: Reg(1),
                value: 42
            }
            .to_string(),
            "const v1, #42"
        );
        assert_eq!(sample_invoke().to_string(), "invoke-static {v3, v1}, method@7");
        assert_eq!(Opcode::ConstString.to_string(), "const-string");
        assert_eq!(Opcode::MoveResult.to_string(), "move-result");
    }
}
