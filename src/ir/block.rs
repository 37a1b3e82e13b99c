//! Basic blocks and their exceptional edges.
//!
//! A [`BasicBlock`] holds straight-line instructions, exactly one
//! [`Terminator`] and an ordered list of [`CatchEdge`]s. Catch edges are a
//! per-block property: every potentially-throwing instruction of the block
//! dispatches to the same ordered handler list, which is what lets the
//! big-block extractor compare exception profiles block-wise.

use super::insn::{Insn, Terminator};
use super::types::TypeId;

/// Index of a basic block within its method's block arena.
///
/// Block 0 is always the method entry. Ids are stable across instruction
/// edits; blocks are never removed, only emptied.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) u32);

impl BlockId {
    /// Creates a block id from an arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        BlockId(index as u32)
    }

    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b{}", self.0)
    }
}

impl From<usize> for BlockId {
    fn from(index: usize) -> Self {
        BlockId::new(index)
    }
}

/// One outgoing exceptional edge of a basic block.
///
/// Edge order is significant: handlers are tried in list order, mirroring
/// the source-level `catch` clause order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CatchEdge {
    /// The caught exception type; `None` is the catch-all clause.
    pub exception: Option<TypeId>,
    /// The handler block entered when the exception matches.
    pub handler: BlockId,
}

/// A basic block: instructions, one terminator, ordered catch edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    insns: Vec<Insn>,
    terminator: Terminator,
    catches: Vec<CatchEdge>,
}

impl BasicBlock {
    /// Creates a block from its parts.
    #[must_use]
    pub fn new(insns: Vec<Insn>, terminator: Terminator, catches: Vec<CatchEdge>) -> Self {
        Self {
            insns,
            terminator,
            catches,
        }
    }

    /// The straight-line instructions.
    #[must_use]
    pub fn insns(&self) -> &[Insn] {
        &self.insns
    }

    /// Mutable access to the instruction list, used by the rewriter.
    pub fn insns_mut(&mut self) -> &mut Vec<Insn> {
        &mut self.insns
    }

    /// The block's terminator.
    #[must_use]
    pub fn terminator(&self) -> &Terminator {
        &self.terminator
    }

    /// Replaces the terminator.
    pub fn set_terminator(&mut self, terminator: Terminator) {
        self.terminator = terminator;
    }

    /// The ordered outgoing exceptional edges.
    #[must_use]
    pub fn catches(&self) -> &[CatchEdge] {
        &self.catches
    }

    /// Returns `true` if the block has at least one catch edge.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        !self.catches.is_empty()
    }

    /// Returns `true` if any instruction of the block may throw.
    #[must_use]
    pub fn can_throw(&self) -> bool {
        self.insns.iter().any(Insn::can_throw)
    }

    /// All successor blocks: terminator targets first, then catch handlers.
    #[must_use]
    pub fn successors(&self) -> Vec<BlockId> {
        let mut out = self.terminator.targets();
        out.extend(self.catches.iter().map(|edge| edge.handler));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CmpOp, Reg};

    #[test]
    fn test_successors_include_catch_handlers() {
        let block = BasicBlock::new(
            Vec::new(),
            Terminator::Branch {
                op: CmpOp::Eq,
                lhs: Reg(0),
                rhs: None,
                then_target: BlockId(1),
                else_target: BlockId(2),
            },
            vec![CatchEdge {
                exception: None,
                handler: BlockId(3),
            }],
        );
        assert_eq!(
            block.successors(),
            vec![BlockId(1), BlockId(2), BlockId(3)]
        );
        assert!(block.is_protected());
    }

    #[test]
    fn test_can_throw_scans_instructions() {
        let quiet = BasicBlock::new(
            vec![Insn::Move {
                dest: Reg(0),
                src: Reg(1),
            }],
            Terminator::Return { src: None },
            Vec::new(),
        );
        assert!(!quiet.can_throw());

        let loud = BasicBlock::new(
            vec![Insn::NewInstance {
                dest: Reg(0),
                class: crate::ir::TypeId(0),
            }],
            Terminator::Return { src: None },
            Vec::new(),
        );
        assert!(loud.can_throw());
    }
}
