//! Methods: access flags, prototypes and the block arena.
//!
//! A [`Method`] owns its control-flow graph as a `Vec<BasicBlock>` indexed
//! by [`BlockId`]; block 0 is the entry. Parameter registers are explicit,
//! so frames need no calling-convention knowledge.

use bitflags::bitflags;

use super::block::{BasicBlock, BlockId};
use super::class::ClassId;
use super::insn::Reg;
use super::refs::ProtoId;

bitflags! {
    /// Method access flags, after the dex `access_flags` encoding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodFlags: u32 {
        /// Visible everywhere.
        const PUBLIC = 0x0001;
        /// Visible only to the declaring class.
        const PRIVATE = 0x0002;
        /// Visible to the declaring class and subclasses.
        const PROTECTED = 0x0004;
        /// No receiver; dispatched statically.
        const STATIC = 0x0008;
        /// Not overridable.
        const FINAL = 0x0010;
        /// No implementation in this program.
        const ABSTRACT = 0x0400;
        /// Implemented outside the managed program.
        const NATIVE = 0x0100;
        /// Generated by a tool rather than present in source.
        const SYNTHETIC = 0x1000;
        /// An instance constructor.
        const CONSTRUCTOR = 0x10000;
    }
}

/// Index of a method in the program's method arena.
///
/// Methods from all classes share one arena so whole-program iteration and
/// parallel scans address them uniformly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodId(pub(crate) u32);

impl MethodId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for MethodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MethodId({})", self.0)
    }
}

impl std::fmt::Display for MethodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// A method definition with its control-flow graph.
#[derive(Debug, Clone)]
pub struct Method {
    name: String,
    class: ClassId,
    flags: MethodFlags,
    proto: ProtoId,
    registers: u16,
    params: Vec<Reg>,
    blocks: Vec<BasicBlock>,
}

impl Method {
    /// Creates a method from its parts. Graph invariants are checked by
    /// [`crate::ir::Program::validate`], not here.
    #[must_use]
    pub fn new(
        name: String,
        class: ClassId,
        flags: MethodFlags,
        proto: ProtoId,
        registers: u16,
        params: Vec<Reg>,
        blocks: Vec<BasicBlock>,
    ) -> Self {
        Self {
            name,
            class,
            flags,
            proto,
            registers,
            params,
            blocks,
        }
    }

    /// The method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declaring class.
    #[must_use]
    pub const fn class(&self) -> ClassId {
        self.class
    }

    /// The access flags.
    #[must_use]
    pub const fn flags(&self) -> MethodFlags {
        self.flags
    }

    /// Returns `true` for static methods.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    /// The method prototype id.
    #[must_use]
    pub const fn proto(&self) -> ProtoId {
        self.proto
    }

    /// The frame's register count.
    #[must_use]
    pub const fn registers(&self) -> u16 {
        self.registers
    }

    /// The registers holding the parameters on entry, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[Reg] {
        &self.params
    }

    /// The entry block id.
    #[must_use]
    pub const fn entry(&self) -> BlockId {
        BlockId(0)
    }

    /// Number of basic blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if the method has no body (abstract or native).
    #[must_use]
    pub fn is_bodyless(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns a block by id.
    ///
    /// # Panics
    ///
    /// Panics if the id is out of range.
    #[must_use]
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    /// Returns a block mutably.
    ///
    /// # Panics
    ///
    /// Panics if the id is out of range.
    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.index()]
    }

    /// All blocks in arena order.
    #[must_use]
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Iterator over all block ids in arena order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId::new)
    }

    /// Counts the incoming edges of every block, catch edges included.
    ///
    /// Index `i` of the result is the predecessor count of block `i`. The
    /// entry block may legitimately have zero.
    #[must_use]
    pub fn predecessor_counts(&self) -> Vec<u32> {
        let mut counts = vec![0u32; self.blocks.len()];
        for block in &self.blocks {
            for succ in block.successors() {
                counts[succ.index()] += 1;
            }
        }
        counts
    }

    /// Total instruction count across all blocks.
    #[must_use]
    pub fn insn_count(&self) -> usize {
        self.blocks.iter().map(|b| b.insns().len()).sum()
    }
}
