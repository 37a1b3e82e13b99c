//! Register liveness analysis.
//!
//! A register is *live* at a program point if some path from that point
//! reaches a read of the register without passing a redefinition. This is
//! the classic backward data flow problem:
//!
//! - `USE[B]` = registers read in B before any definition
//! - `DEF[B]` = registers defined in B
//! - `OUT[B]` = ∪{IN[S] | S is a successor of B}
//! - `IN[B]` = USE[B] ∪ (OUT[B] - DEF[B])
//!
//! Successors include catch handlers, so a register consumed only by an
//! exception handler is live throughout the protected region. The outliner
//! relies on both faces of that fact: the live set after a run decides the
//! run's return value, and the live-in set of a handler decides whether a
//! run's definitions escape to it.
//!
//! The result stores per-block boundary sets; [`Liveness::live_after`]
//! refines them to an arbitrary instruction boundary by replaying the block
//! suffix backward.

use crate::ir::{BlockId, Method};
use crate::utils::BitSet;

/// Per-method register liveness at block boundaries.
///
/// # Example
///
/// ```rust
/// use dexoutline::analysis::Liveness;
/// use dexoutline::ir::build::ProgramBuilder;
/// use dexoutline::ir::Reg;
///
/// let mut builder = ProgramBuilder::new();
/// let mut class = builder.class("LMain;")?;
/// let id = class
///     .method("f")
///     .block(|b| {
///         b.const_int(Reg(0), 7);
///         b.goto_(1);
///     })
///     .block(|b| {
///         b.ret_val(Reg(0));
///     })
///     .build()?;
/// let program = builder.build()?;
///
/// let method = program.method(id);
/// let liveness = Liveness::compute(method);
/// assert!(liveness.block_live_out(method.entry()).contains(0));
/// # Ok::<(), dexoutline::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Liveness {
    live_in: Vec<BitSet>,
    live_out: Vec<BitSet>,
    registers: usize,
}

impl Liveness {
    /// Runs the backward fixed-point analysis over one method.
    #[must_use]
    pub fn compute(method: &Method) -> Self {
        let registers = method.registers() as usize;
        let block_count = method.block_count();

        // Per-block USE (read before defined) and DEF sets. Terminator
        // reads come after every instruction of the block.
        let mut use_sets = Vec::with_capacity(block_count);
        let mut def_sets = Vec::with_capacity(block_count);
        for block in method.blocks() {
            let mut uses = BitSet::new(registers);
            let mut defs = BitSet::new(registers);
            for insn in block.insns() {
                for reg in insn.uses() {
                    if !defs.contains(reg.index()) {
                        uses.insert(reg.index());
                    }
                }
                if let Some(def) = insn.def() {
                    defs.insert(def.index());
                }
            }
            for reg in block.terminator().uses() {
                if !defs.contains(reg.index()) {
                    uses.insert(reg.index());
                }
            }
            use_sets.push(uses);
            def_sets.push(defs);
        }

        let mut live_in = vec![BitSet::new(registers); block_count];
        let mut live_out = vec![BitSet::new(registers); block_count];

        // Worklist to fixed point, reverse arena order for fewer sweeps.
        let mut changed = true;
        while changed {
            changed = false;
            for index in (0..block_count).rev() {
                let block = method.block(BlockId::new(index));

                let mut out = BitSet::new(registers);
                for succ in block.successors() {
                    out.union_with(&live_in[succ.index()]);
                }

                // IN = USE ∪ (OUT - DEF)
                let mut in_set = out.clone();
                in_set.difference_with(&def_sets[index]);
                in_set.union_with(&use_sets[index]);

                if out != live_out[index] {
                    live_out[index] = out;
                    changed = true;
                }
                if in_set != live_in[index] {
                    live_in[index] = in_set;
                    changed = true;
                }
            }
        }

        Self {
            live_in,
            live_out,
            registers,
        }
    }

    /// Number of registers tracked.
    #[must_use]
    pub const fn registers(&self) -> usize {
        self.registers
    }

    /// The registers live on entry to a block.
    #[must_use]
    pub fn block_live_in(&self, block: BlockId) -> &BitSet {
        &self.live_in[block.index()]
    }

    /// The registers live on exit from a block.
    #[must_use]
    pub fn block_live_out(&self, block: BlockId) -> &BitSet {
        &self.live_out[block.index()]
    }

    /// The registers live at the boundary immediately after instruction
    /// `index` of `block`.
    ///
    /// Computed by replaying the block backward from its exit: the
    /// terminator's reads first, then every instruction after `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range for the block.
    #[must_use]
    pub fn live_after(&self, method: &Method, block: BlockId, index: usize) -> BitSet {
        let body = method.block(block);
        assert!(index < body.insns().len(), "instruction index out of range");

        let mut live = self.live_out[block.index()].clone();
        for reg in body.terminator().uses() {
            live.insert(reg.index());
        }
        for insn in body.insns()[index + 1..].iter().rev() {
            if let Some(def) = insn.def() {
                live.remove(def.index());
            }
            for reg in insn.uses() {
                live.insert(reg.index());
            }
        }
        live
    }
}
