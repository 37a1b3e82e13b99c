//! Big-block extraction.
//!
//! A *big block* is a maximal single-entry run of basic blocks connected by
//! unconditional gotos, with no internal conditional branch and a
//! consistent exceptional-edge profile: either every block carries the
//! identical ordered catch-edge list, or a trailing suffix of non-throwing
//! blocks with no catch edges extends a protected prefix. The extractor
//! therefore lets a region *end* with unprotected code even when it
//! *starts* inside a try, which is exactly the shape the outliner may
//! collapse into a single call without changing which handler observes an
//! exception.
//!
//! A run terminates at a conditional branch, a switch, a return or throw, a
//! block whose catch-edge list is neither identical nor a valid unprotected
//! extension, a join point (successor with more than one predecessor), or a
//! catch-handler entry. Big blocks are a derived view over the graph:
//! recompute them after every structural edit, never cache them across a
//! rewrite.

use crate::ir::{BlockId, Insn, Method, Terminator};

/// An ordered run of basic-block ids forming one straight-line region.
///
/// Non-owning: holds only ids into the method's block arena, valid until
/// the next graph mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigBlock {
    blocks: Vec<BlockId>,
}

impl BigBlock {
    /// The covered blocks, in execution order.
    #[must_use]
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// The first covered block, the region's single entry.
    #[must_use]
    pub fn head(&self) -> BlockId {
        self.blocks[0]
    }

    /// Total instruction count of the concatenated stream.
    #[must_use]
    pub fn insn_count(&self, method: &Method) -> usize {
        self.blocks
            .iter()
            .map(|&id| method.block(id).insns().len())
            .sum()
    }

    /// Iterator over the concatenated instruction stream.
    pub fn insns<'a>(&'a self, method: &'a Method) -> impl Iterator<Item = &'a Insn> + 'a {
        self.blocks
            .iter()
            .flat_map(move |&id| method.block(id).insns().iter())
    }

    /// The `(block, index-in-block)` position of every stream offset.
    #[must_use]
    pub fn positions(&self, method: &Method) -> Vec<(BlockId, usize)> {
        let mut out = Vec::with_capacity(self.insn_count(method));
        for &id in &self.blocks {
            for index in 0..method.block(id).insns().len() {
                out.push((id, index));
            }
        }
        out
    }

    /// Splits the stream window `[start, start + len)` into per-block
    /// instruction ranges, in execution order.
    ///
    /// # Panics
    ///
    /// Panics if the window exceeds the stream.
    #[must_use]
    pub fn segments(
        &self,
        method: &Method,
        start: usize,
        len: usize,
    ) -> Vec<(BlockId, std::ops::Range<usize>)> {
        assert!(start + len <= self.insn_count(method), "window out of range");
        let mut out = Vec::new();
        let mut offset = 0;
        let end = start + len;
        for &id in &self.blocks {
            let block_len = method.block(id).insns().len();
            let block_start = offset;
            let block_end = offset + block_len;
            offset = block_end;
            if block_end <= start {
                continue;
            }
            if block_start >= end {
                break;
            }
            let lo = start.max(block_start) - block_start;
            let hi = end.min(block_end) - block_start;
            if lo < hi {
                out.push((id, lo..hi));
            }
        }
        out
    }
}

/// Extracts every big block of a method, in entry order.
///
/// The returned regions partition the blocks that can appear in one: every
/// block belongs to exactly one big block (possibly of length one).
#[must_use]
pub fn big_blocks(method: &Method) -> Vec<BigBlock> {
    let block_count = method.block_count();
    let preds = method.predecessor_counts();

    let mut is_handler = vec![false; block_count];
    for block in method.blocks() {
        for edge in block.catches() {
            is_handler[edge.handler.index()] = true;
        }
    }

    let mut claimed = vec![false; block_count];
    let mut out = Vec::new();

    for start in method.block_ids() {
        if claimed[start.index()] {
            continue;
        }
        claimed[start.index()] = true;

        let profile = method.block(start).catches().to_vec();
        let start_protected = !profile.is_empty();
        let mut in_suffix = false;

        let mut blocks = vec![start];
        let mut current = start;
        loop {
            let Terminator::Goto { target } = *method.block(current).terminator() else {
                break;
            };
            if claimed[target.index()] || preds[target.index()] != 1 || is_handler[target.index()]
            {
                break;
            }
            let next = method.block(target);
            if !in_suffix && next.catches() == profile.as_slice() {
                // same exception profile, plain extension
            } else if start_protected && next.catches().is_empty() && !next.can_throw() {
                // unprotected, non-throwing suffix after a protected prefix
                in_suffix = true;
            } else {
                break;
            }
            claimed[target.index()] = true;
            blocks.push(target);
            current = target;
        }

        out.push(BigBlock { blocks });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::build::ProgramBuilder;
    use crate::ir::{CmpOp, MethodId, Program, Reg};

    fn build(f: impl FnOnce(&mut ProgramBuilder) -> MethodId) -> (Program, MethodId) {
        let mut builder = ProgramBuilder::new();
        let id = f(&mut builder);
        (builder.build().unwrap(), id)
    }

    #[test]
    fn test_goto_chain_is_one_big_block() {
        let (program, id) = build(|builder| {
            let mut class = builder.class("LMain;").unwrap();
            class
                .method("chain")
                .block(|b| {
                    b.const_int(Reg(0), 1);
                    b.goto_(1);
                })
                .block(|b| {
                    b.const_int(Reg(1), 2);
                    b.goto_(2);
                })
                .block(|b| {
                    b.ret();
                })
                .build()
                .unwrap()
        });
        let method = program.method(id);
        let bbs = big_blocks(method);
        assert_eq!(bbs.len(), 1);
        assert_eq!(bbs[0].blocks().len(), 3);
        assert_eq!(bbs[0].insn_count(method), 2);
    }

    #[test]
    fn test_branch_splits_regions() {
        let (program, id) = build(|builder| {
            let mut class = builder.class("LMain;").unwrap();
            class
                .method("branchy")
                .block(|b| {
                    b.const_int(Reg(0), 1);
                    b.branch_z(CmpOp::Eq, Reg(0), 1, 2);
                })
                .block(|b| {
                    b.goto_(3);
                })
                .block(|b| {
                    b.goto_(3);
                })
                .block(|b| {
                    b.ret();
                })
                .build()
                .unwrap()
        });
        let method = program.method(id);
        let bbs = big_blocks(method);
        // Entry, both arms, and the join each stand alone: the arms end in
        // gotos but their target has two predecessors.
        assert_eq!(bbs.len(), 4);
        assert!(bbs.iter().all(|bb| bb.blocks().len() == 1));
    }

    #[test]
    fn test_identical_catch_profile_extends() {
        let (program, id) = build(|builder| {
            let mut class = builder.class("LMain;").unwrap();
            class
                .method("in_try")
                .block(|b| {
                    b.const_int(Reg(0), 1);
                    b.catch_(None, 2);
                    b.goto_(1);
                })
                .block(|b| {
                    b.const_int(Reg(1), 2);
                    b.catch_(None, 2);
                    b.goto_(3);
                })
                .block(|b| {
                    // handler
                    b.ret();
                })
                .block(|b| {
                    b.ret();
                })
                .build()
                .unwrap()
        });
        let method = program.method(id);
        let bbs = big_blocks(method);
        let head = bbs.iter().find(|bb| bb.head().index() == 0).unwrap();
        assert_eq!(
            head.blocks(),
            &[BlockId::new(0), BlockId::new(1), BlockId::new(3)],
            "protected blocks with equal profiles chain, and the quiet \
             unprotected tail joins as a suffix"
        );
    }

    #[test]
    fn test_differing_catch_targets_split() {
        let (program, id) = build(|builder| {
            let mut class = builder.class("LMain;").unwrap();
            class
                .method("two_tries")
                .block(|b| {
                    b.const_int(Reg(0), 1);
                    b.catch_(None, 2);
                    b.goto_(1);
                })
                .block(|b| {
                    b.const_int(Reg(1), 2);
                    b.catch_(None, 3);
                    b.goto_(4);
                })
                .block(|b| {
                    b.ret();
                })
                .block(|b| {
                    b.ret();
                })
                .block(|b| {
                    b.ret();
                })
                .build()
                .unwrap()
        });
        let method = program.method(id);
        let bbs = big_blocks(method);
        let head = bbs.iter().find(|bb| bb.head().index() == 0).unwrap();
        assert_eq!(head.blocks().len(), 1);
    }

    #[test]
    fn test_throwing_unprotected_suffix_rejected() {
        let (program, id) = build(|builder| {
            let object = builder.object_type();
            let mut class = builder.class("LMain;").unwrap();
            class
                .method("leaky")
                .block(|b| {
                    b.const_int(Reg(0), 1);
                    b.catch_(None, 2);
                    b.goto_(1);
                })
                .block(|b| {
                    // would throw outside the try
                    b.new_instance(Reg(1), object);
                    b.ret();
                })
                .block(|b| {
                    b.ret();
                })
                .build()
                .unwrap()
        });
        let method = program.method(id);
        let bbs = big_blocks(method);
        let head = bbs.iter().find(|bb| bb.head().index() == 0).unwrap();
        assert_eq!(head.blocks().len(), 1);
    }

    #[test]
    fn test_handler_entry_starts_its_own_region() {
        let (program, id) = build(|builder| {
            let mut class = builder.class("LMain;").unwrap();
            class
                .method("guarded")
                .block(|b| {
                    b.const_int(Reg(0), 1);
                    b.catch_(None, 1);
                    b.goto_(1);
                })
                .block(|b| {
                    b.ret();
                })
                .build()
                .unwrap()
        });
        let method = program.method(id);
        let bbs = big_blocks(method);
        assert_eq!(bbs.len(), 2);
    }

    #[test]
    fn test_segments_split_window_across_blocks() {
        let (program, id) = build(|builder| {
            let mut class = builder.class("LMain;").unwrap();
            class
                .method("chain")
                .block(|b| {
                    b.const_int(Reg(0), 1);
                    b.const_int(Reg(1), 2);
                    b.goto_(1);
                })
                .block(|b| {
                    b.const_int(Reg(2), 3);
                    b.const_int(Reg(3), 4);
                    b.ret();
                })
                .build()
                .unwrap()
        });
        let method = program.method(id);
        let bbs = big_blocks(method);
        assert_eq!(bbs.len(), 1);

        let segments = bbs[0].segments(method, 1, 2);
        assert_eq!(
            segments,
            vec![(BlockId::new(0), 1..2), (BlockId::new(1), 0..1)]
        );
        let positions = bbs[0].positions(method);
        assert_eq!(positions[2], (BlockId::new(1), 0));
    }
}
