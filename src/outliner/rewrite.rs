//! Call-site rewriting.
//!
//! Replacing an occurrence is a pure instruction-list edit: the covered
//! window is removed segment by segment (a suffix of the first block, whole
//! middle blocks, a prefix of the last) and an `invoke-static` of the
//! outlined method takes its place at the window start, followed by a
//! `move-result` when the candidate returns a value. Block boundaries,
//! terminators and catch edges are left exactly as they were, so the
//! surrounding control flow and exception ranges stay valid without any
//! graph repair.

use crate::analysis::BigBlock;
use crate::ir::{Insn, Method, MethodRefId, Reg};

use super::candidates::{CandidateKey, RunLoc};
use super::canon::canonicalize_with_map;
use super::candidates::cost;

/// Rewrites one occurrence into a call of `callee`.
///
/// `region` must be the current big block containing `loc`; both come from
/// a scan of the method's present graph. Returns the estimated code units
/// saved at this call site.
pub(crate) fn rewrite_occurrence(
    method: &mut Method,
    region: &BigBlock,
    loc: RunLoc,
    key: &CandidateKey,
    callee: MethodRefId,
) -> u32 {
    let window: Vec<Insn> = region
        .insns(method)
        .skip(loc.start)
        .take(loc.len)
        .cloned()
        .collect();
    let (_, originals) = canonicalize_with_map(&window);

    let args: Vec<Reg> = key
        .seq
        .live_ins()
        .into_iter()
        .map(|index| originals[index as usize])
        .collect();
    let result = key.live_out.map(|index| originals[index as usize]);

    let mut call = vec![Insn::Invoke {
        kind: crate::ir::InvokeKind::Static,
        method: callee,
        args,
    }];
    if let Some(dest) = result {
        call.push(Insn::MoveResult { dest });
    }

    let segments = region.segments(method, loc.start, loc.len);
    let mut replacement = Some(call);
    for (block, range) in segments {
        let insns = method.block_mut(block).insns_mut();
        match replacement.take() {
            // The call stands where the window began.
            Some(call) => {
                insns.splice(range, call);
            }
            None => {
                insns.drain(range);
            }
        }
    }

    let window_units: u32 = window.iter().map(Insn::code_units).sum();
    let call_units = cost::INVOKE
        + if key.live_out.is_some() {
            cost::MOVE_RESULT
        } else {
            0
        };
    window_units.saturating_sub(call_units)
}
