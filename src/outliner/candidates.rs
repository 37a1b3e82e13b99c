//! Program-wide candidate discovery and ranking.
//!
//! Scanning is embarrassingly parallel: each method's big blocks are
//! enumerated independently and reduced to a [`MethodScan`] keyed by
//! [`CandidateKey`]. Scans land in a [`ScanCache`] (one entry per method,
//! disjoint keys, so parallel inserts need no coordination beyond the
//! map); the global candidate table is then folded from the cache by a
//! single thread in method-id order, which keeps the output deterministic
//! regardless of scan scheduling.
//!
//! A window survives the scan only if it already satisfies the local
//! eligibility rules: it does not split an invoke/move-result pair, at
//! most one of its definitions is live after it (folded into the key), and
//! none of its definitions escapes to a catch handler. Occurrences of one
//! key within one big block are taken greedily left to right without
//! overlap, so a back-to-back repetition counts each copy exactly once.

use std::collections::HashMap;

use dashmap::DashMap;
use log::trace;
use rayon::prelude::*;

use crate::analysis::{big_blocks, Liveness};
use crate::ir::{BlockId, Insn, MethodId, Program};

use super::canon::{canonicalize_with_map, CanonicalSequence};
use super::config::OutlinerConfig;
use super::dataflow::{escapes_to_catch, live_out_of, window_defs, LiveOut};

/// Estimated code-unit costs of the rewrite, after the dex formats.
pub(crate) mod cost {
    /// One `invoke-static` at each call site.
    pub(crate) const INVOKE: u32 = 3;
    /// One `move-result` at call sites of returning candidates.
    pub(crate) const MOVE_RESULT: u32 = 1;
    /// Fixed overhead of one synthesized method: frame, metadata, return.
    pub(crate) const METHOD_BODY: u32 = 8;
}

/// The grouping key of interchangeable runs.
///
/// The live-in contract is a pure function of the canonical sequence; the
/// live-out contract is contextual, so the canonical index of the returned
/// register (if any) is folded into the key. Runs that agree on the
/// sequence but disagree on what survives them form distinct candidates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct CandidateKey {
    /// The register-renamed instruction run.
    pub seq: CanonicalSequence,
    /// Canonical index of the live-out register, `None` for void runs.
    pub live_out: Option<u16>,
}

/// One concrete window within a big block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct RunLoc {
    /// Entry block of the containing big block.
    pub head: BlockId,
    /// Offset into the big block's concatenated stream.
    pub start: usize,
    /// Window length in instructions.
    pub len: usize,
}

/// One occurrence of a candidate: a window in a specific method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Occurrence {
    /// The containing method.
    pub method: MethodId,
    /// The window.
    pub loc: RunLoc,
}

/// A canonical sequence with all its occurrences and benefit scores.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    /// The grouping key.
    pub key: CandidateKey,
    /// Every occurrence, in (method id, stream position) order.
    pub occurrences: Vec<Occurrence>,
    /// Unweighted estimated code units saved; the eligibility cut.
    pub score: i64,
    /// Profile-weighted score; the ordering criterion.
    pub weighted_score: f64,
}

/// Eligible windows of one method, keyed for program-wide grouping.
#[derive(Debug, Default)]
pub(crate) struct MethodScan {
    /// Occurrence locations per key, in stream order.
    pub runs: HashMap<CandidateKey, Vec<RunLoc>>,
}

/// Per-method scan results, invalidated on rewrite.
///
/// Keys are disjoint per method, so parallel producers insert without
/// contention; consumers read sequentially in method-id order.
pub(crate) type ScanCache = DashMap<MethodId, MethodScan>;

/// Scans one method for eligible windows.
///
/// Pure function of the method's current graph; call again after any
/// rewrite of the method.
pub(crate) fn scan_method(
    program: &Program,
    id: MethodId,
    config: &OutlinerConfig,
) -> MethodScan {
    let method = program.method(id);
    let mut scan = MethodScan::default();
    if method.is_bodyless() {
        return scan;
    }

    let liveness = Liveness::compute(method);
    for big_block in big_blocks(method) {
        let stream: Vec<Insn> = big_block.insns(method).cloned().collect();
        let positions = big_block.positions(method);
        let mut local: HashMap<CandidateKey, Vec<RunLoc>> = HashMap::new();

        for start in 0..stream.len() {
            // Never begin a window on the bound half of an invoke pair.
            if stream[start].is_move_result() {
                continue;
            }
            let max_len = config.max_insn_size.min(stream.len() - start);
            for len in config.min_insn_size..=max_len {
                let end = start + len;
                // Never end a window between an invoke and its move-result.
                if stream[end - 1].is_invoke()
                    && stream.get(end).is_some_and(Insn::is_move_result)
                {
                    continue;
                }

                let window = &stream[start..end];
                let defs = window_defs(window);

                let live_out = match live_out_of(method, &liveness, positions[end - 1], &defs) {
                    LiveOut::Many => continue,
                    LiveOut::One(reg) => Some(reg),
                    LiveOut::None => None,
                };

                let mut covered: Vec<BlockId> = Vec::new();
                for &(block, _) in &positions[start..end] {
                    if covered.last() != Some(&block) {
                        covered.push(block);
                    }
                }
                if escapes_to_catch(method, &liveness, &covered, &defs) {
                    continue;
                }

                let (seq, originals) = canonicalize_with_map(window);
                let live_out = live_out.map(|reg| {
                    let index = originals
                        .iter()
                        .position(|&original| original == reg)
                        .unwrap_or_else(|| unreachable!("live-out is always a window def"));
                    u16::try_from(index).unwrap_or(u16::MAX)
                });

                local
                    .entry(CandidateKey { seq, live_out })
                    .or_default()
                    .push(RunLoc {
                        head: big_block.head(),
                        start,
                        len,
                    });
            }
        }

        // Greedy left-to-right selection per key: a repetition directly
        // following an occurrence counts once, overlaps are dropped.
        for (key, mut locs) in local {
            locs.sort_by_key(|loc| loc.start);
            let mut kept: Vec<RunLoc> = Vec::new();
            for loc in locs {
                let clear = kept
                    .last()
                    .is_none_or(|prev| loc.start >= prev.start + prev.len);
                if clear {
                    kept.push(loc);
                }
            }
            scan.runs.entry(key).or_default().extend(kept);
        }
    }

    trace!(
        "scanned {}: {} distinct keys",
        program.qualified_name(id),
        scan.runs.len()
    );
    scan
}

/// Scans every method in parallel, populating the cache.
pub(crate) fn scan_program(program: &Program, config: &OutlinerConfig) -> ScanCache {
    let cache = ScanCache::new();
    program
        .method_ids()
        .collect::<Vec<_>>()
        .par_iter()
        .for_each(|&id| {
            cache.insert(id, scan_method(program, id, config));
        });
    cache
}

/// The unweighted benefit score of a key occurring `count` times.
///
/// Estimated code units saved: each occurrence trades the run for one call
/// (plus a result bind for returning candidates), and the program gains
/// one method body holding the run once.
pub(crate) fn score(key: &CandidateKey, count: usize) -> i64 {
    let units = i64::from(key.seq.code_units());
    let call = i64::from(cost::INVOKE)
        + if key.live_out.is_some() {
            i64::from(cost::MOVE_RESULT)
        } else {
            0
        };
    let count = count as i64;
    (units - call) * count - (units + i64::from(cost::METHOD_BODY))
}

/// Folds per-method scans into the ranked global candidate list.
///
/// Deterministic: methods are folded in id order, occurrences arrive in
/// stream order, and the final ordering is (weighted score descending,
/// first occurrence ascending, key ascending).
pub(crate) fn build_candidates(
    program: &Program,
    config: &OutlinerConfig,
    cache: &ScanCache,
) -> Vec<Candidate> {
    let mut table: HashMap<CandidateKey, Vec<Occurrence>> = HashMap::new();
    for method in program.method_ids() {
        let Some(scan) = cache.get(&method) else {
            continue;
        };
        for (key, locs) in &scan.runs {
            let occurrences = table.entry(key.clone()).or_default();
            occurrences.extend(locs.iter().map(|&loc| Occurrence { method, loc }));
        }
    }

    let mut candidates: Vec<Candidate> = table
        .into_iter()
        .filter_map(|(key, mut occurrences)| {
            occurrences.sort();
            if occurrences.len() < config.min_occurrences {
                return None;
            }
            let score = score(&key, occurrences.len());
            if score <= 0 {
                return None;
            }
            let weighted_score = weighted(program, config, &key, &occurrences);
            Some(Candidate {
                key,
                occurrences,
                score,
                weighted_score,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.weighted_score
            .total_cmp(&a.weighted_score)
            .then_with(|| a.occurrences[0].cmp(&b.occurrences[0]))
            .then_with(|| a.key.cmp(&b.key))
    });
    candidates
}

/// The profile-weighted score: per-occurrence savings scaled by the
/// occurrence method's weight. Only the ordering uses this; eligibility
/// stays unweighted so an absent profile cannot change the outcome set.
fn weighted(
    program: &Program,
    config: &OutlinerConfig,
    key: &CandidateKey,
    occurrences: &[Occurrence],
) -> f64 {
    let units = f64::from(key.seq.code_units());
    let call = f64::from(cost::INVOKE)
        + if key.live_out.is_some() {
            f64::from(cost::MOVE_RESULT)
        } else {
            0.0
        };
    let saved_per_occurrence = units - call;
    let gain: f64 = occurrences
        .iter()
        .map(|occurrence| {
            let name = program.qualified_name(occurrence.method);
            config.weight_of(&name) * saved_per_occurrence
        })
        .sum();
    gain - (units + f64::from(cost::METHOD_BODY))
}
