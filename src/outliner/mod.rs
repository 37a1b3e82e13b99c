//! Whole-program instruction sequence outlining.
//!
//! The outliner finds identical straight-line instruction runs repeated
//! across (or within) method bodies and replaces each occurrence with a
//! call to one synthesized static method, trading execution of a few extra
//! call instructions for the code size of the duplicated runs.
//!
//! One invocation works in three phases:
//!
//! 1. **Scan** — every method is decomposed into big blocks
//!    ([`crate::analysis::big_blocks`]) and their instruction streams are
//!    enumerated as fixed-range windows, canonicalized
//!    ([`canon::canonicalize`]) and grouped program-wide. Scanning runs in
//!    parallel per method; the candidate table is folded sequentially in
//!    method order so results never depend on scheduling.
//! 2. **Select** — candidates are ranked by estimated code units saved
//!    (optionally profile-weighted) and drained best-first. Before a
//!    candidate is applied, methods touched by earlier rewrites are
//!    rescanned and the candidate's occurrences revalidated against the
//!    current graph.
//! 3. **Apply** — an outlined method is synthesized
//!    ([`synthesis`]) and every surviving occurrence spliced into a call
//!    ([`rewrite`]).
//!
//! The outliner is exposed as a [`Pass`](crate::pass::Pass) so hosts can
//! run it standalone or inside a [`PassPipeline`](crate::pass::PassPipeline).
//!
//! # Examples
//!
//! ```rust
//! use dexoutline::ir::build::ProgramBuilder;
//! use dexoutline::ir::Reg;
//! use dexoutline::outliner::{InstructionSequenceOutliner, OutlinerConfig};
//!
//! let mut builder = ProgramBuilder::new();
//! let string = builder.string_type();
//! let void = builder.void_type();
//! let printer = builder.reference_type("Lio/Printer;");
//! let println = builder.extern_method(printer, "println", void, &[string]);
//! let mut class = builder.class("LMain;")?;
//! for name in ["a", "b"] {
//!     class
//!         .method(name)
//!         .block(|b| {
//!             for line in ["hello", "from", "dexoutline"] {
//!                 b.const_string(Reg(0), line);
//!                 b.invoke_static(println, &[Reg(0)]);
//!             }
//!             b.ret();
//!         })
//!         .build()?;
//! }
//! let mut program = builder.build()?;
//!
//! let outliner = InstructionSequenceOutliner::new(OutlinerConfig::default());
//! let stats = outliner.outline(&mut program)?;
//! assert_eq!(stats.methods_created, 1);
//! assert_eq!(stats.call_sites_rewritten, 2);
//! # Ok::<(), dexoutline::Error>(())
//! ```

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::analysis::big_blocks;
use crate::ir::{MethodId, Program};
use crate::pass::Pass;
use crate::Result;

pub mod canon;
pub mod config;

mod candidates;
mod dataflow;
mod demand;
mod rewrite;
mod synthesis;

pub use canon::{canonicalize, CanonicalSequence};
pub use config::OutlinerConfig;

use candidates::{build_candidates, scan_method, scan_program, Candidate, Occurrence};
use synthesis::SynthesisContext;

/// Counters reported by one outliner invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutlinerStats {
    /// Outlined methods synthesized.
    pub methods_created: usize,
    /// Occurrences replaced by calls.
    pub call_sites_rewritten: usize,
    /// Estimated code units saved across all rewrites, net of the
    /// synthesized bodies.
    pub estimated_units_saved: i64,
}

/// The instruction sequence outlining pass.
///
/// Stateless between runs; all tuning lives in the [`OutlinerConfig`]
/// captured at construction.
#[derive(Debug, Default)]
pub struct InstructionSequenceOutliner {
    config: OutlinerConfig,
}

impl InstructionSequenceOutliner {
    /// Creates the pass with the given configuration.
    #[must_use]
    pub fn new(config: OutlinerConfig) -> Self {
        Self { config }
    }

    /// Runs one outlining invocation and reports what happened.
    ///
    /// The select/apply loop drains the ranked candidate list once; bodies
    /// synthesized during the run are not themselves rescanned, so one
    /// invocation never outlines its own output.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedGraph`] if the program graph is
    /// structurally invalid. Per-candidate obstacles (inexpressible
    /// parameter or return types, occurrence counts dropping under the
    /// threshold after earlier rewrites) skip the candidate silently.
    pub fn outline(&self, program: &mut Program) -> Result<OutlinerStats> {
        program.validate()?;
        let config = self.config.normalized();

        let cache = scan_program(program, &config);
        let candidates = build_candidates(program, &config, &cache);
        debug!("{} candidates after scan", candidates.len());

        let mut context = SynthesisContext::new(program);
        let mut stats = OutlinerStats::default();
        let mut dirty: HashSet<MethodId> = HashSet::new();

        for candidate in candidates {
            if config.max_outlined_methods != 0
                && stats.methods_created >= config.max_outlined_methods
            {
                debug!(
                    "budget of {} outlined methods reached",
                    config.max_outlined_methods
                );
                break;
            }

            // Rescan methods touched since the initial scan, then reread
            // this candidate's occurrences from the scan cache.
            let candidate = match revalidate(program, &config, &cache, &mut dirty, candidate) {
                Some(candidate) => candidate,
                None => continue,
            };

            let Some(outlined) = context.synthesize(program, &candidate) else {
                continue;
            };
            let callee = program.method_ref_for(outlined);

            let mut by_method: HashMap<MethodId, Vec<Occurrence>> = HashMap::new();
            for occurrence in candidate.occurrences {
                by_method.entry(occurrence.method).or_default().push(occurrence);
            }
            for (method_id, occurrences) in by_method {
                let regions = big_blocks(program.method(method_id));
                // Later windows first, so earlier stream offsets stay valid.
                for occurrence in occurrences.iter().rev() {
                    let region = regions
                        .iter()
                        .find(|region| region.head() == occurrence.loc.head)
                        .unwrap_or_else(|| unreachable!("occurrence from a fresh scan"));
                    let saved = rewrite::rewrite_occurrence(
                        program.method_mut(method_id),
                        region,
                        occurrence.loc,
                        &candidate.key,
                        callee,
                    );
                    stats.call_sites_rewritten += 1;
                    stats.estimated_units_saved += i64::from(saved);
                }
                dirty.insert(method_id);
            }

            stats.methods_created += 1;
            stats.estimated_units_saved -= i64::from(candidate.key.seq.code_units())
                + i64::from(candidates::cost::METHOD_BODY);
        }

        info!(
            "outlined {} methods across {} call sites (~{} code units saved)",
            stats.methods_created, stats.call_sites_rewritten, stats.estimated_units_saved
        );
        Ok(stats)
    }
}

/// Rechecks a candidate against the current graph.
///
/// Dirty methods are rescanned first, then the occurrence list is rebuilt
/// from the cache unconditionally: an earlier candidate may already have
/// rescanned these methods before being dropped, so the recorded offsets
/// can be stale even when no dirty bit remains. The candidate survives if
/// the rebuilt list still clears the occurrence threshold and a positive
/// unweighted score.
fn revalidate(
    program: &Program,
    config: &OutlinerConfig,
    cache: &candidates::ScanCache,
    dirty: &mut HashSet<MethodId>,
    candidate: Candidate,
) -> Option<Candidate> {
    let mut methods: Vec<MethodId> = candidate
        .occurrences
        .iter()
        .map(|occurrence| occurrence.method)
        .collect();
    methods.dedup();

    let mut occurrences = Vec::new();
    for method in methods {
        if dirty.remove(&method) {
            cache.insert(method, scan_method(program, method, config));
        }
        let Some(scan) = cache.get(&method) else {
            continue;
        };
        if let Some(locs) = scan.runs.get(&candidate.key) {
            occurrences.extend(locs.iter().map(|&loc| Occurrence { method, loc }));
        }
    }
    occurrences.sort();

    if occurrences.len() < config.min_occurrences {
        debug!("candidate dropped on revalidation: occurrences fell under threshold");
        return None;
    }
    let score = candidates::score(&candidate.key, occurrences.len());
    if score <= 0 {
        debug!("candidate dropped on revalidation: no longer profitable");
        return None;
    }
    Some(Candidate {
        key: candidate.key,
        occurrences,
        score,
        weighted_score: candidate.weighted_score,
    })
}

impl Pass for InstructionSequenceOutliner {
    fn name(&self) -> &'static str {
        "instruction-sequence-outliner"
    }

    fn run(&self, program: &mut Program) -> Result<bool> {
        Ok(self.outline(program)?.methods_created > 0)
    }

    fn description(&self) -> &'static str {
        "Deduplicates repeated instruction sequences into synthesized static methods"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::build::ProgramBuilder;
    use crate::ir::{MethodRefId, Reg};

    fn repeated_program(bodies: usize) -> Program {
        let mut builder = ProgramBuilder::new();
        let string = builder.string_type();
        let void = builder.void_type();
        let printer = builder.reference_type("Lio/Printer;");
        let println = builder.extern_method(printer, "println", void, &[string]);
        let mut class = builder.class("LMain;").unwrap();
        for index in 0..bodies {
            class
                .method(&format!("m{index}"))
                .block(|b| {
                    for line in ["a", "b", "c"] {
                        b.const_string(Reg(0), line);
                        b.invoke_static(println, &[Reg(0)]);
                    }
                    b.ret();
                })
                .build()
                .unwrap();
        }
        builder.build().unwrap()
    }

    fn invoked_refs(program: &Program, method: crate::ir::MethodId) -> Vec<MethodRefId> {
        let method = program.method(method);
        let mut out = Vec::new();
        for block in method.blocks() {
            for insn in block.insns() {
                if let crate::ir::Insn::Invoke { method, .. } = insn {
                    out.push(*method);
                }
            }
        }
        out
    }

    #[test]
    fn test_outlines_repeated_bodies_once() {
        let mut program = repeated_program(3);
        let outliner = InstructionSequenceOutliner::default();
        let stats = outliner.outline(&mut program).unwrap();

        assert_eq!(stats.methods_created, 1);
        assert_eq!(stats.call_sites_rewritten, 3);
        assert!(program.validate().is_ok());

        let outlined = program
            .find_method("LMain;", "$outline$0")
            .expect("synthesized into the shared class");
        assert_eq!(program.method(outlined).insn_count(), 6);

        // Every original body is now a single call of the outlined method.
        for index in 0..3 {
            let id = program.find_method("LMain;", &format!("m{index}")).unwrap();
            let calls = invoked_refs(&program, id);
            assert_eq!(calls.len(), 1);
            assert_eq!(program.resolve_method_ref(calls[0]), Some(outlined));
        }
    }

    #[test]
    fn test_idempotent_on_second_run() {
        let mut program = repeated_program(2);
        let outliner = InstructionSequenceOutliner::default();
        assert!(outliner.outline(&mut program).unwrap().methods_created > 0);

        let again = outliner.outline(&mut program).unwrap();
        assert_eq!(again.methods_created, 0);
        assert_eq!(again.call_sites_rewritten, 0);
        assert!(program.validate().is_ok());
    }

    #[test]
    fn test_budget_caps_synthesis() {
        let mut builder = ProgramBuilder::new();
        let string = builder.string_type();
        let void = builder.void_type();
        let printer = builder.reference_type("Lio/Printer;");
        let println = builder.extern_method(printer, "println", void, &[string]);
        let log = builder.extern_method(printer, "log", void, &[string]);
        let mut class = builder.class("LMain;").unwrap();
        // Two unrelated repeated sequences, only one may be outlined.
        for index in 0..2 {
            class
                .method(&format!("p{index}"))
                .block(|b| {
                    for line in ["p", "q", "r"] {
                        b.const_string(Reg(0), line);
                        b.invoke_static(println, &[Reg(0)]);
                    }
                    b.ret();
                })
                .build()
                .unwrap();
            class
                .method(&format!("l{index}"))
                .block(|b| {
                    for line in ["x", "y", "z"] {
                        b.const_string(Reg(1), line);
                        b.invoke_static(log, &[Reg(1)]);
                    }
                    b.ret();
                })
                .build()
                .unwrap();
        }
        let mut program = builder.build().unwrap();

        let outliner = InstructionSequenceOutliner::new(
            OutlinerConfig::default().with_max_outlined_methods(1),
        );
        let stats = outliner.outline(&mut program).unwrap();
        assert_eq!(stats.methods_created, 1);
        assert!(program.validate().is_ok());
    }

    #[test]
    fn test_overlapping_candidate_revalidated_away() {
        // The whole-body run subsumes its shorter sub-runs; after it is
        // applied, the sub-runs no longer occur anywhere.
        let mut program = repeated_program(3);
        let outliner = InstructionSequenceOutliner::default();
        let stats = outliner.outline(&mut program).unwrap();

        assert_eq!(stats.methods_created, 1, "sub-windows dropped on revalidation");
        assert!(program.validate().is_ok());
    }

    #[test]
    fn test_many_overlapping_candidates_collapse_to_one_method() {
        // With four bodies, several sub-windows of the whole-body run are
        // profitable on their own and rank right behind it. After the full
        // run is applied, every one of them must be reread against the
        // rewritten bodies and dropped, not replayed at its old offsets.
        let mut program = repeated_program(4);
        let outliner = InstructionSequenceOutliner::default();
        let stats = outliner.outline(&mut program).unwrap();

        assert_eq!(stats.methods_created, 1);
        assert_eq!(stats.call_sites_rewritten, 4);
        assert!(program.validate().is_ok());

        for index in 0..4 {
            let id = program.find_method("LMain;", &format!("m{index}")).unwrap();
            assert_eq!(program.method(id).insn_count(), 1);
        }
    }

    #[test]
    fn test_pass_reports_change() {
        let mut program = repeated_program(2);
        let pass = InstructionSequenceOutliner::default();
        assert_eq!(pass.name(), "instruction-sequence-outliner");
        assert!(pass.run(&mut program).unwrap());
        assert!(!pass.run(&mut program).unwrap());
    }
}
