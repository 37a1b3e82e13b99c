//! Register-naming canonicalization.
//!
//! Two instruction runs that differ only by a register-renaming bijection
//! must compare equal so they can share one outlined method. The
//! canonicalizer renames every register to its index in first-use order
//! (reads and writes alike, in operand order), leaving opcodes, literals
//! and symbol references untouched. Since all symbol operands are interned
//! `Copy` ids, the resulting [`CanonicalSequence`] is directly usable as a
//! hash-map key.
//!
//! Renaming goes through [`Insn::map_registers`], an exhaustive match over
//! the instruction enum, so adding an instruction variant cannot silently
//! bypass canonicalization.

use std::collections::HashMap;

use crate::ir::{Insn, Reg};

/// An instruction run with registers renamed to first-use-order indices.
///
/// The value is immutable and self-contained: equality, hashing and the
/// derived ordering depend only on opcodes, canonical register indices,
/// literals and interned symbol ids. The derived `Ord` supplies the stable
/// tie-break when candidates score equally.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalSequence {
    insns: Vec<Insn>,
}

impl CanonicalSequence {
    /// The canonicalized instructions.
    #[must_use]
    pub fn insns(&self) -> &[Insn] {
        &self.insns
    }

    /// Run length in instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.insns.len()
    }

    /// Returns `true` for the empty run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }

    /// Number of distinct registers the run touches.
    ///
    /// Canonical indices are dense, so this is one past the highest index.
    #[must_use]
    pub fn reg_count(&self) -> u16 {
        let mut max: Option<u16> = None;
        for insn in &self.insns {
            for reg in insn.uses() {
                max = Some(max.map_or(reg.0, |m| m.max(reg.0)));
            }
            if let Some(def) = insn.def() {
                max = Some(max.map_or(def.0, |m| m.max(def.0)));
            }
        }
        max.map_or(0, |m| m + 1)
    }

    /// Estimated encoded size of the run in code units.
    #[must_use]
    pub fn code_units(&self) -> u32 {
        self.insns.iter().map(Insn::code_units).sum()
    }

    /// The canonical indices read before being defined, in first-read
    /// order.
    ///
    /// These are the run's live-in registers and, in this exact order, the
    /// parameters of a method outlined from it.
    #[must_use]
    pub fn live_ins(&self) -> Vec<u16> {
        let mut defined = std::collections::HashSet::new();
        let mut seen = std::collections::HashSet::new();
        let mut live_ins = Vec::new();
        for insn in &self.insns {
            for reg in insn.uses() {
                if !defined.contains(&reg) && seen.insert(reg) {
                    live_ins.push(reg.0);
                }
            }
            if let Some(def) = insn.def() {
                defined.insert(def);
            }
        }
        live_ins
    }

    /// The canonical indices the run defines.
    #[must_use]
    pub fn defs(&self) -> Vec<u16> {
        let mut defs = Vec::new();
        for insn in &self.insns {
            if let Some(def) = insn.def() {
                if !defs.contains(&def.0) {
                    defs.push(def.0);
                }
            }
        }
        defs
    }
}

/// Canonicalizes an instruction run.
///
/// Pure function of the input: no side effects, no shared state.
#[must_use]
pub fn canonicalize(insns: &[Insn]) -> CanonicalSequence {
    canonicalize_with_map(insns).0
}

/// Canonicalizes a run and returns the canonical-to-actual register map.
///
/// Entry `i` of the map is the original register renamed to canonical
/// index `i`; the rewriter uses it to translate the key's live-in indices
/// back into call arguments at a concrete occurrence.
#[must_use]
pub fn canonicalize_with_map(insns: &[Insn]) -> (CanonicalSequence, Vec<Reg>) {
    let mut assignment: HashMap<Reg, Reg> = HashMap::new();
    let mut originals: Vec<Reg> = Vec::new();

    let canonical = insns
        .iter()
        .map(|insn| {
            let mut insn = insn.clone();
            insn.map_registers(|reg| {
                *assignment.entry(reg).or_insert_with(|| {
                    let index = u16::try_from(originals.len()).unwrap_or(u16::MAX);
                    originals.push(reg);
                    Reg(index)
                })
            });
            insn
        })
        .collect();

    (CanonicalSequence { insns: canonical }, originals)
}
