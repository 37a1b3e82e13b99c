//! Configuration for the instruction sequence outliner.

use std::collections::HashMap;

/// Configuration record recognized by
/// [`InstructionSequenceOutliner`](crate::outliner::InstructionSequenceOutliner).
///
/// All options have working defaults; a default-constructed config outlines
/// every profitable candidate it finds.
#[derive(Debug, Clone)]
pub struct OutlinerConfig {
    /// Minimum instruction-run length considered (default: 3).
    ///
    /// Values below 2 are clamped to 2; single-instruction candidates are
    /// never profitable against the call overhead and would only inflate
    /// the candidate table.
    pub min_insn_size: usize,

    /// Maximum instruction-run length considered (default: 25).
    ///
    /// Caps the window enumeration; longer repeats are still found as
    /// multiple adjacent candidates.
    pub max_insn_size: usize,

    /// Minimum occurrence count for a candidate to be retained (default: 2).
    ///
    /// Occurrences may lie in different methods or repeat within one.
    pub min_occurrences: usize,

    /// Budget cap on synthesized methods per pass invocation (default: 0).
    ///
    /// `0` means unlimited. Hitting the cap ends the pass early without
    /// affecting already-applied rewrites.
    pub max_outlined_methods: usize,

    /// Optional profile weights, keyed by fully qualified method name
    /// (`Lpkg/Cls;.name`).
    ///
    /// Weights multiply each occurrence's estimated saving when *ordering*
    /// candidates; they never change which candidates are eligible. An
    /// absent map (or an absent key, treated as weight 1.0) therefore only
    /// reorders output.
    pub method_profile_weights: Option<HashMap<String, f64>>,
}

impl Default for OutlinerConfig {
    fn default() -> Self {
        Self {
            min_insn_size: 3,
            max_insn_size: 25,
            min_occurrences: 2,
            max_outlined_methods: 0,
            method_profile_weights: None,
        }
    }
}

impl OutlinerConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum instruction-run length.
    #[must_use]
    pub fn with_min_insn_size(mut self, min_insn_size: usize) -> Self {
        self.min_insn_size = min_insn_size;
        self
    }

    /// Sets the maximum instruction-run length.
    #[must_use]
    pub fn with_max_insn_size(mut self, max_insn_size: usize) -> Self {
        self.max_insn_size = max_insn_size;
        self
    }

    /// Sets the minimum occurrence count.
    #[must_use]
    pub fn with_min_occurrences(mut self, min_occurrences: usize) -> Self {
        self.min_occurrences = min_occurrences;
        self
    }

    /// Sets the synthesized-method budget. `0` is unlimited.
    #[must_use]
    pub fn with_max_outlined_methods(mut self, max_outlined_methods: usize) -> Self {
        self.max_outlined_methods = max_outlined_methods;
        self
    }

    /// Installs profile weights for benefit-score ordering.
    #[must_use]
    pub fn with_method_profile_weights(mut self, weights: HashMap<String, f64>) -> Self {
        self.method_profile_weights = Some(weights);
        self
    }

    /// Returns a copy with out-of-range values clamped.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut config = self.clone();
        config.min_insn_size = config.min_insn_size.max(2);
        config.max_insn_size = config.max_insn_size.max(config.min_insn_size);
        config.min_occurrences = config.min_occurrences.max(2);
        config
    }

    /// The ordering weight of one method, 1.0 when unprofiled.
    #[must_use]
    pub fn weight_of(&self, qualified_name: &str) -> f64 {
        self.method_profile_weights
            .as_ref()
            .and_then(|weights| weights.get(qualified_name))
            .copied()
            .unwrap_or(1.0)
    }
}
