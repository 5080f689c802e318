//! Composite ranking score
//!
//! Blends the direct-identifier macro F1 (strict, gated per example) with the
//! indirect-identifier micro F1. Direct identifiers carry the higher privacy
//! risk, so `alpha` weights them.

use anon_core::{AnonError, Result, DEFAULT_ALPHA};

/// `alpha * direct_macro_f1 + (1 - alpha) * indirect_micro_f1`
pub fn composite_score(direct_macro_f1: f64, indirect_micro_f1: f64, alpha: f64) -> f64 {
    alpha * direct_macro_f1 + (1.0 - alpha) * indirect_micro_f1
}

/// Composite scorer with a fixed, validated weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeScorer {
    alpha: f64,
}

impl CompositeScorer {
    /// Create a scorer; `alpha` must lie in [0, 1]
    pub fn new(alpha: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(AnonError::ValidationError(format!(
                "composite weight must be within [0, 1], got {alpha}"
            )));
        }
        Ok(Self { alpha })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn score(&self, direct_macro_f1: f64, indirect_micro_f1: f64) -> f64 {
        composite_score(direct_macro_f1, indirect_micro_f1, self.alpha)
    }
}

impl Default for CompositeScorer {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
        }
    }
}
