//! Corpus aggregation
//!
//! Accumulates pair results into micro statistics (global confusion sums)
//! and macro statistics (mean of per-example F1), overall and split by
//! identifier class.

use serde::{Deserialize, Serialize};

use anon_core::{ExampleMetadata, IdentifierClass};

use crate::breakdown::{facet_breakdown, FacetBreakdown};
use crate::composite::CompositeScorer;
use crate::metrics::{harmonic_mean, PairResult};

// ============================================================================
// Confusion Counts
// ============================================================================

/// Summed confusion counts across many pairs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ConfusionCounts {
    /// Add one pair's counts
    pub fn add(&mut self, result: &PairResult) {
        self.true_positives += result.true_positive;
        self.false_positives += result.false_positive;
        self.false_negatives += result.false_negative;
    }

    /// Add another sum
    pub fn merge(&mut self, other: &ConfusionCounts) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
    }

    /// Calculate precision (TP / (TP + FP)), 0.0 when nothing was predicted
    pub fn precision(&self) -> f64 {
        if self.true_positives + self.false_positives == 0 {
            0.0
        } else {
            self.true_positives as f64 / (self.true_positives + self.false_positives) as f64
        }
    }

    /// Calculate recall (TP / (TP + FN)), 0.0 when gold has no placeholders
    pub fn recall(&self) -> f64 {
        if self.true_positives + self.false_negatives == 0 {
            0.0
        } else {
            self.true_positives as f64 / (self.true_positives + self.false_negatives) as f64
        }
    }

    /// Calculate F1 score (2 * P * R / (P + R))
    pub fn f1_score(&self) -> f64 {
        harmonic_mean(self.precision(), self.recall())
    }

    pub fn micro(&self) -> MicroMetrics {
        MicroMetrics {
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1_score(),
        }
    }
}

/// Micro-averaged precision/recall/F1
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MicroMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

// ============================================================================
// Aggregator
// ============================================================================

/// One scored example, kept for the facet breakdown and diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredExample {
    pub id: String,
    pub metadata: ExampleMetadata,
    pub prediction_missing: bool,
    pub result: PairResult,
}

/// Accumulator over scored pairs.
///
/// Pairs are independent: aggregators built over disjoint slices of a corpus
/// can be combined with [`CorpusAggregator::merge`] in corpus order.
#[derive(Debug, Clone, Default)]
pub struct CorpusAggregator {
    overall: ConfusionCounts,
    direct: ConfusionCounts,
    indirect: ConfusionCounts,
    f1_scores: Vec<f64>,
    direct_f1_scores: Vec<f64>,
    indirect_f1_scores: Vec<f64>,
    examples: Vec<ScoredExample>,
}

impl CorpusAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scored example
    pub fn add(&mut self, example: ScoredExample) {
        let result = &example.result;
        self.overall.add(result);
        self.f1_scores.push(result.f1);

        match result.identifier_class {
            IdentifierClass::Direct => {
                self.direct.add(result);
                self.direct_f1_scores.push(result.f1);
            }
            IdentifierClass::Indirect => {
                self.indirect.add(result);
                self.indirect_f1_scores.push(result.f1);
            }
        }

        self.examples.push(example);
    }

    /// Append another aggregator's examples after this one's
    pub fn merge(&mut self, other: CorpusAggregator) {
        self.overall.merge(&other.overall);
        self.direct.merge(&other.direct);
        self.indirect.merge(&other.indirect);
        self.f1_scores.extend(other.f1_scores);
        self.direct_f1_scores.extend(other.direct_f1_scores);
        self.indirect_f1_scores.extend(other.indirect_f1_scores);
        self.examples.extend(other.examples);
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Scored examples in input order
    pub fn examples(&self) -> &[ScoredExample] {
        &self.examples
    }

    /// Produce the corpus report
    pub fn finish(&self, scorer: &CompositeScorer) -> CorpusReport {
        let direct_macro_f1 = mean(&self.direct_f1_scores);
        let indirect_micro_f1 = self.indirect.f1_score();

        let breakdown = if self.examples.iter().any(|e| e.metadata.has_facets()) {
            Some(facet_breakdown(
                self.examples.iter().map(|e| (&e.metadata, e.result.f1)),
            ))
        } else {
            None
        };

        CorpusReport {
            num_examples: self.examples.len(),
            num_direct: self.direct_f1_scores.len(),
            num_indirect: self.indirect_f1_scores.len(),
            missing_predictions: self.examples.iter().filter(|e| e.prediction_missing).count(),
            gated_examples: self.examples.iter().filter(|e| e.result.gated()).count(),
            perfect_examples: self.examples.iter().filter(|e| e.result.is_perfect()).count(),
            totals: self.overall,
            micro: self.overall.micro(),
            macro_f1: mean(&self.f1_scores),
            direct_macro_f1,
            indirect_micro_f1,
            alpha: scorer.alpha(),
            composite: scorer.score(direct_macro_f1, indirect_micro_f1),
            breakdown,
            per_example_f1: self.f1_scores.clone(),
        }
    }
}

/// Arithmetic mean, 0.0 for an empty slice
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

// ============================================================================
// Corpus Report
// ============================================================================

/// Aggregate statistics for one evaluated system
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusReport {
    pub num_examples: usize,
    pub num_direct: usize,
    pub num_indirect: usize,
    /// Gold examples with no prediction (scored against an empty text)
    pub missing_predictions: usize,
    /// Direct examples zeroed by the missed-direct gate
    pub gated_examples: usize,
    /// Examples with F1 of exactly 1.0
    pub perfect_examples: usize,
    pub totals: ConfusionCounts,
    pub micro: MicroMetrics,
    pub macro_f1: f64,
    pub direct_macro_f1: f64,
    pub indirect_micro_f1: f64,
    pub alpha: f64,
    pub composite: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<FacetBreakdown>,
    /// Per-example F1 in input order
    #[serde(skip)]
    pub per_example_f1: Vec<f64>,
}

impl CorpusReport {
    /// Human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Examples evaluated: {} (direct: {}, indirect: {}, missing predictions: {})\n\
             Micro:     P {:.4} | R {:.4} | F1 {:.4}\n\
             TP: {} | FP: {} | FN: {}\n\
             Macro F1:           {:.4}\n\
             Direct macro F1:    {:.4} (gated: {})\n\
             Indirect micro F1:  {:.4}\n\
             Composite (α={:.2}): {:.4}\n",
            self.num_examples,
            self.num_direct,
            self.num_indirect,
            self.missing_predictions,
            self.micro.precision,
            self.micro.recall,
            self.micro.f1,
            self.totals.true_positives,
            self.totals.false_positives,
            self.totals.false_negatives,
            self.macro_f1,
            self.direct_macro_f1,
            self.gated_examples,
            self.indirect_micro_f1,
            self.alpha,
            self.composite,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
