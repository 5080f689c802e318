//! Multi-system comparison
//!
//! Scores one or more systems' predictions against a shared gold corpus.
//! Predictions are joined to gold by id; a gold example without a
//! prediction is scored against an empty text rather than skipped.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use anon_core::{GoldExample, Prediction};

use crate::aggregate::{CorpusAggregator, CorpusReport, ScoredExample};
use crate::composite::CompositeScorer;
use crate::metrics::score_pair;

/// One system's prediction corpus
#[derive(Debug, Clone)]
pub struct SystemPredictions {
    pub name: String,
    pub predictions: Vec<Prediction>,
}

impl SystemPredictions {
    pub fn new(name: impl Into<String>, predictions: Vec<Prediction>) -> Self {
        Self {
            name: name.into(),
            predictions,
        }
    }
}

/// Score every gold example against the matching prediction.
///
/// Duplicate prediction ids resolve to the last occurrence. Predictions
/// whose id matches no gold example are ignored.
pub fn score_corpus(gold: &[GoldExample], predictions: &[Prediction]) -> CorpusAggregator {
    let pred_map: HashMap<&str, &str> = predictions
        .iter()
        .map(|p| (p.id.as_str(), p.pred_text.as_str()))
        .collect();

    let mut aggregator = CorpusAggregator::new();
    for example in gold {
        let pred_text = pred_map.get(example.id.as_str()).copied();
        let result = score_pair(
            &example.gold_text,
            pred_text.unwrap_or(""),
            example.identifier_class,
        );

        debug!(
            id = %example.id,
            class = %example.identifier_class,
            tp = result.true_positive,
            fp = result.false_positive,
            fn_ = result.false_negative,
            precision = result.precision,
            recall = result.recall,
            f1 = result.f1,
            missed_direct = result.missed_direct,
            "Scored example"
        );

        aggregator.add(ScoredExample {
            id: example.id.clone(),
            metadata: example.metadata.clone(),
            prediction_missing: pred_text.is_none(),
            result,
        });
    }

    aggregator
}

/// Score one system and produce its report
pub fn evaluate_system(
    gold: &[GoldExample],
    predictions: &[Prediction],
    scorer: &CompositeScorer,
) -> CorpusReport {
    score_corpus(gold, predictions).finish(scorer)
}

// ============================================================================
// Runner
// ============================================================================

/// Reports for every compared system
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub generated_at: DateTime<Utc>,
    pub gold_examples: usize,
    pub alpha: f64,
    /// System reports in input order
    #[serde(serialize_with = "serialize_systems")]
    pub systems: Vec<(String, CorpusReport)>,
}

fn serialize_systems<S>(
    systems: &[(String, CorpusReport)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_map(systems.iter().map(|(name, report)| (name, report)))
}

impl ComparisonReport {
    pub fn system(&self, name: &str) -> Option<&CorpusReport> {
        self.systems
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, report)| report)
    }

    /// Systems ordered by composite score, best first
    pub fn ranking(&self) -> Vec<(&str, &CorpusReport)> {
        let mut ranked: Vec<(&str, &CorpusReport)> = self
            .systems
            .iter()
            .map(|(name, report)| (name.as_str(), report))
            .collect();
        ranked.sort_by(|a, b| b.1.composite.total_cmp(&a.1.composite));
        ranked
    }

    /// Plain-text comparison table sorted by composite score
    pub fn render_table(&self) -> String {
        let name_width = self
            .systems
            .iter()
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or(0)
            .max("system".len());

        let mut out = format!(
            "{:<name_width$}  {:>8}  {:>8}  {:>9}  {:>11}  {:>9}\n",
            "system", "micro_f1", "macro_f1", "direct_f1", "indirect_f1", "composite",
        );
        for (name, report) in self.ranking() {
            out.push_str(&format!(
                "{:<name_width$}  {:>8.4}  {:>8.4}  {:>9.4}  {:>11.4}  {:>9.4}\n",
                name,
                report.micro.f1,
                report.macro_f1,
                report.direct_macro_f1,
                report.indirect_micro_f1,
                report.composite,
            ));
        }
        out
    }
}

/// Compares N systems against one gold corpus
pub struct MultiSystemRunner {
    gold: Vec<GoldExample>,
    scorer: CompositeScorer,
}

impl MultiSystemRunner {
    pub fn new(gold: Vec<GoldExample>, scorer: CompositeScorer) -> Self {
        Self { gold, scorer }
    }

    /// Keep only the first `limit` gold examples; 0 means no limit
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        if let Some(limit) = limit.filter(|&n| n > 0) {
            self.gold.truncate(limit);
        }
        self
    }

    pub fn gold(&self) -> &[GoldExample] {
        &self.gold
    }

    /// Score a single system
    pub fn evaluate(&self, predictions: &[Prediction]) -> CorpusReport {
        evaluate_system(&self.gold, predictions, &self.scorer)
    }

    /// Score every system, preserving input order
    pub fn run(&self, systems: &[SystemPredictions]) -> ComparisonReport {
        let mut reports = Vec::with_capacity(systems.len());

        for system in systems {
            let report = self.evaluate(&system.predictions);
            if report.missing_predictions > 0 {
                warn!(
                    system = %system.name,
                    missing = report.missing_predictions,
                    "Gold examples without prediction scored as empty"
                );
            }
            info!(
                system = %system.name,
                composite = report.composite,
                macro_f1 = report.macro_f1,
                "System evaluated"
            );
            reports.push((system.name.clone(), report));
        }

        ComparisonReport {
            generated_at: Utc::now(),
            gold_examples: self.gold.len(),
            alpha: self.scorer.alpha(),
            systems: reports,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
