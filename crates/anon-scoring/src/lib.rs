//! Anon Scoring - Placeholder-based anonymization quality metrics
//!
//! Scores candidate anonymizations against gold references by the
//! bracketed placeholder tags they use (`[Vardas]`, `[ID]`, ...):
//! - `placeholder`: tag extraction into multisets
//! - `metrics`: per-pair confusion counts and F1 with the direct-identifier gate
//! - `aggregate`: micro/macro statistics over a corpus
//! - `breakdown`: perfect-match counts per metadata facet
//! - `composite`: weighted direct/indirect ranking score
//! - `runner`: gold-vs-N-systems comparison

pub mod aggregate;
pub mod breakdown;
pub mod composite;
pub mod metrics;
pub mod placeholder;
pub mod runner;

pub use aggregate::{ConfusionCounts, CorpusAggregator, CorpusReport, MicroMetrics, ScoredExample};
pub use breakdown::{facet_breakdown, BucketCount, FacetBreakdown};
pub use composite::{composite_score, CompositeScorer};
pub use metrics::{score_multisets, score_pair, PairResult};
pub use placeholder::{extract_placeholders, PlaceholderMultiset, DIRECT_PLACEHOLDERS};
pub use runner::{
    evaluate_system, score_corpus, ComparisonReport, MultiSystemRunner, SystemPredictions,
};
