//! Pair scoring
//!
//! Compares the placeholder multisets of one gold text and one candidate
//! text, producing confusion counts and a per-example F1.

use serde::{Deserialize, Serialize};

use anon_core::IdentifierClass;

use crate::placeholder::{extract_placeholders, PlaceholderMultiset, DIRECT_PLACEHOLDERS};

// ============================================================================
// Pair Result
// ============================================================================

/// Scoring outcome for one (gold, prediction) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairResult {
    /// Matched placeholder occurrences
    pub true_positive: usize,
    /// Predicted occurrences without a gold counterpart
    pub false_positive: usize,
    /// Gold occurrences the prediction did not reproduce
    pub false_negative: usize,
    pub precision: f64,
    pub recall: f64,
    /// Per-example F1 after the direct-identifier gate
    pub f1: f64,
    /// A direct placeholder present in gold is absent from the prediction
    pub missed_direct: bool,
    pub identifier_class: IdentifierClass,
}

impl PairResult {
    /// True when the gate zeroed this pair's F1
    pub fn gated(&self) -> bool {
        self.identifier_class == IdentifierClass::Direct && self.missed_direct
    }

    /// Exact placeholder match (F1 of exactly 1.0)
    pub fn is_perfect(&self) -> bool {
        self.f1 == 1.0
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// Score a candidate anonymization against its gold reference.
///
/// Matching is multiset intersection over placeholder tags. For a `Direct`
/// pair, missing any of [`DIRECT_PLACEHOLDERS`] that gold contains forces
/// F1 to 0.0 regardless of the other matches. Never fails: texts without
/// placeholders score as empty multisets.
pub fn score_pair(gold_text: &str, pred_text: &str, identifier_class: IdentifierClass) -> PairResult {
    let gold = extract_placeholders(gold_text);
    let pred = extract_placeholders(pred_text);
    score_multisets(&gold, &pred, identifier_class)
}

/// Score two already-extracted multisets
pub fn score_multisets(
    gold: &PlaceholderMultiset,
    pred: &PlaceholderMultiset,
    identifier_class: IdentifierClass,
) -> PairResult {
    let mut true_positive = 0;
    let mut false_positive = 0;
    let mut false_negative = 0;

    for (tag, gold_count) in gold.iter() {
        let pred_count = pred.count(tag);
        true_positive += gold_count.min(pred_count);

        if pred_count == 0 {
            // Gold tag never predicted
            false_negative += gold_count;
        } else {
            false_positive += pred_count.saturating_sub(gold_count);
            false_negative += gold_count.saturating_sub(pred_count);
        }
    }

    // Predicted tags with no gold counterpart at all
    false_positive += pred
        .iter()
        .filter(|(tag, _)| !gold.contains(tag))
        .map(|(_, count)| count)
        .sum::<usize>();

    let precision = pair_precision(true_positive, false_positive, false_negative);
    let recall = pair_recall(true_positive, false_negative);

    let missed_direct = DIRECT_PLACEHOLDERS
        .iter()
        .any(|tag| gold.count(tag) > 0 && pred.count(tag) == 0);

    let f1 = if identifier_class == IdentifierClass::Direct && missed_direct {
        0.0
    } else {
        harmonic_mean(precision, recall)
    };

    PairResult {
        true_positive,
        false_positive,
        false_negative,
        precision,
        recall,
        f1,
        missed_direct,
        identifier_class,
    }
}

/// Per-example precision. With nothing predicted, a pair is vacuously
/// precise only if gold has no placeholders either.
fn pair_precision(tp: usize, fp: usize, fn_: usize) -> f64 {
    if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else if tp + fn_ == 0 {
        1.0
    } else {
        0.0
    }
}

/// Per-example recall. No gold placeholders means nothing could be missed.
fn pair_recall(tp: usize, fn_: usize) -> f64 {
    if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        1.0
    }
}

/// Calculate F1 score (2 * P * R / (P + R))
pub(crate) fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identical_texts_score_perfectly() {
        let text = "Pacientas [Vardas] serga.";
        let result = score_pair(text, text, IdentifierClass::Direct);

        assert_eq!(result.true_positive, 1);
        assert_eq!(result.false_positive, 0);
        assert_eq!(result.false_negative, 0);
        assert!((result.f1 - 1.0).abs() < 0.001);
        assert!(result.is_perfect());
    }

    #[test]
    fn test_direct_miss_gate() {
        let result = score_pair("[ID] [Vardas]", "[Vardas]", IdentifierClass::Direct);

        assert_eq!(result.true_positive, 1);
        assert_eq!(result.false_negative, 1);
        assert_eq!(result.false_positive, 0);
        assert!(result.missed_direct);
        assert!(result.gated());
        assert_eq!(result.f1, 0.0);
    }

    #[test]
    fn test_direct_miss_not_gated_for_indirect() {
        let result = score_pair("[ID] [Vardas]", "[Vardas]", IdentifierClass::Indirect);

        assert!(result.missed_direct);
        assert!(!result.gated());
        // P = 1.0, R = 0.5
        assert!((result.f1 - 0.667).abs() < 0.001);
    }

    #[test]
    fn test_gate_ignores_other_matches() {
        let gold = "[Vardas_Pavardė] gyvena [Miestas], tel. [Tel. numeris].";
        let pred = "[Vardas_Pavardė] gyvena [Miestas], tel. 860000000.";
        let result = score_pair(gold, pred, IdentifierClass::Direct);

        assert_eq!(result.true_positive, 2);
        assert_eq!(result.f1, 0.0);
    }

    #[test]
    fn test_over_prediction() {
        let result = score_pair("[Miestas]", "[Miestas] [Miestas]", IdentifierClass::Indirect);

        assert_eq!(result.true_positive, 1);
        assert_eq!(result.false_positive, 1);
        assert_eq!(result.false_negative, 0);
        assert!((result.precision - 0.5).abs() < 0.001);
        assert!((result.recall - 1.0).abs() < 0.001);
        assert!((result.f1 - 0.667).abs() < 0.001);
    }

    #[test]
    fn test_under_prediction_of_shared_tag() {
        let result = score_pair(
            "[Vardas] ir [Vardas] ir [Vardas]",
            "[Vardas] ir Jonas",
            IdentifierClass::Indirect,
        );

        assert_eq!(result.true_positive, 1);
        assert_eq!(result.false_negative, 2);
        assert_eq!(result.false_positive, 0);
    }

    #[test]
    fn test_unrelated_prediction_tags() {
        let result = score_pair("[Vardas]", "[Amžius] [Data]", IdentifierClass::Indirect);

        assert_eq!(result.true_positive, 0);
        assert_eq!(result.false_positive, 2);
        assert_eq!(result.false_negative, 1);
        assert_eq!(result.precision, 0.0);
        assert_eq!(result.f1, 0.0);
    }

    #[test]
    fn test_empty_prediction() {
        let result = score_pair("[Vardas] [Miestas]", "", IdentifierClass::Indirect);

        assert_eq!(result.true_positive, 0);
        assert_eq!(result.false_negative, 2);
        assert_eq!(result.precision, 0.0);
        assert_eq!(result.recall, 0.0);
        assert_eq!(result.f1, 0.0);
    }

    #[test]
    fn test_both_empty_is_vacuously_perfect() {
        let result = score_pair("Nieko slapto.", "Nieko slapto.", IdentifierClass::Direct);

        assert_eq!(result.precision, 1.0);
        assert_eq!(result.recall, 1.0);
        assert!(result.is_perfect());
    }

    #[test]
    fn test_spurious_tags_without_gold() {
        let result = score_pair("Nieko slapto.", "[Vardas]", IdentifierClass::Indirect);

        assert_eq!(result.false_positive, 1);
        assert_eq!(result.precision, 0.0);
        assert_eq!(result.recall, 1.0);
        assert_eq!(result.f1, 0.0);
    }

    fn tag_text() -> impl Strategy<Value = String> {
        proptest::collection::vec(
            prop_oneof![
                Just("[Vardas]"),
                Just("[Miestas]"),
                Just("[ID]"),
                Just("[El. paštas]"),
                Just("[Data]"),
                Just("tekstas"),
            ],
            0..12,
        )
        .prop_map(|parts| parts.join(" "))
    }

    proptest! {
        #[test]
        fn prop_self_score_is_perfect(gold in tag_text()) {
            let expected_tp = extract_placeholders(&gold).total();
            let result = score_pair(&gold, &gold, IdentifierClass::Direct);
            prop_assert_eq!(result.true_positive, expected_tp);
            prop_assert_eq!(result.false_positive, 0);
            prop_assert_eq!(result.false_negative, 0);
            prop_assert_eq!(result.precision, 1.0);
            prop_assert_eq!(result.recall, 1.0);
            prop_assert_eq!(result.f1, 1.0);
        }

        #[test]
        fn prop_counts_respect_multisets(gold in tag_text(), pred in tag_text()) {
            let g = extract_placeholders(&gold);
            let p = extract_placeholders(&pred);
            let result = score_pair(&gold, &pred, IdentifierClass::Indirect);

            prop_assert_eq!(result.true_positive + result.false_negative, g.total());
            prop_assert_eq!(result.true_positive + result.false_positive, p.total());
            let matched: usize = g.iter().map(|(tag, count)| count.min(p.count(tag))).sum();
            prop_assert_eq!(result.true_positive, matched);
            prop_assert!((0.0..=1.0).contains(&result.f1));
        }

        #[test]
        fn prop_empty_prediction_recall(gold in tag_text()) {
            let result = score_pair(&gold, "", IdentifierClass::Indirect);
            prop_assert_eq!(result.true_positive, 0);
            prop_assert_eq!(result.false_negative, extract_placeholders(&gold).total());
            let expected_recall = if extract_placeholders(&gold).is_empty() { 1.0 } else { 0.0 };
            prop_assert_eq!(result.recall, expected_recall);
        }
    }
}
