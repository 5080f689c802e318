//! Gold and prediction record mapping
//!
//! Gold objects: `{"id", "gold" | "output", "raw" | "input", "instruction"?,
//! "bucket"?, "id_type" | "identifier_type"?, "metadata"?}`.
//! Prediction objects: `{"id", "pred"}`.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{info, warn};

use anon_core::{ExampleMetadata, GoldExample, IdentifierClass, Prediction};

use crate::loader::{read_json_records, LoadedCorpus, PositionedValue, SkipWarning};
use crate::Result;

/// Ids may be written as strings or integers
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "id must be a string or number, got {other}"
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct GoldRecord {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    gold: Option<String>,
    output: Option<String>,
    input: Option<String>,
    raw: Option<String>,
    instruction: Option<String>,
    bucket: Option<String>,
    id_type: Option<String>,
    identifier_type: Option<String>,
    metadata: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct PredictionRecord {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    pred: Option<String>,
}

/// Convert one raw gold object, or explain why it is unusable
pub fn gold_from_value(value: Value) -> std::result::Result<GoldExample, String> {
    let record: GoldRecord = serde_json::from_value(value).map_err(|e| e.to_string())?;

    let gold_text = record
        .gold
        .or(record.output)
        .ok_or_else(|| format!("record {} has no \"gold\" or \"output\" field", record.id))?;

    // Anything other than "direct" is scored as indirect
    let identifier_class = match record.id_type.or(record.identifier_type) {
        None => IdentifierClass::Direct,
        Some(label) => IdentifierClass::parse(&label).unwrap_or_else(|| {
            warn!(id = %record.id, label = %label, "Unrecognized identifier class, treating as indirect");
            IdentifierClass::Indirect
        }),
    };

    let mut example = GoldExample::new(record.id, gold_text)
        .with_source(record.raw.or(record.input).unwrap_or_default())
        .with_class(identifier_class)
        .with_metadata(record.metadata.map(ExampleMetadata::from).unwrap_or_default());

    if let Some(instruction) = record.instruction {
        example = example.with_instruction(instruction);
    }
    if let Some(bucket) = record.bucket {
        example = example.with_bucket(bucket);
    }

    Ok(example)
}

/// Convert one raw prediction object, or explain why it is unusable
pub fn prediction_from_value(value: Value) -> std::result::Result<Prediction, String> {
    let record: PredictionRecord = serde_json::from_value(value).map_err(|e| e.to_string())?;
    let pred_text = record
        .pred
        .ok_or_else(|| format!("record {} has no \"pred\" field", record.id))?;
    Ok(Prediction::new(record.id, pred_text))
}

fn map_records<T>(
    raw: LoadedCorpus<PositionedValue>,
    source: &str,
    convert: impl Fn(Value) -> std::result::Result<T, String>,
) -> LoadedCorpus<T> {
    let mut corpus = LoadedCorpus {
        records: Vec::with_capacity(raw.records.len()),
        warnings: raw.warnings,
    };

    for (position, value) in raw.records {
        let text = value.to_string();
        match convert(value) {
            Ok(record) => corpus.records.push(record),
            Err(reason) => corpus.skip(SkipWarning::new(source, position, &text, reason)),
        }
    }

    corpus
}

/// Load a gold corpus. A missing or unreadable file is an error; malformed
/// records are skipped with warnings.
pub fn load_gold(path: &Path) -> Result<LoadedCorpus<GoldExample>> {
    let source = path.display().to_string();
    let corpus = map_records(read_json_records(path)?, &source, gold_from_value);

    let mut seen = HashSet::new();
    let duplicates = corpus
        .records
        .iter()
        .filter(|example| !seen.insert(example.id.as_str()))
        .count();
    if duplicates > 0 {
        warn!(path = %source, duplicates, "Gold corpus contains duplicate ids");
    }

    info!(
        path = %source,
        examples = corpus.len(),
        skipped = corpus.warnings.len(),
        "Loaded gold corpus"
    );
    Ok(corpus)
}

/// Load a prediction corpus
pub fn load_predictions(path: &Path) -> Result<LoadedCorpus<Prediction>> {
    let source = path.display().to_string();
    let corpus = map_records(read_json_records(path)?, &source, prediction_from_value);

    info!(
        path = %source,
        predictions = corpus.len(),
        skipped = corpus.warnings.len(),
        "Loaded predictions"
    );
    Ok(corpus)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anon_core::Facet;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_gold_full_record() {
        let example = gold_from_value(json!({
            "id": "B-ZD-Med-01",
            "gold": "Pacientas [Vardas] serga.",
            "input": "Pacientas Jonas serga.",
            "instruction": "Anonimizuokite.",
            "id_type": "indirect",
            "metadata": {"domain": "Medical", "risk_level": "high"}
        }))
        .unwrap();

        assert_eq!(example.id, "B-ZD-Med-01");
        assert_eq!(example.gold_text, "Pacientas [Vardas] serga.");
        assert_eq!(example.source_text, "Pacientas Jonas serga.");
        assert_eq!(example.instruction.as_deref(), Some("Anonimizuokite."));
        assert_eq!(example.identifier_class, IdentifierClass::Indirect);
        assert_eq!(example.metadata.get(Facet::Domain), Some("Medical"));
    }

    #[test]
    fn test_gold_output_alias_and_defaults() {
        let example = gold_from_value(json!({
            "id": 7,
            "output": "[ID]",
            "raw": "38801010000",
            "bucket": "B-FD-Leg-02"
        }))
        .unwrap();

        assert_eq!(example.id, "7");
        assert_eq!(example.gold_text, "[ID]");
        assert_eq!(example.source_text, "38801010000");
        assert_eq!(example.bucket.as_deref(), Some("B-FD-Leg-02"));
        assert_eq!(example.identifier_class, IdentifierClass::Direct);
        assert!(!example.metadata.has_facets());
    }

    #[test]
    fn test_gold_identifier_type_key() {
        let example = gold_from_value(json!({
            "id": "1", "gold": "[Miestas]", "identifier_type": "indirect"
        }))
        .unwrap();
        assert_eq!(example.identifier_class, IdentifierClass::Indirect);
    }

    #[test]
    fn test_gold_unknown_class_is_indirect() {
        let example = gold_from_value(json!({
            "id": "1", "gold": "[Miestas]", "id_type": "quasi"
        }))
        .unwrap();
        assert_eq!(example.identifier_class, IdentifierClass::Indirect);
    }

    #[test]
    fn test_gold_missing_text_rejected() {
        let err = gold_from_value(json!({"id": "1", "input": "x"})).unwrap_err();
        assert!(err.contains("no \"gold\""));
        assert!(gold_from_value(json!({"gold": "x"})).is_err());
        assert!(gold_from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_prediction_records() {
        let pred = prediction_from_value(json!({"id": "1", "pred": "[Vardas]"})).unwrap();
        assert_eq!(pred, Prediction::new("1", "[Vardas]"));
        assert!(prediction_from_value(json!({"id": "1"})).is_err());
        assert!(prediction_from_value(json!({"id": null, "pred": "x"})).is_err());
    }

    #[test]
    fn test_load_gold_skips_bad_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id": "1", "gold": "[Vardas]"}},"#).unwrap();
        writeln!(file, r#"{{"id": "2"}}"#).unwrap();
        writeln!(file, r#"{{"id": "3", "gold": "#).unwrap();
        writeln!(file, r#"{{"id": "4", "output": "[ID]", "id_type": "direct"}}"#).unwrap();

        let corpus = load_gold(file.path()).unwrap();

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.records[1].id, "4");
        assert_eq!(corpus.warnings.len(), 2);
    }

    #[test]
    fn test_rejected_record_reports_source_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id": "1", "gold": "[Vardas]"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file, r#"{{"id": "4"}}"#).unwrap();

        let corpus = load_gold(file.path()).unwrap();

        assert_eq!(corpus.len(), 1);
        let positions: Vec<usize> = corpus.warnings.iter().map(|w| w.position).collect();
        assert_eq!(positions, vec![3, 4]);
        assert!(corpus.warnings[1].reason.contains("\"gold\""));
    }

    #[test]
    fn test_load_gold_missing_file_is_error() {
        assert!(load_gold(Path::new("/nonexistent/gold.jsonl")).is_err());
    }

    #[test]
    fn test_load_predictions_json_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "1", "pred": "[Vardas]"}}, {{"id": "2", "pred": "be žymių"}}]"#
        )
        .unwrap();

        let corpus = load_predictions(file.path()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.records[1].pred_text, "be žymių");
    }
}
