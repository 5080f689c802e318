//! Tolerant JSON / JSONL reader

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{CorpusError, Result};

/// Maximum characters of an offending line kept in a warning
const SNIPPET_CHARS: usize = 80;

/// A record or line that was skipped while loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipWarning {
    /// File (or source label) the record came from
    pub source: String,
    /// 1-based line number (JSONL) or record number (array)
    pub position: usize,
    /// Truncated text of the offending line or record
    pub snippet: String,
    pub reason: String,
}

impl SkipWarning {
    pub fn new(
        source: impl Into<String>,
        position: usize,
        text: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            position,
            snippet: truncate_snippet(text),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for SkipWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Skipping invalid record in {} (#{}): {} [{}]",
            self.source, self.position, self.snippet, self.reason
        )
    }
}

fn truncate_snippet(text: &str) -> String {
    let mut chars = text.chars();
    let snippet: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{snippet}…")
    } else {
        snippet
    }
}

/// Records loaded from one corpus plus everything that was skipped
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCorpus<T> {
    pub records: Vec<T>,
    pub warnings: Vec<SkipWarning>,
}

impl<T> LoadedCorpus<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record a skipped entry and log it
    pub fn skip(&mut self, warning: SkipWarning) {
        warn!(
            source = %warning.source,
            position = warning.position,
            reason = %warning.reason,
            "Skipping invalid record: {}",
            warning.snippet
        );
        self.warnings.push(warning);
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }
}

impl<T> Default for LoadedCorpus<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw JSON value tagged with where it sits in the source
pub type PositionedValue = (usize, Value);

/// Read a corpus file into raw JSON values
pub fn read_json_records(path: &Path) -> Result<LoadedCorpus<PositionedValue>> {
    let content = std::fs::read_to_string(path).map_err(|e| CorpusError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(parse_json_records(&content, &path.display().to_string()))
}

/// Parse corpus text: a JSON array if it parses as one, otherwise one JSON
/// value per line with trailing commas stripped and blank lines ignored.
///
/// Each value carries its 1-based line number (JSONL) or element number
/// (array), so later rejections point at the right place.
pub fn parse_json_records(content: &str, source: &str) -> LoadedCorpus<PositionedValue> {
    let text = content.trim_start_matches('\u{feff}').trim();
    let mut corpus = LoadedCorpus::new();

    if text.starts_with('[') {
        match serde_json::from_str::<Vec<Value>>(text) {
            Ok(records) => {
                corpus.records = records
                    .into_iter()
                    .enumerate()
                    .map(|(idx, value)| (idx + 1, value))
                    .collect();
                return corpus;
            }
            Err(e) => {
                debug!(source, error = %e, "Not a valid JSON array, reading line by line");
            }
        }
    }

    for (idx, line) in text.lines().enumerate() {
        let raw = line.trim().trim_end_matches(',');
        if raw.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(value) => corpus.records.push((idx + 1, value)),
            Err(e) => corpus.skip(SkipWarning::new(source, idx + 1, raw, e.to_string())),
        }
    }

    corpus
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_json_array() {
        let corpus = parse_json_records(r#"[{"id": "1"}, {"id": "2"}]"#, "test");
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.records[1], (2, serde_json::json!({"id": "2"})));
        assert!(corpus.warnings.is_empty());
    }

    #[test]
    fn test_parse_jsonl_with_trailing_commas_and_blanks() {
        let text = "{\"id\": \"1\"},\n\n  {\"id\": \"2\"} ,\n{\"id\": \"3\"}\n";
        let corpus = parse_json_records(text, "test");

        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.records[2].1["id"], "3");
        // Line numbers count the blank line
        let positions: Vec<usize> = corpus.records.iter().map(|(pos, _)| *pos).collect();
        assert_eq!(positions, vec![1, 3, 4]);
        assert!(corpus.warnings.is_empty());
    }

    #[test]
    fn test_invalid_lines_are_skipped_with_warning() {
        let text = "{\"id\": \"1\"}\n{\"id\": \"2\", broken\n{\"id\": \"3\"}";
        let corpus = parse_json_records(text, "preds.jsonl");

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.warnings.len(), 1);
        let warning = &corpus.warnings[0];
        assert_eq!(warning.source, "preds.jsonl");
        assert_eq!(warning.position, 2);
        assert!(warning.snippet.starts_with("{\"id\": \"2\""));
        assert!(warning.to_string().contains("preds.jsonl"));
    }

    #[test]
    fn test_broken_array_falls_back_to_lines() {
        // Trailing comma after the last element breaks strict array parsing
        let text = "[\n{\"id\": \"1\"},\n{\"id\": \"2\"},\n]";
        let corpus = parse_json_records(text, "gold.json");

        assert_eq!(corpus.len(), 2);
        // The bracket lines themselves are reported
        assert_eq!(corpus.warnings.len(), 2);
    }

    #[test]
    fn test_snippet_truncated() {
        let long_line = format!("{{\"id\": \"{}\"", "ą".repeat(200));
        let corpus = parse_json_records(&long_line, "test");

        let snippet = &corpus.warnings[0].snippet;
        assert_eq!(snippet.chars().count(), SNIPPET_CHARS + 1);
        assert!(snippet.ends_with('…'));
    }

    #[test]
    fn test_empty_input() {
        let corpus = parse_json_records("  \n ", "test");
        assert!(corpus.is_empty());
        assert!(corpus.warnings.is_empty());
    }

    #[test]
    fn test_byte_order_mark_ignored() {
        let corpus = parse_json_records("\u{feff}[{\"id\": \"1\"}]", "test");
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn test_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"id\": \"a\", \"pred\": \"[Vardas]\"}}").unwrap();
        writeln!(file, "not json").unwrap();

        let corpus = read_json_records(file.path()).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.warnings.len(), 1);
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_json_records(Path::new("/nonexistent/gold.jsonl"));
        assert!(matches!(result, Err(CorpusError::IoError { .. })));
    }
}
