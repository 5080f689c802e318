//! Placeholder extraction
//!
//! A placeholder is a bracket-delimited anonymization marker such as
//! `[Vardas]`. Tags are compared by exact string equality.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholders whose absence fails a direct-identifier example outright:
/// national ID, email, phone number, full name.
pub const DIRECT_PLACEHOLDERS: [&str; 4] =
    ["[ID]", "[El. paštas]", "[Tel. numeris]", "[Vardas_Pavardė]"];

// Opening bracket, one or more non-`]` characters, closing bracket
static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]+\]").expect("valid placeholder pattern"));

/// Multiset of placeholder tags (tag -> occurrence count) within one text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMultiset {
    counts: BTreeMap<String, usize>,
}

impl PlaceholderMultiset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `tag`
    pub fn insert(&mut self, tag: impl Into<String>) {
        *self.counts.entry(tag.into()).or_insert(0) += 1;
    }

    /// Occurrence count, 0 for unseen tags
    pub fn count(&self, tag: &str) -> usize {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.counts.contains_key(tag)
    }

    /// Iterate `(tag, count)` in tag order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(tag, count)| (tag.as_str(), *count))
    }

    /// Number of distinct tags
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all occurrence counts
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl<S: Into<String>> FromIterator<S> for PlaceholderMultiset {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut multiset = Self::new();
        for tag in iter {
            multiset.insert(tag);
        }
        multiset
    }
}

/// Extract every placeholder tag in `text`, scanning left to right.
///
/// No normalization is applied: `[Vardas]` and `[vardas]` are distinct, and
/// empty brackets `[]` are not a tag.
pub fn extract_placeholders(text: &str) -> PlaceholderMultiset {
    PLACEHOLDER_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
