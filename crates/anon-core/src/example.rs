//! Gold examples, predictions and the metadata facet schema

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Identifier Class
// ============================================================================

/// Identifier class of a gold example.
///
/// - `Direct`: identifiers that alone reveal identity (ID number, email,
///   phone, full name). Scored with the all-or-nothing miss gate.
/// - `Indirect`: identifiers that reveal identity only in combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierClass {
    #[default]
    Direct,
    Indirect,
}

impl IdentifierClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Indirect => "indirect",
        }
    }

    /// Parse a class label, `None` for anything other than direct/indirect
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "direct" => Some(Self::Direct),
            "indirect" => Some(Self::Indirect),
            _ => None,
        }
    }
}

impl std::fmt::Display for IdentifierClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Facet Schema
// ============================================================================

/// Metadata dimensions reported by the facet breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    RiskLevel,
    IdentifierType,
    PromptType,
    Domain,
    TextLength,
}

impl Facet {
    /// All facets in reporting order
    pub const ALL: [Facet; 5] = [
        Facet::RiskLevel,
        Facet::IdentifierType,
        Facet::PromptType,
        Facet::Domain,
        Facet::TextLength,
    ];

    /// Metadata key used in corpus files
    pub fn key(&self) -> &'static str {
        match self {
            Self::RiskLevel => "risk_level",
            Self::IdentifierType => "identifier_type",
            Self::PromptType => "prompt_type",
            Self::Domain => "domain",
            Self::TextLength => "text_length",
        }
    }

    /// Allowed values, in reporting order
    pub fn allowed_values(&self) -> &'static [&'static str] {
        match self {
            Self::RiskLevel => &["low", "medium", "high"],
            Self::IdentifierType => &["direct", "indirect"],
            Self::PromptType => &["Zero-Shot", "Few-Shot", "Chain-of-Thought"],
            Self::Domain => &["Medical", "Legal", "Government", "Common"],
            Self::TextLength => &["Short Sentences", "Short Paragraphs", "Long Paragraphs"],
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ============================================================================
// Example Metadata
// ============================================================================

/// Typed metadata record for a gold example.
///
/// Known facets are optional string fields; anything else is kept verbatim
/// in `extra` and never reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExampleMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ExampleMetadata {
    /// Value of a facet, if present
    pub fn get(&self, facet: Facet) -> Option<&str> {
        let value = match facet {
            Facet::RiskLevel => &self.risk_level,
            Facet::IdentifierType => &self.identifier_type,
            Facet::PromptType => &self.prompt_type,
            Facet::Domain => &self.domain,
            Facet::TextLength => &self.text_length,
        };
        value.as_deref()
    }

    /// Value of a facet, or `"unknown"` when absent
    pub fn value_or_unknown(&self, facet: Facet) -> &str {
        self.get(facet).unwrap_or("unknown")
    }

    /// Set a facet value
    pub fn with_facet(mut self, facet: Facet, value: impl Into<String>) -> Self {
        let slot = match facet {
            Facet::RiskLevel => &mut self.risk_level,
            Facet::IdentifierType => &mut self.identifier_type,
            Facet::PromptType => &mut self.prompt_type,
            Facet::Domain => &mut self.domain,
            Facet::TextLength => &mut self.text_length,
        };
        *slot = Some(value.into());
        self
    }

    /// True when at least one known facet is set
    pub fn has_facets(&self) -> bool {
        Facet::ALL.iter().any(|f| self.get(*f).is_some())
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for ExampleMetadata {
    /// Lenient conversion: facet values that are not JSON strings are moved
    /// to `extra` instead of failing the whole record.
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let mut metadata = Self::default();
        for (key, value) in map {
            match (Facet::from_key(&key), value) {
                (Some(facet), serde_json::Value::String(s)) => {
                    metadata = metadata.with_facet(facet, s);
                }
                (_, value) => {
                    metadata.extra.insert(key, value);
                }
            }
        }
        metadata
    }
}

// ============================================================================
// Gold Example / Prediction
// ============================================================================

/// Human-authored reference anonymization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldExample {
    /// Example identifier, joins predictions to gold
    pub id: String,

    /// Reference anonymized text with placeholder tags
    pub gold_text: String,

    /// Original (non-anonymized) text
    pub source_text: String,

    /// Instruction given to the generator, if the corpus carries one
    pub instruction: Option<String>,

    /// Prompt bucket label (e.g. `B-FD-Leg-01`)
    pub bucket: Option<String>,

    pub identifier_class: IdentifierClass,

    pub metadata: ExampleMetadata,
}

impl GoldExample {
    pub fn new(id: impl Into<String>, gold_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            gold_text: gold_text.into(),
            source_text: String::new(),
            instruction: None,
            bucket: None,
            identifier_class: IdentifierClass::default(),
            metadata: ExampleMetadata::default(),
        }
    }

    pub fn with_source(mut self, source_text: impl Into<String>) -> Self {
        self.source_text = source_text.into();
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn with_class(mut self, identifier_class: IdentifierClass) -> Self {
        self.identifier_class = identifier_class;
        self
    }

    pub fn with_metadata(mut self, metadata: ExampleMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Candidate anonymization produced by a system under evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,

    #[serde(rename = "pred")]
    pub pred_text: String,
}

impl Prediction {
    pub fn new(id: impl Into<String>, pred_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pred_text: pred_text.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
