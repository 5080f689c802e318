//! Anon Corpus - Gold and prediction corpus I/O
//!
//! Reads corpora stored either as a single JSON array or as newline-delimited
//! JSON objects. Loading is tolerant: trailing commas are stripped and lines
//! that still fail to parse are skipped with a warning instead of failing the
//! whole file.
//!
//! Each loader returns the typed records together with the list of
//! skip-warnings so callers can report them.

pub mod loader;
pub mod records;
pub mod writer;

pub use loader::{parse_json_records, read_json_records, LoadedCorpus, PositionedValue, SkipWarning};
pub use records::{gold_from_value, load_gold, load_predictions, prediction_from_value};
pub use writer::{write_json_report, write_predictions};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during corpus I/O
#[derive(Error, Debug)]
pub enum CorpusError {
    /// The corpus file could not be read
    #[error("IO error reading corpus: {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be written
    #[error("IO error writing file: {path}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization of output records failed
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for corpus operations
pub type Result<T> = std::result::Result<T, CorpusError>;
