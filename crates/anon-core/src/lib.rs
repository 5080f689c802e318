//! Anon Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the evaluation
//! workspace:
//! - Gold examples and predictions (the unit of scoring)
//! - Identifier classes and the fixed metadata facet schema
//! - Common error types
//! - The text generator trait implemented by model backends
//! - Configuration management

pub mod config;
pub mod example;

pub use config::{
    AppConfig, ConfigError, EvaluationConfig, GeneratorConfig, GeneratorProvider, LoggingConfig,
    SystemEntry, DEFAULT_ALPHA,
};
pub use example::{ExampleMetadata, Facet, GoldExample, IdentifierClass, Prediction};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for evaluation operations
#[derive(Error, Debug)]
pub enum AnonError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Generator error: {0}")]
    GeneratorError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for AnonError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnonError>;

// ============================================================================
// Traits
// ============================================================================

/// Trait for text generation backends producing candidate anonymizations.
///
/// A generator is an explicitly constructed handle: build it once, call
/// `generate` many times, drop it when done. Scoring never needs one.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    /// Produce an anonymized version of `input_text` following `instruction`
    async fn generate(
        &self,
        instruction: &str,
        input_text: &str,
        max_new_tokens: u32,
    ) -> Result<String>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
