//! Evaluation Configuration Management
//!
//! Handles configuration from environment variables, config files,
//! and command-line arguments with sensible defaults for local runs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default weight of the direct-identifier macro F1 in the composite score
pub const DEFAULT_ALPHA: f64 = 0.8;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Scoring and corpus configuration
    pub evaluation: EvaluationConfig,

    /// Text generation backend configuration
    pub generator: GeneratorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply every variable `lookup` reports as set, whatever its value
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // Evaluation
        if let Some(alpha) = lookup("ANON_ALPHA") {
            self.evaluation.alpha = parse_var("ANON_ALPHA", alpha)?;
        }
        if let Some(path) = lookup("ANON_GOLD_PATH") {
            self.evaluation.gold_path = Some(PathBuf::from(path));
        }
        if let Some(limit) = lookup("ANON_LIMIT") {
            self.evaluation.limit = Some(parse_var("ANON_LIMIT", limit)?);
        }

        // Generator
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.generator.provider = provider.parse()?;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.generator.openai_api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.generator.openai_base_url = Some(url);
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.generator.ollama_url = url;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.generator.model = model;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let alpha = self.evaluation.alpha;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(ConfigError::InvalidValue {
                key: "evaluation.alpha".to_string(),
                value: alpha.to_string(),
            });
        }
        if self.generator.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "generator.concurrency".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// A named prediction corpus to compare against gold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemEntry {
    /// System name used in reports
    pub name: String,

    /// Path to the system's prediction file
    pub path: PathBuf,
}

impl SystemEntry {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl std::str::FromStr for SystemEntry {
    type Err = ConfigError;

    /// Parse `name=path`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
                Ok(Self::new(name.trim(), path.trim()))
            }
            _ => Err(ConfigError::InvalidValue {
                key: "system".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Composite weight of the direct-identifier macro F1
    pub alpha: f64,

    /// Gold corpus path
    pub gold_path: Option<PathBuf>,

    /// Systems to compare, in report order
    pub systems: Vec<SystemEntry>,

    /// Only evaluate the first N gold examples
    pub limit: Option<usize>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            gold_path: None,
            systems: Vec::new(),
            limit: None,
        }
    }
}

/// Text generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Backend provider to use
    pub provider: GeneratorProvider,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL (for compatible APIs)
    pub openai_base_url: Option<String>,

    /// Ollama server URL
    pub ollama_url: String,

    /// Model name to use
    pub model: String,

    /// Maximum new tokens per generation
    pub max_new_tokens: u32,

    /// Sampling temperature (0.0 keeps decoding greedy)
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum generations in flight
    pub concurrency: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: GeneratorProvider::Ollama,
            openai_api_key: None,
            openai_base_url: None,
            ollama_url: "http://localhost:11434".to_string(),
            model: "lt-llama-2-13b-anon".to_string(),
            max_new_tokens: 2048,
            temperature: 0.0,
            timeout_secs: 300,
            concurrency: 4,
        }
    }
}

/// Supported generator providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorProvider {
    OpenAI,
    Ollama,
}

impl std::str::FromStr for GeneratorProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::InvalidValue {
                key: "LLM_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
