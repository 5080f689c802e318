//! Generator backends
//!
//! OpenAI-compatible chat completions and Ollama `/api/generate`. Both decode
//! greedily by default so repeated runs yield comparable predictions.

use std::time::Duration;

use anon_core::{AnonError, Generator, GeneratorConfig, GeneratorProvider, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::prompt::{extract_response, PromptTemplate};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AnonError::GeneratorError(format!("Failed to build HTTP client: {e}")))
}

// ============================================================================
// OpenAI Generator
// ============================================================================

/// OpenAI-compatible chat completion backend
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    system_prompt: String,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

impl OpenAiGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            model: model.into(),
            temperature: 0.0,
            system_prompt: PromptTemplate::default().system().to_string(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| AnonError::ConfigError("OpenAI API key required".to_string()))?;

        Ok(Self {
            client: build_client(config.timeout_secs)?,
            api_key: api_key.clone(),
            base_url: config
                .openai_base_url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            model: config.model.clone(),
            temperature: config.temperature,
            system_prompt: PromptTemplate::default().system().to_string(),
        })
    }

    fn messages(&self, instruction: &str, input_text: &str) -> Vec<Message> {
        vec![
            Message {
                role: "system".to_string(),
                content: self.system_prompt.clone(),
            },
            Message {
                role: "user".to_string(),
                content: format!("{instruction}\n{input_text}"),
            },
        ]
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(
        &self,
        instruction: &str,
        input_text: &str,
        max_new_tokens: u32,
    ) -> Result<String> {
        let request = OpenAiRequest {
            model: &self.model,
            messages: self.messages(instruction, input_text),
            max_tokens: max_new_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AnonError::GeneratorError(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AnonError::GeneratorError(format!(
                "OpenAI error ({status}): {error_text}"
            )));
        }

        let result: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| AnonError::GeneratorError(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| AnonError::GeneratorError("No response generated".to_string()))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Ollama Generator
// ============================================================================

/// Ollama backend serving a Llama-2 style anonymizer
///
/// Sends the fully rendered `[INST]` prompt with `raw: true` so the server
/// does not apply its own template.
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    template: PromptTemplate,
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    raw: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.0,
            template: PromptTemplate::default(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            template: PromptTemplate::default(),
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(
        &self,
        instruction: &str,
        input_text: &str,
        max_new_tokens: u32,
    ) -> Result<String> {
        let prompt = self.template.render(instruction, input_text);
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "Calling Ollama");

        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            raw: true,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: max_new_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AnonError::GeneratorError(format!("Ollama request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AnonError::GeneratorError(format!(
                "Ollama error ({status}): {error_text}"
            )));
        }

        let result: OllamaResponse = response.json().await.map_err(|e| {
            AnonError::GeneratorError(format!("Failed to parse Ollama response: {e}"))
        })?;

        Ok(extract_response(&result.response).to_string())
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create a generator from config
pub fn create_generator(config: &GeneratorConfig) -> Result<Box<dyn Generator>> {
    match config.provider {
        GeneratorProvider::OpenAI => Ok(Box::new(OpenAiGenerator::from_config(config)?)),
        GeneratorProvider::Ollama => Ok(Box::new(OllamaGenerator::from_config(config)?)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_generator_creation() {
        let generator = OpenAiGenerator::new("test-key", "gpt-4o-mini");
        assert_eq!(generator.name(), "gpt-4o-mini");
        assert_eq!(generator.temperature, 0.0);
    }

    #[test]
    fn test_openai_messages() {
        let generator = OpenAiGenerator::new("k", "m");
        let messages = generator.messages("Anonimizuokite.", "Jonas serga.");

        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.starts_with("Esi paslaugus asistentas"));
        assert_eq!(messages[1].content, "Anonimizuokite.\nJonas serga.");
    }

    #[test]
    fn test_openai_requires_key() {
        let config = GeneratorConfig {
            provider: GeneratorProvider::OpenAI,
            ..Default::default()
        };
        assert!(matches!(
            create_generator(&config),
            Err(AnonError::ConfigError(_))
        ));
    }

    #[test]
    fn test_ollama_request_shape() {
        let request = OllamaRequest {
            model: "lt-llama",
            prompt: PromptTemplate::default().render("i", "t"),
            stream: false,
            raw: true,
            options: OllamaOptions {
                temperature: 0.0,
                num_predict: 2048,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["raw"], true);
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 2048);
        assert!(json["prompt"].as_str().unwrap().starts_with("[INST] <<SYS>>"));
    }

    #[test]
    fn test_ollama_base_url_trimmed() {
        let generator = OllamaGenerator::new("http://localhost:11434/", "lt-llama");
        assert_eq!(generator.base_url, "http://localhost:11434");
        assert_eq!(generator.name(), "lt-llama");
    }

    #[test]
    fn test_create_ollama_from_default_config() {
        let generator = create_generator(&GeneratorConfig::default()).unwrap();
        assert_eq!(generator.name(), "lt-llama-2-13b-anon");
    }
}
