//! Anon Generator - Candidate anonymization producers
//!
//! Builds prompts for an instruction-tuned anonymizer, calls a model backend
//! through the [`anon_core::Generator`] trait and writes one prediction per
//! gold example. Scoring never depends on this crate.

pub mod batch;
pub mod client;
pub mod prompt;

pub use batch::{generate_predictions, prompt_for, BatchOptions, BatchOutcome};
pub use client::{create_generator, OllamaGenerator, OpenAiGenerator};
pub use prompt::{extract_response, prepare_input, PromptKind, PromptTemplate};
