//! Batch prediction generation over a gold corpus

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use anon_core::{GoldExample, Generator, Prediction};

use crate::prompt::{prepare_input, PromptKind};

/// Batch generation settings
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Maximum generations in flight
    pub concurrency: usize,
    pub max_new_tokens: u32,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_new_tokens: 2048,
        }
    }
}

/// Predictions in gold order plus the ids whose generation failed
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub predictions: Vec<Prediction>,
    pub failed: Vec<String>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.predictions.len() - self.failed.len()
    }
}

/// Instruction and input text for a gold example.
///
/// A bucket label decides the prompting strategy; without one, the corpus
/// instruction is used if present, otherwise the medical default.
pub fn prompt_for(example: &GoldExample) -> (String, String) {
    match (&example.bucket, &example.instruction) {
        (Some(bucket), _) => {
            let (instruction, input) = prepare_input(bucket, &example.source_text);
            (instruction.to_string(), input)
        }
        (None, Some(instruction)) => (instruction.clone(), example.source_text.clone()),
        (None, None) => (
            PromptKind::MedicalZeroShot.instruction().to_string(),
            example.source_text.clone(),
        ),
    }
}

/// Generate one prediction per gold example.
///
/// Up to `options.concurrency` calls run at once. A failed call is logged and
/// recorded as an empty prediction, so it is penalized rather than dropped.
pub async fn generate_predictions(
    generator: &dyn Generator,
    gold: &[GoldExample],
    options: BatchOptions,
) -> BatchOutcome {
    info!(
        backend = generator.name(),
        examples = gold.len(),
        concurrency = options.concurrency,
        "Generating predictions"
    );

    let mut results: Vec<(usize, Option<String>)> = stream::iter(gold.iter().enumerate())
        .map(|(idx, example)| async move {
            let (instruction, input) = prompt_for(example);
            match generator
                .generate(&instruction, &input, options.max_new_tokens)
                .await
            {
                Ok(text) => {
                    debug!(id = %example.id, chars = text.chars().count(), "Generated prediction");
                    (idx, Some(text))
                }
                Err(e) => {
                    warn!(id = %example.id, error = %e, "Generation failed, recording empty prediction");
                    (idx, None)
                }
            }
        })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;

    // Completion order is arbitrary
    results.sort_by_key(|(idx, _)| *idx);

    let mut outcome = BatchOutcome::default();
    for (idx, text) in results {
        let id = gold[idx].id.clone();
        if text.is_none() {
            outcome.failed.push(id.clone());
        }
        outcome
            .predictions
            .push(Prediction::new(id, text.unwrap_or_default()));
    }

    info!(
        generated = outcome.succeeded(),
        failed = outcome.failed.len(),
        "Generation finished"
    );
    outcome
}
