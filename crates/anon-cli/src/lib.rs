//! Anon CLI - command implementations behind the `anon-eval` binary
//!
//! Each command takes fully resolved options (config file, environment and
//! flags already merged) so the binary stays a thin argument parser.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use anon_core::{ConfigError, GeneratorConfig, GoldExample, LoggingConfig, Prediction, SystemEntry};
use anon_generator::{create_generator, generate_predictions, prompt_for, BatchOptions, BatchOutcome};
use anon_scoring::{
    ComparisonReport, CompositeScorer, CorpusReport, MultiSystemRunner, SystemPredictions,
};

// ============================================================================
// Logging
// ============================================================================

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level; `verbose` raises the default
/// to `debug` so per-example diagnostics show up.
pub fn init_tracing(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let installed = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))
}

// ============================================================================
// Options
// ============================================================================

/// How `compare` prints its result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Debug, Clone)]
pub struct EvaluateOptions {
    pub gold: PathBuf,
    pub pred: PathBuf,
    pub alpha: f64,
    pub limit: Option<usize>,
    /// Write the JSON report here as well as printing the summary
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub gold: PathBuf,
    pub systems: Vec<SystemEntry>,
    pub alpha: f64,
    pub limit: Option<usize>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub gold: PathBuf,
    pub output: PathBuf,
    pub limit: Option<usize>,
    pub generator: GeneratorConfig,
}

/// Gold path from flag or config, required by every command
pub fn require_gold(flag: Option<PathBuf>, configured: Option<PathBuf>) -> Result<PathBuf> {
    flag.or(configured)
        .ok_or_else(|| ConfigError::MissingRequired("gold corpus path (--gold)".to_string()))
        .map_err(Into::into)
}

// ============================================================================
// Loading
// ============================================================================

/// Load the gold corpus. Any failure to read it is fatal. A limit of 0
/// keeps every example.
pub fn load_gold_examples(path: &Path, limit: Option<usize>) -> Result<Vec<GoldExample>> {
    let corpus = anon_corpus::load_gold(path)
        .with_context(|| format!("Failed to load gold corpus {}", path.display()))?;

    let mut gold = corpus.into_records();
    if let Some(limit) = limit.filter(|&n| n > 0) {
        gold.truncate(limit);
    }
    if gold.is_empty() {
        warn!(path = %path.display(), "Gold corpus has no usable examples");
    }
    Ok(gold)
}

/// Load one system's predictions. An unreadable file is reported and the
/// system is scored as if every prediction were empty.
pub fn load_system_predictions(name: &str, path: &Path) -> Vec<Prediction> {
    match anon_corpus::load_predictions(path) {
        Ok(corpus) => corpus.into_records(),
        Err(e) => {
            warn!(system = name, path = %path.display(), error = %e, "Prediction file unavailable, scoring as empty");
            Vec::new()
        }
    }
}

fn log_examples(gold: &[GoldExample], predictions: &[Prediction]) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    for example in gold {
        let prediction = predictions
            .iter()
            .rev()
            .find(|p| p.id == example.id)
            .map(|p| p.pred_text.as_str());
        let (instruction, input) = prompt_for(example);
        debug!(
            id = %example.id,
            instruction = %example.instruction.as_deref().unwrap_or(&instruction),
            input = %input,
            prediction = prediction.unwrap_or("<missing>"),
            reference = %example.gold_text,
            "Example"
        );
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Score one prediction file against gold
pub fn run_evaluate(options: &EvaluateOptions) -> Result<CorpusReport> {
    let scorer = CompositeScorer::new(options.alpha)?;
    let gold = load_gold_examples(&options.gold, options.limit)?;
    let predictions = load_system_predictions("prediction", &options.pred);

    log_examples(&gold, &predictions);

    let report = MultiSystemRunner::new(gold, scorer).evaluate(&predictions);
    info!(
        examples = report.num_examples,
        macro_f1 = report.macro_f1,
        composite = report.composite,
        "Evaluation complete"
    );

    if let Some(output) = &options.output {
        anon_corpus::write_json_report(output, &report)
            .with_context(|| format!("Failed to write report {}", output.display()))?;
    }
    Ok(report)
}

/// Score every configured system against one gold corpus
pub fn run_compare(options: &CompareOptions) -> Result<ComparisonReport> {
    if options.systems.is_empty() {
        return Err(ConfigError::MissingRequired("at least one --system name=path".to_string()).into());
    }

    let scorer = CompositeScorer::new(options.alpha)?;
    let gold = load_gold_examples(&options.gold, options.limit)?;

    let systems: Vec<SystemPredictions> = options
        .systems
        .iter()
        .map(|entry| {
            SystemPredictions::new(
                entry.name.clone(),
                load_system_predictions(&entry.name, &entry.path),
            )
        })
        .collect();

    let report = MultiSystemRunner::new(gold, scorer).run(&systems);

    if let Some(output) = &options.output {
        anon_corpus::write_json_report(output, &report)
            .with_context(|| format!("Failed to write report {}", output.display()))?;
    }
    Ok(report)
}

/// Generate predictions for the gold corpus with the configured backend
pub async fn run_generate(options: &GenerateOptions) -> Result<BatchOutcome> {
    let gold = load_gold_examples(&options.gold, options.limit)?;
    let generator = create_generator(&options.generator).context("Failed to create generator")?;

    let outcome = generate_predictions(
        generator.as_ref(),
        &gold,
        BatchOptions {
            concurrency: options.generator.concurrency,
            max_new_tokens: options.generator.max_new_tokens,
        },
    )
    .await;

    anon_corpus::write_predictions(&options.output, &outcome.predictions)
        .with_context(|| format!("Failed to write predictions {}", options.output.display()))?;
    Ok(outcome)
}

/// Render a comparison for stdout
pub fn render_comparison(report: &ComparisonReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize comparison")
        }
        OutputFormat::Table => Ok(report.render_table()),
    }
}

/// Render a single-system report for stdout
pub fn render_evaluation(report: &CorpusReport) -> String {
    let mut out = report.summary();
    if let Some(breakdown) = &report.breakdown {
        out.push('\n');
        out.push_str(&breakdown.render());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_gold_prefers_flag() {
        let gold = require_gold(Some("a.jsonl".into()), Some("b.jsonl".into())).unwrap();
        assert_eq!(gold, PathBuf::from("a.jsonl"));
        assert_eq!(
            require_gold(None, Some("b.jsonl".into())).unwrap(),
            PathBuf::from("b.jsonl")
        );
        assert!(require_gold(None, None).is_err());
    }

    #[test]
    fn test_missing_prediction_file_is_empty() {
        let preds = load_system_predictions("x", Path::new("/nonexistent/preds.jsonl"));
        assert!(preds.is_empty());
    }

    #[test]
    fn test_compare_requires_systems() {
        let options = CompareOptions {
            gold: "gold.jsonl".into(),
            systems: vec![],
            alpha: 0.8,
            limit: None,
            output: None,
        };
        let err = run_compare(&options).unwrap_err();
        assert!(err.to_string().contains("--system"));
    }
}
