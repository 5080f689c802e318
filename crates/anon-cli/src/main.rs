//! Anon Eval CLI
//!
//! Usage:
//!   anon-eval evaluate --gold gold.jsonl --pred lt_llama.jsonl
//!   anon-eval compare --gold gold.jsonl --system chatgpt=chatgpt.jsonl --system lt_llama=lt_llama.jsonl
//!   anon-eval generate --gold gold.jsonl --output lt_llama.jsonl

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use anon_cli::{
    init_tracing, render_comparison, render_evaluation, require_gold, run_compare, run_evaluate,
    run_generate, CompareOptions, EvaluateOptions, GenerateOptions, OutputFormat,
};
use anon_core::{AppConfig, GeneratorProvider, SystemEntry};

#[derive(Parser)]
#[command(name = "anon-eval")]
#[command(about = "Placeholder-based evaluation of text anonymization systems")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Log per-example diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one prediction file against gold, with facet breakdown
    Evaluate {
        #[arg(long)]
        gold: Option<PathBuf>,

        /// Prediction file (JSON array or JSONL of {"id", "pred"})
        #[arg(long)]
        pred: PathBuf,

        /// Weight of the direct-identifier macro F1 in the composite score
        #[arg(long)]
        alpha: Option<f64>,

        /// Only evaluate the first N gold examples (0 = all)
        #[arg(long)]
        limit: Option<usize>,

        /// Also write the JSON report to this file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Compare several systems against one gold corpus
    Compare {
        #[arg(long)]
        gold: Option<PathBuf>,

        /// System to compare as name=path, repeatable
        #[arg(long = "system")]
        systems: Vec<SystemEntry>,

        #[arg(long)]
        alpha: Option<f64>,

        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Also write the JSON report to this file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Generate predictions for a gold corpus with an LLM backend
    Generate {
        #[arg(long)]
        gold: Option<PathBuf>,

        /// Prediction JSONL to write
        #[arg(long, short)]
        output: PathBuf,

        #[arg(long)]
        provider: Option<GeneratorProvider>,

        #[arg(long)]
        model: Option<String>,

        /// Maximum generations in flight
        #[arg(long)]
        concurrency: Option<usize>,

        #[arg(long)]
        max_new_tokens: Option<u32>,

        #[arg(long)]
        limit: Option<usize>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };
    config
        .with_env_override()
        .context("Invalid environment configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    config.logging.json_format |= cli.log_json;
    init_tracing(&config.logging, cli.verbose)?;

    let evaluation = config.evaluation;

    match cli.command {
        Commands::Evaluate {
            gold,
            pred,
            alpha,
            limit,
            output,
        } => {
            let options = EvaluateOptions {
                gold: require_gold(gold, evaluation.gold_path)?,
                pred,
                alpha: alpha.unwrap_or(evaluation.alpha),
                limit: limit.or(evaluation.limit),
                output,
            };
            let report = run_evaluate(&options)?;
            print!("{}", render_evaluation(&report));
        }
        Commands::Compare {
            gold,
            systems,
            alpha,
            limit,
            format,
            output,
        } => {
            let options = CompareOptions {
                gold: require_gold(gold, evaluation.gold_path)?,
                systems: if systems.is_empty() {
                    evaluation.systems
                } else {
                    systems
                },
                alpha: alpha.unwrap_or(evaluation.alpha),
                limit: limit.or(evaluation.limit),
                output,
            };
            let report = run_compare(&options)?;
            println!("{}", render_comparison(&report, format)?);
        }
        Commands::Generate {
            gold,
            output,
            provider,
            model,
            concurrency,
            max_new_tokens,
            limit,
        } => {
            let mut generator = config.generator;
            if let Some(provider) = provider {
                generator.provider = provider;
            }
            if let Some(model) = model {
                generator.model = model;
            }
            if let Some(concurrency) = concurrency {
                generator.concurrency = concurrency.max(1);
            }
            if let Some(max_new_tokens) = max_new_tokens {
                generator.max_new_tokens = max_new_tokens;
            }

            let options = GenerateOptions {
                gold: require_gold(gold, evaluation.gold_path)?,
                output,
                limit: limit.or(evaluation.limit),
                generator,
            };
            let outcome = run_generate(&options).await?;
            println!(
                "Wrote {} predictions to {} ({} failed)",
                outcome.predictions.len(),
                options.output.display(),
                outcome.failed.len()
            );
        }
    }

    Ok(())
}
