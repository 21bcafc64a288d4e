//! chatsent CLI
//! ------------
//! `clean`   export.json -> cleaned_chat_data.json + query_counts.json
//! `analyze` cleaned data -> sentiment labels -> charts + report.html
//! `run`     both, in one go
//!
//! Console logging follows `RUST_LOG` (default `info`).

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use chatsent::classifier::{Classifier, LexiconClassifier, RemoteClassifier, RemoteConfig};
use chatsent::clean::{self, CleaningOutput};
use chatsent::model::{CleanedMessage, QueryCount};
use chatsent::render::{render_all, RenderInput};
use chatsent::sentiment::{analyze, default_trend_start, AnalyzeOptions};

// ================================
// CLI + Config
// ================================

#[derive(Debug, Parser)]
#[command(name = "chatsent", version, about = "Chat-log cleaning, chunked sentiment labelling and charts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Normalize, deduplicate and filter the human messages of an export
    Clean {
        /// Chat export: JSON object of client id -> list of turns
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        #[arg(long, value_name = "FILE", default_value = "cleaned_chat_data.json")]
        output: PathBuf,

        /// Query frequencies counted before deduplication
        #[arg(long, value_name = "FILE", default_value = "query_counts.json")]
        counts: PathBuf,
    },

    /// Label cleaned messages and render charts
    Analyze {
        #[arg(long, value_name = "FILE", default_value = "cleaned_chat_data.json")]
        cleaned: PathBuf,

        #[arg(long, value_name = "FILE", default_value = "query_counts.json")]
        counts: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Clean then analyze
    Run {
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ClassifierKind {
    /// Offline word-list scoring
    Lexicon,
    /// Hugging Face style inference endpoint
    Remote,
}

#[derive(Debug, Args)]
struct AnalysisArgs {
    /// Output directory (charts + report.html)
    #[arg(long, value_name = "DIR", default_value = "./out")]
    out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = ClassifierKind::Lexicon)]
    classifier: ClassifierKind,

    /// Inference endpoint URL (overrides --model)
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Model id on the Hugging Face inference API
    #[arg(long, default_value = "distilbert-base-uncased-finetuned-sst-2-english")]
    model: String,

    /// Characters per chunk sent to the classifier; capped at --model-max-chars
    #[arg(long, default_value_t = chatsent::DEFAULT_MAX_CHUNK_CHARS)]
    max_chunk_chars: usize,

    /// Input ceiling of the classifier model, in characters
    #[arg(long, default_value_t = chatsent::DEFAULT_MAX_CHUNK_CHARS)]
    model_max_chars: usize,

    /// Parallel classifier calls (default: available cores)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Max attempts per remote call
    #[arg(long, default_value_t = 3)]
    max_retries: usize,

    /// Remote request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_seconds: u64,

    /// Synthetic date of the first message in the trend chart
    #[arg(long, value_name = "YYYY-MM-DD")]
    trend_start: Option<NaiveDate>,

    #[arg(long, default_value_t = false)]
    no_progress: bool,
}

#[derive(Debug, Clone)]
struct Config {
    run_id: String,
    out_dir: PathBuf,
    classifier: ClassifierKind,
    remote: RemoteConfig,
    options: AnalyzeOptions,
}

impl Config {
    fn from_args(args: AnalysisArgs) -> Self {
        let mut remote = RemoteConfig::for_model(&args.model);
        if let Some(endpoint) = args.endpoint {
            remote.endpoint = endpoint;
        }
        remote.max_retries = args.max_retries;
        remote.timeout = Duration::from_secs(args.timeout_seconds);
        remote.max_chars = args.model_max_chars.max(1);
        // loads variables from .env if present
        dotenvy::dotenv().ok();
        remote.token = std::env::var("HF_API_TOKEN").ok().filter(|t| !t.is_empty());

        let mut options = AnalyzeOptions {
            max_chunk_chars: args.max_chunk_chars.min(remote.max_chars).max(1),
            trend_start: args.trend_start.unwrap_or_else(default_trend_start),
            show_progress: !args.no_progress,
            ..AnalyzeOptions::default()
        };
        if let Some(c) = args.concurrency {
            options.concurrency = c.max(1);
        }

        Self {
            run_id: Uuid::new_v4().to_string(),
            out_dir: args.out_dir,
            classifier: args.classifier,
            remote,
            options,
        }
    }

    fn build_classifier(&self) -> Result<Box<dyn Classifier>> {
        Ok(match self.classifier {
            ClassifierKind::Lexicon => {
                Box::new(LexiconClassifier::new().with_max_chars(self.remote.max_chars))
            }
            ClassifierKind::Remote => Box::new(RemoteClassifier::new(self.remote.clone())?),
        })
    }
}

// ================================
// Stages
// ================================

fn clean_to_files(input: &Path, output: &Path, counts: &Path) -> Result<CleaningOutput> {
    let export = clean::load_export(input)?;
    let cleaned = clean::clean_export(&export);
    if cleaned.messages.is_empty() {
        warn!("No messages survived cleaning.");
    }
    clean::write_cleaned(output, &cleaned.messages)?;
    clean::write_query_counts(counts, &cleaned.query_counts)?;
    Ok(cleaned)
}

fn analyze_and_render(messages: &[CleanedMessage], query_counts: &[QueryCount], cfg: &Config) -> Result<()> {
    info!("🆔 Run ID: {}", cfg.run_id);
    let classifier = cfg.build_classifier()?;
    info!(
        "⚙️  Classifier={}, MaxChunkChars={}, Concurrency={}",
        classifier.name(),
        cfg.options.max_chunk_chars,
        cfg.options.concurrency
    );

    let report = analyze(messages, classifier.as_ref(), &cfg.options)?;
    let outputs = render_all(
        &cfg.out_dir,
        &RenderInput { messages, query_counts, report: &report, run_id: &cfg.run_id },
    )?;

    info!("📦 Report: {}", outputs.report.display());
    info!("✅ All done.");
    Ok(())
}

fn read_counts_or_recount(path: &Path, messages: &[CleanedMessage]) -> Result<Vec<QueryCount>> {
    if path.exists() {
        return clean::read_query_counts(path);
    }
    warn!(
        "{} not found; counting over deduplicated messages, every query will have count 1",
        path.display()
    );
    Ok(clean::count_queries(messages.iter().map(|m| m.message.as_str())))
}

// ================================
// Main
// ================================

fn main() -> Result<()> {
    // ---- Logging setup ----
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Clean { input, output, counts } => {
            clean_to_files(&input, &output, &counts)?;
            info!("✅ Cleaned data written to {}", output.display());
        }
        Command::Analyze { cleaned, counts, analysis } => {
            let messages = clean::read_cleaned(&cleaned).context("Cannot analyze without cleaned data")?;
            let query_counts = read_counts_or_recount(&counts, &messages)?;
            let cfg = Config::from_args(analysis);
            analyze_and_render(&messages, &query_counts, &cfg)?;
        }
        Command::Run { input, analysis } => {
            let cfg = Config::from_args(analysis);
            let cleaned = clean_to_files(
                &input,
                &cfg.out_dir.join("cleaned_chat_data.json"),
                &cfg.out_dir.join("query_counts.json"),
            )?;
            analyze_and_render(&cleaned.messages, &cleaned.query_counts, &cfg)?;
        }
    }
    Ok(())
}
