use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use gleaner::config::{AnalysisConfig, Language, Settings};
use gleaner::coordinator::Coordinator;
use gleaner::{corpus, output};

/// Gleaner: frequent-term analysis for document corpora.
///
/// Finds the most frequent significant terms (words or stems) in a set of
/// plain-text documents, optionally fanning per-document work out to a
/// pool of workers.
#[derive(Parser)]
#[command(name = "gleaner", version, about)]
struct Cli {
    /// File or directory of plain-text documents to analyze
    #[arg(short, long)]
    input: PathBuf,

    /// Language of the documents (selects stopword list and stemmer)
    #[arg(short, long, default_value = "english")]
    language: String,

    /// Count stems instead of surface words
    #[arg(long)]
    stem: bool,

    /// Distribute per-document analysis across the worker pool
    #[arg(long = "async")]
    async_mode: bool,

    /// How many terms to show (0 or less shows everything)
    #[arg(long, default_value = "10")]
    top_n: i64,

    /// Override the worker count for this run (default: GLEANER_WORKERS)
    #[arg(long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gleaner=warn")),
        )
        .init();

    let cli = Cli::parse();

    let language = Language::parse(&cli.language)?;
    let config = AnalysisConfig::new(language, cli.stem, cli.top_n, cli.async_mode);

    let mut settings = Settings::load();
    if let Some(workers) = cli.workers {
        settings.workers = workers;
    }

    let documents = corpus::enumerate(&cli.input)?;
    if documents.is_empty() {
        println!("{}", "No documents to analyze.".yellow());
        return Ok(());
    }

    info!(
        documents = documents.len(),
        stem = cli.stem,
        async_mode = cli.async_mode,
        "Analyzing corpus"
    );
    if cli.async_mode {
        println!(
            "Analyzing {} documents across {} workers...",
            documents.len(),
            settings.workers
        );
    } else {
        println!("Analyzing {} documents...", documents.len());
    }

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Analyzing [{bar:30}] {pos}/{len} ({eta})")
            .unwrap(),
    );

    let coordinator = Coordinator::new(config, settings)?;
    let outcome = coordinator
        .run(documents, |progress| {
            pb.set_position(progress.completed as u64);
        })
        .await;
    pb.finish_and_clear();

    match outcome {
        Ok(outcome) => {
            output::terminal::display_ranking(&outcome);
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "Analysis failed:".red().bold(), e);
            Err(e.into())
        }
    }
}
