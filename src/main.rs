//! Memweave - staged multi-lens synthesis of daily transcripts
//!
//! Command-line entry point. Scheduling is left to the caller (cron, a
//! systemd timer); exit status 2 means there was no transcript to process.

use anyhow::Result;
use clap::{Parser, Subcommand};
use memweave::{
    config::MemweaveConfig,
    pipeline::Pipeline,
    store::{FileStageStore, Stage, StageStore},
    transcript::{
        validate_date, Chunker, FileTranscriptSource, MarkerScanner, Transcript, TranscriptSource,
    },
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status when the requested date has no transcript
const EXIT_INPUT_MISSING: i32 = 2;

#[derive(Parser)]
#[command(name = "memweave")]
#[command(author = "Memweave Team")]
#[command(version)]
#[command(about = "Staged multi-lens synthesis of daily transcripts into memory updates")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MEMWEAVE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for a date
    Process {
        /// Date key (YYYY-MM-DD), defaults to today
        date: Option<String>,
    },

    /// Run the pipeline again, overwriting earlier artifacts
    Reprocess {
        /// Date key (YYYY-MM-DD)
        date: String,
    },

    /// Print a persisted stage artifact
    Show {
        /// Date key (YYYY-MM-DD)
        date: String,

        /// significance, patterns, contradictions, compression, synthesis or full
        stage: Stage,
    },

    /// Preview chunking and markers without inference
    Chunks {
        /// Date key (YYYY-MM-DD)
        date: String,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("memweave={}", log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    // Load configuration
    let config = match &cli.config {
        Some(path) => MemweaveConfig::from_file(path)?,
        None => MemweaveConfig::default(),
    };

    match cli.command {
        Commands::Process { date } => {
            let date = date.unwrap_or_else(today);
            run_pipeline(&config, &date, false).await?;
        }
        Commands::Reprocess { date } => {
            run_pipeline(&config, &date, true).await?;
        }
        Commands::Show { date, stage } => {
            show_stage(&config, &date, stage).await?;
        }
        Commands::Chunks { date } => {
            preview_chunks(&config, &date).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

async fn run_pipeline(config: &MemweaveConfig, date: &str, rerun: bool) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let outcome = if rerun {
        pipeline.reprocess(date).await
    } else {
        pipeline.process(date).await
    };

    match outcome {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) if e.is_input_missing() => {
            eprintln!("{}", e);
            std::process::exit(EXIT_INPUT_MISSING);
        }
        Err(e) => Err(e.into()),
    }
}

async fn show_stage(config: &MemweaveConfig, date: &str, stage: Stage) -> Result<()> {
    validate_date(date)?;
    let store = FileStageStore::new(config.storage.agents_dir.clone()).await?;

    match store.get(date, stage).await? {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        None => anyhow::bail!("No {} artifact for {}", stage, date),
    }
}

async fn preview_chunks(config: &MemweaveConfig, date: &str) -> Result<()> {
    validate_date(date)?;
    let source = FileTranscriptSource::new(config.storage.raw_dir.clone());

    let Some(text) = source.load(date).await? else {
        eprintln!("No transcript found for {}", date);
        std::process::exit(EXIT_INPUT_MISSING);
    };

    let transcript = Transcript::parse(date, text);
    let chunks = Chunker::new(config.pipeline.chunk_size).split(&transcript);
    let markers = MarkerScanner::new(&config.pipeline.marker_phrases).scan(&transcript, &chunks);

    println!(
        "{}: {} blocks, {} bytes, {} chunks (budget {} bytes)",
        date,
        transcript.blocks().len(),
        transcript.text().len(),
        chunks.len(),
        config.pipeline.chunk_size
    );
    for chunk in &chunks {
        println!(
            "  chunk {:>3}  blocks {:>4}..{:<4}  {:>7} bytes",
            chunk.index,
            chunk.blocks.start,
            chunk.blocks.end,
            chunk.text.len()
        );
    }

    if !markers.is_empty() {
        println!();
        println!("Markers:");
        for marker in &markers {
            println!(
                "  block {:>4} (chunk {}) {}: \"{}\"",
                marker.block_index,
                marker.chunk_index,
                marker.speaker.as_deref().unwrap_or("-"),
                marker.phrase
            );
        }
    }

    Ok(())
}

fn show_config(config: Option<&MemweaveConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
