mod chat;
mod config;
mod corpus;
mod error;
mod extract;
mod fetch;
mod finetune;
mod openai;
mod prompt;
mod sift;
mod synth;
mod validate;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing::info;

use crate::error::{Error, Result};

#[derive(Parser)]
#[command(
    name = "sitetune",
    about = "Scrape a website, build chat training data, and fine-tune a model on it"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch configured pages and generate a training corpus
    Scrape {
        /// JSON file with page sources: [{"url": ..., "content_type": ...}]
        #[arg(short, long)]
        sources: Option<PathBuf>,
        /// Corpus output path
        #[arg(short, long, default_value = config::OUTPUT_FILE)]
        output: PathBuf,
        /// Number of Q&A pairs to request
        #[arg(short = 'n', long, default_value_t = config::TRAINING_EXAMPLES)]
        examples: usize,
        /// Generation model
        #[arg(long, default_value = config::GENERATION_MODEL)]
        model: String,
    },
    /// Validate an existing corpus file
    Validate {
        #[arg(short, long, default_value = config::OUTPUT_FILE)]
        corpus: PathBuf,
    },
    /// Upload the corpus and run a supervised fine-tuning job to completion
    Train {
        #[arg(short, long, default_value = config::OUTPUT_FILE)]
        corpus: PathBuf,
        /// Base model to fine-tune
        #[arg(long, default_value = config::TRAINING_MODEL)]
        model: String,
        /// Seconds between job status polls
        #[arg(long, default_value_t = config::POLL_INTERVAL_SECS)]
        poll_interval: u64,
    },
    /// Scrape + fine-tune in one pipeline
    Run {
        /// JSON file with page sources
        #[arg(short, long)]
        sources: Option<PathBuf>,
        /// Corpus output path
        #[arg(short, long, default_value = config::OUTPUT_FILE)]
        output: PathBuf,
        /// Number of Q&A pairs to request
        #[arg(short = 'n', long, default_value_t = config::TRAINING_EXAMPLES)]
        examples: usize,
        /// Generation model
        #[arg(long, default_value = config::GENERATION_MODEL)]
        generation_model: String,
        /// Base model to fine-tune
        #[arg(long, default_value = config::TRAINING_MODEL)]
        model: String,
        /// Seconds between job status polls
        #[arg(long, default_value_t = config::POLL_INTERVAL_SECS)]
        poll_interval: u64,
    },
    /// Chat with a fine-tuned model
    Chat {
        /// Fine-tuned model id (defaults to FINE_TUNED_MODEL)
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scrape {
            sources,
            output,
            examples,
            model,
        } => cmd_scrape(sources, &output, examples, &model).await.map(|_| ()),
        Commands::Validate { corpus } => cmd_validate(&corpus),
        Commands::Train {
            corpus,
            model,
            poll_interval,
        } => cmd_train(&corpus, &model, poll_interval).await,
        Commands::Run {
            sources,
            output,
            examples,
            generation_model,
            model,
            poll_interval,
        } => match cmd_scrape(sources, &output, examples, &generation_model).await {
            Ok(0) => {
                println!("Skipping fine-tuning: no training data was generated.");
                Ok(())
            }
            Ok(_) => cmd_train(&output, &model, poll_interval).await,
            Err(e) => Err(e),
        },
        Commands::Chat { model } => cmd_chat(model).await,
    };

    if let Err(err) = &result {
        if let Some(hint) = hint_for(err) {
            eprintln!("Hint: {hint}");
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result.map_err(Into::into)
}

/// Returns the number of training records written.
async fn cmd_scrape(
    sources_path: Option<PathBuf>,
    output: &std::path::Path,
    examples: usize,
    model: &str,
) -> Result<usize> {
    // Credentials are checked before any network call.
    let client = openai::Client::from_env()?;
    let sources = match sources_path {
        Some(path) => config::load_sources(&path)?,
        None => config::default_sources(),
    };

    println!("Scraping {} pages...", sources.len());
    let fetcher = fetch::HttpFetcher::new()?;
    let (contents, stats) = fetch::scrape_sources(
        &fetcher,
        &sources,
        Duration::from_millis(config::FETCH_DELAY_MS),
    )
    .await?;
    println!(
        "Fetched {} pages ({} ok, {} errors)",
        stats.total, stats.ok, stats.errors
    );

    let content_block = prompt::format_content(&contents);
    info!("requesting {examples} training examples from {model}");
    let synthesis = synth::synthesize(&client, model, &content_block, examples).await?;

    if synthesis.pairs.is_empty() {
        println!("No usable training data was generated; nothing written.");
        return Ok(0);
    }

    let records = corpus::assemble(synthesis.pairs);
    corpus::write_corpus(output, &records)?;
    println!("Saved {} examples to {}", records.len(), output.display());
    println!("Total generation cost: ${:.4}", synthesis.cost);
    Ok(records.len())
}

fn cmd_validate(corpus_path: &std::path::Path) -> Result<()> {
    let valid = validate::validate_corpus(corpus_path)?;
    println!("Validation passed: {valid} valid examples");
    Ok(())
}

async fn cmd_train(corpus_path: &std::path::Path, model: &str, poll_interval: u64) -> Result<()> {
    let client = openai::Client::from_env()?;
    let valid = validate::validate_corpus(corpus_path)?;
    println!("Validation passed: {valid} valid examples");

    println!("Starting supervised fine-tuning of {model}");
    let backend = finetune::HttpBackend::new(client);
    let model_id = finetune::run_fine_tuning(
        &backend,
        corpus_path,
        model,
        Duration::from_secs(poll_interval),
    )
    .await?;

    println!("\n{}", "=".repeat(60));
    println!("Fine-tuning succeeded.");
    println!("Model id: {model_id}");
    println!("Trained on {valid} examples");
    println!("Set FINE_TUNED_MODEL={model_id} to chat with it.");
    Ok(())
}

async fn cmd_chat(model: Option<String>) -> Result<()> {
    let client = openai::Client::from_env()?;
    let model = match model {
        Some(model) => model,
        None => config::fine_tuned_model()?,
    };
    chat::run(&client, &model).await
}

fn hint_for(err: &Error) -> Option<String> {
    match err {
        Error::NotFound(path) => Some(format!(
            "no corpus at {path}; run 'sitetune scrape' first to generate one"
        )),
        Error::Configuration(_) => {
            Some("set the variable in your environment or shell profile".into())
        }
        Error::InsufficientData(_) => {
            Some("scrape more pages or raise --examples so at least 10 valid pairs survive".into())
        }
        _ => None,
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_cover_recognizable_failures() {
        let hint = hint_for(&Error::NotFound("training_data.jsonl".into())).unwrap();
        assert!(hint.contains("sitetune scrape"));

        assert!(hint_for(&Error::Configuration("OPENAI_API_KEY".into())).is_some());
        assert!(hint_for(&Error::InsufficientData(4)).is_some());
        assert!(hint_for(&Error::TrainingCancelled).is_none());
    }

    #[test]
    fn durations_format_for_humans() {
        assert_eq!(format_duration(Duration::from_secs(5)), "5.0s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
