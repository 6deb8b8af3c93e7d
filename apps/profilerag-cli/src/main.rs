use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use profilerag_core::config::{Config, IndexBackend, Settings};
use profilerag_core::corpus::load_corpus;
use profilerag_core::types::{ConfidenceLevel, Document, DocumentMetadata, QueryResponse};
use profilerag_engine::QueryEngine;

const INGEST_BATCH: usize = 32;

#[derive(Parser)]
#[command(name = "profilerag", version, about = "Ask questions about a professional profile")]
struct Cli {
    /// Directory holding config.toml and config.<env>.toml
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Profile JSON file or directory of .txt files (overrides corpus.path)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Print machine-readable JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Embed and index the corpus
    Ingest,
    /// Answer one question
    Ask {
        question: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Answer several questions concurrently
    Batch {
        #[arg(required = true)]
        questions: Vec<String>,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Index size, model and request metrics
    Stats,
    /// Component health report
    Health,
    /// Verify configured backends end to end
    Check,
    /// Drop cached answers and indexed passages
    Clear,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let env_name = std::env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
    let config = Config::load_in(&cli.config_dir, &env_name).context("loading configuration")?;
    let mut settings = config.settings()?;
    if let Some(path) = &cli.corpus {
        settings.corpus.path = Some(path.to_string_lossy().into_owned());
    }
    Ok(settings)
}

async fn ingest(engine: &QueryEngine, documents: Vec<Document>) -> anyhow::Result<usize> {
    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} passages ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let mut indexed = 0usize;
    let mut documents = documents.into_iter().peekable();
    while documents.peek().is_some() {
        let batch: Vec<Document> = documents.by_ref().take(INGEST_BATCH).collect();
        indexed += engine.add_documents(batch).await?;
        pb.set_position(indexed as u64);
    }
    pb.finish_with_message("indexed");
    Ok(indexed)
}

/// Index the corpus when the index is still empty.
async fn ensure_corpus(engine: &QueryEngine, settings: &Settings) -> anyhow::Result<()> {
    if engine.get_stats().await?.total_documents > 0 {
        return Ok(());
    }
    let Some(path) = settings.corpus.path.as_deref() else {
        tracing::warn!("index is empty and corpus.path is not set; answers will report insufficient information");
        return Ok(());
    };
    let documents = load_corpus(Path::new(path))?;
    ingest(engine, documents).await?;
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_response(response: &QueryResponse) {
    let level = ConfidenceLevel::from_score(response.confidence);
    println!("{}\n", response.answer);
    println!("Confidence: {:.0}% ({})", response.confidence * 100.0, level.description());
    for (i, source) in response.sources.iter().enumerate() {
        let preview: String = source.text.chars().take(100).collect();
        println!("  [{}] {:.3}  {}", i + 1, source.score, preview);
    }
}

async fn check(engine: &QueryEngine, settings: &Settings, json: bool) -> anyhow::Result<()> {
    let uri_set = settings.index.uri.as_deref().map(|u| !u.trim().is_empty()).unwrap_or(false);
    let generation_key = settings.generation.resolved_api_key().is_some();
    if !json {
        println!("Embedding backend: {:?}", settings.embedding.backend);
        println!("Index backend:     {:?}{}", settings.index.backend, if settings.index.backend == IndexBackend::Lance { if uri_set { " (uri set)" } else { " (uri missing)" } } else { "" });
        println!("Generation key:    {}", if generation_key { "present" } else { "absent (extraction only)" });
    }

    engine.initialize().await?;
    let metadata = DocumentMetadata { category: Some("test".into()), source: Some("setup_verification".into()), ..DocumentMetadata::default() };
    let doc = Document::new("setup_test", "This is a test document to verify the profile knowledge base setup is working correctly.")
        .with_metadata(metadata);
    engine.add_documents(vec![doc]).await?;
    let result = engine.query("Is the setup working?", None).await?;
    let stats = engine.get_stats().await?;

    if json {
        return print_json(&serde_json::json!({
            "success": true,
            "environment": { "index_uri": uri_set, "generation_key": generation_key },
            "test_result": {
                "answer": result.answer,
                "confidence": (result.confidence * 100.0).round(),
                "sources": result.sources.len(),
            },
            "system_stats": stats,
        }));
    }
    println!("\nSetup verification successful");
    print_response(&result);
    println!("\nDocuments: {}  Model: {}", stats.total_documents, stats.model_name.as_deref().unwrap_or("-"));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    let engine = QueryEngine::from_settings(&settings)?;

    match &cli.command {
        Command::Ingest => {
            let Some(path) = settings.corpus.path.as_deref() else {
                bail!("no corpus configured; pass --corpus or set corpus.path");
            };
            let documents = load_corpus(Path::new(path))?;
            let count = ingest(&engine, documents).await?;
            println!("Indexed {} passages from {}", count, path);
        }
        Command::Ask { question, top_k } => {
            ensure_corpus(&engine, &settings).await?;
            let response = engine.query(question, *top_k).await?;
            if cli.json { print_json(&response)?; } else { print_response(&response); }
        }
        Command::Batch { questions, top_k } => {
            ensure_corpus(&engine, &settings).await?;
            let answers = engine.batch_query(questions, *top_k).await?;
            if cli.json {
                print_json(&answers)?;
            } else {
                for a in &answers {
                    println!("Q: {}", a.question);
                    print_response(&a.response);
                    println!();
                }
            }
        }
        Command::Stats => {
            let stats = engine.get_stats().await?;
            if cli.json {
                print_json(&stats)?;
            } else {
                println!("Documents:     {}", stats.total_documents);
                println!("Initialized:   {}", stats.is_initialized);
                println!("Index backend: {}", stats.index_backend);
                println!("Generation:    {}", if stats.generation_enabled { "enabled" } else { "extraction only" });
                println!("Requests:      {} (avg {} ms, last {} ms)", stats.metrics.request_count, stats.metrics.avg_latency_ms, stats.metrics.last_request_ms);
            }
        }
        Command::Health => {
            if let Err(e) = engine.initialize().await {
                tracing::warn!(error = %e, "initialization failed");
            }
            let report = engine.health().await;
            if cli.json {
                print_json(&report)?;
            } else {
                println!("Status: {:?}", report.status);
                println!("  embeddings:   {}", report.checks.embeddings);
                println!("  vector_store: {}", report.checks.vector_store);
                println!("  cache:        {}", report.checks.cache);
            }
        }
        Command::Check => check(&engine, &settings, cli.json).await?,
        Command::Clear => {
            let outcome = engine.clear_index().await?;
            if cli.json { print_json(&outcome)?; } else { println!("Clear: {:?}", outcome); }
        }
    }
    Ok(())
}
