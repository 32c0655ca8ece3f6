//! Command-line interface.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::AppConfig;
use crate::engine::MatchEngine;
use crate::ingest;
use crate::llm::extract::{HeuristicExtractor, LlmExtractor, ProfileExtractor};
use crate::llm::groq::{GroqClient, GroqScorer};
use crate::llm::evaluate_candidates;
use crate::search::fusion::SearchOptions;
use crate::storage::CandidateStore;

const API_KEY_VAR: &str = "GROQ_API_KEY";

#[derive(Parser)]
#[command(name = "matchpoint", version, about = "Hybrid resume retrieval and ranking")]
pub struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest resume exports, then rebuild the search indices.
    Ingest {
        /// Directory of exports; defaults to the configured data dir.
        #[arg(value_name = "DIR")]
        data_dir: Option<PathBuf>,

        /// Use heuristic profile extraction instead of the LLM.
        #[arg(long)]
        offline: bool,
    },

    /// Rebuild the search indices from stored candidates.
    Rebuild,

    /// Search candidates with a free-text query.
    Search {
        query: String,

        /// Maximum fused hits to return.
        #[arg(long)]
        top_k: Option<usize>,

        /// RRF smoothing constant.
        #[arg(long)]
        rrf_k: Option<usize>,

        /// Role filter; repeatable, case-insensitive substring match.
        #[arg(long = "role", value_name = "ROLE")]
        roles: Vec<String>,

        /// Score each matching candidate with the LLM after retrieval.
        #[arg(long)]
        evaluate: bool,

        /// Emit JSON instead of human-readable output.
        #[arg(long)]
        json: bool,
    },

    /// Show store and index status.
    Status {
        #[arg(long)]
        json: bool,
    },
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&config_path)?;

    match cli.command {
        Commands::Ingest { data_dir, offline } => {
            cmd_ingest(&config, data_dir, offline)
        }
        Commands::Rebuild => cmd_rebuild(&config),
        Commands::Search {
            query,
            top_k,
            rrf_k,
            roles,
            evaluate,
            json,
        } => cmd_search(&config, &query, top_k, rrf_k, roles, evaluate, json),
        Commands::Status { json } => cmd_status(&config, json),
    }
}

fn open_store(config: &AppConfig) -> anyhow::Result<CandidateStore> {
    CandidateStore::open(&config.system.database_path).context("opening candidate store")
}

fn cmd_ingest(config: &AppConfig, data_dir: Option<PathBuf>, offline: bool) -> anyhow::Result<()> {
    let data_dir = data_dir.unwrap_or_else(|| config.system.data_dir.clone());
    let store = open_store(config)?;

    let extractor: Box<dyn ProfileExtractor> = match api_key() {
        Some(key) if !offline => {
            let client = GroqClient::new(&config.llm.api_base, key)?;
            Box::new(LlmExtractor::new(
                client,
                &config.llm.extraction_model,
                config.llm.temperature,
                config.llm.max_tokens,
            ))
        }
        _ => {
            if !offline {
                info!("{API_KEY_VAR} not set; using heuristic profile extraction");
            }
            Box::new(HeuristicExtractor)
        }
    };

    let report = ingest::ingest_dir(&data_dir, &store, extractor.as_ref())?;
    println!(
        "Ingested {} candidate(s) from {} file(s) ({} skipped)",
        report.candidates_stored, report.files_processed, report.files_skipped
    );

    let engine = MatchEngine::new(&config.system.index_dir);
    let chunks = engine.rebuild(&store)?;
    println!("Indexed {chunks} chunk(s)");
    Ok(())
}

fn cmd_rebuild(config: &AppConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let engine = MatchEngine::new(&config.system.index_dir);
    let chunks = engine.rebuild(&store)?;
    println!("Indexed {chunks} chunk(s) from {} candidate(s)", store.count()?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_search(
    config: &AppConfig,
    query: &str,
    top_k: Option<usize>,
    rrf_k: Option<usize>,
    roles: Vec<String>,
    evaluate: bool,
    json: bool,
) -> anyhow::Result<()> {
    let engine = MatchEngine::new(&config.system.index_dir);
    if !engine.load() {
        // Fall back to rebuilding from the store; an empty store leaves the
        // engine not-ready and the search call reports that cleanly.
        let store = open_store(config)?;
        engine.rebuild(&store)?;
    }

    let opts = SearchOptions {
        top_k: top_k.unwrap_or(config.retrieval.top_k_chunks),
        rrf_k: rrf_k.unwrap_or(config.retrieval.rrf_k),
        target_roles: roles,
    };
    let hits = engine.search(query, &opts)?;

    if evaluate {
        let Some(key) = api_key() else {
            bail!("--evaluate requires {API_KEY_VAR} to be set");
        };
        let client = GroqClient::new(&config.llm.api_base, key)?;
        let scorer = GroqScorer::new(
            client,
            &config.llm.reasoning_model,
            config.llm.temperature,
            config.llm.max_tokens,
        );
        let evaluations = evaluate_candidates(&scorer, query, &hits)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&evaluations)?);
        } else {
            for eval in &evaluations {
                let role = eval.role.as_deref().unwrap_or("Unknown");
                println!("{:>3}  {} ({role})", eval.score, eval.name);
                if !eval.rationale.is_empty() {
                    println!("     {}", eval.rationale);
                }
            }
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else if hits.is_empty() {
        println!("No matches.");
    } else {
        for hit in &hits {
            let role = if hit.owner_role.is_empty() { "Unknown" } else { &hit.owner_role };
            println!("[{:.4}] {} ({role})", hit.score, hit.owner_name);
            for line in hit.text.lines().take(3) {
                println!("    {line}");
            }
        }
    }
    Ok(())
}

fn cmd_status(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let engine = MatchEngine::new(&config.system.index_dir);
    engine.load();
    let stats = engine.stats();

    if json {
        let status = serde_json::json!({
            "candidates": store.count()?,
            "index": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("Candidates: {}", store.count()?);
        println!("Index ready: {}", stats.ready);
        println!("Indexed chunks: {}", stats.chunk_count);
        println!("Embedder: {}", stats.embedder_id);
        if let Some(built_at) = stats.built_at {
            println!("Built at: {built_at}");
        }
    }
    Ok(())
}

fn api_key() -> Option<String> {
    std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty())
}
