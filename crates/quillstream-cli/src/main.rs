#![deny(unsafe_code)]

//! Quillstream CLI — command-line surface for the completion subsystem.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quillstream_config::AppConfig;
use quillstream_core::Orchestrator;
use quillstream_core::context::build_flat_context;
use quillstream_core::knowledge::{CrossTabSnippet, KnowledgeEntry};
use quillstream_core::store::{AppConfigStore, StaticContextStore};
use quillstream_core::token::{estimate_tokens, format_token_count};
use quillstream_core::types::TextAction;

/// Quillstream — context-aware AI completion and text transformation.
#[derive(Parser)]
#[command(name = "quillstream", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "quillstream.toml")]
    config: PathBuf,

    /// Path to a knowledge file (entries and snippets, TOML).
    #[arg(short, long, default_value = "knowledge.toml")]
    knowledge: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest a completion for in-progress text.
    Complete {
        /// The text being written.
        input: String,
    },

    /// Transform a text selection.
    Transform {
        /// Action: polish, correct, simplify, expand, translate, or custom.
        #[arg(value_parser = parse_text_action)]
        action: TextAction,

        /// The text to transform.
        text: String,

        /// Instruction for the custom action.
        #[arg(long)]
        prompt: Option<String>,
    },

    /// Ask the assistant a one-shot question.
    Quick {
        /// The prompt.
        prompt: String,
    },

    /// Preview the assembled flat context under the token budget.
    Context {
        /// Optional in-progress input (measured, not included).
        #[arg(default_value = "")]
        input: String,
    },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

fn parse_text_action(s: &str) -> Result<TextAction, String> {
    s.parse()
}

/// Effective log filter: verbosity flags override the configured level.
fn log_filter<'a>(verbose: u8, configured_level: &'a str) -> &'a str {
    match verbose {
        0 => configured_level,
        1 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config).await?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(log_filter(cli.verbose, &config.logging.level))
            }),
        )
        .init();

    match cli.command {
        Commands::Complete { input } => cmd_complete(config, &cli.knowledge, &input).await?,
        Commands::Transform {
            action,
            text,
            prompt,
        } => cmd_transform(config, &cli.knowledge, action, &text, prompt.as_deref()).await?,
        Commands::Quick { prompt } => cmd_quick(config, &cli.knowledge, &prompt).await?,
        Commands::Context { input } => cmd_context(&config, &cli.knowledge, &input).await?,
        Commands::Config { show } => cmd_config(&config, &cli.config, show)?,
    }

    Ok(())
}

/// Knowledge file schema: curated entries and collected snippets.
#[derive(Debug, Default, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    entries: Vec<KnowledgeEntry>,
    #[serde(default)]
    snippets: Vec<CrossTabSnippet>,
}

async fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::load(path).await.map_err(|e| anyhow::anyhow!(e))
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(AppConfig::default())
    }
}

async fn load_knowledge(path: &Path) -> Result<KnowledgeFile> {
    if !path.exists() {
        info!(path = %path.display(), "Knowledge file not found, starting empty");
        return Ok(KnowledgeFile::default());
    }
    let content = tokio::fs::read_to_string(path).await?;
    let file: KnowledgeFile = toml::from_str(&content)?;
    info!(
        entries = file.entries.len(),
        snippets = file.snippets.len(),
        "loaded knowledge file"
    );
    Ok(file)
}

async fn build_orchestrator(config: AppConfig, knowledge_path: &Path) -> Result<Orchestrator> {
    let knowledge = load_knowledge(knowledge_path).await?;
    let wait = Duration::from_secs(config.request.wait_timeout_secs);

    Ok(Orchestrator::new(
        Arc::new(AppConfigStore::new(config)),
        Arc::new(StaticContextStore::new(
            knowledge.entries,
            knowledge.snippets,
        )),
        wait,
    ))
}

async fn cmd_complete(config: AppConfig, knowledge_path: &Path, input: &str) -> Result<()> {
    let orchestrator = build_orchestrator(config, knowledge_path).await?;
    let envelope = orchestrator.complete_with_timeout(input).await;
    match envelope.result {
        Some(result) if envelope.success => {
            println!("{result}");
            Ok(())
        }
        _ => anyhow::bail!(
            "completion failed: {}",
            envelope.error.unwrap_or_else(|| "no output".to_string())
        ),
    }
}

async fn cmd_transform(
    config: AppConfig,
    knowledge_path: &Path,
    action: TextAction,
    text: &str,
    prompt: Option<&str>,
) -> Result<()> {
    let orchestrator = build_orchestrator(config, knowledge_path).await?;
    let envelope = orchestrator.process_text(action, text, prompt).await;
    match envelope.result {
        Some(result) if envelope.success => {
            println!("{result}");
            Ok(())
        }
        _ => anyhow::bail!(
            "{action} failed: {}",
            envelope.error.unwrap_or_else(|| "no output".to_string())
        ),
    }
}

async fn cmd_quick(config: AppConfig, knowledge_path: &Path, prompt: &str) -> Result<()> {
    let orchestrator = build_orchestrator(config, knowledge_path).await?;
    let envelope = orchestrator.quick_prompt(prompt).await;
    match envelope.result {
        Some(result) if envelope.success => {
            println!("{result}");
            Ok(())
        }
        _ => anyhow::bail!(
            "quick prompt failed: {}",
            envelope.error.unwrap_or_else(|| "no output".to_string())
        ),
    }
}

async fn cmd_context(config: &AppConfig, knowledge_path: &Path, input: &str) -> Result<()> {
    let knowledge = load_knowledge(knowledge_path).await?;

    let enabled_entries: Vec<_> = knowledge
        .entries
        .into_iter()
        .filter(|e| e.enabled)
        .collect();
    let enabled_snippets: Vec<_> = knowledge
        .snippets
        .into_iter()
        .filter(|s| s.enabled)
        .collect();

    let context = build_flat_context(
        input,
        &enabled_entries,
        &enabled_snippets,
        config.request.context_budget_tokens,
    );

    if context.is_empty() {
        println!("(no enabled context)");
    } else {
        println!("{context}");
        println!();
        println!(
            "-- {} (budget {})",
            format_token_count(estimate_tokens(&context)),
            format_token_count(config.request.context_budget_tokens)
        );
    }
    Ok(())
}

fn cmd_config(config: &AppConfig, config_path: &Path, show: bool) -> Result<()> {
    if show {
        let toml_str =
            toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {e}"))?;
        println!("{toml_str}");
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}
