use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use scribe_core::bootstrap::{create_provider, load_config, load_index_if_present, resolve_config_path};
use scribe_core::tools::format_results;
use scribe_core::{AppContext, ChatOverrides, Config};
use scribe_gateway::GatewayServer;
use scribe_index::ChunkerConfig;
use scribe_index::indexer::IndexReport;
use scribe_llm::provider::Message;

#[derive(Debug, Parser)]
#[command(name = "scribe", version, about = "Agentic retrieval over a folder of Markdown notes")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, env = "SCRIBE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the index from a folder of notes and write it to disk.
    Index {
        folder: PathBuf,
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },
    /// Search the index directly, without the agent.
    Query {
        text: String,
        #[arg(long)]
        max_results: Option<usize>,
    },
    /// Ask the agent a single question.
    Chat {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Run the HTTP gateway.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let config = load_config(&config_path)?;
    let provider = create_provider(&config).context("failed to create LLM provider")?;
    let ctx = Arc::new(AppContext::new(config, provider));

    match cli.command {
        Command::Index {
            folder,
            chunk_size,
            chunk_overlap,
        } => run_index(&ctx, folder, chunk_size, chunk_overlap).await,
        Command::Query { text, max_results } => run_query(&ctx, &text, max_results).await,
        Command::Chat { message } => run_chat(&ctx, &message.join(" ")).await,
        Command::Serve => run_serve(ctx).await,
    }
}

fn init_subscriber() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_index(
    ctx: &AppContext,
    folder: PathBuf,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
) -> anyhow::Result<()> {
    let mut indexer_config = ctx.config.indexer_config();
    indexer_config.chunker = ChunkerConfig::new(
        chunk_size.unwrap_or(indexer_config.chunker.size),
        chunk_overlap.unwrap_or(indexer_config.chunker.overlap),
    )?;

    let report = ctx
        .rebuild(&folder, indexer_config)
        .await
        .with_context(|| format!("failed to index {}", folder.display()))?;
    print_report(&ctx.config, &report);
    Ok(())
}

fn print_report(config: &Config, report: &IndexReport) {
    println!(
        "Indexed {} of {} files ({} skipped) into {} chunks in {} ms",
        report.files_indexed,
        report.files_found,
        report.files_skipped,
        report.chunks,
        report.duration_ms,
    );
    if report.chunks == 0 {
        println!("No chunks produced, existing index left untouched");
    } else {
        println!("Embedding dimension: {}", report.dimension);
        println!("Index:    {}", config.index_path().display());
        println!("Metadata: {}", config.metadata_path().display());
    }
    for error in &report.errors {
        println!("  skipped: {error}");
    }
}

async fn run_query(ctx: &AppContext, text: &str, max_results: Option<usize>) -> anyhow::Result<()> {
    load_index_if_present(ctx).await?;
    let results = ctx.query(text, max_results).await?;
    println!("{}", format_results(text, &results));
    Ok(())
}

async fn run_chat(ctx: &AppContext, message: &str) -> anyhow::Result<()> {
    load_index_if_present(ctx).await?;
    let reply = ctx
        .chat(vec![Message::user(message)], &ChatOverrides::default())
        .await?;
    println!("{}", reply.message.content);
    Ok(())
}

async fn run_serve(ctx: Arc<AppContext>) -> anyhow::Result<()> {
    load_index_if_present(&ctx).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::from_context(ctx, shutdown_rx).serve().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_index_with_chunk_flags() {
        let cli = Cli::try_parse_from([
            "scribe",
            "index",
            "notes",
            "--chunk-size",
            "300",
            "--chunk-overlap",
            "30",
        ])
        .unwrap();
        match cli.command {
            Command::Index {
                folder,
                chunk_size,
                chunk_overlap,
            } => {
                assert_eq!(folder, PathBuf::from("notes"));
                assert_eq!(chunk_size, Some(300));
                assert_eq!(chunk_overlap, Some(30));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn chat_joins_words() {
        let cli = Cli::try_parse_from(["scribe", "chat", "what", "is", "tokio"]).unwrap();
        match cli.command {
            Command::Chat { message } => assert_eq!(message.join(" "), "what is tokio"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn chat_requires_a_message() {
        assert!(Cli::try_parse_from(["scribe", "chat"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["scribe", "serve", "--config", "x.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Command::Serve));
    }
}
