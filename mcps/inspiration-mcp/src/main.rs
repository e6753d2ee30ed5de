//! Inspiration MCP Server
//!
//! Finds verified, real-world architectural inspiration photos for a
//! reference image. Runs as a stdio MCP server by default; `find` runs a
//! single search from the command line.
//!
//! # Configuration
//! Set `GEMINI_API_KEY` (and optionally `UNSPLASH_ACCESS_KEY`) or configure
//! in `~/.inspire/inspiration.toml`

use anyhow::Result;
use clap::{Parser, Subcommand};
use rmcp::{transport::stdio, ServiceExt};
use tokio_util::sync::CancellationToken;

use inspiration_mcp::config::Config;
use inspiration_mcp::server::load_image;
use inspiration_mcp::{InspirationMcpServer, InspirationPipeline, PipelineOutcome};

#[derive(Parser)]
#[command(name = "inspiration-mcp")]
#[command(about = "Find real-world architectural inspiration for a reference image")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdio (default)
    Serve,
    /// Run a single search and print the results as JSON
    Find {
        /// Path to the reference image
        image: String,
        /// Number of results to return
        #[arg(long, short)]
        count: Option<usize>,
        /// MIME type of the image (default: guessed from the extension)
        #[arg(long)]
        mime_type: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    inspire_common::init_tracing("inspiration_mcp")?;

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Find {
            image,
            count,
            mime_type,
        } => find(config, &image, count, mime_type.as_deref()).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    tracing::info!("Starting Inspiration MCP Server");
    tracing::info!("Vision model: {}", config.gemini.model);

    let server = InspirationMcpServer::new(config)?;
    let service = server.serve(stdio()).await?;

    tracing::info!("Server running, waiting for requests...");
    service.waiting().await?;

    tracing::info!("Server shutting down");
    Ok(())
}

async fn find(config: Config, image: &str, count: Option<usize>, mime_type: Option<&str>) -> Result<()> {
    let count = config.resolve_count(count);
    let (bytes, mime) = load_image(image, mime_type).await?;
    let pipeline = InspirationPipeline::from_config(&config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling search");
            on_interrupt.cancel();
        }
    });

    match pipeline.run(&bytes, &mime, count, &cancel).await? {
        PipelineOutcome::Completed(results) if results.is_empty() => {
            eprintln!("{}", inspiration_mcp::server::NO_RESULTS_MESSAGE);
        }
        PipelineOutcome::Completed(results) => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        PipelineOutcome::Cancelled => {
            eprintln!("{}", inspiration_mcp::server::CANCELLED_MESSAGE);
        }
    }

    Ok(())
}
