//! QA server binary
//!
//! Run with: cargo run -p docqa --bin docqa-server -- --config docqa.toml

use clap::Parser;
use docqa::{config::QaConfig, server::RagServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "docqa-server", version, about = "Document question answering server")]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(short, long, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = QaConfig::load(cli.config.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Provider: {}", config.providers.provider.id());
    tracing::info!("  - Chat model: {}", config.providers.chat_model);
    tracing::info!("  - Embedding model: {}", config.providers.embedding_model);
    tracing::info!(
        "  - Chunk size: {} (overlap {})",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Retrieved fragments: {}", config.retrieval.k);
    tracing::info!("  - Index: {}", config.vector_db.persist_path.display());

    if config.providers.provider.requires_api_key() && config.providers.api_key.is_none() {
        tracing::warn!(
            "{} is not set; questions and ingestion will fail until a key is provided",
            config.providers.provider.api_key_env()
        );
    }

    let server = RagServer::new(config);

    println!("\nServer starting...");
    println!("  API: http://{}/api", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/init_embeddings - Build the index from the primary source");
    println!("  POST /api/reindex         - Rebuild the index from a directory");
    println!("  POST /api/upload          - Add documents to the index");
    println!("  POST /api/ask             - Ask a question");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
