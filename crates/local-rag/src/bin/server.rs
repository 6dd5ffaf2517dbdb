//! RAG Server binary
//!
//! Run with: cargo run -p local-rag --bin local-rag-server -- --doc-dir ./sample_docs

use clap::Parser;
use local_rag::{config::RagConfig, server::RagServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Answer questions about the documents in a local folder
#[derive(Parser, Debug)]
#[command(name = "local-rag-server", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Document directory (overrides config)
    #[arg(long)]
    doc_dir: Option<PathBuf>,

    /// Host to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Accept connections while the index is being built
    #[arg(long)]
    serve_during_init: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "local_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = RagConfig::load(args.config.as_deref())?;
    if let Some(dir) = args.doc_dir {
        config.documents.dir = dir;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.serve_during_init {
        config.server.serve_during_init = true;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Documents: {}", config.documents.dir.display());
    tracing::info!(
        "  - Embeddings: {:?} ({})",
        config.embeddings.backend,
        config.llm.embed_model
    );
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!(
        "  - Retrieval: top_k={}, mode={:?}",
        config.retrieval.top_k,
        config.retrieval.response_mode
    );

    let server = RagServer::new(config)?;

    tracing::info!("Checking providers at {}...", server.state().config().llm.base_url);
    if server.check_providers().await {
        tracing::info!("Providers are available");
    } else {
        tracing::warn!(
            "Ollama not available at {}; start it with `ollama serve` and pull the configured models",
            server.state().config().llm.base_url
        );
    }

    tracing::info!("  API: http://{}/query, health: /health, info: /info", server.address());
    server.run().await?;

    Ok(())
}
