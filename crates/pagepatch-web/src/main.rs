//! Pagepatch Web - server binary for the page-edit API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use pagepatch_core::{AppConfig, create_blob_store};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pagepatch_web::{build_router, state::AppState};

#[derive(Parser, Debug)]
#[command(name = "pagepatch-web")]
#[command(author, version, about = "Pagepatch Web Server", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Blob storage endpoint URL
    #[arg(long, env = "STORAGE_ENDPOINT")]
    storage_endpoint: Option<String>,

    /// Blob storage service key
    #[arg(long, env = "STORAGE_KEY")]
    storage_key: Option<String>,

    /// Blob storage bucket
    #[arg(long, env = "STORAGE_BUCKET")]
    storage_bucket: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config, then apply CLI/env overrides
    let mut config = if let Some(path) = &args.config {
        AppConfig::from_file(path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    if let Some(endpoint) = args.storage_endpoint {
        config.storage.endpoint = endpoint;
    }
    if let Some(key) = args.storage_key {
        config.storage.api_key = Some(key);
    }
    if let Some(bucket) = args.storage_bucket {
        config.storage.bucket = bucket;
    }

    let blob_store =
        create_blob_store(&config.storage).context("Failed to create blob store client")?;

    let state = Arc::new(
        AppState::new(config, blob_store).context("Failed to initialize application state")?,
    );

    // Spawn background task for session cleanup (runs every 5 minutes)
    let cleanup_state = Arc::clone(&state);
    tokio::spawn(async move {
        let cleanup_interval = Duration::from_secs(5 * 60);
        loop {
            tokio::time::sleep(cleanup_interval).await;
            cleanup_state.cleanup_old_sessions().await;
        }
    });

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
