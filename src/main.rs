use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use log_ingest::config::load_config;
use log_ingest::ingest::MemoryStore;
use log_ingest::observability::{global, Logger};
use log_ingest::HttpServer;

#[derive(Parser)]
#[command(name = "log-ingest", version, about = "Log ingestion service")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Framework diagnostics go to stderr; structured records own stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "log_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let logger = Logger::new(config.log.clone());
    if global::init(logger.clone()).is_err() {
        tracing::warn!("Default logger was already initialised");
    }

    logger
        .with_fields([
            ("bind_address", serde_json::Value::from(config.server.bind_address())),
            ("rate_limit_enabled", serde_json::Value::from(config.rate_limit.enabled)),
            ("slow_request_ms", serde_json::Value::from(config.pipeline.slow_request_ms)),
        ])
        .info("Configuration loaded");

    let listener = TcpListener::bind(config.server.bind_address()).await?;

    let store = Arc::new(MemoryStore::new());
    let server = HttpServer::with_logger(config, store, logger);
    server.run(listener).await?;

    global::info("Shutdown complete");
    global::shutdown();
    Ok(())
}
