//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with the ingestion handlers
//! - Wrap it in the middleware pipeline
//! - Bind to the listener with peer addresses available to the pipeline
//! - Drain in-flight requests on Ctrl-C / SIGTERM, bounded by the grace period

use axum::Router;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::config::AppConfig;
use crate::http::middleware::{self, PipelineState};
use crate::ingest::{self, IngestState, LogStore};
use crate::observability::Logger;

/// HTTP server for the ingestion service.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    logger: Logger,
}

impl HttpServer {
    /// Create a server whose logger is built from `config.log`.
    pub fn new(config: AppConfig, store: Arc<dyn LogStore>) -> Self {
        let logger = Logger::new(config.log.clone());
        Self::with_logger(config, store, logger)
    }

    pub fn with_logger(config: AppConfig, store: Arc<dyn LogStore>, logger: Logger) -> Self {
        let router = Self::build_router(&config, store, &logger);
        Self {
            router,
            config,
            logger,
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(config: &AppConfig, store: Arc<dyn LogStore>, logger: &Logger) -> Router {
        let state = PipelineState::new(
            logger.with_component("middleware"),
            &config.rate_limit,
            config.pipeline.clone(),
        );
        let handlers = ingest::routes(IngestState {
            store,
            logger: logger.with_component("handlers"),
        });
        middleware::apply(handlers, state)
    }

    /// The assembled router, for driving the service in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let logger = self.logger.with_component("server");
        logger
            .with_field("address", addr.to_string())
            .info("HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let signalled = Arc::new(Notify::new());
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown({
                let signalled = signalled.clone();
                let logger = logger.clone();
                async move {
                    shutdown_signal().await;
                    logger.info("Shutdown signal received, draining connections");
                    signalled.notify_one();
                }
            })
            .into_future();

        let grace = Duration::from_secs(self.config.server.shutdown_grace_secs);
        tokio::select! {
            result = serve => result?,
            _ = async {
                signalled.notified().await;
                tokio::time::sleep(grace).await;
            } => {
                logger
                    .with_field("grace_secs", grace.as_secs())
                    .warn("Shutdown grace period elapsed, abandoning open connections");
            }
        }

        logger.info("HTTP server stopped");
        logger.flush();
        Ok(())
    }
}

/// Wait for Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
