//! Log ingestion endpoints.
//!
//! ```text
//! POST /ingest, POST /logs  → handlers::ingest_log  → LogStore::append
//! GET  /health, GET /healthz → handlers::health_check → LogStore::ping
//! ```

pub mod handlers;
pub mod model;
pub mod store;

use axum::{
    routing::{get, post},
    Router,
};

pub use handlers::IngestState;
pub use model::{EntryError, LogEntry};
pub use store::{LogStore, MemoryStore, StoreError};

/// Ingestion routes with their state applied.
pub fn routes(state: IngestState) -> Router {
    Router::new()
        .route("/ingest", post(handlers::ingest_log))
        .route("/logs", post(handlers::ingest_log))
        .route("/health", get(handlers::health_check))
        .route("/healthz", get(handlers::health_check))
        .fallback(handlers::not_found)
        .with_state(state)
}
