//! Log ingestion service library.
//!
//! Structured logging plus the HTTP middleware pipeline that feeds it.

pub mod config;
pub mod http;
pub mod ingest;
pub mod observability;
pub mod security;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use observability::{CorrelationScope, Level, Logger, LoggerConfig};
