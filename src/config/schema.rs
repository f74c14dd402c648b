//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::observability::LoggerConfig;

/// Root configuration for the ingestion service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener settings.
    pub server: ServerConfig,

    /// Structured logger settings.
    pub log: LoggerConfig,

    /// Fixed-window rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Request pipeline settings.
    pub pipeline: PipelineConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    /// Time allowed for in-flight requests to drain on shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_grace_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Window length in seconds. All counters reset together when it elapses.
    pub window_secs: u64,

    /// Requests per window above which a "high rate" record is logged.
    pub soft_limit: u32,

    /// Requests per window above which requests are rejected with 429.
    pub hard_limit: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 60,
            soft_limit: 50,
            hard_limit: 100,
        }
    }
}

/// Middleware pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Requests slower than this get an extra WARN record.
    pub slow_request_ms: u64,

    /// Paths that skip request/response logging (exact match).
    pub bypass_paths: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            slow_request_ms: 5_000,
            bypass_paths: vec!["/health".to_string(), "/healthz".to_string()],
        }
    }
}
