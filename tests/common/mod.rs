//! Shared utilities for the integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use log_ingest::config::AppConfig;
use log_ingest::http::middleware::{self, PipelineState};
use log_ingest::http::HttpServer;
use log_ingest::ingest::MemoryStore;
use log_ingest::observability::{Logger, LoggerConfig, MemoryBuffer, Sink};

/// A DEBUG-level logger writing JSON lines into memory.
pub fn memory_logger() -> (Logger, MemoryBuffer) {
    let (sink, buffer) = Sink::memory();
    let config = LoggerConfig {
        level: "DEBUG".into(),
        service: "log-ingest-test".into(),
        ..LoggerConfig::default()
    };
    (Logger::new(config).with_output(sink), buffer)
}

/// `router` wrapped in the full middleware pipeline.
pub fn with_pipeline(router: Router, config: &AppConfig) -> (Router, MemoryBuffer) {
    let (logger, buffer) = memory_logger();
    let state = PipelineState::new(logger, &config.rate_limit, config.pipeline.clone());
    (middleware::apply(router, state), buffer)
}

/// The real service router over a fresh memory store.
pub fn service(config: AppConfig) -> (Router, Arc<MemoryStore>, MemoryBuffer) {
    let (logger, buffer) = memory_logger();
    let store = Arc::new(MemoryStore::new());
    let server = HttpServer::with_logger(config, store.clone(), logger);
    (server.router(), store, buffer)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("user-agent", "integration-test")
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("user-agent", "integration-test")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Records whose message equals `message`.
pub fn records(buffer: &MemoryBuffer, message: &str) -> Vec<Value> {
    buffer
        .json_lines()
        .into_iter()
        .filter(|r| r["message"] == message)
        .collect()
}
