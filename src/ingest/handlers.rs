//! Ingestion and health-check handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::ingest::model::LogEntry;
use crate::ingest::store::LogStore;
use crate::observability::{CorrelationScope, Fields, Logger};

/// State injected into the ingestion handlers.
#[derive(Clone)]
pub struct IngestState {
    pub store: Arc<dyn LogStore>,
    pub logger: Logger,
}

/// `POST /ingest` and `POST /logs`.
///
/// Accepts either a structured entry (`message` plus optional `level`,
/// `timestamp`, `source`) or the legacy `{"log": "..."}` form.
pub async fn ingest_log(
    State(state): State<IngestState>,
    scope: CorrelationScope,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let request_id = scope.request_id().to_string();
    let logger = state
        .logger
        .at(crate::call_site!())
        .with_field("request_id", request_id.as_str());

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    logger
        .with_fields([
            ("content_type", Value::from(content_type)),
            ("content_length", Value::from(body.len())),
        ])
        .info_ctx(&scope, "Processing log ingestion request");

    let raw: Map<String, Value> = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => {
            logger
                .with_error(Some(&e))
                .warn_ctx(&scope, "Failed to decode JSON request body");
            return (StatusCode::BAD_REQUEST, "Invalid JSON format").into_response();
        }
    };

    let mut entry = if raw.contains_key("message") {
        logger.debug_ctx(&scope, "Processing structured log format");
        match serde_json::from_value::<LogEntry>(Value::Object(raw)) {
            Ok(entry) => entry,
            Err(e) => {
                logger
                    .with_error(Some(&e))
                    .warn_ctx(&scope, "Failed to unmarshal structured log entry");
                return (StatusCode::BAD_REQUEST, "Invalid structured log entry").into_response();
            }
        }
    } else if let Some(log) = raw.get("log") {
        logger.debug_ctx(&scope, "Processing legacy log format");
        let Some(text) = log.as_str() else {
            logger.warn_ctx(&scope, "Legacy log field is not a string");
            return (StatusCode::BAD_REQUEST, "Invalid legacy log entry").into_response();
        };
        let entry = LogEntry::legacy(text);
        logger
            .with_fields([
                ("message_length", Value::from(entry.message.len())),
                ("source", Value::from(entry.source.as_str())),
            ])
            .info_ctx(&scope, "Converted legacy log entry to structured format");
        entry
    } else {
        logger
            .with_field("raw_data", Value::Object(raw))
            .warn_ctx(&scope, "Request missing required fields");
        return (
            StatusCode::BAD_REQUEST,
            "Missing required fields: either 'message' or 'log' field required",
        )
            .into_response();
    };

    if let Err(e) = entry.validate() {
        logger
            .with_field("validation_error", e.to_string())
            .warn_ctx(&scope, "Log entry validation failed");
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }

    let db_start = Instant::now();
    let stored = state.store.append(entry.clone());
    let db_elapsed = db_start.elapsed();

    if let Err(e) = stored {
        logger
            .with_error(Some(&e))
            .with_field("db_duration_ms", db_elapsed.as_millis() as u64)
            .error_ctx(&scope, "Failed to store log entry in database");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store log entry").into_response();
    }

    logger.log_database_operation("INSERT", "logs", db_elapsed, 1);
    logger
        .with_fields([
            ("log_level", Value::from(entry.level.as_str())),
            ("log_source", Value::from(entry.source.as_str())),
            ("message_length", Value::from(entry.message.len())),
            ("db_duration_ms", Value::from(db_elapsed.as_millis() as u64)),
            ("total_duration_ms", Value::from(start.elapsed().as_millis() as u64)),
        ])
        .info_ctx(&scope, "Log entry stored successfully");

    let mut event = Fields::new();
    event.insert("log_level".into(), Value::from(entry.level.as_str()));
    event.insert("log_source".into(), Value::from(entry.source.as_str()));
    if let Some(ts) = entry.timestamp {
        event.insert("timestamp".into(), Value::from(ts.to_rfc3339()));
    }
    state
        .logger
        .at(crate::call_site!())
        .log_business_event("log_ingested", &request_id, event);

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "accepted",
            "message": "Log entry stored successfully",
            "request_id": request_id,
        })),
    )
        .into_response()
}

/// `GET /health` and `GET /healthz`.
pub async fn health_check(State(state): State<IngestState>, scope: CorrelationScope) -> Response {
    let logger = state
        .logger
        .at(crate::call_site!())
        .with_field("request_id", scope.request_id());

    if let Err(e) = state.store.ping() {
        logger
            .with_error(Some(&e))
            .error_ctx(&scope, "Health check failed - database connectivity issue");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "error": "database connectivity issue",
                "timestamp": Utc::now().to_rfc3339(),
            })),
        )
            .into_response();
    }

    logger.debug_ctx(&scope, "Health check passed");
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": Utc::now().to_rfc3339(),
            "service": state.logger.service(),
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
        .into_response()
}

pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found").into_response()
}
