//! Request logging stage with health-check bypass.
//!
//! # Responsibilities
//! - Skip all request logging for the configured health-check paths
//! - Take the request id the recovery stage assigned (or, when this stage
//!   runs on its own, the inbound `X-Request-ID` or a fresh UUID) and attach
//!   it to the correlation scope and the response
//! - Log request start and completion, plus slow / 4xx / 5xx follow-ups

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tokio::time::Instant;

use crate::http::middleware::PipelineState;
use crate::http::request::{resolve_request_id, RequestInfo, X_REQUEST_ID};
use crate::http::response::ResponseCapture;
use crate::observability::CorrelationScope;

pub async fn request_logging_middleware(
    State(state): State<PipelineState>,
    mut request: Request,
    next: Next,
) -> Response {
    if state.is_bypassed(request.uri().path()) {
        return next.run(request).await;
    }

    let start = Instant::now();
    let scope = request
        .extensions()
        .get::<CorrelationScope>()
        .cloned()
        .unwrap_or_default();
    let request_id = match scope.request_id() {
        "" => resolve_request_id(request.headers()),
        assigned => assigned.to_string(),
    };
    let scope = scope.with_request_id(&request_id);
    request.extensions_mut().insert(scope.clone());

    let info = RequestInfo::from_request(&request);
    let logger = &state.logger;

    logger
        .at(crate::call_site!())
        .with_fields([
            ("http_method", Value::from(info.method.as_str())),
            ("http_path", Value::from(info.path.as_str())),
            ("http_query", Value::from(info.query.as_str())),
            ("http_user_agent", Value::from(info.user_agent.as_str())),
            ("http_remote_addr", Value::from(info.remote_addr.as_str())),
            ("http_host", Value::from(info.host.as_str())),
            ("request_id", Value::from(request_id.as_str())),
            ("content_length", Value::from(info.content_length)),
        ])
        .info_ctx(&scope, "HTTP request started");

    let response = next.run(request).await;
    let (mut response, capture) = ResponseCapture::observe(response).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }

    let elapsed = start.elapsed();
    let duration_ms = elapsed.as_millis() as u64;
    let status = capture.status().as_u16();

    logger
        .at(crate::call_site!())
        .with_fields([
            ("http_method", Value::from(info.method.as_str())),
            ("http_path", Value::from(info.path.as_str())),
            ("http_status_code", Value::from(status)),
            ("http_remote_addr", Value::from(info.remote_addr.as_str())),
            ("request_id", Value::from(request_id.as_str())),
            ("duration_ms", Value::from(duration_ms)),
            ("response_size", Value::from(capture.bytes_written())),
        ])
        .info_ctx(&scope, "HTTP request completed");

    if elapsed > state.slow_request_threshold() {
        logger
            .at(crate::call_site!())
            .with_fields([
                ("http_method", Value::from(info.method.as_str())),
                ("http_path", Value::from(info.path.as_str())),
                ("duration_ms", Value::from(duration_ms)),
                ("request_id", Value::from(request_id.as_str())),
            ])
            .warn_ctx(&scope, "Slow HTTP request detected");
    }

    if status >= 400 {
        let failed = logger.at(crate::call_site!()).with_fields([
            ("http_method", Value::from(info.method.as_str())),
            ("http_path", Value::from(info.path.as_str())),
            ("http_status_code", Value::from(status)),
            ("request_id", Value::from(request_id.as_str())),
        ]);
        if status >= 500 {
            failed.error_ctx(&scope, "HTTP request failed with server error");
        } else {
            failed.warn_ctx(&scope, "HTTP request failed with client error");
        }
    }

    response
}
