//! Request inspection shared by the pipeline stages.
//!
//! # Responsibilities
//! - Read the inbound `X-Request-ID` or generate a fresh one (UUID v4)
//! - Extract the request attributes every stage logs (method, path, peer, ...)
//! - Recover the correlation scope attached by the logging stage

use axum::{
    extract::{ConnectInfo, Request},
    http::{header, HeaderMap, HeaderName},
};
use std::net::SocketAddr;
use uuid::Uuid;

use crate::observability::CorrelationScope;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The inbound request id, if present and non-empty.
pub fn inbound_request_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Reuse the inbound request id verbatim, or generate a new one.
pub fn resolve_request_id(headers: &HeaderMap) -> String {
    inbound_request_id(headers)
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Snapshot of the request attributes the pipeline logs.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: String,
    /// Raw (still percent-encoded) path.
    pub path: String,
    pub query: String,
    pub user_agent: String,
    /// Peer `ip:port`, or `unknown` when the connection info is unavailable.
    pub remote_addr: String,
    /// Peer IP only; the rate limiting key.
    pub client_key: String,
    pub host: String,
    /// `-1` when the request does not declare a length.
    pub content_length: i64,
    scope: CorrelationScope,
}

impl RequestInfo {
    pub fn from_request(request: &Request) -> Self {
        let headers = request.headers();
        let header_str = |name: &header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };

        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let host = request
            .uri()
            .authority()
            .map(|a| a.to_string())
            .unwrap_or_else(|| header_str(&header::HOST));

        let scope = request
            .extensions()
            .get::<CorrelationScope>()
            .cloned()
            .unwrap_or_else(|| CorrelationScope::new().with_request_id(inbound_request_id(headers).unwrap_or_default()));

        Self {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().unwrap_or_default().to_string(),
            user_agent: header_str(&header::USER_AGENT),
            remote_addr: peer.map_or_else(|| "unknown".to_string(), |addr| addr.to_string()),
            client_key: peer.map_or_else(|| "unknown".to_string(), |addr| addr.ip().to_string()),
            host,
            content_length: headers
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(-1),
            scope,
        }
    }

    /// The request's correlation scope. Inside the pipeline this holds the id
    /// the recovery stage assigned; outside it, only the inbound
    /// `X-Request-ID`, if any.
    pub fn scope(&self) -> CorrelationScope {
        self.scope.clone()
    }
}
