//! Fixed-window rate limiting middleware.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::config::RateLimitConfig;
use crate::http::middleware::PipelineState;
use crate::http::request::RequestInfo;

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Within the soft limit.
    Allowed { count: u32 },
    /// Above the soft limit but still admitted.
    HighRate { count: u32 },
    /// Above the hard limit.
    Denied { count: u32 },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Admission::Denied { .. })
    }

    pub fn count(&self) -> u32 {
        match *self {
            Admission::Allowed { count } | Admission::HighRate { count } | Admission::Denied { count } => count,
        }
    }
}

struct Window {
    started: Instant,
    counts: HashMap<String, u32>,
}

/// Per-client request counter over one shared wall-clock window.
///
/// When the window expires, the first request to arrive resets the counters
/// of *every* client, not just its own.
pub struct FixedWindowLimiter {
    window: Mutex<Window>,
    length: Duration,
    soft_limit: u32,
    hard_limit: u32,
}

impl FixedWindowLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_limits(Duration::from_secs(config.window_secs), config.soft_limit, config.hard_limit)
    }

    pub fn with_limits(length: Duration, soft_limit: u32, hard_limit: u32) -> Self {
        Self {
            window: Mutex::new(Window {
                started: Instant::now(),
                counts: HashMap::new(),
            }),
            length,
            soft_limit,
            hard_limit,
        }
    }

    /// Count a request from `client` and report whether it is admitted.
    pub fn allow(&self, client: &str) -> bool {
        self.check(client).is_allowed()
    }

    pub fn check(&self, client: &str) -> Admission {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &str, now: Instant) -> Admission {
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);

        if now.saturating_duration_since(window.started) > self.length {
            window.counts.clear();
            window.started = now;
        }

        let count = window.counts.entry(client.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        let count = *count;

        if count > self.hard_limit {
            Admission::Denied { count }
        } else if count > self.soft_limit {
            Admission::HighRate { count }
        } else {
            Admission::Allowed { count }
        }
    }

    /// Requests counted for `client` in the current window.
    pub fn current(&self, client: &str) -> u32 {
        let window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        window.counts.get(client).copied().unwrap_or(0)
    }
}

/// Rate limiting stage, keyed by client IP.
pub async fn rate_limit_middleware(
    State(state): State<PipelineState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(limiter) = state.limiter.as_deref() else {
        return next.run(request).await;
    };

    let info = RequestInfo::from_request(&request);
    let scope = info.scope();

    match limiter.check(&info.client_key) {
        Admission::Allowed { .. } => next.run(request).await,
        Admission::HighRate { count } => {
            state
                .logger
                .at(crate::call_site!())
                .with_fields([
                    ("http_remote_addr", Value::from(info.remote_addr.as_str())),
                    ("request_count", Value::from(count)),
                    ("request_id", Value::from(scope.request_id())),
                ])
                .info_ctx(&scope, "High request rate detected");
            next.run(request).await
        }
        Admission::Denied { count } => {
            state
                .logger
                .at(crate::call_site!())
                .with_fields([
                    ("http_method", Value::from(info.method.as_str())),
                    ("http_path", Value::from(info.path.as_str())),
                    ("http_remote_addr", Value::from(info.remote_addr.as_str())),
                    ("request_count", Value::from(count)),
                    ("request_id", Value::from(scope.request_id())),
                ])
                .warn_ctx(&scope, "Rate limit exceeded");
            (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response()
        }
    }
}
