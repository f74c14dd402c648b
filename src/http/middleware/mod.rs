//! Request pipeline.
//!
//! # Data Flow
//! ```text
//! request
//!     → recovery.rs        (catch handler panics → 500)
//!     → security headers   (flag suspicious requests, add headers)
//!     → cors.rs            (CORS headers, answer preflight)
//!     → rate limit         (429 above the hard limit)
//!     → logging.rs         (health-check bypass, request id, start/complete records)
//!     → router / handler
//! ```
//!
//! Each stage may answer on its own (preflight, 429, 500) or delegate inward.

pub mod cors;
pub mod logging;
pub mod recovery;

use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;

use crate::config::{PipelineConfig, RateLimitConfig};
use crate::observability::Logger;
use crate::security::headers::security_headers_middleware;
use crate::security::rate_limit::{rate_limit_middleware, FixedWindowLimiter};

pub use cors::cors_middleware;
pub use logging::request_logging_middleware;
pub use recovery::recovery_middleware;

/// State shared by every pipeline stage.
#[derive(Clone)]
pub struct PipelineState {
    pub logger: Logger,
    /// `None` when rate limiting is disabled.
    pub limiter: Option<Arc<FixedWindowLimiter>>,
    pub config: Arc<PipelineConfig>,
}

impl PipelineState {
    pub fn new(logger: Logger, rate_limit: &RateLimitConfig, config: PipelineConfig) -> Self {
        let limiter = rate_limit
            .enabled
            .then(|| Arc::new(FixedWindowLimiter::new(rate_limit)));
        Self {
            logger,
            limiter,
            config: Arc::new(config),
        }
    }

    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.config.slow_request_ms)
    }

    pub fn is_bypassed(&self, path: &str) -> bool {
        self.config.bypass_paths.iter().any(|p| p == path)
    }
}

/// Wrap `router` in the full pipeline, outermost stage first.
///
/// Routes (and the fallback) must be registered before this is called.
pub fn apply(router: Router, state: PipelineState) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(from_fn_with_state(state.clone(), recovery_middleware))
            .layer(from_fn_with_state(state.clone(), security_headers_middleware))
            .layer(from_fn_with_state(state.clone(), cors_middleware))
            .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
            .layer(from_fn_with_state(state, request_logging_middleware)),
    )
}
