//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (flag empty User-Agent / encoded paths, add security headers)
//!     → [CORS stage]
//!     → rate_limit.rs (per-IP fixed-window counter)
//!     → Pass to request logging and routing
//! ```
//!
//! # Design Decisions
//! - Security headers are set on every response, including rejections
//!   produced further in
//! - Suspicious requests are logged, never rejected
//! - One limiter window is shared by all clients and reset as a whole

pub mod headers;
pub mod rate_limit;

pub use rate_limit::{Admission, FixedWindowLimiter};
