//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, serve loop, shutdown)
//!     → middleware/ (recovery → security headers → CORS → rate limit → logging)
//!     → ingest handlers
//!     → response.rs (status and size observed for the completion record)
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::PipelineState;
pub use request::{RequestInfo, X_REQUEST_ID};
pub use response::ResponseCapture;
pub use server::HttpServer;
