//! Observability subsystem: the structured logger.
//!
//! # Data Flow
//! ```text
//! logger.info_ctx(&scope, "msg")
//!     → logger.rs (level filter, field merge)
//!     → context.rs (trace / user / request ids from the scope)
//!     → caller.rs (file, line, function of the call)
//!     → record.rs (LogRecord)
//!     → encoder.rs (JSON or text line)
//!     → sink.rs (one locked write per line)
//! ```
//!
//! # Design Decisions
//! - Loggers are immutable values; per-request loggers are derived, never mutated
//! - Correlation ids travel in an explicit scope value, not in globals
//! - Logging never fails its caller

pub mod caller;
pub mod context;
pub mod encoder;
pub mod global;
pub mod level;
pub mod logger;
pub mod record;
pub mod sink;

pub use caller::{CallSite, CallerResolver, LocationResolver, NoResolver};
pub use context::CorrelationScope;
pub use level::{Format, Level};
pub use logger::{Logger, LoggerConfig};
pub use record::{Fields, LogRecord};
pub use sink::{MemoryBuffer, Sink};
