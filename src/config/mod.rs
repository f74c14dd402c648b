//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → .env + process environment (overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults, so the service starts with no config at all
//! - Unrecognized log level / format names are not errors; the logger falls
//!   back to INFO / JSON

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, PipelineConfig, RateLimitConfig, ServerConfig};
pub use validation::ValidationError;
