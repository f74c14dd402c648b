//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load configuration: optional TOML file, then `.env`, then environment
/// overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => AppConfig::default(),
    };

    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Apply environment-style overrides read through `lookup`. Empty values and
/// numbers that do not parse leave the current setting alone.
pub fn apply_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(host) = get("SERVER_HOST") {
        config.server.host = host;
    }
    set_parsed(&mut config.server.port, get("SERVER_PORT"));

    if let Some(level) = get("LOG_LEVEL") {
        config.log.level = level;
    }
    if let Some(format) = get("LOG_FORMAT") {
        config.log.format = format;
    }
    if let Some(output) = get("LOG_OUTPUT") {
        config.log.output = output;
    }

    set_parsed(&mut config.rate_limit.soft_limit, get("RATE_LIMIT_SOFT"));
    set_parsed(&mut config.rate_limit.hard_limit, get("RATE_LIMIT_HARD"));
    set_parsed(&mut config.rate_limit.window_secs, get("RATE_LIMIT_WINDOW_SECS"));
    set_parsed(&mut config.pipeline.slow_request_ms, get("SLOW_REQUEST_MS"));
}

fn set_parsed<T: FromStr>(slot: &mut T, raw: Option<String>) {
    if let Some(value) = raw.and_then(|v| v.trim().parse().ok()) {
        *slot = value;
    }
}
