//! Ingested log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const VALID_LEVELS: [&str; 10] = [
    "DEBUG", "INFO", "WARN", "ERROR", "FATAL", "debug", "info", "warn", "error", "fatal",
];

/// A log entry submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Assigned by the store; zero until stored.
    #[serde(default)]
    pub id: u64,
    pub message: String,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: String,
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("message cannot be empty")]
    EmptyMessage,

    #[error("invalid log level")]
    InvalidLevel,
}

impl LogEntry {
    /// Entry from the legacy `{"log": "..."}` form.
    pub fn legacy(message: impl Into<String>) -> Self {
        Self {
            id: 0,
            message: message.into(),
            level: default_level(),
            timestamp: Some(Utc::now()),
            source: "legacy_api".to_string(),
        }
    }

    /// Check the entry and fill in a missing timestamp and source.
    pub fn validate(&mut self) -> Result<(), EntryError> {
        if self.message.is_empty() {
            return Err(EntryError::EmptyMessage);
        }
        if !VALID_LEVELS.contains(&self.level.as_str()) {
            return Err(EntryError::InvalidLevel);
        }
        if self.timestamp.is_none() {
            self.timestamp = Some(Utc::now());
        }
        if self.source.is_empty() {
            self.source = "unknown".to_string();
        }
        Ok(())
    }
}
