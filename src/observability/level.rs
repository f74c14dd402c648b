//! Severity levels and output formats.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Record severity, ordered `Debug < Info < Warn < Error < Fatal`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

impl Level {
    pub const ALL: [Level; 5] = [Level::Debug, Level::Info, Level::Warn, Level::Error, Level::Fatal];

    /// Canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    pub fn from_repr(raw: u8) -> Option<Level> {
        Level::ALL.get(raw as usize).copied()
    }

    /// Name for a raw numeric level; anything out of range is `"UNKNOWN"`.
    pub fn name_of(raw: u8) -> &'static str {
        Level::from_repr(raw).map_or("UNKNOWN", Level::as_str)
    }

    /// Parse a configured level name. Unrecognized input yields `Info`.
    pub fn parse_or_default(name: &str) -> Level {
        match name.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Level::Debug,
            "INFO" => Level::Info,
            "WARN" | "WARNING" => Level::Warn,
            "ERROR" => Level::Error,
            "FATAL" => Level::Fatal,
            _ => Level::Info,
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Info
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line encoding used by a logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Text,
}

impl Format {
    /// Parse a configured format name. Unrecognized input yields `Json`.
    pub fn parse_or_default(name: &str) -> Format {
        if name.trim().eq_ignore_ascii_case("text") {
            Format::Text
        } else {
            Format::Json
        }
    }
}
