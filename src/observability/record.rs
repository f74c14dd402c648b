//! The structured log record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::observability::level::Level;

/// Arbitrary key/value context attached to a record.
pub type Fields = BTreeMap<String, Value>;

/// One logging event.
///
/// Optional members are skipped when empty so the JSON line only carries
/// what was actually supplied. `file`, `line` and `function` are always
/// present and fall back to `"unknown"`/`0` when the call site is not known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub service: String,
    pub component: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    pub file: String,
    pub line: u32,
    pub function: String,

    /// Elapsed time in milliseconds.
    #[serde(rename = "duration", default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> LogRecord {
        LogRecord {
            timestamp: Utc::now(),
            level: Level::Warn,
            message: "disk almost full".into(),
            service: "log-ingest".into(),
            component: "storage".into(),
            trace_id: None,
            user_id: None,
            request_id: Some("req-1".into()),
            file: "store.rs".into(),
            line: 42,
            function: "log_ingest::ingest::store::append".into(),
            duration_ms: None,
            error: None,
            fields: Fields::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn empty_optionals_are_omitted() {
        let value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object().unwrap();

        for absent in ["trace_id", "user_id", "duration", "error", "fields", "tags"] {
            assert!(!obj.contains_key(absent), "{absent} should be omitted");
        }
        for present in ["timestamp", "level", "message", "service", "component", "file", "line", "function"] {
            assert!(obj.contains_key(present), "{present} should be present");
        }
        assert_eq!(obj["request_id"], "req-1");
    }

    #[test]
    fn decodes_what_it_encodes() {
        let mut record = sample();
        record.fields.insert("usage".into(), json!(0.97));
        record.fields.insert("volume".into(), json!({"name": "data", "mounted": true}));
        record.tags = vec!["capacity".into()];
        record.duration_ms = Some(12);

        let line = serde_json::to_string(&record).unwrap();
        let decoded: LogRecord = serde_json::from_str(&line).unwrap();

        assert_eq!(decoded.level, record.level);
        assert_eq!(decoded.message, record.message);
        assert_eq!(decoded.service, record.service);
        assert_eq!(decoded.component, record.component);
        assert_eq!(decoded.fields, record.fields);
        assert_eq!(decoded.tags, record.tags);
        assert_eq!(decoded.duration_ms, Some(12));
    }
}
