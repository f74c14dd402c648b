//! Record encoders: one JSON object per line, or a fixed human-readable layout.

use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::fmt::Write as _;

use crate::observability::level::Format;
use crate::observability::record::LogRecord;

/// Encode `record` in `format`. Never fails.
pub fn encode(record: &LogRecord, format: Format) -> String {
    match format {
        Format::Json => encode_json(record),
        Format::Text => encode_text(record),
    }
}

/// Full JSON encoding. If serialization fails, a minimal record describing
/// the failure is returned instead.
pub fn encode_json(record: &LogRecord) -> String {
    serde_json::to_string(record).unwrap_or_else(|e| fallback_json(&e.to_string()))
}

fn fallback_json(reason: &str) -> String {
    json!({
        "level": "ERROR",
        "message": format!("Failed to marshal log entry: {reason}"),
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })
    .to_string()
}

/// `[YYYY-MM-DD HH:MM:SS] LEVEL [service/component] file:line function - message`
/// followed by `[trace=..]`, `[request=..]`, `[user=..]` when present and
/// ` fields={..}` when there are fields.
pub fn encode_text(record: &LogRecord) -> String {
    let mut line = format!(
        "[{}] {} [{}/{}] {}:{} {} - {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.level,
        record.service,
        record.component,
        record.file,
        record.line,
        record.function,
        record.message,
    );

    if let Some(id) = &record.trace_id {
        let _ = write!(line, " [trace={id}]");
    }
    if let Some(id) = &record.request_id {
        let _ = write!(line, " [request={id}]");
    }
    if let Some(id) = &record.user_id {
        let _ = write!(line, " [user={id}]");
    }

    if !record.fields.is_empty() {
        if let Ok(fields) = serde_json::to_string(&record.fields) {
            let _ = write!(line, " fields={fields}");
        }
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::level::Level;
    use crate::observability::record::Fields;
    use chrono::TimeZone;

    fn record() -> LogRecord {
        LogRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
            level: Level::Info,
            message: "HTTP request completed".into(),
            service: "log-ingest".into(),
            component: "http".into(),
            trace_id: None,
            user_id: None,
            request_id: None,
            file: "logging.rs".into(),
            line: 88,
            function: "unknown".into(),
            duration_ms: None,
            error: None,
            fields: Fields::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn text_layout_without_extras() {
        assert_eq!(
            encode_text(&record()),
            "[2024-03-09 14:05:07] INFO [log-ingest/http] logging.rs:88 unknown - HTTP request completed"
        );
    }

    #[test]
    fn text_suffixes_follow_fixed_order() {
        let mut r = record();
        r.user_id = Some("u1".into());
        r.request_id = Some("r1".into());
        r.trace_id = Some("t1".into());
        r.fields.insert("http_status_code".into(), json!(200));

        let line = encode_text(&r);
        assert!(
            line.ends_with(" - HTTP request completed [trace=t1] [request=r1] [user=u1] fields={\"http_status_code\":200}"),
            "{line}"
        );
    }

    #[test]
    fn json_timestamp_is_rfc3339_utc() {
        let value: serde_json::Value = serde_json::from_str(&encode_json(&record())).unwrap();
        assert_eq!(value["timestamp"], "2024-03-09T14:05:07Z");
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["line"], 88);
    }

    #[test]
    fn fallback_is_valid_json() {
        let value: serde_json::Value = serde_json::from_str(&fallback_json("bad \"value\"")).unwrap();
        assert_eq!(value["level"], "ERROR");
        assert!(value["message"].as_str().unwrap().contains("bad \"value\""));
    }
}
