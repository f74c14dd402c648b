//! Immutable, field-chaining structured logger.
//!
//! # Responsibilities
//! - Filter by level before any formatting or I/O
//! - Assemble a [`LogRecord`] from the logger's fields, an optional
//!   [`CorrelationScope`] and the resolved call site
//! - Encode and write exactly one line per emitted record
//!
//! # Design Decisions
//! - Every `with_*` method returns a new logger; the receiver never changes
//!   and derived field maps are independent copies
//! - Messages are taken as `impl Display`, so `format_args!` arguments are
//!   only rendered once the level check has passed
//! - Emitting never returns an error; sink failures are reported through
//!   `tracing` and dropped

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display};
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use crate::observability::caller::{CallSite, CallerResolver, LocationResolver};
use crate::observability::context::CorrelationScope;
use crate::observability::encoder;
use crate::observability::level::{Format, Level};
use crate::observability::record::{Fields, LogRecord};
use crate::observability::sink::Sink;

/// Logger construction parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Threshold level name (DEBUG, INFO, WARN, ERROR, FATAL).
    pub level: String,

    /// Line format name (JSON or TEXT).
    pub format: String,

    pub service: String,
    pub component: String,

    /// `stdout`, `stderr`, or a file path.
    pub output: String,

    /// Fields attached to every record.
    pub fields: Fields,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            format: "JSON".to_string(),
            service: "log-ingest".to_string(),
            component: "main".to_string(),
            output: "stdout".to_string(),
            fields: Fields::new(),
        }
    }
}

impl LoggerConfig {
    /// Read `LOG_LEVEL`, `LOG_FORMAT` and `LOG_OUTPUT`, defaulting to INFO,
    /// JSON and stdout.
    pub fn from_env(service: &str, component: &str) -> Self {
        let defaults = Self::default();
        Self {
            level: env_or("LOG_LEVEL", &defaults.level),
            format: env_or("LOG_FORMAT", &defaults.format),
            service: service.to_string(),
            component: component.to_string(),
            output: env_or("LOG_OUTPUT", &defaults.output),
            fields: Fields::new(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Structured leveled logger.
#[derive(Clone)]
pub struct Logger {
    level: Level,
    format: Format,
    service: Arc<str>,
    component: Arc<str>,
    fields: Fields,
    tags: Vec<String>,
    sink: Sink,
    resolver: Arc<dyn CallerResolver>,
    site: Option<CallSite>,
}

impl Logger {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            level: Level::parse_or_default(&config.level),
            format: Format::parse_or_default(&config.format),
            service: Arc::from(config.service),
            component: Arc::from(config.component),
            fields: config.fields,
            tags: Vec::new(),
            sink: Sink::open(&config.output),
            resolver: Arc::new(LocationResolver),
            site: None,
        }
    }

    /// Logger configured from `LOG_LEVEL`, `LOG_FORMAT` and `LOG_OUTPUT`.
    pub fn from_env(service: &str, component: &str) -> Self {
        Self::new(LoggerConfig::from_env(service, component))
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Whether a record at `level` would be emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    // ── Derivation ───────────────────────────────────────────────────────

    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(key.into(), value.into());
        Self { fields, ..self.clone() }
    }

    /// Union of the current fields and `fields`; new keys win.
    pub fn with_fields<K, V>(&self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut merged = self.fields.clone();
        merged.extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self { fields: merged, ..self.clone() }
    }

    pub fn with_component(&self, component: &str) -> Self {
        Self { component: Arc::from(component), ..self.clone() }
    }

    /// Adds an `error` field; `None` returns an unchanged copy.
    pub fn with_error<E: Display + ?Sized>(&self, err: Option<&E>) -> Self {
        match err {
            Some(err) => self.with_field("error", err.to_string()),
            None => self.clone(),
        }
    }

    /// Adds a human-readable `duration` field.
    pub fn with_duration(&self, duration: Duration) -> Self {
        self.with_field("duration", format!("{duration:?}"))
    }

    pub fn with_tags<T: Into<String>>(&self, tags: impl IntoIterator<Item = T>) -> Self {
        let mut all = self.tags.clone();
        all.extend(tags.into_iter().map(Into::into));
        Self { tags: all, ..self.clone() }
    }

    pub fn with_output(&self, sink: Sink) -> Self {
        Self { sink, ..self.clone() }
    }

    pub fn with_level(&self, level: Level) -> Self {
        Self { level, ..self.clone() }
    }

    pub fn with_format(&self, format: Format) -> Self {
        Self { format, ..self.clone() }
    }

    pub fn with_resolver(&self, resolver: Arc<dyn CallerResolver>) -> Self {
        Self { resolver, ..self.clone() }
    }

    /// Pin records from the returned logger to an explicit call site.
    pub fn at(&self, site: CallSite) -> Self {
        Self { site: Some(site), ..self.clone() }
    }

    // ── Emission ─────────────────────────────────────────────────────────

    #[track_caller]
    pub fn debug(&self, message: impl Display) {
        self.log(Level::Debug, None, message);
    }

    #[track_caller]
    pub fn info(&self, message: impl Display) {
        self.log(Level::Info, None, message);
    }

    #[track_caller]
    pub fn warn(&self, message: impl Display) {
        self.log(Level::Warn, None, message);
    }

    #[track_caller]
    pub fn error(&self, message: impl Display) {
        self.log(Level::Error, None, message);
    }

    /// Log at FATAL, flush, and exit the process with status 1.
    #[track_caller]
    pub fn fatal(&self, message: impl Display) -> ! {
        self.log(Level::Fatal, None, message);
        self.exit()
    }

    #[track_caller]
    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, None, args);
    }

    #[track_caller]
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, None, args);
    }

    #[track_caller]
    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, None, args);
    }

    #[track_caller]
    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, None, args);
    }

    #[track_caller]
    pub fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.log(Level::Fatal, None, args);
        self.exit()
    }

    #[track_caller]
    pub fn debug_ctx(&self, scope: &CorrelationScope, message: impl Display) {
        self.log(Level::Debug, Some(scope), message);
    }

    #[track_caller]
    pub fn info_ctx(&self, scope: &CorrelationScope, message: impl Display) {
        self.log(Level::Info, Some(scope), message);
    }

    #[track_caller]
    pub fn warn_ctx(&self, scope: &CorrelationScope, message: impl Display) {
        self.log(Level::Warn, Some(scope), message);
    }

    #[track_caller]
    pub fn error_ctx(&self, scope: &CorrelationScope, message: impl Display) {
        self.log(Level::Error, Some(scope), message);
    }

    #[track_caller]
    pub fn fatal_ctx(&self, scope: &CorrelationScope, message: impl Display) -> ! {
        self.log(Level::Fatal, Some(scope), message);
        self.exit()
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    #[track_caller]
    pub fn log_http_request(
        &self,
        method: &str,
        path: &str,
        user_agent: &str,
        remote_addr: &str,
        status: u16,
        duration: Duration,
    ) {
        self.with_fields([
            ("http_method", Value::from(method)),
            ("http_path", Value::from(path)),
            ("http_user_agent", Value::from(user_agent)),
            ("http_remote_addr", Value::from(remote_addr)),
            ("http_status_code", Value::from(status)),
            ("duration", Value::from(format!("{duration:?}"))),
        ])
        .info("HTTP request processed");
    }

    #[track_caller]
    pub fn log_database_operation(&self, operation: &str, table: &str, duration: Duration, rows_affected: u64) {
        self.with_fields([
            ("db_operation", Value::from(operation)),
            ("db_table", Value::from(table)),
            ("db_rows_affected", Value::from(rows_affected)),
            ("duration", Value::from(format!("{duration:?}"))),
        ])
        .debug("Database operation completed");
    }

    #[track_caller]
    pub fn log_business_event(&self, event: &str, entity_id: &str, fields: Fields) {
        self.with_fields([
            ("business_event", Value::from(event)),
            ("entity_id", Value::from(entity_id)),
        ])
        .with_fields(fields)
        .info("Business event occurred");
    }

    pub fn flush(&self) {
        if let Err(e) = self.sink.flush() {
            tracing::warn!(sink = %self.sink.name(), error = %e, "Failed to flush log sink");
        }
    }

    // ── Internals ────────────────────────────────────────────────────────

    #[track_caller]
    fn log(&self, level: Level, scope: Option<&CorrelationScope>, message: impl Display) {
        if !self.enabled(level) {
            return;
        }
        let site = self.call_site(Location::caller());
        let record = self.record(level, scope, site, message.to_string());
        self.write(&record);
    }

    fn call_site(&self, location: &'static Location<'static>) -> CallSite {
        self.site
            .or_else(|| self.resolver.resolve(location))
            .unwrap_or(CallSite::UNKNOWN)
    }

    fn record(&self, level: Level, scope: Option<&CorrelationScope>, site: CallSite, message: String) -> LogRecord {
        let id = |get: fn(&CorrelationScope) -> &str| {
            scope.map(get).filter(|s| !s.is_empty()).map(str::to_owned)
        };

        LogRecord {
            timestamp: Utc::now(),
            level,
            message,
            service: self.service.to_string(),
            component: self.component.to_string(),
            trace_id: id(CorrelationScope::trace_id),
            user_id: id(CorrelationScope::user_id),
            request_id: id(CorrelationScope::request_id),
            file: site.file.to_string(),
            line: site.line,
            function: site.function.to_string(),
            duration_ms: None,
            error: None,
            fields: self.fields.clone(),
            tags: self.tags.clone(),
        }
    }

    fn write(&self, record: &LogRecord) {
        let line = encoder::encode(record, self.format);
        if let Err(e) = self.sink.write_line(&line) {
            tracing::warn!(sink = %self.sink.name(), error = %e, "Failed to write log record");
        }
    }

    fn exit(&self) -> ! {
        self.flush();
        std::process::exit(1)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("format", &self.format)
            .field("service", &self.service)
            .field("component", &self.component)
            .field("fields", &self.fields)
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::caller::NoResolver;
    use crate::observability::sink::MemoryBuffer;
    use serde_json::json;

    fn memory_logger(level: Level) -> (Logger, MemoryBuffer) {
        let (sink, buffer) = Sink::memory();
        let logger = Logger::new(LoggerConfig {
            service: "svc".into(),
            component: "test".into(),
            ..LoggerConfig::default()
        })
        .with_level(level)
        .with_output(sink);
        (logger, buffer)
    }

    #[test]
    fn threshold_filters_lower_levels() {
        for (i, threshold) in Level::ALL.iter().enumerate() {
            for below in &Level::ALL[..i] {
                let (logger, buffer) = memory_logger(*threshold);
                logger.log(*below, None, "dropped");
                assert!(buffer.lines().is_empty(), "{below} emitted under {threshold}");
            }
            let (logger, buffer) = memory_logger(*threshold);
            logger.log(*threshold, None, "kept");
            assert_eq!(buffer.lines().len(), 1);
        }
    }

    #[test]
    fn filtered_messages_are_never_formatted() {
        struct Explodes;
        impl Display for Explodes {
            fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
                panic!("formatted a filtered message");
            }
        }

        let (logger, buffer) = memory_logger(Level::Error);
        logger.info(Explodes);
        assert!(buffer.lines().is_empty());
    }

    #[test]
    fn with_fields_leaves_receiver_untouched() {
        let (base, _) = memory_logger(Level::Info);
        let base = base.with_field("a", 1);
        let derived = base.with_fields([("b", 2), ("a", 3)]);

        assert_eq!(base.fields().len(), 1);
        assert_eq!(base.fields()["a"], json!(1));
        assert_eq!(derived.fields()["a"], json!(3));
        assert_eq!(derived.fields()["b"], json!(2));
    }

    #[test]
    fn siblings_do_not_share_fields() {
        let (base, _) = memory_logger(Level::Info);
        let left = base.with_field("side", "left");
        let right = base.with_field("side", "right");
        let left_more = left.with_field("extra", true);

        assert_eq!(right.fields().get("extra"), None);
        assert_eq!(left.fields().get("extra"), None);
        assert_eq!(left_more.fields()["side"], "left");
        assert_eq!(right.fields()["side"], "right");
    }

    #[test]
    fn with_error_none_adds_nothing() {
        let (logger, _) = memory_logger(Level::Info);
        let unchanged = logger.with_error::<std::io::Error>(None);
        assert!(unchanged.fields().is_empty());

        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let with = logger.with_error(Some(&err));
        assert_eq!(with.fields()["error"], "disk gone");
    }

    #[test]
    fn with_duration_is_human_readable() {
        let (logger, _) = memory_logger(Level::Info);
        let logger = logger.with_duration(Duration::from_millis(1500));
        assert_eq!(logger.fields()["duration"], "1.5s");
    }

    #[test]
    fn with_component_replaces_only_component() {
        let (logger, buffer) = memory_logger(Level::Info);
        let db = logger.with_field("k", "v").with_component("database");
        db.info("hello");

        let record = &buffer.json_lines()[0];
        assert_eq!(record["component"], "database");
        assert_eq!(record["service"], "svc");
        assert_eq!(record["fields"]["k"], "v");
        assert_eq!(logger.component(), "test");
    }

    #[test]
    fn scope_ids_are_copied_when_present() {
        let (logger, buffer) = memory_logger(Level::Info);
        let scope = CorrelationScope::new().with_trace_id("t-1").with_request_id("r-1");
        logger.info_ctx(&scope, "scoped");
        logger.info("unscoped");

        let records = buffer.json_lines();
        assert_eq!(records[0]["trace_id"], "t-1");
        assert_eq!(records[0]["request_id"], "r-1");
        assert!(records[0].get("user_id").is_none());
        assert!(records[1].get("trace_id").is_none());
        assert!(records[1].get("request_id").is_none());
    }

    #[test]
    fn empty_fields_are_omitted() {
        let (logger, buffer) = memory_logger(Level::Info);
        logger.info("plain");
        assert!(buffer.json_lines()[0].get("fields").is_none());
    }

    #[test]
    fn call_site_is_the_public_caller() {
        let (logger, buffer) = memory_logger(Level::Info);
        let line = line!() + 1;
        logger.info("here");

        let record = &buffer.json_lines()[0];
        assert_eq!(record["file"], "logger.rs");
        assert_eq!(record["line"], line);
    }

    #[test]
    fn helpers_report_their_caller() {
        let (logger, buffer) = memory_logger(Level::Debug);
        let line = line!() + 1;
        logger.log_database_operation("INSERT", "logs", Duration::from_millis(3), 1);

        let record = &buffer.json_lines()[0];
        assert_eq!(record["line"], line);
        assert_eq!(record["level"], "DEBUG");
        assert_eq!(record["fields"]["db_table"], "logs");
        assert_eq!(record["fields"]["db_rows_affected"], 1);
    }

    #[test]
    fn unresolved_call_site_uses_sentinels() {
        let (logger, buffer) = memory_logger(Level::Info);
        logger.with_resolver(Arc::new(NoResolver)).warn("lost");

        let record = &buffer.json_lines()[0];
        assert_eq!(record["file"], "unknown");
        assert_eq!(record["line"], 0);
        assert_eq!(record["function"], "unknown");
    }

    #[test]
    fn pinned_site_wins() {
        let (logger, buffer) = memory_logger(Level::Info);
        logger.at(crate::call_site!()).info("pinned");

        let record = &buffer.json_lines()[0];
        assert!(record["function"].as_str().unwrap().ends_with("pinned_site_wins"));
    }

    #[test]
    fn formatted_variant_renders_arguments() {
        let (logger, buffer) = memory_logger(Level::Info);
        logger.warnf(format_args!("{} of {}", 3, 4));
        assert_eq!(buffer.json_lines()[0]["message"], "3 of 4");
    }

    #[test]
    fn business_event_merges_extra_fields() {
        let (logger, buffer) = memory_logger(Level::Info);
        let mut extra = Fields::new();
        extra.insert("log_level".into(), json!("warn"));
        logger.log_business_event("log_ingested", "req-5", extra);

        let record = &buffer.json_lines()[0];
        assert_eq!(record["message"], "Business event occurred");
        assert_eq!(record["fields"]["business_event"], "log_ingested");
        assert_eq!(record["fields"]["entity_id"], "req-5");
        assert_eq!(record["fields"]["log_level"], "warn");
    }

    #[test]
    fn text_format_writes_one_line() {
        let (logger, buffer) = memory_logger(Level::Info);
        logger
            .with_format(Format::Text)
            .with_field("n", 1)
            .info_ctx(&CorrelationScope::new().with_request_id("abc"), "text line");

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(" INFO [svc/test] logger.rs:"));
        assert!(lines[0].ends_with("- text line [request=abc] fields={\"n\":1}"), "{}", lines[0]);
    }

    #[test]
    fn tags_are_carried() {
        let (logger, buffer) = memory_logger(Level::Info);
        logger.with_tags(["ingest", "audit"]).info("tagged");
        assert_eq!(buffer.json_lines()[0]["tags"], json!(["ingest", "audit"]));
    }

    #[test]
    fn unknown_config_names_fall_back() {
        let logger = Logger::new(LoggerConfig {
            level: "chatty".into(),
            format: "xml".into(),
            ..LoggerConfig::default()
        });
        assert_eq!(logger.level(), Level::Info);
        assert_eq!(logger.format(), Format::Json);
    }
}
