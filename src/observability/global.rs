//! Process-wide default logger.
//!
//! Initialized explicitly, once, at startup. Later calls to [`init`] are
//! rejected rather than silently replacing the handle. The handle lives for
//! the rest of the process; [`shutdown`] flushes it before exit.

use std::fmt::{self, Display};
use std::sync::OnceLock;

use crate::observability::logger::Logger;

static DEFAULT: OnceLock<Logger> = OnceLock::new();

/// Install `logger` as the process default. Returns it back if a default
/// was already installed.
pub fn init(logger: Logger) -> Result<(), Logger> {
    DEFAULT.set(logger)
}

pub fn get() -> Option<&'static Logger> {
    DEFAULT.get()
}

#[track_caller]
pub fn debug(message: impl Display) {
    if let Some(logger) = get() {
        logger.debug(message);
    }
}

#[track_caller]
pub fn info(message: impl Display) {
    if let Some(logger) = get() {
        logger.info(message);
    }
}

#[track_caller]
pub fn warn(message: impl Display) {
    if let Some(logger) = get() {
        logger.warn(message);
    }
}

#[track_caller]
pub fn error(message: impl Display) {
    if let Some(logger) = get() {
        logger.error(message);
    }
}

/// Log at FATAL through the default logger and exit with status 1. Exits
/// even when no default was installed.
#[track_caller]
pub fn fatal(message: impl Display) -> ! {
    match get() {
        Some(logger) => logger.fatal(message),
        None => std::process::exit(1),
    }
}

#[track_caller]
pub fn debugf(args: fmt::Arguments<'_>) {
    if let Some(logger) = get() {
        logger.debugf(args);
    }
}

#[track_caller]
pub fn infof(args: fmt::Arguments<'_>) {
    if let Some(logger) = get() {
        logger.infof(args);
    }
}

#[track_caller]
pub fn warnf(args: fmt::Arguments<'_>) {
    if let Some(logger) = get() {
        logger.warnf(args);
    }
}

#[track_caller]
pub fn errorf(args: fmt::Arguments<'_>) {
    if let Some(logger) = get() {
        logger.errorf(args);
    }
}

#[track_caller]
pub fn fatalf(args: fmt::Arguments<'_>) -> ! {
    match get() {
        Some(logger) => logger.fatalf(args),
        None => std::process::exit(1),
    }
}

/// Flush the default logger's sink, if one was installed.
pub fn shutdown() {
    if let Some(logger) = get() {
        logger.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::logger::LoggerConfig;
    use crate::observability::sink::Sink;

    #[test]
    fn second_init_is_rejected() {
        let (sink, buffer) = Sink::memory();
        let first = Logger::new(LoggerConfig::default()).with_output(sink).with_field("which", "first");
        let second = Logger::new(LoggerConfig::default()).with_field("which", "second");

        // Other tests in this binary never touch the global handle.
        init(first).expect("first init succeeds");
        assert_eq!(get().unwrap().fields()["which"], "first");

        let rejected = init(second).expect_err("second init is rejected");
        assert_eq!(rejected.fields()["which"], "second");

        info("through the default");
        warnf(format_args!("retry {} of {}", 2, 3));
        shutdown();
        let lines = buffer.json_lines();
        assert_eq!(lines[0]["message"], "through the default");
        assert_eq!(lines[1]["message"], "retry 2 of 3");
        assert_eq!(lines[1]["level"], "WARN");
        assert!(lines[1]["file"].as_str().unwrap().ends_with("global.rs"));
        assert_eq!(get().unwrap().fields()["which"], "first");
    }
}
