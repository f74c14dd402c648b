//! Call-site resolution.
//!
//! # Responsibilities
//! - Describe where a log call came from (file, line, function)
//! - Resolve that description from the `#[track_caller]` location the
//!   logger captures at its public entry points
//! - Fall back to `unknown`/`0` instead of failing the log call
//!
//! # Design Decisions
//! - Every public emit method is `#[track_caller]`, so internal dispatch
//!   frames never show up as the call site
//! - Rust has no cheap runtime lookup of the enclosing function name; callers
//!   that want it pin a site built by [`call_site!`](crate::call_site)

use std::panic::Location;

/// File, line and function of a logging call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub function: &'static str,
}

impl CallSite {
    pub const UNKNOWN: CallSite = CallSite {
        file: "unknown",
        line: 0,
        function: "unknown",
    };

    /// Build a site, keeping only the file's base name and stripping
    /// closure/async suffixes from the function path.
    pub fn new(file: &'static str, line: u32, function: &'static str) -> Self {
        let mut function = function;
        while let Some(stripped) = function.strip_suffix("::{{closure}}") {
            function = stripped;
        }
        Self {
            file: base_name(file),
            line,
            function: if function.is_empty() { "unknown" } else { function },
        }
    }
}

impl Default for CallSite {
    fn default() -> Self {
        CallSite::UNKNOWN
    }
}

fn base_name(path: &'static str) -> &'static str {
    path.rsplit(['/', '\\']).next().filter(|s| !s.is_empty()).unwrap_or("unknown")
}

/// Source of call-site metadata for a logger.
pub trait CallerResolver: Send + Sync {
    /// Describe the call site at `location`, or `None` if it cannot be resolved.
    fn resolve(&self, location: &'static Location<'static>) -> Option<CallSite>;
}

/// Resolves file and line from the captured caller location.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationResolver;

impl CallerResolver for LocationResolver {
    fn resolve(&self, location: &'static Location<'static>) -> Option<CallSite> {
        Some(CallSite::new(location.file(), location.line(), "unknown"))
    }
}

/// Never resolves; every record carries the sentinel site.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl CallerResolver for NoResolver {
    fn resolve(&self, _location: &'static Location<'static>) -> Option<CallSite> {
        None
    }
}

/// Build a [`CallSite`] for the current file, line and enclosing function.
///
/// ```
/// let site = log_ingest::call_site!();
/// assert!(site.line > 0);
/// ```
#[macro_export]
macro_rules! call_site {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        $crate::observability::CallSite::new(
            file!(),
            line!(),
            name.strip_suffix("::__here").unwrap_or(name),
        )
    }};
}
