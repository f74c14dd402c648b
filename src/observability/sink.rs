//! Output targets for encoded records.
//!
//! # Responsibilities
//! - Own the write target (stdout, stderr, file, in-memory buffer)
//! - Serialize writes so each record lands as one complete line
//!
//! # Design Decisions
//! - One mutex per sink; every clone of a logger shares it, so writes from a
//!   single logger family stay FIFO
//! - Each line is written with one `write_all` and flushed before the lock
//!   is released
//! - A poisoned lock is recovered: a panic elsewhere must not silence logging

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Target = Box<dyn Write + Send>;

/// A shareable, line-atomic write target.
#[derive(Clone)]
pub struct Sink {
    name: Arc<str>,
    target: Arc<Mutex<Target>>,
}

impl Sink {
    /// Wrap an arbitrary writer.
    pub fn from_writer(name: &str, writer: impl Write + Send + 'static) -> Self {
        Self {
            name: Arc::from(name),
            target: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::from_writer("stdout", io::stdout())
    }

    pub fn stderr() -> Self {
        Self::from_writer("stderr", io::stderr())
    }

    /// Open `path` for appending, creating it if needed.
    pub fn file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(&path.display().to_string(), file))
    }

    /// Resolve a configured output name: `""`/`stdout`, `stderr`, or a file
    /// path. A file that cannot be opened falls back to stdout.
    pub fn open(output: &str) -> Self {
        match output.trim() {
            "" | "stdout" => Self::stdout(),
            "stderr" => Self::stderr(),
            path => Self::file(path).unwrap_or_else(|e| {
                tracing::warn!(path = %path, error = %e, "Cannot open log file, using stdout");
                Self::stdout()
            }),
        }
    }

    /// An in-memory sink and a handle for reading back what was written.
    pub fn memory() -> (Self, MemoryBuffer) {
        let buffer = MemoryBuffer::default();
        (Self::from_writer("memory", buffer.clone()), buffer)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write `line` followed by a newline as one unit.
    pub(crate) fn write_line(&self, line: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        let mut target = self.lock();
        target.write_all(&buf)?;
        target.flush()
    }

    pub fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }

    fn lock(&self) -> MutexGuard<'_, Target> {
        self.target.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").field("name", &self.name).finish()
    }
}

/// Shared byte buffer behind [`Sink::memory`].
#[derive(Clone, Default)]
pub struct MemoryBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemoryBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    /// Every line parsed as JSON; lines that do not parse are skipped.
    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn clear(&self) {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Write for MemoryBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
