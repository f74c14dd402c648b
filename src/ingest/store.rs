//! Log storage.
//!
//! The service only needs append, a couple of read queries and a
//! connectivity check. `MemoryStore` backs the binary and the tests; it keeps
//! only the newest `capacity` entries and evicts the oldest beyond that.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use crate::ingest::model::LogEntry;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store rejected entry: {0}")]
    Rejected(String),
}

pub trait LogStore: Send + Sync {
    /// Store `entry`, returning its assigned id.
    fn append(&self, entry: LogEntry) -> Result<u64, StoreError>;

    /// Up to `limit` entries, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<LogEntry>, StoreError>;

    /// Entries whose timestamp lies in `[start, end]`, newest first.
    fn by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LogEntry>, StoreError>;

    /// Entries with exactly this level, newest first.
    fn by_level(&self, level: &str) -> Result<Vec<LogEntry>, StoreError>;

    fn ping(&self) -> Result<(), StoreError>;
}

/// Entries retained by `MemoryStore::new`.
pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug)]
struct Ring {
    entries: VecDeque<LogEntry>,
    next_id: u64,
}

/// In-process store bounded to a fixed number of entries.
#[derive(Debug)]
pub struct MemoryStore {
    ring: Mutex<Ring>,
    capacity: usize,
    offline: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that keeps at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Mutex::new(Ring {
                entries: VecDeque::with_capacity(capacity.min(1024)),
                next_id: 1,
            }),
            capacity,
            offline: AtomicBool::new(false),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Simulate losing (or regaining) the backing store.
    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }

    fn newest_first(&self, keep: impl Fn(&LogEntry) -> bool) -> Result<Vec<LogEntry>, StoreError> {
        self.check_online()?;
        let ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(ring.entries.iter().rev().filter(|e| keep(e)).cloned().collect())
    }
}

impl LogStore for MemoryStore {
    fn append(&self, mut entry: LogEntry) -> Result<u64, StoreError> {
        self.check_online()?;
        if entry.message.is_empty() {
            return Err(StoreError::Rejected("empty message".to_string()));
        }
        let mut ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        let id = ring.next_id;
        ring.next_id += 1;
        entry.id = id;
        if ring.entries.len() == self.capacity {
            ring.entries.pop_front();
        }
        ring.entries.push_back(entry);
        Ok(id)
    }

    fn recent(&self, limit: usize) -> Result<Vec<LogEntry>, StoreError> {
        let mut entries = self.newest_first(|_| true)?;
        entries.truncate(limit);
        Ok(entries)
    }

    fn by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LogEntry>, StoreError> {
        self.newest_first(|e| e.timestamp.is_some_and(|ts| ts >= start && ts <= end))
    }

    fn by_level(&self, level: &str) -> Result<Vec<LogEntry>, StoreError> {
        self.newest_first(|e| e.level == level)
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(message: &str, level: &str, timestamp: DateTime<Utc>) -> LogEntry {
        LogEntry {
            id: 0,
            message: message.to_string(),
            level: level.to_string(),
            timestamp: Some(timestamp),
            source: "test".to_string(),
        }
    }

    #[test]
    fn append_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let now = Utc::now();
        assert_eq!(store.append(entry("a", "info", now)).unwrap(), 1);
        assert_eq!(store.append(entry("b", "info", now)).unwrap(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn queries_return_newest_first() {
        let store = MemoryStore::new();
        let base = Utc::now();
        store.append(entry("old", "info", base - Duration::hours(2))).unwrap();
        store.append(entry("mid", "error", base - Duration::hours(1))).unwrap();
        store.append(entry("new", "error", base)).unwrap();

        let recent: Vec<_> = store.recent(2).unwrap().into_iter().map(|e| e.message).collect();
        assert_eq!(recent, ["new", "mid"]);

        let ranged = store
            .by_time_range(base - Duration::minutes(90), base)
            .unwrap();
        assert_eq!(ranged.len(), 2);

        let errors = store.by_level("error").unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "new");
    }

    #[test]
    fn full_store_evicts_oldest_and_keeps_counting() {
        let store = MemoryStore::with_capacity(2);
        let now = Utc::now();
        for message in ["a", "b", "c"] {
            store.append(entry(message, "info", now)).unwrap();
        }
        assert_eq!(store.len(), 2);

        let ids: Vec<_> = store.recent(10).unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, [3, 2]);
        assert_eq!(store.append(entry("d", "info", now)).unwrap(), 4);
    }

    #[test]
    fn offline_store_fails_every_operation() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert!(store.ping().is_err());
        assert!(store.append(entry("a", "info", Utc::now())).is_err());
        assert!(store.recent(10).is_err());

        store.set_available(true);
        assert!(store.ping().is_ok());
    }
}
