use crate::commitlog::LogEntry;
use std::{fmt, io};

/// LogIndex is the index of an entry in the log; i.e. a log entry's index.
///
/// Real entries are indexed starting from 1. Index 0 never holds an entry and stands for "no
/// entry", e.g. the previous entry of the very first one.
#[derive(Copy, Clone, Default, PartialOrd, PartialEq, Ord, Eq, Hash)]
pub struct LogIndex(u64);

impl LogIndex {
    pub const ZERO: LogIndex = LogIndex(0);

    pub const fn new(index: u64) -> Self {
        LogIndex(index)
    }

    pub fn new_usize(index: usize) -> Self {
        Self::new(index as u64)
    }

    pub fn start_index() -> Self {
        Self::new(1)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn plus(&self, delta: u64) -> LogIndex {
        LogIndex(self.0 + delta)
    }

    /// Floors at 0.
    pub fn saturating_minus(&self, delta: u64) -> LogIndex {
        LogIndex(self.0.saturating_sub(delta))
    }
}

impl fmt::Debug for LogIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LogIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one durable log among all logs hosted by a process.
#[derive(Copy, Clone, Debug, PartialOrd, PartialEq, Ord, Eq, Hash)]
pub struct LogId(pub u64);

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lazy, finite forward sequence of entries produced by `PersistedLog::read()`.
pub type LogIterator = Box<dyn Iterator<Item = LogEntry> + Send>;

/// PersistedLog is the durable, append only storage of a replicated log's entries.
///
/// The log is addressed by `LogIndex`. Implementations only ever see one writer at a time;
/// the replication code never issues concurrent `insert()`/`remove_back()` calls against the
/// same log. A failed call must be assumed to have had any partial effect.
pub trait PersistedLog: Send + Sync {
    /// Appends `entries` in iteration order.
    fn insert(&self, entries: &mut dyn Iterator<Item = LogEntry>) -> io::Result<()>;

    /// Returns all entries with index >= `start`.
    fn read(&self, start: LogIndex) -> io::Result<LogIterator>;

    /// Drops all entries with index < `stop`.
    fn remove_front(&self, stop: LogIndex) -> io::Result<()>;

    /// Drops all entries with index >= `start`.
    fn remove_back(&self, start: LogIndex) -> io::Result<()>;

    /// Irreversibly deletes the log. Every later call fails.
    fn drop_log(&self) -> io::Result<()>;
}
