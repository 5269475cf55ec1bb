//! The in-memory mirror of a durable log.
//!
//! Every mutation hits the durable log first and is only applied to memory once the durable log
//! reported success. This keeps the in-memory sequence exactly equal to the durable log's content
//! starting at index 1.

use crate::commitlog::{LogEntry, LogIndex, PersistedLog};
use std::sync::Arc;
use std::{fmt, io, slice};

/// LogCore owns the handle to one durable log together with its in-memory copy.
///
/// There is exactly one `LogCore` per durable log. It is not `Clone`; changing roles moves it
/// from the resigning participant into the new one.
pub struct LogCore {
    persisted: Arc<dyn PersistedLog>,
    // Shared with outstanding snapshots. Copied on write only if a snapshot is still alive.
    entries: Arc<Vec<LogEntry>>,
}

impl LogCore {
    /// Rebuilds the in-memory log by draining the durable log from index 1.
    pub fn new(persisted: Arc<dyn PersistedLog>) -> io::Result<Self> {
        let mut entries = Vec::new();
        let mut expected_index = LogIndex::start_index();
        for entry in persisted.read(LogIndex::start_index())? {
            if entry.index() != expected_index {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Durable log returned index {} where {} was expected",
                        entry.index(),
                        expected_index
                    ),
                ));
            }
            expected_index = expected_index.plus(1);
            entries.push(entry);
        }

        Ok(LogCore {
            persisted,
            entries: Arc::new(entries),
        })
    }

    /// 0 if the log is empty.
    pub fn last_index(&self) -> LogIndex {
        LogIndex::new_usize(self.entries.len())
    }

    pub fn next_index(&self) -> LogIndex {
        self.last_index().plus(1)
    }

    pub fn entry(&self, index: LogIndex) -> Option<&LogEntry> {
        slot(index).and_then(|slot| self.entries.get(slot))
    }

    /// Persists `entries` and then appends them to the in-memory log. The caller guarantees they
    /// start at `next_index()` and are contiguous.
    pub(crate) fn append(&mut self, entries: Vec<LogEntry>) -> io::Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        debug_assert_eq!(entries[0].index(), self.next_index());

        self.persisted.insert(&mut entries.iter().cloned())?;
        Arc::make_mut(&mut self.entries).extend(entries);

        Ok(())
    }

    /// Removes everything starting at `start` and later, durable copy first.
    pub(crate) fn remove_back(&mut self, start: LogIndex) -> io::Result<()> {
        self.persisted.remove_back(start)?;

        let keep = slot(start).unwrap_or(0);
        if keep < self.entries.len() {
            Arc::make_mut(&mut self.entries).truncate(keep);
        }

        Ok(())
    }

    /// Entries with index > `index`, at most `limit` of them.
    pub(crate) fn entries_after(&self, index: LogIndex, limit: usize) -> Vec<LogEntry> {
        let from = index.as_u64() as usize;
        if from >= self.entries.len() {
            return Vec::new();
        }

        self.entries[from..].iter().take(limit).cloned().collect()
    }

    /// O(1) view of the whole log as it is right now.
    pub fn snapshot(&self) -> LogSnapshot {
        LogSnapshot {
            entries: Arc::clone(&self.entries),
            len: self.entries.len(),
        }
    }

    /// O(1) view of the entries with index <= `index`.
    pub fn snapshot_up_to(&self, index: LogIndex) -> LogSnapshot {
        LogSnapshot {
            entries: Arc::clone(&self.entries),
            len: std::cmp::min(index.as_u64() as usize, self.entries.len()),
        }
    }
}

impl fmt::Debug for LogCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogCore").field("last_index", &self.last_index()).finish()
    }
}

// Position of `index` in the in-memory vec. None for index 0, which never holds an entry.
fn slot(index: LogIndex) -> Option<usize> {
    index.as_u64().checked_sub(1).map(|s| s as usize)
}

/// An immutable prefix of a log. Later appends or truncations of the log don't affect it.
#[derive(Clone)]
pub struct LogSnapshot {
    entries: Arc<Vec<LogEntry>>,
    len: usize,
}

impl LogSnapshot {
    pub fn last_index(&self) -> LogIndex {
        LogIndex::new_usize(self.len)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: LogIndex) -> Option<&LogEntry> {
        slot(index).and_then(|slot| self.as_slice().get(slot))
    }

    pub fn as_slice(&self) -> &[LogEntry] {
        &self.entries[..self.len]
    }

    pub fn iter(&self) -> slice::Iter<'_, LogEntry> {
        self.as_slice().iter()
    }

    /// Iterates the entries with index >= `start`.
    pub fn iter_from(&self, start: LogIndex) -> slice::Iter<'_, LogEntry> {
        let from = std::cmp::min(slot(start).unwrap_or(0), self.len);
        self.as_slice()[from..].iter()
    }
}

impl fmt::Debug for LogSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
