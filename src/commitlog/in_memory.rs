use crate::commitlog::{LogEntry, LogIndex, LogIterator, PersistedLog};
use std::io;
use std::sync::{Mutex, MutexGuard};

/// A `PersistedLog` whose entries live only as long as the process.
pub struct InMemoryLog {
    // None once the log has been dropped.
    log: Mutex<Option<Entries>>,
}

struct Entries {
    entries: Vec<LogEntry>,
    // Index the first entry has, or would have if the log is empty.
    front: LogIndex,
}

impl Entries {
    fn next_index(&self) -> LogIndex {
        self.front.plus(self.entries.len() as u64)
    }
}

impl InMemoryLog {
    pub fn new() -> Self {
        Self::with_entries(Vec::new())
    }

    /// Creates a log that already holds `entries`, e.g. the state left behind by a previous run.
    pub fn with_entries(entries: Vec<LogEntry>) -> Self {
        let front = entries.first().map_or(LogIndex::start_index(), LogEntry::index);
        InMemoryLog {
            log: Mutex::new(Some(Entries { entries, front })),
        }
    }

    fn locked(&self) -> io::Result<MutexGuard<'_, Option<Entries>>> {
        self.log
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "in-memory log lock poisoned"))
    }

    fn dropped() -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, "log has been dropped")
    }

    // Position of the first entry with index >= `index`.
    fn position(log: &[LogEntry], index: LogIndex) -> usize {
        log.partition_point(|entry| entry.index() < index)
    }
}

impl Default for InMemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistedLog for InMemoryLog {
    fn insert(&self, entries: &mut dyn Iterator<Item = LogEntry>) -> io::Result<()> {
        let mut guard = self.locked()?;
        let log = guard.as_mut().ok_or_else(Self::dropped)?;

        for entry in entries {
            let expected = log.next_index();
            if entry.index() != expected {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Inserting index {} where {} is expected leaves a gap", entry.index(), expected),
                ));
            }
            log.entries.push(entry);
        }

        Ok(())
    }

    fn read(&self, start: LogIndex) -> io::Result<LogIterator> {
        let guard = self.locked()?;
        let log = guard.as_ref().ok_or_else(Self::dropped)?;

        let from = Self::position(&log.entries, start);
        let entries: Vec<LogEntry> = log.entries[from..].to_vec();
        Ok(Box::new(entries.into_iter()))
    }

    fn remove_front(&self, stop: LogIndex) -> io::Result<()> {
        let mut guard = self.locked()?;
        let log = guard.as_mut().ok_or_else(Self::dropped)?;

        let next_index = log.next_index();
        let until = Self::position(&log.entries, stop);
        log.entries.drain(..until);
        log.front = std::cmp::max(log.front, std::cmp::min(stop, next_index));
        Ok(())
    }

    fn remove_back(&self, start: LogIndex) -> io::Result<()> {
        let mut guard = self.locked()?;
        let log = guard.as_mut().ok_or_else(Self::dropped)?;

        let from = Self::position(&log.entries, start);
        log.entries.truncate(from);
        Ok(())
    }

    fn drop_log(&self) -> io::Result<()> {
        let mut guard = self.locked()?;
        guard.take().ok_or_else(Self::dropped)?;
        Ok(())
    }
}
