use crate::commitlog::{InMemoryLog, LogEntry, LogIndex, LogIterator, PersistedLog};
use crate::replica::{AbstractFollower, AppendEntriesRequest, AppendEntriesResult, ParticipantId, ReplicationError};
use slog::Drain;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::time::{Duration, Instant};

pub(crate) fn test_logger() -> slog::Logger {
    let decorator = slog_term::PlainSyncDecorator::new(slog_term::TestStdoutWriter);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();

    slog::Logger::root(drain, slog::o!())
}

/// Polls `condition` until it holds, failing the test after a sanity timeout.
pub(crate) async fn eventually<F: FnMut() -> bool>(mut condition: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "Condition not met in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// In-memory log whose mutations can be switched to fail.
#[derive(Default)]
pub(crate) struct FailingLog {
    log: InMemoryLog,
    fail_inserts: AtomicBool,
    fail_remove_back: AtomicBool,
}

impl FailingLog {
    pub(crate) fn new() -> Self {
        FailingLog::default()
    }

    pub(crate) fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_remove_back(&self, fail: bool) {
        self.fail_remove_back.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, operation: &str) -> io::Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, format!("injected {} failure", operation)));
        }
        Ok(())
    }
}

impl PersistedLog for FailingLog {
    fn insert(&self, entries: &mut dyn Iterator<Item = LogEntry>) -> io::Result<()> {
        FailingLog::check(&self.fail_inserts, "insert")?;
        self.log.insert(entries)
    }

    fn read(&self, start: LogIndex) -> io::Result<LogIterator> {
        self.log.read(start)
    }

    fn remove_front(&self, stop: LogIndex) -> io::Result<()> {
        self.log.remove_front(stop)
    }

    fn remove_back(&self, start: LogIndex) -> io::Result<()> {
        FailingLog::check(&self.fail_remove_back, "remove_back")?;
        self.log.remove_back(start)
    }

    fn drop_log(&self) -> io::Result<()> {
        self.log.drop_log()
    }
}

/// Follower that never answers successfully.
pub(crate) struct UnreachableFollower {
    id: ParticipantId,
    num_calls: AtomicUsize,
}

impl UnreachableFollower {
    pub(crate) fn new(id: &str) -> Self {
        UnreachableFollower {
            id: ParticipantId::new(id),
            num_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn num_calls(&self) -> usize {
        self.num_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AbstractFollower for UnreachableFollower {
    fn participant_id(&self) -> &ParticipantId {
        &self.id
    }

    async fn append_entries(&self, _request: AppendEntriesRequest) -> Result<AppendEntriesResult, ReplicationError> {
        self.num_calls.fetch_add(1, Ordering::SeqCst);
        Err(ReplicationError::Transport("connection refused".to_string()))
    }
}
