use crate::commitlog::{LogEntry, LogIndex, LogTerm};
use crate::replica::ParticipantId;
use std::io;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppendEntriesRequest {
    pub leader_term: LogTerm,
    pub leader_id: ParticipantId,
    // "Previous log entry" is the entry immediately preceding `entries`. (0, 0) if `entries`
    // start at the very beginning of the log.
    pub prev_log_term: LogTerm,
    pub prev_log_index: LogIndex,
    pub leader_commit: LogIndex,
    pub entries: Vec<LogEntry>,
}

impl AppendEntriesRequest {
    /// Checks the shape of the request, independent of any follower state.
    pub fn validate(&self) -> Result<(), LogError> {
        if self.prev_log_index.is_zero() != self.prev_log_term.is_zero() {
            return Err(LogError::MalformedRequest(
                "prevLogIndex and prevLogTerm must either both be 0 or both be non-0",
            ));
        }

        let mut expected_index = self.prev_log_index.plus(1);
        for entry in self.entries.iter() {
            if entry.index() != expected_index {
                return Err(LogError::MalformedRequest(
                    "entries must be contiguous and start right after prevLogIndex",
                ));
            }
            expected_index = expected_index.plus(1);
        }

        Ok(())
    }

    /// Index of the last entry carried, or `prev_log_index` for a pure heartbeat.
    pub fn last_index(&self) -> LogIndex {
        self.prev_log_index.plus(self.entries.len() as u64)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AppendEntriesResult {
    pub success: bool,
    pub term: LogTerm,
}

impl AppendEntriesResult {
    pub(crate) fn accepted(term: LogTerm) -> Self {
        AppendEntriesResult { success: true, term }
    }

    pub(crate) fn rejected(term: LogTerm) -> Self {
        AppendEntriesResult { success: false, term }
    }
}

/// Failures of a participant operation. A protocol level rejection is not one of these; it is an
/// `AppendEntriesResult` with `success == false`.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Participant has resigned and no longer owns its log")]
    ParticipantResigned,

    #[error("Failed to persist log: {0:?}")]
    StorageError(io::Error),

    #[error("Malformed AppendEntries request: {0}")]
    MalformedRequest(&'static str),

    #[error("Write concern {write_concern} can't be reached with {participants} participants")]
    InvalidWriteConcern { write_concern: usize, participants: usize },
}

/// Failure to get an answer out of a follower. The leader treats every variant the same way: as a
/// transport failure that is retried after a backoff.
#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    #[error("Timed out calling AppendEntries")]
    Timeout,

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Follower failed to handle AppendEntries: {0}")]
    Follower(#[from] LogError),
}
