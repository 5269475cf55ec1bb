use crate::commitlog::{LogEntry, LogIndex, LogTerm};
use crate::replica::{LogCore, LogError, LogSnapshot, LogStatistics, LogStatus, ParticipantId};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Common surface of every role a replicated log can be in.
pub trait LogParticipant: Send + Sync {
    fn participant_id(&self) -> &ParticipantId;

    /// Fixed for the lifetime of the participant. A new term means a new participant.
    fn term(&self) -> LogTerm;

    fn get_status(&self) -> LogStatus;

    /// Gives up ownership of the log core. The participant is inert afterwards: every operation
    /// fails with `LogError::ParticipantResigned`.
    fn resign(&self) -> Result<LogCore, LogError>;
}

/// Bookkeeping shared by leader and follower. Always accessed under the owner's lock.
#[derive(Debug)]
pub(crate) struct ParticipantState {
    // None once resigned.
    log_core: Option<LogCore>,
    // Never decreases, never exceeds the local spearhead.
    commit_index: LogIndex,
}

impl ParticipantState {
    pub(crate) fn new(log_core: LogCore) -> Self {
        ParticipantState {
            log_core: Some(log_core),
            commit_index: LogIndex::ZERO,
        }
    }

    pub(crate) fn log_core(&self) -> Result<&LogCore, LogError> {
        self.log_core.as_ref().ok_or(LogError::ParticipantResigned)
    }

    pub(crate) fn log_core_mut(&mut self) -> Result<&mut LogCore, LogError> {
        self.log_core.as_mut().ok_or(LogError::ParticipantResigned)
    }

    pub(crate) fn is_resigned(&self) -> bool {
        self.log_core.is_none()
    }

    pub(crate) fn commit_index(&self) -> LogIndex {
        self.commit_index
    }

    /// Returns true if the commit index moved.
    pub(crate) fn ratchet_fwd_commit_index(&mut self, new_commit_index: LogIndex) -> bool {
        let last_index = match self.log_core.as_ref() {
            Some(core) => core.last_index(),
            None => return false,
        };
        let new_commit_index = std::cmp::min(new_commit_index, last_index);
        if new_commit_index <= self.commit_index {
            return false;
        }

        self.commit_index = new_commit_index;
        true
    }

    /// The entry at `index` if 1 <= index <= spearhead.
    pub(crate) fn get_entry_by_index(&self, index: LogIndex) -> Option<LogEntry> {
        self.log_core.as_ref().and_then(|core| core.entry(index)).cloned()
    }

    pub(crate) fn local_statistics(&self) -> LogStatistics {
        LogStatistics {
            spearhead: self
                .log_core
                .as_ref()
                .map(|core| core.last_index())
                .unwrap_or(LogIndex::ZERO),
            commit_index: self.commit_index,
        }
    }

    pub(crate) fn committed_entries(&self) -> Result<LogSnapshot, LogError> {
        Ok(self.log_core()?.snapshot_up_to(self.commit_index))
    }

    pub(crate) fn resign(&mut self) -> Result<LogCore, LogError> {
        self.log_core.take().ok_or(LogError::ParticipantResigned)
    }
}

// Poisoning is ignored. In-memory state only changes after the durable call it mirrors succeeded.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
