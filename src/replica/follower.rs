use crate::commitlog::{LogEntry, LogIndex, LogTerm};
use crate::replica::participant::{lock, LogParticipant, ParticipantState};
use crate::replica::{
    AbstractFollower, AppendEntriesRequest, AppendEntriesResult, FollowerStatus, LogCore, LogError, LogSnapshot,
    LogStatus, ParticipantId, ReplicationError,
};
use std::sync::{Arc, Mutex};

/// LogFollower accepts AppendEntries from the leader of its term and mirrors the leader's log.
///
/// Cloning yields another handle to the same follower.
#[derive(Clone)]
pub struct LogFollower {
    inner: Arc<FollowerInner>,
}

struct FollowerInner {
    logger: slog::Logger,
    id: ParticipantId,
    leader_id: ParticipantId,
    term: LogTerm,
    guarded: Mutex<ParticipantState>,
}

impl LogFollower {
    pub fn new(
        logger: &slog::Logger,
        id: ParticipantId,
        term: LogTerm,
        leader_id: ParticipantId,
        log_core: LogCore,
    ) -> Self {
        let logger = logger.new(slog::o!(
            "ParticipantId" => id.to_string(),
            "Term" => term.as_u64(),
            "Role" => "Follower",
        ));
        slog::info!(logger, "Following {} with log {:?}", leader_id, log_core);

        LogFollower {
            inner: Arc::new(FollowerInner {
                logger,
                id,
                leader_id,
                term,
                guarded: Mutex::new(ParticipantState::new(log_core)),
            }),
        }
    }

    pub fn leader_id(&self) -> &ParticipantId {
        &self.inner.leader_id
    }

    pub async fn append_entries(&self, request: AppendEntriesRequest) -> Result<AppendEntriesResult, LogError> {
        self.inner.handle_append_entries(request)
    }

    pub fn get_entry_by_index(&self, index: LogIndex) -> Option<LogEntry> {
        lock(&self.inner.guarded).get_entry_by_index(index)
    }

    /// Entries up to the commit index, as of now.
    pub fn committed_entries(&self) -> Result<LogSnapshot, LogError> {
        lock(&self.inner.guarded).committed_entries()
    }

    pub fn follower_status(&self) -> FollowerStatus {
        FollowerStatus {
            term: self.inner.term,
            leader: self.inner.leader_id.clone(),
            local: lock(&self.inner.guarded).local_statistics(),
        }
    }
}

impl FollowerInner {
    fn handle_append_entries(&self, request: AppendEntriesRequest) -> Result<AppendEntriesResult, LogError> {
        let mut guarded = lock(&self.guarded);

        // 1. Reply false if the request doesn't come from our leader in our term.
        if request.leader_term != self.term || request.leader_id != self.leader_id {
            slog::info!(
                self.logger,
                "Rejecting AppendEntries from {} in term {}",
                request.leader_id,
                request.leader_term
            );
            return Ok(AppendEntriesResult::rejected(self.term));
        }

        request.validate()?;
        let commit_index = guarded.commit_index();
        let log_core = guarded.log_core_mut()?;

        // 2. Reply false if our log doesn't contain an entry at prevLogIndex whose term matches
        //    prevLogTerm. The leader retries further back.
        if !request.prev_log_index.is_zero() {
            match log_core.entry(request.prev_log_index) {
                Some(entry) if entry.term() == request.prev_log_term => { /* carry on */ }
                Some(entry) => {
                    slog::debug!(
                        self.logger,
                        "Log mismatch at {}: local term {}, leader term {}",
                        request.prev_log_index,
                        entry.term(),
                        request.prev_log_term
                    );
                    return Ok(AppendEntriesResult::rejected(self.term));
                }
                None => {
                    slog::debug!(
                        self.logger,
                        "Missing previous log entry {}, local spearhead {}",
                        request.prev_log_index,
                        log_core.last_index()
                    );
                    return Ok(AppendEntriesResult::rejected(self.term));
                }
            }
        }

        // 3. Skip entries we already hold, then drop everything after the point of agreement.
        //    The committed prefix is never removed.
        let prev_log_index = request.prev_log_index;
        let mut entries = request.entries;
        let num_known = entries
            .iter()
            .take_while(|entry| log_core.entry(entry.index()).map(LogEntry::term) == Some(entry.term()))
            .count();
        let new_entries = entries.split_off(num_known);
        let agreed_index = prev_log_index.plus(num_known as u64);

        if !new_entries.is_empty() && agreed_index < commit_index {
            slog::warn!(
                self.logger,
                "Entry {} conflicts with commit index {}",
                agreed_index.plus(1),
                commit_index
            );
            return Err(LogError::MalformedRequest("entries conflict with committed entries"));
        }

        let truncate_from = std::cmp::max(agreed_index, commit_index).plus(1);
        if truncate_from <= log_core.last_index() {
            log_core
                .remove_back(truncate_from)
                .map_err(|e| self.storage_error("truncate", e))?;
        }

        // 4. + 5. Persist, then append in memory.
        let num_entries = new_entries.len();
        log_core
            .append(new_entries)
            .map_err(|e| self.storage_error("insert", e))?;

        // 6. Follow the leader's commit index as far as our log reaches.
        if guarded.ratchet_fwd_commit_index(request.leader_commit) {
            slog::debug!(self.logger, "Commit index is now {}", guarded.commit_index());
        }

        slog::debug!(
            self.logger,
            "Appended {} entries after {}, commit index {}",
            num_entries,
            agreed_index,
            guarded.commit_index()
        );

        Ok(AppendEntriesResult::accepted(self.term))
    }

    fn storage_error(&self, operation: &str, error: std::io::Error) -> LogError {
        slog::error!(self.logger, "Failed to {} durable log: {:?}", operation, error);
        LogError::StorageError(error)
    }
}

impl LogParticipant for LogFollower {
    fn participant_id(&self) -> &ParticipantId {
        &self.inner.id
    }

    fn term(&self) -> LogTerm {
        self.inner.term
    }

    fn get_status(&self) -> LogStatus {
        LogStatus::Follower(self.follower_status())
    }

    fn resign(&self) -> Result<LogCore, LogError> {
        let log_core = lock(&self.inner.guarded).resign()?;
        slog::info!(self.inner.logger, "Resigned");
        Ok(log_core)
    }
}

// Lets a leader drive a follower living in the same process.
#[async_trait::async_trait]
impl AbstractFollower for LogFollower {
    fn participant_id(&self) -> &ParticipantId {
        &self.inner.id
    }

    async fn append_entries(&self, request: AppendEntriesRequest) -> Result<AppendEntriesResult, ReplicationError> {
        LogFollower::append_entries(self, request)
            .await
            .map_err(ReplicationError::from)
    }
}
