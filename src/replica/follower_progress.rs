use crate::api::RetryPolicy;
use crate::commitlog::{LogIndex, LogTerm};
use crate::replica::{AppendEntriesResult, FollowerStatistics, ReplicationError};
use chrono::{DateTime, Utc};
use tokio::time::Duration;

/// FollowerProgress is the leader's view of one follower's log.
#[derive(Debug)]
pub(crate) struct FollowerProgress {
    // Highest index known to be replicated on the follower. Optimistically seeded one behind the
    // leader's spearhead and walked back one by one while the follower rejects.
    last_acked_index: LogIndex,
    // Whether the follower acknowledged anything in this term. Until then the seeded
    // `last_acked_index` is a guess and doesn't count towards a quorum.
    confirmed: bool,
    // Leader commit index carried by the last acknowledged request.
    last_acked_commit_index: LogIndex,
    num_errors_since_last_answer: u32,
    // At most one outstanding request per follower; no pipelining.
    request_in_flight: bool,
    last_answer_at: Option<DateTime<Utc>>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ProgressUpdate {
    /// The follower accepted everything up to `last_acked_index`.
    Acked,
    /// The follower is missing the previous entry or has it with another term.
    Rejected,
    /// No usable answer. Wait this long before retrying.
    RetryAfter(Duration),
}

/// What the leader sent, needed to interpret the answer.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SentRequest {
    pub(crate) up_to: LogIndex,
    pub(crate) commit_index: LogIndex,
}

impl FollowerProgress {
    pub(crate) fn new(leader_last_index: LogIndex) -> Self {
        FollowerProgress {
            last_acked_index: leader_last_index.saturating_minus(1),
            confirmed: false,
            last_acked_commit_index: LogIndex::ZERO,
            num_errors_since_last_answer: 0,
            request_in_flight: false,
            last_answer_at: None,
        }
    }

    pub(crate) fn last_acked_index(&self) -> LogIndex {
        self.last_acked_index
    }

    /// Index the follower is known to hold, as far as commit decisions are concerned.
    pub(crate) fn quorum_index(&self) -> LogIndex {
        if self.confirmed {
            self.last_acked_index
        } else {
            LogIndex::ZERO
        }
    }

    pub(crate) fn is_request_in_flight(&self) -> bool {
        self.request_in_flight
    }

    /// True if the follower lacks entries or hasn't heard of the current commit index.
    pub(crate) fn has_news(&self, leader_last_index: LogIndex, leader_commit_index: LogIndex) -> bool {
        self.last_acked_index != leader_last_index || self.last_acked_commit_index != leader_commit_index
    }

    pub(crate) fn mark_request_in_flight(&mut self) {
        self.request_in_flight = true;
    }

    pub(crate) fn clear_request_in_flight(&mut self) {
        self.request_in_flight = false;
    }

    pub(crate) fn handle_append_entries_outcome(
        &mut self,
        logger: &slog::Logger,
        leader_term: LogTerm,
        sent: SentRequest,
        outcome: Result<AppendEntriesResult, ReplicationError>,
        retry_policy: &RetryPolicy,
    ) -> ProgressUpdate {
        match outcome {
            Ok(result) if result.success => {
                self.last_answer_at = Some(Utc::now());
                self.last_acked_index = sent.up_to;
                self.confirmed = true;
                self.last_acked_commit_index = sent.commit_index;
                self.num_errors_since_last_answer = 0;
                ProgressUpdate::Acked
            }
            Ok(result) => {
                self.last_answer_at = Some(Utc::now());
                // Walking further back can't help if the follower isn't in our term or if we're
                // already at the beginning of the log. Don't hammer it; back off instead.
                if result.term != leader_term || self.last_acked_index.is_zero() {
                    self.num_errors_since_last_answer = self.num_errors_since_last_answer.saturating_add(1);
                    slog::warn!(
                        logger,
                        "Follower in term {} rejected request at index {}",
                        result.term,
                        self.last_acked_index
                    );
                    return ProgressUpdate::RetryAfter(
                        retry_policy.jittered_delay_for(self.num_errors_since_last_answer),
                    );
                }

                self.last_acked_index = self.last_acked_index.saturating_minus(1);
                slog::debug!(logger, "Follower rejected, retrying from index {}", self.last_acked_index);
                ProgressUpdate::Rejected
            }
            Err(e) => {
                self.num_errors_since_last_answer = self.num_errors_since_last_answer.saturating_add(1);
                let delay = retry_policy.jittered_delay_for(self.num_errors_since_last_answer);
                slog::warn!(
                    logger,
                    "AppendEntries failure #{}, retrying in {:?}: {}",
                    self.num_errors_since_last_answer,
                    delay,
                    e
                );
                ProgressUpdate::RetryAfter(delay)
            }
        }
    }

    pub(crate) fn statistics(&self) -> FollowerStatistics {
        FollowerStatistics {
            last_acked_index: self.last_acked_index,
            last_acked_commit_index: self.last_acked_commit_index,
            num_errors_since_last_answer: self.num_errors_since_last_answer,
            request_in_flight: self.request_in_flight,
            last_answer_at: self.last_answer_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::RetryPolicy;
    use crate::commitlog::{LogIndex, LogTerm};
    use crate::replica::follower_progress::{FollowerProgress, ProgressUpdate, SentRequest};
    use crate::replica::{AppendEntriesResult, ReplicationError};
    use crate::test_utils::test_logger;
    use tokio::time::Duration;

    const TERM: LogTerm = LogTerm::new(2);

    fn policy() -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(400),
        }
    }

    fn sent(up_to: u64, commit_index: u64) -> SentRequest {
        SentRequest {
            up_to: LogIndex::new(up_to),
            commit_index: LogIndex::new(commit_index),
        }
    }

    fn answer(success: bool, term: LogTerm) -> Result<AppendEntriesResult, ReplicationError> {
        Ok(AppendEntriesResult { success, term })
    }

    #[test]
    fn seeded_one_behind_leader() {
        assert_eq!(FollowerProgress::new(LogIndex::new(5)).last_acked_index(), LogIndex::new(4));
        assert_eq!(FollowerProgress::new(LogIndex::new(1)).last_acked_index(), LogIndex::ZERO);
        assert_eq!(FollowerProgress::new(LogIndex::ZERO).last_acked_index(), LogIndex::ZERO);
    }

    #[test]
    fn seeded_index_counts_for_quorum_only_once_acked() {
        let logger = test_logger();
        let mut progress = FollowerProgress::new(LogIndex::new(5));
        assert_eq!(progress.quorum_index(), LogIndex::ZERO);

        progress.handle_append_entries_outcome(&logger, TERM, sent(4, 0), answer(false, TERM), &policy());
        assert_eq!(progress.quorum_index(), LogIndex::ZERO);

        progress.handle_append_entries_outcome(&logger, TERM, sent(5, 0), answer(true, TERM), &policy());
        assert_eq!(progress.quorum_index(), LogIndex::new(5));
    }

    #[test]
    fn news_means_missing_entries_or_commit() {
        let progress = FollowerProgress::new(LogIndex::new(1));

        assert!(progress.has_news(LogIndex::new(1), LogIndex::ZERO));
        assert!(!progress.has_news(LogIndex::ZERO, LogIndex::ZERO));
        assert!(progress.has_news(LogIndex::ZERO, LogIndex::new(1)));
    }

    #[test]
    fn ack_moves_progress_and_resets_errors() {
        let logger = test_logger();
        let mut progress = FollowerProgress::new(LogIndex::new(3));
        progress.handle_append_entries_outcome(&logger, TERM, sent(3, 1), Err(ReplicationError::Timeout), &policy());

        let update = progress.handle_append_entries_outcome(&logger, TERM, sent(5, 2), answer(true, TERM), &policy());

        assert_eq!(update, ProgressUpdate::Acked);
        let stats = progress.statistics();
        assert_eq!(stats.last_acked_index, LogIndex::new(5));
        assert_eq!(stats.last_acked_commit_index, LogIndex::new(2));
        assert_eq!(stats.num_errors_since_last_answer, 0);
        assert!(stats.last_answer_at.is_some());
    }

    #[test]
    fn rejection_walks_back_one_entry() {
        let logger = test_logger();
        let mut progress = FollowerProgress::new(LogIndex::new(4));

        let update = progress.handle_append_entries_outcome(&logger, TERM, sent(4, 0), answer(false, TERM), &policy());

        assert_eq!(update, ProgressUpdate::Rejected);
        assert_eq!(progress.last_acked_index(), LogIndex::new(2));
        assert_eq!(progress.statistics().num_errors_since_last_answer, 0);
    }

    #[test]
    fn hopeless_rejection_backs_off() {
        let logger = test_logger();
        let mut at_start = FollowerProgress::new(LogIndex::new(1));
        let mut other_term = FollowerProgress::new(LogIndex::new(4));

        let update = at_start.handle_append_entries_outcome(&logger, TERM, sent(1, 0), answer(false, TERM), &policy());
        assert!(matches!(update, ProgressUpdate::RetryAfter(_)));
        assert_eq!(at_start.last_acked_index(), LogIndex::ZERO);

        let update = other_term.handle_append_entries_outcome(
            &logger,
            TERM,
            sent(4, 0),
            answer(false, LogTerm::new(7)),
            &policy(),
        );
        assert!(matches!(update, ProgressUpdate::RetryAfter(_)));
        assert_eq!(other_term.last_acked_index(), LogIndex::new(3));
    }

    #[test]
    fn consecutive_failures_grow_backoff_up_to_cap() {
        let logger = test_logger();
        let mut progress = FollowerProgress::new(LogIndex::new(2));

        let mut delays = Vec::new();
        for _ in 0..5 {
            match progress.handle_append_entries_outcome(
                &logger,
                TERM,
                sent(2, 0),
                Err(ReplicationError::Transport("connection refused".into())),
                &policy(),
            ) {
                ProgressUpdate::RetryAfter(delay) => delays.push(delay),
                other => panic!("Unexpected update {:?}", other),
            }
        }

        assert_eq!(progress.statistics().num_errors_since_last_answer, 5);
        assert_eq!(progress.last_acked_index(), LogIndex::new(1));
        let nominal = [100, 200, 400, 400, 400];
        for (delay, nominal) in delays.into_iter().zip(nominal.iter()) {
            let nominal = Duration::from_millis(*nominal);
            assert!(delay <= nominal && delay >= nominal - nominal / 10);
        }
    }

    #[test]
    fn error_count_saturates() {
        let logger = test_logger();
        let mut progress = FollowerProgress::new(LogIndex::new(1));
        progress.num_errors_since_last_answer = u32::MAX;

        let update = progress.handle_append_entries_outcome(&logger, TERM, sent(1, 0), answer(false, TERM), &policy());
        assert!(update_delay(&update) <= Duration::from_millis(400));
        assert_eq!(progress.statistics().num_errors_since_last_answer, u32::MAX);

        let update =
            progress.handle_append_entries_outcome(&logger, TERM, sent(1, 0), Err(ReplicationError::Timeout), &policy());
        assert!(update_delay(&update) <= Duration::from_millis(400));
        assert_eq!(progress.statistics().num_errors_since_last_answer, u32::MAX);
    }

    fn update_delay(update: &ProgressUpdate) -> Duration {
        match update {
            ProgressUpdate::RetryAfter(delay) => *delay,
            other => panic!("Unexpected update {:?}", other),
        }
    }
}
