use crate::api::ReplicationOptionsValidated;
use crate::commitlog::{LogEntry, LogIndex, LogPayload, LogTerm};
use crate::replica::follower_progress::{FollowerProgress, ProgressUpdate, SentRequest};
use crate::replica::participant::{lock, LogParticipant, ParticipantState};
use crate::replica::{
    AbstractFollower, AppendEntriesRequest, LeaderStatus, LogCore, LogError, LogSnapshot, LogStatus, ParticipantId,
    QuorumData, ReplicationError,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// LogLeader accepts new entries, replicates them to its followers and decides when they are
/// committed.
///
/// Cloning yields another handle to the same leader.
#[derive(Clone)]
pub struct LogLeader {
    inner: Arc<LeaderInner>,
}

struct LeaderInner {
    logger: slog::Logger,
    id: ParticipantId,
    term: LogTerm,
    // Number of participants, the leader included, that must hold an entry before it's committed.
    write_concern: usize,
    options: ReplicationOptionsValidated,
    followers: HashMap<ParticipantId, Arc<dyn AbstractFollower>>,
    guarded: Mutex<GuardedLeaderData>,
}

struct GuardedLeaderData {
    participant: ParticipantState,
    follower: BTreeMap<ParticipantId, FollowerProgress>,
    // Promises of `wait_for()`, keyed by the index they wait for.
    waiting: BTreeMap<LogIndex, Vec<oneshot::Sender<QuorumData>>>,
    last_quorum: QuorumData,
}

struct PreparedRequest {
    follower_id: ParticipantId,
    request: AppendEntriesRequest,
    sent: SentRequest,
}

enum WaitRegistration {
    Ready(QuorumData),
    Pending(oneshot::Receiver<QuorumData>),
}

pub(crate) fn validate_write_concern(write_concern: usize, num_followers: usize) -> Result<(), LogError> {
    let participants = num_followers + 1;
    if write_concern == 0 || write_concern > participants {
        return Err(LogError::InvalidWriteConcern {
            write_concern,
            participants,
        });
    }

    Ok(())
}

impl LogLeader {
    /// The caller validated `write_concern` against `followers`.
    pub(crate) fn new(
        logger: &slog::Logger,
        id: ParticipantId,
        term: LogTerm,
        followers: Vec<Arc<dyn AbstractFollower>>,
        write_concern: usize,
        options: ReplicationOptionsValidated,
        log_core: LogCore,
    ) -> Self {
        let logger = logger.new(slog::o!(
            "ParticipantId" => id.to_string(),
            "Term" => term.as_u64(),
            "Role" => "Leader",
        ));

        let last_index = log_core.last_index();
        let follower_progress = followers
            .iter()
            .map(|follower| (follower.participant_id().clone(), FollowerProgress::new(last_index)))
            .collect();
        let followers: HashMap<_, _> = followers
            .into_iter()
            .map(|follower| (follower.participant_id().clone(), follower))
            .collect();

        slog::info!(
            logger,
            "Leading {} followers with write concern {}, log {:?}",
            followers.len(),
            write_concern,
            log_core
        );

        LogLeader {
            inner: Arc::new(LeaderInner {
                logger,
                id,
                term,
                write_concern,
                options,
                followers,
                guarded: Mutex::new(GuardedLeaderData {
                    participant: ParticipantState::new(log_core),
                    follower: follower_progress,
                    waiting: BTreeMap::new(),
                    last_quorum: QuorumData::nothing_committed(term),
                }),
            }),
        }
    }

    /// Appends a new entry in the current term to the leader's own log and returns its index.
    /// Replication happens with the next `run_async_step()`.
    pub fn insert(&self, payload: LogPayload) -> Result<LogIndex, LogError> {
        let mut guarded = lock(&self.inner.guarded);
        let log_core = guarded.participant.log_core_mut()?;

        let index = log_core.next_index();
        log_core
            .append(vec![LogEntry::new(self.inner.term, index, payload)])
            .map_err(|e| {
                slog::error!(self.inner.logger, "Failed to persist entry {}: {:?}", index, e);
                LogError::StorageError(e)
            })?;

        slog::debug!(self.inner.logger, "Inserted entry {}", index);
        Ok(index)
    }

    /// Resolves once `index` is committed. The returned future doesn't need to be polled for the
    /// registration to happen; it is registered right away.
    pub fn wait_for(&self, index: LogIndex) -> impl Future<Output = Result<QuorumData, LogError>> + Send + 'static {
        let registration = lock(&self.inner.guarded).register_waiter(index);

        async move {
            match registration? {
                WaitRegistration::Ready(quorum) => Ok(quorum),
                WaitRegistration::Pending(rx) => rx.await.map_err(|_| LogError::ParticipantResigned),
            }
        }
    }

    /// Sends AppendEntries to every follower that has no request in flight and is missing
    /// entries or the current commit index. Must be called within a tokio runtime.
    pub fn run_async_step(&self) {
        let requests = {
            let mut guarded = lock(&self.inner.guarded);
            self.inner.check_commit_index(&mut guarded);
            self.inner.prepare_all_requests(&mut guarded)
        };

        self.inner.spawn_replication(requests);
    }

    pub fn leader_status(&self) -> LeaderStatus {
        let guarded = lock(&self.inner.guarded);

        LeaderStatus {
            term: self.inner.term,
            local: guarded.participant.local_statistics(),
            follower: guarded
                .follower
                .iter()
                .map(|(id, progress)| (id.clone(), progress.statistics()))
                .collect(),
        }
    }

    pub fn get_entry_by_index(&self, index: LogIndex) -> Option<LogEntry> {
        lock(&self.inner.guarded).participant.get_entry_by_index(index)
    }

    /// Entries up to the commit index, as of now.
    pub fn committed_entries(&self) -> Result<LogSnapshot, LogError> {
        lock(&self.inner.guarded).participant.committed_entries()
    }

    pub fn write_concern(&self) -> usize {
        self.inner.write_concern
    }
}

impl GuardedLeaderData {
    fn register_waiter(&mut self, index: LogIndex) -> Result<WaitRegistration, LogError> {
        if self.participant.is_resigned() {
            return Err(LogError::ParticipantResigned);
        }

        if self.participant.commit_index() >= index {
            return Ok(WaitRegistration::Ready(self.last_quorum.clone()));
        }

        let (tx, rx) = oneshot::channel();
        self.waiting.entry(index).or_insert_with(Vec::new).push(tx);
        Ok(WaitRegistration::Pending(rx))
    }

    fn resolve_waiters(&mut self, quorum: &QuorumData) {
        let still_waiting = self.waiting.split_off(&quorum.index.plus(1));
        let resolved = std::mem::replace(&mut self.waiting, still_waiting);

        for promise in resolved.into_iter().flat_map(|(_, promises)| promises) {
            // The waiter may have lost interest.
            let _ = promise.send(quorum.clone());
        }
    }
}

impl LeaderInner {
    /// Moves the commit index forward if a quorum acknowledged more than is committed. Returns
    /// true if it moved.
    fn check_commit_index(&self, guarded: &mut GuardedLeaderData) -> bool {
        let spearhead = match guarded.participant.log_core() {
            Ok(log_core) => log_core.last_index(),
            Err(_) => return false,
        };

        // The leader holds its whole log, so it acknowledges its own spearhead.
        let acked = std::iter::once((spearhead, self.id.clone()))
            .chain(
                guarded
                    .follower
                    .iter()
                    .map(|(id, progress)| (progress.quorum_index(), id.clone())),
            )
            .collect();

        let (commit_index, quorum) = match compute_quorum(acked, self.write_concern) {
            Some(quorum) => quorum,
            None => return false,
        };
        if !guarded.participant.ratchet_fwd_commit_index(commit_index) {
            return false;
        }

        let quorum = QuorumData {
            index: guarded.participant.commit_index(),
            term: self.term,
            quorum,
        };
        slog::info!(self.logger, "Commit index is now {}, quorum {:?}", quorum.index, quorum.quorum);

        guarded.resolve_waiters(&quorum);
        guarded.last_quorum = quorum;
        true
    }

    fn prepare_all_requests(&self, guarded: &mut GuardedLeaderData) -> Vec<PreparedRequest> {
        let follower_ids: Vec<ParticipantId> = guarded.follower.keys().cloned().collect();

        follower_ids
            .iter()
            .filter_map(|follower_id| self.prepare_request(guarded, follower_id))
            .collect()
    }

    fn prepare_request(&self, guarded: &mut GuardedLeaderData, follower_id: &ParticipantId) -> Option<PreparedRequest> {
        let log_core = guarded.participant.log_core().ok()?;
        let commit_index = guarded.participant.commit_index();
        let progress = guarded.follower.get_mut(follower_id)?;

        if progress.is_request_in_flight() || !progress.has_news(log_core.last_index(), commit_index) {
            return None;
        }

        let prev_log_index = progress.last_acked_index();
        let prev_log_term = if prev_log_index.is_zero() {
            LogTerm::ZERO
        } else {
            match log_core.entry(prev_log_index) {
                Some(entry) => entry.term(),
                None => {
                    slog::error!(
                        self.logger,
                        "Follower {} acked index {} beyond our spearhead {}",
                        follower_id,
                        prev_log_index,
                        log_core.last_index()
                    );
                    return None;
                }
            }
        };

        let entries = log_core.entries_after(prev_log_index, self.options.max_entries_per_request);
        let sent = SentRequest {
            up_to: prev_log_index.plus(entries.len() as u64),
            commit_index,
        };
        progress.mark_request_in_flight();

        Some(PreparedRequest {
            follower_id: follower_id.clone(),
            request: AppendEntriesRequest {
                leader_term: self.term,
                leader_id: self.id.clone(),
                prev_log_term,
                prev_log_index,
                leader_commit: commit_index,
                entries,
            },
            sent,
        })
    }

    fn spawn_replication(self: &Arc<Self>, requests: Vec<PreparedRequest>) {
        for prepared in requests {
            tokio::task::spawn(Arc::clone(self).replicate_to_follower(prepared));
        }
    }

    // Drives one follower until it has nothing new to receive. Only one of these runs per
    // follower at a time, guarded by the follower's in-flight flag.
    async fn replicate_to_follower(self: Arc<Self>, mut prepared: PreparedRequest) {
        let follower_id = prepared.follower_id.clone();
        let follower = match self.followers.get(&follower_id) {
            Some(follower) => Arc::clone(follower),
            None => return,
        };
        let logger = self.logger.new(slog::o!("Follower" => follower_id.to_string()));

        loop {
            let PreparedRequest { request, sent, .. } = prepared;
            slog::debug!(
                logger,
                "Sending {} entries after {}, commit index {}",
                request.entries.len(),
                request.prev_log_index,
                request.leader_commit
            );

            let outcome =
                match tokio::time::timeout(self.options.append_entries_timeout, follower.append_entries(request)).await {
                    Ok(outcome) => outcome,
                    Err(_elapsed) => Err(ReplicationError::Timeout),
                };

            let (retry_delay, triggered) = {
                let mut guarded = lock(&self.guarded);
                if guarded.participant.is_resigned() {
                    slog::info!(logger, "Dropping AppendEntries reply, no longer leader");
                    return;
                }

                let update = match guarded.follower.get_mut(&follower_id) {
                    Some(progress) => progress.handle_append_entries_outcome(
                        &logger,
                        self.term,
                        sent,
                        outcome,
                        &self.options.retry_policy,
                    ),
                    None => return,
                };

                match update {
                    ProgressUpdate::Acked => {
                        // A new commit index is news for followers that are otherwise caught up.
                        let triggered = if self.check_commit_index(&mut guarded) {
                            self.prepare_all_requests(&mut guarded)
                        } else {
                            Vec::new()
                        };
                        (None, triggered)
                    }
                    ProgressUpdate::Rejected => (None, Vec::new()),
                    ProgressUpdate::RetryAfter(delay) => (Some(delay), Vec::new()),
                }
            };
            self.spawn_replication(triggered);

            if let Some(delay) = retry_delay {
                tokio::time::sleep(delay).await;
            }

            let next = {
                let mut guarded = lock(&self.guarded);
                if let Some(progress) = guarded.follower.get_mut(&follower_id) {
                    progress.clear_request_in_flight();
                }
                self.prepare_request(&mut guarded, &follower_id)
            };

            match next {
                Some(next) => prepared = next,
                None => return,
            }
        }
    }
}

/// Returns the `write_concern`-th highest acknowledged index together with the participants
/// acknowledging at least that much. Ties are broken by participant id.
fn compute_quorum(
    mut acked: Vec<(LogIndex, ParticipantId)>,
    write_concern: usize,
) -> Option<(LogIndex, HashSet<ParticipantId>)> {
    if write_concern == 0 || write_concern > acked.len() {
        return None;
    }

    acked.sort_by(|(a_index, a_id), (b_index, b_id)| b_index.cmp(a_index).then_with(|| a_id.cmp(b_id)));
    let commit_index = acked[write_concern - 1].0;
    let quorum = acked.into_iter().take(write_concern).map(|(_, id)| id).collect();

    Some((commit_index, quorum))
}

impl LogParticipant for LogLeader {
    fn participant_id(&self) -> &ParticipantId {
        &self.inner.id
    }

    fn term(&self) -> LogTerm {
        self.inner.term
    }

    fn get_status(&self) -> LogStatus {
        LogStatus::Leader(self.leader_status())
    }

    fn resign(&self) -> Result<LogCore, LogError> {
        let mut guarded = lock(&self.inner.guarded);
        let log_core = guarded.participant.resign()?;

        // Dropping the promises fails their futures with ParticipantResigned.
        let num_waiting: usize = guarded.waiting.values().map(Vec::len).sum();
        guarded.waiting.clear();

        slog::info!(self.inner.logger, "Resigned, abandoning {} waiters", num_waiting);
        Ok(log_core)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::{ReplicationOptionsValidated, RetryPolicy};
    use crate::commitlog::{InMemoryLog, LogEntry, LogIndex, LogPayload, LogTerm};
    use crate::replica::leader::{compute_quorum, validate_write_concern};
    use crate::replica::{
        AbstractFollower, LogCore, LogError, LogFollower, LogLeader, LogParticipant, ParticipantId,
    };
    use crate::test_utils::{eventually, test_logger, UnreachableFollower};
    use std::collections::HashSet;
    use std::sync::Arc;
    use tokio::time::Duration;

    const TERM: u64 = 3;

    fn entry(term: u64, index: u64) -> LogEntry {
        LogEntry::new(LogTerm::new(term), LogIndex::new(index), LogPayload::from(vec![term as u8, index as u8]))
    }

    fn core(entries: Vec<LogEntry>) -> LogCore {
        LogCore::new(Arc::new(InMemoryLog::with_entries(entries))).unwrap()
    }

    fn test_options() -> ReplicationOptionsValidated {
        ReplicationOptionsValidated {
            append_entries_timeout: Duration::from_millis(500),
            retry_policy: RetryPolicy {
                initial_delay: Duration::from_millis(5),
                max_delay: Duration::from_millis(20),
            },
            max_entries_per_request: 2,
        }
    }

    fn leader(entries: Vec<LogEntry>, followers: Vec<Arc<dyn AbstractFollower>>, write_concern: usize) -> LogLeader {
        validate_write_concern(write_concern, followers.len()).unwrap();
        LogLeader::new(
            &test_logger(),
            ParticipantId::new("leader"),
            LogTerm::new(TERM),
            followers,
            write_concern,
            test_options(),
            core(entries),
        )
    }

    fn follower(id: &str, entries: Vec<LogEntry>) -> LogFollower {
        LogFollower::new(
            &test_logger(),
            ParticipantId::new(id),
            LogTerm::new(TERM),
            ParticipantId::new("leader"),
            core(entries),
        )
    }

    fn as_abstract(follower: &LogFollower) -> Arc<dyn AbstractFollower> {
        Arc::new(follower.clone())
    }

    fn log_of(follower: &LogFollower) -> Vec<(u64, u64)> {
        let spearhead = follower.follower_status().local.spearhead.as_u64();
        (1..=spearhead)
            .filter_map(|i| follower.get_entry_by_index(LogIndex::new(i)))
            .map(|e| (e.term().as_u64(), e.index().as_u64()))
            .collect()
    }

    fn ids(ids: &[&str]) -> HashSet<ParticipantId> {
        ids.iter().map(|id| ParticipantId::new(*id)).collect()
    }

    #[test]
    fn test_quorum_logic() {
        fn run(expected: u64, write_concern: usize, acked: Vec<u64>) {
            let acked = acked
                .into_iter()
                .enumerate()
                .map(|(i, index)| (LogIndex::new(index), ParticipantId::new(format!("p{}", i))))
                .collect();

            let commit_index = compute_quorum(acked, write_concern).map(|(index, _)| index.as_u64());

            assert_eq!(Some(expected), commit_index);
        }

        // Single participant
        run(0, 1, vec![0]);
        run(7, 1, vec![7]);

        // 3 participants
        run(9, 1, vec![9, 0, 0]);
        run(0, 2, vec![9, 0, 0]);
        run(8, 2, vec![9, 8, 0]);
        run(8, 3, vec![9, 8, 8]);
        run(5, 2, vec![5, 5, 3]);

        // 5 participants
        run(0, 3, vec![9, 8, 0, 0, 0]);
        run(7, 3, vec![9, 8, 7, 0, 0]);
        run(6, 5, vec![9, 8, 7, 6, 6]);

        // Ordering doesn't matter
        run(8, 2, vec![0, 8, 9]);
        run(7, 3, vec![0, 9, 0, 7, 8]);
    }

    #[test]
    fn quorum_is_deterministic_on_ties() {
        let acked = vec![
            (LogIndex::new(5), ParticipantId::new("c")),
            (LogIndex::new(5), ParticipantId::new("b")),
            (LogIndex::new(5), ParticipantId::new("a")),
            (LogIndex::new(3), ParticipantId::new("d")),
        ];

        let (index, quorum) = compute_quorum(acked, 2).unwrap();

        assert_eq!(index, LogIndex::new(5));
        assert_eq!(quorum, ids(&["a", "b"]));
    }

    #[test]
    fn quorum_needs_enough_participants() {
        assert!(compute_quorum(vec![(LogIndex::new(1), ParticipantId::new("a"))], 2).is_none());
        assert!(compute_quorum(vec![(LogIndex::new(1), ParticipantId::new("a"))], 0).is_none());
    }

    #[test]
    fn write_concern_bounds() {
        assert!(validate_write_concern(1, 0).is_ok());
        assert!(validate_write_concern(3, 2).is_ok());
        assert!(matches!(
            validate_write_concern(0, 2),
            Err(LogError::InvalidWriteConcern { .. })
        ));
        assert!(matches!(
            validate_write_concern(4, 2),
            Err(LogError::InvalidWriteConcern {
                write_concern: 4,
                participants: 3
            })
        ));
    }

    #[tokio::test]
    async fn insert_assigns_consecutive_indexes_in_current_term() {
        let leader = leader(vec![entry(1, 1)], vec![], 1);

        let first = leader.insert(LogPayload::from("a")).unwrap();
        let second = leader.insert(LogPayload::from("b")).unwrap();

        assert_eq!(first, LogIndex::new(2));
        assert_eq!(second, LogIndex::new(3));
        let inserted = leader.get_entry_by_index(second).unwrap();
        assert_eq!(inserted.term(), LogTerm::new(TERM));
        assert_eq!(inserted.payload(), &LogPayload::from("b"));
        assert_eq!(leader.leader_status().local.spearhead, LogIndex::new(3));
    }

    #[tokio::test]
    async fn wait_for_stays_pending_until_committed() {
        let leader = leader(vec![], vec![], 1);
        let index = leader.insert(LogPayload::from("a")).unwrap();

        let mut waiting = Box::pin(leader.wait_for(index));
        assert!(tokio::time::timeout(Duration::from_millis(20), &mut waiting).await.is_err());

        leader.run_async_step();

        let quorum = tokio::time::timeout(Duration::from_secs(5), waiting)
            .await
            .expect("wait_for didn't resolve")
            .unwrap();
        assert_eq!(quorum.index, index);
        assert_eq!(quorum.term, LogTerm::new(TERM));
        assert_eq!(quorum.quorum, ids(&["leader"]));

        // Already committed indexes resolve right away with the latest quorum.
        let again = leader.wait_for(LogIndex::new(1)).await.unwrap();
        assert_eq!(again, quorum);
    }

    #[tokio::test]
    async fn commit_resolves_every_waiter_up_to_the_new_index() {
        let leader = leader(vec![], vec![], 1);
        for payload in &["a", "b", "c"] {
            leader.insert(LogPayload::from(*payload)).unwrap();
        }
        let below = leader.wait_for(LogIndex::new(2));
        let at = leader.wait_for(LogIndex::new(3));
        let at_twice = leader.wait_for(LogIndex::new(3));
        let at_again = leader.wait_for(LogIndex::new(3));
        let mut beyond = Box::pin(leader.wait_for(LogIndex::new(4)));

        leader.run_async_step();

        let mut resolved = Vec::new();
        for waiting in vec![below, at, at_twice, at_again] {
            let quorum = tokio::time::timeout(Duration::from_secs(5), waiting)
                .await
                .expect("wait_for didn't resolve")
                .unwrap();
            resolved.push(quorum);
        }
        assert_eq!(resolved[0].index, LogIndex::new(3));
        assert!(resolved.iter().all(|quorum| *quorum == resolved[0]));
        assert!(tokio::time::timeout(Duration::from_millis(20), &mut beyond).await.is_err());

        leader.insert(LogPayload::from("d")).unwrap();
        leader.run_async_step();

        let quorum = tokio::time::timeout(Duration::from_secs(5), beyond)
            .await
            .expect("wait_for didn't resolve")
            .unwrap();
        assert_eq!(quorum.index, LogIndex::new(4));
    }

    #[tokio::test]
    async fn replicates_and_commits_with_followers() {
        let a = follower("a", vec![]);
        let b = follower("b", vec![]);
        let leader = leader(vec![], vec![as_abstract(&a), as_abstract(&b)], 2);

        for payload in &["1", "2", "3", "4", "5"] {
            leader.insert(LogPayload::from(*payload)).unwrap();
        }
        let waiting = leader.wait_for(LogIndex::new(5));
        leader.run_async_step();

        let quorum = tokio::time::timeout(Duration::from_secs(5), waiting)
            .await
            .expect("wait_for didn't resolve")
            .unwrap();
        assert!(quorum.index >= LogIndex::new(5));
        assert!(quorum.quorum.contains(&ParticipantId::new("leader")));
        assert_eq!(quorum.quorum.len(), 2);

        // The new commit index reaches all followers, even caught up ones.
        eventually(|| {
            a.follower_status().local.commit_index == LogIndex::new(5)
                && b.follower_status().local.commit_index == LogIndex::new(5)
        })
        .await;
        let expected: Vec<_> = (1..=5).map(|i| (TERM, i)).collect();
        assert_eq!(log_of(&a), expected);
        assert_eq!(log_of(&b), expected);
        assert_eq!(leader.committed_entries().unwrap().len(), 5);

        let status = leader.leader_status();
        assert_eq!(status.local.commit_index, LogIndex::new(5));
        for id in &["a", "b"] {
            eventually(|| !leader.leader_status().follower[&ParticipantId::new(*id)].request_in_flight).await;
            let status = leader.leader_status();
            let stats = &status.follower[&ParticipantId::new(*id)];
            assert_eq!(stats.last_acked_index, LogIndex::new(5));
            assert_eq!(stats.last_acked_commit_index, LogIndex::new(5));
        }
    }

    #[tokio::test]
    async fn repairs_diverging_follower() {
        let leader_log = vec![entry(1, 1), entry(1, 2), entry(3, 3), entry(3, 4)];
        let diverging = follower("a", vec![entry(1, 1), entry(1, 2), entry(2, 3), entry(2, 4), entry(2, 5)]);
        let leader = leader(leader_log, vec![as_abstract(&diverging)], 2);

        leader.run_async_step();

        eventually(|| leader.leader_status().local.commit_index == LogIndex::new(4)).await;
        eventually(|| diverging.follower_status().local.commit_index == LogIndex::new(4)).await;
        assert_eq!(log_of(&diverging), vec![(1, 1), (1, 2), (3, 3), (3, 4)]);
    }

    #[tokio::test]
    async fn unreachable_follower_backs_off_without_blocking_commit() {
        let a = follower("a", vec![]);
        let unreachable = Arc::new(UnreachableFollower::new("b"));
        let leader = leader(vec![], vec![as_abstract(&a), unreachable.clone()], 2);

        let index = leader.insert(LogPayload::from("x")).unwrap();
        let waiting = leader.wait_for(index);
        leader.run_async_step();

        tokio::time::timeout(Duration::from_secs(5), waiting)
            .await
            .expect("wait_for didn't resolve")
            .unwrap();
        eventually(|| unreachable.num_calls() >= 3).await;
        let status = leader.leader_status();
        let stats = &status.follower[&ParticipantId::new("b")];
        assert!(stats.num_errors_since_last_answer >= 2);
        assert_eq!(stats.last_acked_index, LogIndex::ZERO);
        assert!(stats.last_answer_at.is_none());
    }

    #[tokio::test]
    async fn resign_fails_waiters_and_later_calls() {
        let a = follower("a", vec![]);
        let leader = leader(vec![entry(1, 1)], vec![as_abstract(&a)], 2);
        let waiting = leader.wait_for(LogIndex::new(9));

        let log_core = leader.resign().unwrap();

        assert_eq!(log_core.last_index(), LogIndex::new(1));
        assert!(matches!(waiting.await, Err(LogError::ParticipantResigned)));
        assert!(matches!(
            leader.insert(LogPayload::from("late")),
            Err(LogError::ParticipantResigned)
        ));
        assert!(matches!(
            leader.wait_for(LogIndex::new(1)).await,
            Err(LogError::ParticipantResigned)
        ));
        assert!(matches!(leader.resign(), Err(LogError::ParticipantResigned)));
        // Nothing left to replicate with.
        leader.run_async_step();
        assert_eq!(leader.leader_status().local.spearhead, LogIndex::ZERO);
    }
}
