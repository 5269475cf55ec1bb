use crate::api::ReplicationOptionsValidated;
use crate::commitlog::{LogId, LogTerm};
use crate::replica::leader::validate_write_concern;
use crate::replica::participant::{lock, LogParticipant};
use crate::replica::{AbstractFollower, LogCore, LogError, LogFollower, LogLeader, LogStatus, ParticipantId};
use std::sync::{Arc, Mutex};

/// ReplicatedLog owns one log core and hands it to whichever role this replica currently has.
///
/// Cloning yields another handle to the same log.
#[derive(Clone)]
pub struct ReplicatedLog {
    inner: Arc<ReplicatedLogInner>,
}

struct ReplicatedLogInner {
    logger: slog::Logger,
    log_id: LogId,
    options: ReplicationOptionsValidated,
    active: Mutex<ActiveParticipant>,
}

enum ActiveParticipant {
    // None only if handing the core to a new participant failed halfway.
    Unconfigured(Option<LogCore>),
    Leader(LogLeader),
    Follower(LogFollower),
}

/// Handle to the participant currently active in a `ReplicatedLog`.
#[derive(Clone)]
pub enum Participant {
    Leader(LogLeader),
    Follower(LogFollower),
}

impl ReplicatedLog {
    pub(crate) fn new(
        logger: &slog::Logger,
        log_id: LogId,
        options: ReplicationOptionsValidated,
        log_core: LogCore,
    ) -> Self {
        let logger = logger.new(slog::o!("LogId" => log_id.to_string()));
        slog::info!(logger, "Created replicated log {:?}", log_core);

        ReplicatedLog {
            inner: Arc::new(ReplicatedLogInner {
                logger,
                log_id,
                options,
                active: Mutex::new(ActiveParticipant::Unconfigured(Some(log_core))),
            }),
        }
    }

    pub fn log_id(&self) -> LogId {
        self.inner.log_id
    }

    /// Resigns the current participant and makes this replica the leader of `term`.
    ///
    /// `write_concern` counts the leader itself, so it must be within `1..=followers.len() + 1`.
    /// On an invalid write concern the current participant stays active.
    pub fn become_leader(
        &self,
        id: ParticipantId,
        term: LogTerm,
        followers: Vec<Arc<dyn AbstractFollower>>,
        write_concern: usize,
    ) -> Result<LogLeader, LogError> {
        validate_write_concern(write_concern, followers.len())?;

        let mut active = lock(&self.inner.active);
        let log_core = active.take_log_core()?;

        slog::info!(self.inner.logger, "Becoming leader {} in term {}", id, term);
        let leader = LogLeader::new(
            &self.inner.logger,
            id,
            term,
            followers,
            write_concern,
            self.inner.options.clone(),
            log_core,
        );
        *active = ActiveParticipant::Leader(leader.clone());

        Ok(leader)
    }

    /// Resigns the current participant and makes this replica a follower of `leader_id` in `term`.
    pub fn become_follower(
        &self,
        id: ParticipantId,
        term: LogTerm,
        leader_id: ParticipantId,
    ) -> Result<LogFollower, LogError> {
        let mut active = lock(&self.inner.active);
        let log_core = active.take_log_core()?;

        slog::info!(self.inner.logger, "Becoming follower {} of {} in term {}", id, leader_id, term);
        let follower = LogFollower::new(&self.inner.logger, id, term, leader_id, log_core);
        *active = ActiveParticipant::Follower(follower.clone());

        Ok(follower)
    }

    /// The active participant, if a role was assigned.
    pub fn participant(&self) -> Option<Participant> {
        match &*lock(&self.inner.active) {
            ActiveParticipant::Unconfigured(_) => None,
            ActiveParticipant::Leader(leader) => Some(Participant::Leader(leader.clone())),
            ActiveParticipant::Follower(follower) => Some(Participant::Follower(follower.clone())),
        }
    }

    pub fn get_status(&self) -> LogStatus {
        let active = lock(&self.inner.active);
        match &*active {
            ActiveParticipant::Unconfigured(log_core) => LogStatus::Unconfigured {
                spearhead: log_core.as_ref().map(LogCore::last_index).unwrap_or_default(),
            },
            ActiveParticipant::Leader(leader) => leader.get_status(),
            ActiveParticipant::Follower(follower) => follower.get_status(),
        }
    }
}

impl ActiveParticipant {
    fn take_log_core(&mut self) -> Result<LogCore, LogError> {
        match self {
            ActiveParticipant::Unconfigured(log_core) => log_core.take().ok_or(LogError::ParticipantResigned),
            ActiveParticipant::Leader(leader) => leader.resign(),
            ActiveParticipant::Follower(follower) => follower.resign(),
        }
    }
}

impl Participant {
    pub fn participant_id(&self) -> &ParticipantId {
        match self {
            Participant::Leader(leader) => leader.participant_id(),
            Participant::Follower(follower) => LogParticipant::participant_id(follower),
        }
    }

    pub fn term(&self) -> LogTerm {
        match self {
            Participant::Leader(leader) => leader.term(),
            Participant::Follower(follower) => follower.term(),
        }
    }

    pub fn get_status(&self) -> LogStatus {
        match self {
            Participant::Leader(leader) => leader.get_status(),
            Participant::Follower(follower) => follower.get_status(),
        }
    }
}
