use crate::commitlog::{LogIndex, LogTerm};
use crate::replica::{LogStatistics, ParticipantId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// What the leader knows about one follower's replication progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FollowerStatistics {
    pub last_acked_index: LogIndex,
    pub last_acked_commit_index: LogIndex,
    pub num_errors_since_last_answer: u32,
    pub request_in_flight: bool,
    // None until the follower answered for the first time. A follower that stays behind while
    // this keeps moving is rejecting; one where this stops moving is unreachable.
    pub last_answer_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderStatus {
    pub term: LogTerm,
    pub local: LogStatistics,
    pub follower: HashMap<ParticipantId, FollowerStatistics>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FollowerStatus {
    pub term: LogTerm,
    pub leader: ParticipantId,
    pub local: LogStatistics,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogStatus {
    Unconfigured { spearhead: LogIndex },
    Leader(LeaderStatus),
    Follower(FollowerStatus),
}

impl LogStatus {
    pub fn local(&self) -> LogStatistics {
        match self {
            LogStatus::Unconfigured { spearhead } => LogStatistics {
                spearhead: *spearhead,
                commit_index: LogIndex::ZERO,
            },
            LogStatus::Leader(status) => status.local,
            LogStatus::Follower(status) => status.local,
        }
    }
}
