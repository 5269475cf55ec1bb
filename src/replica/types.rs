use crate::commitlog::{LogIndex, LogTerm};
use std::collections::HashSet;
use std::fmt;

/// ParticipantId names a leader or follower of a replicated log.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        ParticipantId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        ParticipantId::new(id)
    }
}

/// Read-only snapshot of a participant's local log.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LogStatistics {
    /// Highest locally held index, committed or not.
    pub spearhead: LogIndex,
    pub commit_index: LogIndex,
}

/// Records the most recent commit: which index got committed, in which term, and which
/// participants formed the quorum that acknowledged it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QuorumData {
    pub index: LogIndex,
    pub term: LogTerm,
    pub quorum: HashSet<ParticipantId>,
}

impl QuorumData {
    pub(crate) fn nothing_committed(term: LogTerm) -> Self {
        QuorumData {
            index: LogIndex::ZERO,
            term,
            quorum: HashSet::new(),
        }
    }
}
