use crate::commitlog::LogIndex;
use bytes::Bytes;
use std::fmt;

/// LogTerm is the leadership term an entry was created in. Term 0 means "no term yet".
#[derive(Copy, Clone, Default, PartialOrd, PartialEq, Ord, Eq, Hash)]
pub struct LogTerm(u64);

impl LogTerm {
    pub const ZERO: LogTerm = LogTerm(0);

    pub const fn new(term: u64) -> Self {
        LogTerm(term)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for LogTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LogTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque application data carried by a log entry.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct LogPayload(Bytes);

impl LogPayload {
    pub fn new(data: Bytes) -> Self {
        LogPayload(data)
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Bytes> for LogPayload {
    fn from(data: Bytes) -> Self {
        LogPayload(data)
    }
}

impl From<Vec<u8>> for LogPayload {
    fn from(data: Vec<u8>) -> Self {
        LogPayload(Bytes::from(data))
    }
}

impl From<&'static str> for LogPayload {
    fn from(data: &'static str) -> Self {
        LogPayload(Bytes::from_static(data.as_bytes()))
    }
}

impl fmt::Debug for LogPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}B", self.0.len())
    }
}

/// An immutable `(term, index, payload)` triple.
///
/// Entries are never patched in place. If a follower's history diverges from its leader's, the
/// diverging entries are removed and replaced by new entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    term: LogTerm,
    index: LogIndex,
    payload: LogPayload,
}

impl LogEntry {
    pub fn new(term: LogTerm, index: LogIndex, payload: LogPayload) -> Self {
        LogEntry { term, index, payload }
    }

    pub fn term(&self) -> LogTerm {
        self.term
    }

    pub fn index(&self) -> LogIndex {
        self.index
    }

    pub fn payload(&self) -> &LogPayload {
        &self.payload
    }

    pub fn into_payload(self) -> LogPayload {
        self.payload
    }
}
