mod entry;
mod in_memory;
mod log;

pub use entry::LogEntry;
pub use entry::LogPayload;
pub use entry::LogTerm;
pub use in_memory::InMemoryLog;
pub use log::LogId;
pub use log::LogIndex;
pub use log::LogIterator;
pub use log::PersistedLog;
