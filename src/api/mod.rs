//! This mod is meant to hold most of the code for the library's client-facing API.
mod options;
mod wiring;

pub use options::ReplicationOptions;
pub use wiring::try_create_replicated_log;
pub use wiring::ReplicatedLogConfig;
pub use wiring::ReplicatedLogCreationError;

// So replicas can read their tuning.
pub(crate) use options::ReplicationOptionsValidated;
pub(crate) use options::RetryPolicy;
