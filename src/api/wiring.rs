use crate::api::options::ReplicationOptionsValidated;
use crate::commitlog::{LogId, PersistedLog};
use crate::replica::{LogCore, ReplicatedLog};
use crate::ReplicationOptions;
use std::convert::TryFrom;
use std::io;
use std::sync::Arc;

pub struct ReplicatedLogConfig {
    pub log_id: LogId,
    // The durable log this replica's entries live in. Must not be in use by another replicated log.
    pub persisted_log: Arc<dyn PersistedLog>,
    pub info_logger: slog::Logger,
    pub options: ReplicationOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum ReplicatedLogCreationError {
    #[error("Illegal options for configuring replicated log: {0}")]
    IllegalOptions(String),
    #[error("Log initialization failure")]
    LogInitialization(io::Error),
}

/// Loads the durable log and wraps it in an unconfigured `ReplicatedLog`. Assign a role with
/// `become_leader()` or `become_follower()`.
pub fn try_create_replicated_log(config: ReplicatedLogConfig) -> Result<ReplicatedLog, ReplicatedLogCreationError> {
    let options = ReplicationOptionsValidated::try_from(config.options)
        .map_err(|e| ReplicatedLogCreationError::IllegalOptions(e.to_string()))?;

    let log_core = LogCore::new(config.persisted_log).map_err(ReplicatedLogCreationError::LogInitialization)?;

    Ok(ReplicatedLog::new(&config.info_logger, config.log_id, options, log_core))
}
