mod api;
mod commitlog;
mod log_manager;
mod replica;
mod server;
#[cfg(test)]
mod test_utils;
mod grpc {
    include!("../generated/replicated_log.rs");
}

pub use api::try_create_replicated_log;
pub use api::ReplicatedLogConfig;
pub use api::ReplicatedLogCreationError;
pub use api::ReplicationOptions;
pub use commitlog::InMemoryLog;
pub use commitlog::LogEntry;
pub use commitlog::LogId;
pub use commitlog::LogIndex;
pub use commitlog::LogIterator;
pub use commitlog::LogPayload;
pub use commitlog::LogTerm;
pub use commitlog::PersistedLog;
pub use log_manager::LogManager;
pub use log_manager::LogManagerError;
pub use replica::AbstractFollower;
pub use replica::AppendEntriesRequest;
pub use replica::AppendEntriesResult;
pub use replica::ConnectError;
pub use replica::FollowerStatistics;
pub use replica::FollowerStatus;
pub use replica::GrpcFollower;
pub use replica::LeaderStatus;
pub use replica::LogError;
pub use replica::LogFollower;
pub use replica::LogLeader;
pub use replica::LogParticipant;
pub use replica::LogSnapshot;
pub use replica::LogStatistics;
pub use replica::LogStatus;
pub use replica::Participant;
pub use replica::ParticipantId;
pub use replica::QuorumData;
pub use replica::ReplicatedLog;
pub use replica::ReplicationError;
pub use server::shutdown_signal;
pub use server::RpcServer;
pub use server::RpcServerShutdownHandle;
pub use server::RpcServerShutdownSignal;

