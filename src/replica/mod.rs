mod follower;
mod follower_progress;
mod leader;
mod log_core;
mod participant;
mod peer_client;
mod replica_api;
mod replicated_log;
mod status;
mod types;

pub use follower::LogFollower;
pub use leader::LogLeader;
pub use log_core::LogCore;
pub use log_core::LogSnapshot;
pub use participant::LogParticipant;
pub use peer_client::AbstractFollower;
pub use peer_client::ConnectError;
pub use peer_client::GrpcFollower;
pub use replica_api::AppendEntriesRequest;
pub use replica_api::AppendEntriesResult;
pub use replica_api::LogError;
pub use replica_api::ReplicationError;
pub use replicated_log::Participant;
pub use replicated_log::ReplicatedLog;
pub use status::FollowerStatistics;
pub use status::FollowerStatus;
pub use status::LeaderStatus;
pub use status::LogStatus;
pub use types::LogStatistics;
pub use types::ParticipantId;
pub use types::QuorumData;

// So the server can translate between wire and domain types.
pub(crate) use peer_client::from_proto_request;
pub(crate) use peer_client::to_proto_result;
