use crate::commitlog::{LogEntry, LogId, LogIndex, LogPayload, LogTerm};
use crate::grpc::grpc_replicated_log_client::GrpcReplicatedLogClient;
use crate::grpc::{ProtoAppendEntriesRequest, ProtoAppendEntriesResult, ProtoLogEntry};
use crate::replica::{AppendEntriesRequest, AppendEntriesResult, ParticipantId, ReplicationError};
use bytes::Bytes;
use std::net::SocketAddr;
use tonic::codegen::http::uri;
use tonic::transport::{Channel, Endpoint};

/// A follower as seen by its leader: something that answers AppendEntries, possibly remotely.
#[async_trait::async_trait]
pub trait AbstractFollower: Send + Sync {
    fn participant_id(&self) -> &ParticipantId;

    async fn append_entries(&self, request: AppendEntriesRequest) -> Result<AppendEntriesResult, ReplicationError>;
}

/// GrpcFollower reaches a follower hosted by another process's `RpcServer`.
pub struct GrpcFollower {
    logger: slog::Logger,
    participant_id: ParticipantId,
    log_id: LogId,
    client: GrpcReplicatedLogClient<Channel>,
}

impl GrpcFollower {
    pub async fn connect(
        logger: &slog::Logger,
        participant_id: ParticipantId,
        log_id: LogId,
        addr: SocketAddr,
    ) -> Result<Self, ConnectError> {
        let url = format!("http://{}", addr);
        let logger = logger.new(slog::o!("Follower" => participant_id.to_string(), "LogId" => log_id.0));
        slog::info!(logger, "Connecting to {} ...", url);
        let endpoint = Endpoint::from_shared(url)?;

        let connection = endpoint.connect().await?;

        Ok(GrpcFollower {
            logger,
            participant_id,
            log_id,
            client: GrpcReplicatedLogClient::new(connection),
        })
    }
}

#[async_trait::async_trait]
impl AbstractFollower for GrpcFollower {
    fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    async fn append_entries(&self, request: AppendEntriesRequest) -> Result<AppendEntriesResult, ReplicationError> {
        // Channel is cheap to clone and multiplexes all clones over one connection.
        let mut client = self.client.clone();
        let rpc_request = to_proto_request(self.log_id, request);

        slog::debug!(self.logger, "ClientWire - {:?}", rpc_request);
        let rpc_reply = client.append_entries(rpc_request).await;
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_reply);

        match rpc_reply {
            Ok(reply) => Ok(from_proto_result(reply.into_inner())),
            Err(status) => Err(ReplicationError::Transport(format!(
                "AppendEntries RPC failed: {:?}: {}",
                status.code(),
                status.message()
            ))),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Invalid follower address")]
    InvalidUri(#[from] uri::InvalidUri),
    #[error("Failed to connect to follower")]
    ConnectFailure(#[from] tonic::transport::Error),
}

// ------- Conversions --------

pub(crate) fn to_proto_request(log_id: LogId, request: AppendEntriesRequest) -> ProtoAppendEntriesRequest {
    ProtoAppendEntriesRequest {
        log_id: log_id.0,
        leader_term: request.leader_term.as_u64(),
        leader_id: request.leader_id.into_inner(),
        prev_log_term: request.prev_log_term.as_u64(),
        prev_log_index: request.prev_log_index.as_u64(),
        leader_commit: request.leader_commit.as_u64(),
        entries: request
            .entries
            .into_iter()
            .map(|entry| ProtoLogEntry {
                term: entry.term().as_u64(),
                index: entry.index().as_u64(),
                payload: entry.into_payload().into_bytes().to_vec(),
            })
            .collect(),
    }
}

pub(crate) fn from_proto_request(rpc_request: ProtoAppendEntriesRequest) -> (LogId, AppendEntriesRequest) {
    let entries = rpc_request
        .entries
        .into_iter()
        .map(|proto_entry| {
            LogEntry::new(
                LogTerm::new(proto_entry.term),
                LogIndex::new(proto_entry.index),
                LogPayload::new(Bytes::from(proto_entry.payload)),
            )
        })
        .collect();

    let request = AppendEntriesRequest {
        leader_term: LogTerm::new(rpc_request.leader_term),
        leader_id: ParticipantId::new(rpc_request.leader_id),
        prev_log_term: LogTerm::new(rpc_request.prev_log_term),
        prev_log_index: LogIndex::new(rpc_request.prev_log_index),
        leader_commit: LogIndex::new(rpc_request.leader_commit),
        entries,
    };

    (LogId(rpc_request.log_id), request)
}

pub(crate) fn to_proto_result(result: AppendEntriesResult) -> ProtoAppendEntriesResult {
    ProtoAppendEntriesResult {
        term: result.term.as_u64(),
        success: result.success,
    }
}

fn from_proto_result(rpc_result: ProtoAppendEntriesResult) -> AppendEntriesResult {
    AppendEntriesResult {
        success: rpc_result.success,
        term: LogTerm::new(rpc_result.term),
    }
}

#[cfg(test)]
mod tests {
    use crate::commitlog::{LogEntry, LogId, LogIndex, LogPayload, LogTerm};
    use crate::replica::peer_client::{from_proto_request, to_proto_request};
    use crate::replica::{AppendEntriesRequest, ParticipantId};

    #[test]
    fn request_survives_the_wire() {
        let request = AppendEntriesRequest {
            leader_term: LogTerm::new(4),
            leader_id: ParticipantId::new("leader"),
            prev_log_term: LogTerm::new(3),
            prev_log_index: LogIndex::new(7),
            leader_commit: LogIndex::new(6),
            entries: vec![
                LogEntry::new(LogTerm::new(4), LogIndex::new(8), LogPayload::from("a")),
                LogEntry::new(LogTerm::new(4), LogIndex::new(9), LogPayload::from("bc")),
            ],
        };

        let proto = to_proto_request(LogId(12), request.clone());
        assert_eq!(proto.log_id, 12);
        assert_eq!(proto.entries[1].payload, b"bc".to_vec());

        let (log_id, decoded) = from_proto_request(proto);
        assert_eq!(log_id, LogId(12));
        assert_eq!(decoded, request);
    }
}
