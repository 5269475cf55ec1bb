use crate::commitlog::LogId;
use crate::grpc::grpc_replicated_log_server::{GrpcReplicatedLog, GrpcReplicatedLogServer};
use crate::grpc::{ProtoAppendEntriesRequest, ProtoAppendEntriesResult};
use crate::replica::{self, AppendEntriesRequest, LogError, Participant, ReplicatedLog};
use crate::server::RpcServerShutdownSignal;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// RpcServer lets remote leaders reach the followers of the replicated logs registered with it.
///
/// Cloning yields another handle to the same registry, so logs can be registered while the
/// server runs.
#[derive(Clone)]
pub struct RpcServer {
    logger: slog::Logger,
    logs: Arc<Mutex<HashMap<LogId, ReplicatedLog>>>,
}

impl RpcServer {
    pub fn new(logger: slog::Logger) -> Self {
        RpcServer {
            logger,
            logs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Routes requests for `log.log_id()` to `log`. Replaces an earlier registration.
    pub fn register(&self, log: ReplicatedLog) {
        slog::info!(self.logger, "Serving log {}", log.log_id());
        self.registry().insert(log.log_id(), log);
    }

    pub fn unregister(&self, log_id: LogId) -> Option<ReplicatedLog> {
        slog::info!(self.logger, "No longer serving log {}", log_id);
        self.registry().remove(&log_id)
    }

    pub async fn run(self, socket_addr: SocketAddr, shutdown_signal: RpcServerShutdownSignal) {
        let logger = self.logger.clone();
        slog::info!(logger, "Listening on '{:?}'", socket_addr);

        let result = Server::builder()
            .add_service(GrpcReplicatedLogServer::new(self))
            .serve_with_shutdown(socket_addr, shutdown_signal)
            .await;

        slog::info!(logger, "Server run() has exited: {:?}", result);
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<LogId, ReplicatedLog>> {
        self.logs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn handle_append_entries(
        &self,
        rpc_request: ProtoAppendEntriesRequest,
    ) -> Result<ProtoAppendEntriesResult, Status> {
        let (log_id, request) = replica::from_proto_request(rpc_request);
        let follower = self.follower_of(log_id, &request)?;

        follower
            .append_entries(request)
            .await
            .map(replica::to_proto_result)
            .map_err(Self::convert_log_error)
    }

    fn follower_of(&self, log_id: LogId, request: &AppendEntriesRequest) -> Result<replica::LogFollower, Status> {
        let log = self
            .registry()
            .get(&log_id)
            .cloned()
            .ok_or_else(|| Status::not_found(format!("Unknown log {}", log_id)))?;

        match log.participant() {
            Some(Participant::Follower(follower)) => Ok(follower),
            _ => {
                slog::info!(
                    self.logger,
                    "Refusing AppendEntries from {} for log {}, not a follower",
                    request.leader_id,
                    log_id
                );
                Err(Status::failed_precondition(format!("Log {} is not a follower", log_id)))
            }
        }
    }

    fn convert_log_error(error: LogError) -> Status {
        match error {
            LogError::MalformedRequest(reason) => Status::invalid_argument(reason),
            LogError::ParticipantResigned => Status::unavailable("Follower has resigned"),
            LogError::StorageError(_) => Status::internal("Local IO failure"),
            LogError::InvalidWriteConcern { .. } => Status::internal(error.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl GrpcReplicatedLog for RpcServer {
    async fn append_entries(
        &self,
        rpc_request_wrapped: Request<ProtoAppendEntriesRequest>,
    ) -> Result<Response<ProtoAppendEntriesResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_append_entries(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }
}
