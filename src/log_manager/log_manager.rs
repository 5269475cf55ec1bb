use crate::commitlog::{LogId, PersistedLog};
use crate::replica::{AppendEntriesRequest, AppendEntriesResult};
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// LogManager funnels AppendEntries writes for many durable logs through a single worker, which
/// persists queued requests in submission order.
///
/// Cloning yields another handle to the same manager.
#[derive(Clone)]
pub struct LogManager {
    inner: Arc<LogManagerInner>,
}

struct LogManagerInner {
    logger: slog::Logger,
    guarded: Mutex<GuardedManagerData>,
}

struct GuardedManagerData {
    logs: HashMap<LogId, Arc<dyn PersistedLog>>,
    pending: Vec<PendingAppend>,
    // True while a drain task exists. At most one runs at a time.
    worker_active: bool,
}

struct PendingAppend {
    log_id: LogId,
    request: AppendEntriesRequest,
    promise: oneshot::Sender<Result<AppendEntriesResult, LogManagerError>>,
}

#[derive(Debug, thiserror::Error)]
pub enum LogManagerError {
    #[error("No durable log registered for {0}")]
    UnknownLog(LogId),

    #[error("Durable log {0} panicked")]
    LogPanicked(LogId),

    // The drain task died before answering, e.g. the runtime shut down.
    #[error("Log manager worker has exited")]
    WorkerExited,
}

impl LogManager {
    pub fn new(logger: &slog::Logger) -> Self {
        LogManager {
            inner: Arc::new(LogManagerInner {
                logger: logger.new(slog::o!("Component" => "LogManager")),
                guarded: Mutex::new(GuardedManagerData {
                    logs: HashMap::new(),
                    pending: Vec::new(),
                    worker_active: false,
                }),
            }),
        }
    }

    /// Makes `log` the target of requests for `log_id`. Replaces an earlier registration.
    pub fn register_log(&self, log_id: LogId, log: Arc<dyn PersistedLog>) {
        slog::info!(self.inner.logger, "Registered log {}", log_id);
        self.inner.lock().logs.insert(log_id, log);
    }

    pub fn unregister_log(&self, log_id: LogId) -> Option<Arc<dyn PersistedLog>> {
        slog::info!(self.inner.logger, "Unregistered log {}", log_id);
        self.inner.lock().logs.remove(&log_id)
    }

    /// Queues the entries of `request` for insertion into the durable log `log_id`. The request
    /// is queued right away, the returned future only waits for the outcome. `success` of the
    /// result tells whether the insert succeeded. Must be called within a tokio runtime.
    pub fn append_entries(
        &self,
        request: AppendEntriesRequest,
        log_id: LogId,
    ) -> impl Future<Output = Result<AppendEntriesResult, LogManagerError>> + Send + 'static {
        let (tx, rx) = oneshot::channel();

        let start_worker = {
            let mut guarded = self.inner.lock();
            guarded.pending.push(PendingAppend {
                log_id,
                request,
                promise: tx,
            });
            !std::mem::replace(&mut guarded.worker_active, true)
        };

        if start_worker {
            let inner = Arc::clone(&self.inner);
            tokio::task::spawn_blocking(move || inner.drain());
        }

        async move { rx.await.unwrap_or(Err(LogManagerError::WorkerExited)) }
    }
}

impl LogManagerInner {
    fn lock(&self) -> MutexGuard<'_, GuardedManagerData> {
        self.guarded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn drain(&self) {
        loop {
            let batch: Vec<(PendingAppend, Option<Arc<dyn PersistedLog>>)> = {
                let mut guarded = self.lock();
                if guarded.pending.is_empty() {
                    guarded.worker_active = false;
                    return;
                }

                let pending = std::mem::take(&mut guarded.pending);
                pending
                    .into_iter()
                    .map(|append| {
                        let log = guarded.logs.get(&append.log_id).cloned();
                        (append, log)
                    })
                    .collect()
            };

            slog::debug!(self.logger, "Persisting {} queued requests", batch.len());
            for (append, log) in batch {
                let outcome = match log {
                    Some(log) => self.persist_isolated(append.log_id, log.as_ref(), &append.request),
                    None => Err(LogManagerError::UnknownLog(append.log_id)),
                };
                // The caller may have lost interest.
                let _ = append.promise.send(outcome);
            }
        }
    }

    // A panicking log must not take the worker down with it, or every later submission would
    // wait on a worker that is gone.
    fn persist_isolated(
        &self,
        log_id: LogId,
        log: &dyn PersistedLog,
        request: &AppendEntriesRequest,
    ) -> Result<AppendEntriesResult, LogManagerError> {
        std::panic::catch_unwind(AssertUnwindSafe(|| self.persist(log_id, log, request))).map_err(|_| {
            slog::error!(self.logger, "Log {} panicked while persisting {} entries", log_id, request.entries.len());
            LogManagerError::LogPanicked(log_id)
        })
    }

    fn persist(&self, log_id: LogId, log: &dyn PersistedLog, request: &AppendEntriesRequest) -> AppendEntriesResult {
        let mut entries = request.entries.iter().cloned();
        let result = log.insert(&mut entries);
        if let Err(e) = &result {
            slog::error!(self.logger, "Failed to persist {} entries into log {}: {:?}", request.entries.len(), log_id, e);
        }

        AppendEntriesResult {
            success: result.is_ok(),
            term: request.leader_term,
        }
    }
}
