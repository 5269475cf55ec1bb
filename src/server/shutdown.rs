use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Creates a linked pair. The signal completes once the handle is shut down or dropped.
pub fn shutdown_signal() -> (RpcServerShutdownHandle, RpcServerShutdownSignal) {
    let (tx, rx) = oneshot::channel();

    (RpcServerShutdownHandle { tx }, RpcServerShutdownSignal { rx })
}

pub struct RpcServerShutdownHandle {
    tx: oneshot::Sender<()>,
}

impl RpcServerShutdownHandle {
    pub fn shutdown(self) {
        // The server may already be gone.
        let _ = self.tx.send(());
    }
}

pub struct RpcServerShutdownSignal {
    rx: oneshot::Receiver<()>,
}

impl Future for RpcServerShutdownSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Pending => Poll::Pending,
            // Sent or dropped, both mean stop.
            Poll::Ready(_) => Poll::Ready(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::server::shutdown_signal;
    use tokio::time::Duration;

    #[tokio::test]
    async fn completes_on_shutdown() {
        let (handle, signal) = shutdown_signal();
        handle.shutdown();

        tokio::time::timeout(Duration::from_secs(1), signal).await.unwrap();
    }

    #[tokio::test]
    async fn completes_on_drop() {
        let (handle, mut signal) = shutdown_signal();
        assert!(tokio::time::timeout(Duration::from_millis(10), &mut signal).await.is_err());

        drop(handle);

        tokio::time::timeout(Duration::from_secs(1), signal).await.unwrap();
    }
}
