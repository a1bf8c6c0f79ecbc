//! Notification background worker
//!
//! Consumes `NotificationRequest` from the mpsc channel and hands each one
//! to the `EmailSender`. Exits when the channel closes, or drains what is
//! still buffered when shutdown is signalled.

use super::{EmailSender, NotificationRequest};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub struct NotifyWorker {
    sender: Arc<dyn EmailSender>,
}

impl NotifyWorker {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }

    /// Spawn the worker onto the runtime and return the handle used to
    /// drain it at shutdown.
    pub fn spawn(self, rx: mpsc::Receiver<NotificationRequest>) -> NotifyHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = tokio::spawn(self.run(rx, shutdown_rx));
        NotifyHandle {
            shutdown: shutdown_tx,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Run until the channel closes. A shutdown signal stops new sends,
    /// delivers everything still buffered, then exits.
    pub async fn run(
        self,
        mut rx: mpsc::Receiver<NotificationRequest>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!("Notification worker started");

        loop {
            tokio::select! {
                maybe = rx.recv() => match maybe {
                    Some(req) => self.deliver(req).await,
                    None => break,
                },
                // Err means the shutdown sender is gone, drain either way
                _ = shutdown.changed() => {
                    rx.close();
                    while let Some(req) = rx.recv().await {
                        self.deliver(req).await;
                    }
                    break;
                }
            }
        }

        tracing::info!("Notification worker stopping");
    }

    async fn deliver(&self, req: NotificationRequest) {
        let order_id = req.order_id().to_string();
        match self.sender.send(&req).await {
            Ok(()) => {
                tracing::debug!(order_id = %order_id, "Notification delivered");
            }
            Err(e) => {
                // order is already final; log the full request so it
                // can be resent by hand
                tracing::error!(
                    order_id = %order_id,
                    request = ?req,
                    "Notification delivery failed: {e:?}"
                );
            }
        }
    }
}

/// Handle to the spawned worker. Kept in server state so shutdown can
/// wait for queued emails instead of killing the task mid-flight.
pub struct NotifyHandle {
    shutdown: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl NotifyHandle {
    /// Signal the worker to finish delivering what is queued and wait for
    /// it, up to `timeout`.
    pub async fn drain(&self, timeout: Duration) {
        let _ = self.shutdown.send(true);
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            match tokio::time::timeout(timeout, worker).await {
                Ok(Ok(())) => tracing::info!("Notification worker drained"),
                Ok(Err(e)) => tracing::error!("Notification worker task failed: {e:?}"),
                Err(_) => tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Notification worker did not drain in time, queued emails dropped"
                ),
            }
        }
    }
}
