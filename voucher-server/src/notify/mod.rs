//! Outbound notification queue
//!
//! Fulfillment drops a `NotificationRequest` onto an mpsc channel after an
//! order is durably written; a background worker picks it up and hands it
//! to the configured [`EmailSender`]. Delivery failure is logged with the
//! full request so operators can resend out-of-band. It never rolls an
//! order back.

mod worker;

pub use worker::{NotifyHandle, NotifyWorker};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// What the buyer gets mailed
#[derive(Debug, Clone)]
pub enum NotificationRequest {
    /// Codes delivered on fulfillment
    VoucherEmail {
        buyer_name: String,
        buyer_email: String,
        product_name: String,
        codes: Vec<String>,
        order_id: String,
    },
    /// Status-only update (hold, rejection, cancellation)
    OrderStatusEmail {
        buyer_name: String,
        buyer_email: String,
        order_id: String,
        status: String,
        note: Option<String>,
    },
}

impl NotificationRequest {
    pub fn order_id(&self) -> &str {
        match self {
            Self::VoucherEmail { order_id, .. } => order_id,
            Self::OrderStatusEmail { order_id, .. } => order_id,
        }
    }
}

/// Delivery backend. The real mail relay lives outside this service; the
/// shipped implementation just logs.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, request: &NotificationRequest) -> anyhow::Result<()>;
}

/// Writes the would-be email to the log instead of sending it
pub struct LogOnlySender;

#[async_trait]
impl EmailSender for LogOnlySender {
    async fn send(&self, request: &NotificationRequest) -> anyhow::Result<()> {
        match request {
            NotificationRequest::VoucherEmail {
                buyer_email,
                product_name,
                codes,
                order_id,
                ..
            } => {
                tracing::info!(
                    order_id = %order_id,
                    to = %buyer_email,
                    product = %product_name,
                    code_count = codes.len(),
                    "Voucher email (log-only delivery)"
                );
            }
            NotificationRequest::OrderStatusEmail {
                buyer_email,
                order_id,
                status,
                ..
            } => {
                tracing::info!(
                    order_id = %order_id,
                    to = %buyer_email,
                    status = %status,
                    "Order status email (log-only delivery)"
                );
            }
        }
        Ok(())
    }
}

/// Sending half handed to the coordinator
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<NotificationRequest>,
}

impl NotificationQueue {
    /// Create the queue and the receiver for [`NotifyWorker::run`]
    pub fn new(buffer_size: usize) -> (Self, mpsc::Receiver<NotificationRequest>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        (Self { tx }, rx)
    }

    /// Enqueue, non-blocking from the caller's point of view. A closed or
    /// full channel is logged and dropped; the order is already final.
    pub async fn dispatch(&self, request: NotificationRequest) {
        let order_id = request.order_id().to_string();
        if self.tx.send(request).await.is_err() {
            tracing::error!(
                order_id = %order_id,
                "Notification channel closed, email not queued"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    /// Records every request it is asked to send
    pub(super) struct RecordingSender {
        pub sent: Mutex<Vec<NotificationRequest>>,
        pub fail: bool,
    }

    #[async_trait]
    impl EmailSender for RecordingSender {
        async fn send(&self, request: &NotificationRequest) -> anyhow::Result<()> {
            self.sent.lock().push(request.clone());
            if self.fail {
                anyhow::bail!("relay unavailable");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_worker_delivers_queued_requests() {
        let sender = Arc::new(RecordingSender {
            sent: Mutex::new(Vec::new()),
            fail: false,
        });
        let (queue, rx) = NotificationQueue::new(8);
        let handle = NotifyWorker::new(sender.clone()).spawn(rx);

        queue
            .dispatch(NotificationRequest::VoucherEmail {
                buyer_name: "Ana".to_string(),
                buyer_email: "ana@example.com".to_string(),
                product_name: "IELTS Mock".to_string(),
                codes: vec!["CODE-1".to_string()],
                order_id: "EDU2026082910001".to_string(),
            })
            .await;

        handle.drain(Duration::from_secs(5)).await;
        let sent = sender.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].order_id(), "EDU2026082910001");
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_stop_worker() {
        let sender = Arc::new(RecordingSender {
            sent: Mutex::new(Vec::new()),
            fail: true,
        });
        let (queue, rx) = NotificationQueue::new(8);
        let handle = NotifyWorker::new(sender.clone()).spawn(rx);

        for i in 0..3 {
            queue
                .dispatch(NotificationRequest::OrderStatusEmail {
                    buyer_name: "Ana".to_string(),
                    buyer_email: "ana@example.com".to_string(),
                    order_id: format!("EDU202608291000{i}"),
                    status: "REJECTED".to_string(),
                    note: None,
                })
                .await;
        }

        handle.drain(Duration::from_secs(5)).await;
        // all three attempted despite every send failing
        assert_eq!(sender.sent.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_drain_flushes_requests_buffered_before_worker_ran() {
        let sender = Arc::new(RecordingSender {
            sent: Mutex::new(Vec::new()),
            fail: false,
        });
        let (queue, rx) = NotificationQueue::new(8);
        for i in 0..5 {
            queue
                .dispatch(NotificationRequest::OrderStatusEmail {
                    buyer_name: "Ana".to_string(),
                    buyer_email: "ana@example.com".to_string(),
                    order_id: format!("EDU202608291000{i}"),
                    status: "HOLD".to_string(),
                    note: None,
                })
                .await;
        }

        // the sending side stays open; drain alone must deliver everything
        let handle = NotifyWorker::new(sender.clone()).spawn(rx);
        handle.drain(Duration::from_secs(5)).await;
        assert_eq!(sender.sent.lock().len(), 5);
        drop(queue);
    }
}
