//! Notification Queue
//!
//! 无界 FIFO + 计数信号（mpsc 自带），生产端永不阻塞、永不失败；
//! 消费端在空队列上挂起，并在一次挂起内响应取消信号。

use super::intent::Notification;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A queued delivery unit. `attempts` counts completed delivery attempts so
/// retries are visible in logs (delivery itself retries indefinitely).
#[derive(Debug)]
pub struct NotificationJob {
    pub notification: Notification,
    pub attempts: u32,
}

/// Producer handle, cheap to clone, shared across services
#[derive(Clone, Debug)]
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<NotificationJob>,
}

/// Consumer handle, owned by the single worker
#[derive(Debug)]
pub struct NotificationReceiver {
    rx: mpsc::UnboundedReceiver<NotificationJob>,
}

impl NotificationQueue {
    pub fn new() -> (Self, NotificationReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, NotificationReceiver { rx })
    }

    /// Append a fresh intent at the tail. Bounded only by process memory.
    pub fn enqueue(&self, notification: Notification) {
        self.push(NotificationJob {
            notification,
            attempts: 0,
        });
    }

    /// Re-append a failed job at the tail. It loses its relative position,
    /// so there is no ordering guarantee across retries.
    pub fn requeue(&self, job: NotificationJob) {
        self.push(job);
    }

    fn push(&self, job: NotificationJob) {
        let kind = job.notification.kind();
        if self.tx.send(job).is_err() {
            // Receiver only drops during shutdown; the job is lost with the
            // process, consistent with the in-process delivery guarantee.
            tracing::warn!(kind = kind, "Notification queue closed, job dropped");
        }
    }
}

impl NotificationReceiver {
    /// Block until a job is available or cancellation is requested.
    /// Returns `None` on cancellation or when all producers are gone.
    /// Cancellation wins over pending work so shutdown is prompt.
    pub async fn dequeue(&mut self, cancel: &CancellationToken) -> Option<NotificationJob> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            job = self.rx.recv() => job,
        }
    }

    /// Non-blocking drain helper for tests and shutdown accounting
    pub fn try_dequeue(&mut self) -> Option<NotificationJob> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fifo_order_without_failures() {
        let (queue, mut rx) = NotificationQueue::new();
        for id in 1..=3 {
            queue.enqueue(Notification::OrderPacked {
                order_id: id,
                recipient: "c@test".to_string(),
                customer_name: "C".to_string(),
            });
        }
        let cancel = CancellationToken::new();
        for expected in 1..=3 {
            let job = rx.dequeue(&cancel).await.unwrap();
            match job.notification {
                Notification::OrderPacked { order_id, .. } => assert_eq!(order_id, expected),
                other => panic!("unexpected intent: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_dequeue_observes_cancellation() {
        let (_queue, mut rx) = NotificationQueue::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(rx.dequeue(&cancel).await.is_none());
    }

    #[tokio::test]
    async fn test_requeue_goes_to_tail() {
        let (queue, mut rx) = NotificationQueue::new();
        queue.enqueue(Notification::Welcome {
            recipient: "first@test".to_string(),
            name: "First".to_string(),
        });
        queue.enqueue(Notification::Welcome {
            recipient: "second@test".to_string(),
            name: "Second".to_string(),
        });

        let cancel = CancellationToken::new();
        let mut failed = rx.dequeue(&cancel).await.unwrap();
        failed.attempts += 1;
        queue.requeue(failed);

        // Younger job now comes first; the failed one sits at the tail
        let next = rx.dequeue(&cancel).await.unwrap();
        assert_eq!(next.notification.recipient(), "second@test");
        let retried = rx.dequeue(&cancel).await.unwrap();
        assert_eq!(retried.notification.recipient(), "first@test");
        assert_eq!(retried.attempts, 1);
    }
}
