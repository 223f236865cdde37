//! Notification Worker
//!
//! 单消费者循环：出队 → 渲染 → 投递。瞬时失败的任务回到队尾继续重试,
//! 不限次数、无退避、无死信,即与在线下单解耦的 at-least-once 投递。
//! 永久失败的任务会无限循环,这是有意保留的简化（见 DESIGN.md）。

use super::mailer::{DeliveryError, Mailer};
use super::queue::{NotificationJob, NotificationQueue, NotificationReceiver};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Outcome of a single delivery attempt, surfaced for tests
#[derive(Debug, PartialEq, Eq)]
pub enum JobOutcome {
    Delivered,
    Requeued,
    Skipped,
}

/// Single consumer of the notification queue
pub struct NotificationWorker {
    queue: NotificationQueue,
    mailer: Arc<dyn Mailer>,
}

impl NotificationWorker {
    pub fn new(queue: NotificationQueue, mailer: Arc<dyn Mailer>) -> Self {
        Self { queue, mailer }
    }

    /// Worker loop. Suspends on the empty queue; exits within one suspension
    /// of the shutdown signal. A job already dequeued but not delivered at
    /// process kill is lost, acceptable while the process stays up.
    pub async fn run(self, mut rx: NotificationReceiver, shutdown: CancellationToken) {
        tracing::info!("Notification worker started");

        loop {
            let Some(job) = rx.dequeue(&shutdown).await else {
                break;
            };
            self.handle(job).await;
        }

        tracing::info!("Notification worker stopped");
    }

    /// Execute one delivery attempt. On transient failure the job is
    /// re-enqueued at the tail with its attempt counter bumped; on a
    /// configuration failure it is reported as not sent and dropped.
    pub async fn handle(&self, mut job: NotificationJob) -> JobOutcome {
        let (subject, body) = job.notification.render();
        let recipient = job.notification.recipient().to_string();
        let kind = job.notification.kind();

        match self.mailer.send(&recipient, &subject, &body).await {
            Ok(()) => {
                tracing::debug!(
                    kind = kind,
                    recipient = %recipient,
                    attempts = job.attempts,
                    "Notification delivered"
                );
                JobOutcome::Delivered
            }
            Err(DeliveryError::Transient(err)) => {
                job.attempts += 1;
                tracing::warn!(
                    kind = kind,
                    recipient = %recipient,
                    attempts = job.attempts,
                    error = %err,
                    "Notification delivery failed, re-queued for retry"
                );
                self.queue.requeue(job);
                JobOutcome::Requeued
            }
            Err(DeliveryError::Config(err)) => {
                // Preserve the dropped payload in the log for manual recovery
                let payload = serde_json::to_string(&job.notification).unwrap_or_default();
                tracing::warn!(
                    kind = kind,
                    recipient = %recipient,
                    error = %err,
                    payload = %payload,
                    "Notification skipped (not sent): delivery misconfigured"
                );
                JobOutcome::Skipped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::intent::Notification;
    use crate::notify::queue::NotificationQueue;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `fail_times` sends, then succeeds
    struct FlakyMailer {
        fail_times: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, _: &str, _: &str, _: &str) -> Result<(), DeliveryError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                Err(DeliveryError::Transient("connection refused".into()))
            } else {
                Ok(())
            }
        }
    }

    struct MisconfiguredMailer;

    #[async_trait]
    impl Mailer for MisconfiguredMailer {
        async fn send(&self, _: &str, _: &str, _: &str) -> Result<(), DeliveryError> {
            Err(DeliveryError::Config("admin address missing".into()))
        }
    }

    fn welcome() -> Notification {
        Notification::Welcome {
            recipient: "user@test".to_string(),
            name: "User".to_string(),
        }
    }

    #[tokio::test]
    async fn test_failed_job_survives_n_failures() {
        let (queue, mut rx) = NotificationQueue::new();
        let mailer = Arc::new(FlakyMailer {
            fail_times: 7,
            calls: AtomicU32::new(0),
        });
        let worker = NotificationWorker::new(queue.clone(), mailer);

        queue.enqueue(welcome());

        // Each failure puts the job back; it is never silently dropped
        for attempt in 1..=7 {
            let job = rx.try_dequeue().expect("job must still be queued");
            assert_eq!(job.attempts, attempt - 1);
            assert_eq!(worker.handle(job).await, JobOutcome::Requeued);
        }

        let job = rx.try_dequeue().expect("job survived all failures");
        assert_eq!(job.attempts, 7);
        assert_eq!(worker.handle(job).await, JobOutcome::Delivered);
        assert!(rx.try_dequeue().is_none(), "delivered job is discarded");
    }

    #[tokio::test]
    async fn test_config_error_skips_without_requeue() {
        let (queue, mut rx) = NotificationQueue::new();
        let worker = NotificationWorker::new(queue.clone(), Arc::new(MisconfiguredMailer));

        queue.enqueue(welcome());
        let job = rx.try_dequeue().unwrap();
        assert_eq!(worker.handle(job).await, JobOutcome::Skipped);
        assert!(rx.try_dequeue().is_none(), "skipped job is not retried");
    }

    #[tokio::test]
    async fn test_worker_loop_drains_and_stops_on_cancel() {
        let (queue, rx) = NotificationQueue::new();
        let mailer = Arc::new(FlakyMailer {
            fail_times: 0,
            calls: AtomicU32::new(0),
        });
        let worker = NotificationWorker::new(queue.clone(), mailer.clone());
        let shutdown = CancellationToken::new();

        queue.enqueue(welcome());
        queue.enqueue(welcome());

        let handle = tokio::spawn(worker.run(rx, shutdown.clone()));
        tokio::task::yield_now().await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(mailer.calls.load(Ordering::SeqCst), 2);
    }
}
