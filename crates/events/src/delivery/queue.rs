//! Bounded, retrying invitation queue.
//!
//! [`InvitationQueue::start`] spawns a single worker task that consumes a
//! bounded `tokio::sync::mpsc` channel. [`InvitationQueue::enqueue`] never
//! blocks: when the buffer is full the invitation is logged and dropped.
//! On cancellation the worker stops accepting new invitations, drains what is
//! already buffered and exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::template::{Invitation, InviteTemplate};
use super::InvitationSender;

/// Tuning for the invitation worker.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Buffered invitations before `enqueue` starts dropping.
    pub capacity: usize,
    /// Send attempts per invitation, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_base: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            max_attempts: 3,
            retry_base: Duration::from_millis(500),
        }
    }
}

/// Producer handle for the invitation worker. Cheap to clone.
#[derive(Clone)]
pub struct InvitationQueue {
    tx: mpsc::Sender<Invitation>,
}

impl InvitationQueue {
    /// Spawn the worker and return the producer handle with the worker's
    /// join handle.
    pub fn start(
        sender: Arc<dyn InvitationSender>,
        template: InviteTemplate,
        config: QueueConfig,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        let worker = Worker {
            sender,
            template,
            config,
        };
        let handle = tokio::spawn(worker.run(rx, cancel));
        (Self { tx }, handle)
    }

    /// Hand an invitation to the worker without waiting.
    ///
    /// Returns `false` when the invitation was dropped.
    pub fn enqueue(&self, invitation: Invitation) -> bool {
        match self.tx.try_send(invitation) {
            Ok(()) => true,
            Err(TrySendError::Full(invitation)) => {
                tracing::warn!(
                    quest_id = %invitation.quest_id,
                    to = %invitation.recipient_email,
                    "Invitation queue full, dropping invitation"
                );
                false
            }
            Err(TrySendError::Closed(invitation)) => {
                tracing::warn!(
                    quest_id = %invitation.quest_id,
                    to = %invitation.recipient_email,
                    "Invitation queue closed, dropping invitation"
                );
                false
            }
        }
    }
}

struct Worker {
    sender: Arc<dyn InvitationSender>,
    template: InviteTemplate,
    config: QueueConfig,
}

impl Worker {
    async fn run(self, mut rx: mpsc::Receiver<Invitation>, cancel: CancellationToken) {
        tracing::info!(capacity = self.config.capacity, "Invitation worker started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                next = rx.recv() => match next {
                    Some(invitation) => self.deliver(&invitation).await,
                    None => {
                        tracing::info!("Invitation queue closed, worker exiting");
                        return;
                    }
                },
            }
        }

        rx.close();
        let mut drained = 0usize;
        while let Some(invitation) = rx.recv().await {
            self.deliver(&invitation).await;
            drained += 1;
        }
        tracing::info!(drained, "Invitation worker stopped");
    }

    async fn deliver(&self, invitation: &Invitation) {
        let message = match self.template.render(invitation) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    quest_id = %invitation.quest_id,
                    "Invitation could not be rendered, dropping"
                );
                return;
            }
        };
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.sender.send(&invitation.recipient_email, &message).await {
                Ok(()) => {
                    tracing::debug!(
                        quest_id = %invitation.quest_id,
                        to = %invitation.recipient_email,
                        attempt,
                        "Invitation delivered"
                    );
                    return;
                }
                Err(e) if attempt < max_attempts => {
                    let delay = self.config.retry_base * 2u32.saturating_pow(attempt - 1);
                    tracing::warn!(
                        error = %e,
                        quest_id = %invitation.quest_id,
                        attempt,
                        retry_in_ms = delay.as_millis() as u64,
                        "Invitation delivery failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        quest_id = %invitation.quest_id,
                        to = %invitation.recipient_email,
                        attempts = max_attempts,
                        "Invitation delivery failed, giving up"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::delivery::email::EmailError;
    use crate::delivery::template::RenderedEmail;

    /// Records deliveries and fails the first `fail_first` calls.
    struct MockSender {
        fail_first: u32,
        calls: AtomicU32,
        delivered: Mutex<Vec<(String, String)>>,
    }

    impl MockSender {
        fn new(fail_first: u32) -> Arc<Self> {
            Arc::new(Self {
                fail_first,
                calls: AtomicU32::new(0),
                delivered: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl InvitationSender for MockSender {
        async fn send(&self, to_email: &str, message: &RenderedEmail) -> Result<(), EmailError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(EmailError::Build("simulated failure".into()));
            }
            self.delivered
                .lock()
                .unwrap()
                .push((to_email.to_string(), message.subject.clone()));
            Ok(())
        }
    }

    fn invitation(email: &str) -> Invitation {
        Invitation {
            quest_id: Uuid::new_v4(),
            quest_name: "Hunt".into(),
            recipient_email: email.into(),
            recipient_name: "Robin".into(),
            sender_name: "Alex".into(),
        }
    }

    fn fast_config(capacity: usize, max_attempts: u32) -> QueueConfig {
        QueueConfig {
            capacity,
            max_attempts,
            retry_base: Duration::from_millis(1),
        }
    }

    fn template() -> InviteTemplate {
        InviteTemplate::new("https://questy.fun", None).unwrap()
    }

    #[tokio::test]
    async fn delivers_and_drains_on_cancel() {
        let sender = MockSender::new(0);
        let cancel = CancellationToken::new();
        let (queue, handle) =
            InvitationQueue::start(sender.clone(), template(), fast_config(8, 3), cancel.clone());

        assert!(queue.enqueue(invitation("a@example.com")));
        assert!(queue.enqueue(invitation("b@example.com")));
        cancel.cancel();
        handle.await.unwrap();

        let delivered = sender.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 2);
        assert!(delivered[0].1.contains("Alex"));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let sender = MockSender::new(2);
        let cancel = CancellationToken::new();
        let (queue, handle) =
            InvitationQueue::start(sender.clone(), template(), fast_config(8, 3), cancel.clone());

        queue.enqueue(invitation("a@example.com"));
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(sender.calls.load(Ordering::SeqCst), 3);
        assert_eq!(sender.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let sender = MockSender::new(u32::MAX);
        let cancel = CancellationToken::new();
        let (queue, handle) =
            InvitationQueue::start(sender.clone(), template(), fast_config(8, 2), cancel.clone());

        queue.enqueue(invitation("a@example.com"));
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(sender.calls.load(Ordering::SeqCst), 2);
        assert!(sender.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn full_queue_drops_without_blocking() {
        let (tx, _rx) = mpsc::channel(1);
        let queue = InvitationQueue { tx };

        assert!(queue.enqueue(invitation("a@example.com")));
        assert!(!queue.enqueue(invitation("b@example.com")));
    }

    #[tokio::test]
    async fn closed_queue_drops() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let queue = InvitationQueue { tx };
        assert!(!queue.enqueue(invitation("a@example.com")));
    }
}
