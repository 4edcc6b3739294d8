// ==================== NOTIFICATION WORKER ====================
// Background task draining the bounded notification queue. Handlers enqueue
// and return immediately; delivery outcome is only ever logged.

use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::database::{Store, StoreError};
use crate::models::IntroductionRequest;
use crate::services::notifier::{Notifier, NotifyError};
use crate::services::request_service;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    NewRequest,
    Approved,
    Declined,
}

#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub kind: NotificationKind,
    pub request: IntroductionRequest,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("request {0} references a missing user or contact")]
    Unresolved(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Sending half of the queue, cloned into the application state.
#[derive(Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<NotificationJob>,
}

impl NotificationQueue {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NotificationJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Never blocks: a full or closed queue drops the job with a warning.
    pub fn enqueue(&self, kind: NotificationKind, request: &IntroductionRequest) {
        let job = NotificationJob {
            kind,
            request: request.clone(),
        };

        match self.sender.try_send(job) {
            Ok(()) => log::debug!("📨 Queued {:?} notification for request {}", kind, request.id),
            Err(TrySendError::Full(job)) => log::warn!(
                "⚠️  Notification queue full, dropping {:?} for request {}",
                job.kind,
                job.request.id
            ),
            Err(TrySendError::Closed(job)) => log::warn!(
                "⚠️  Notification worker stopped, dropping {:?} for request {}",
                job.kind,
                job.request.id
            ),
        }
    }
}

/// Spawns the worker; it exits once every queue handle is dropped.
pub fn start_notification_worker(
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    mut receiver: mpsc::Receiver<NotificationJob>,
) -> JoinHandle<()> {
    log::info!("📬 Starting notification worker");

    tokio::spawn(async move {
        while let Some(job) = receiver.recv().await {
            match process_job(&*store, &*notifier, &job).await {
                Ok(()) => log::info!(
                    "✅ {:?} notification sent for request {}",
                    job.kind,
                    job.request.id
                ),
                Err(e) => log::error!(
                    "❌ {:?} notification failed for request {}: {}",
                    job.kind,
                    job.request.id,
                    e
                ),
            }
        }
        log::info!("📭 Notification worker stopped");
    })
}

/// Resolves the people involved and hands the job to the notifier. No retry.
pub async fn process_job<S: Store + ?Sized>(
    store: &S,
    notifier: &dyn Notifier,
    job: &NotificationJob,
) -> Result<(), DispatchError> {
    let details = request_service::resolve(store, &job.request)
        .await?
        .ok_or_else(|| DispatchError::Unresolved(job.request.id.clone()))?;

    match job.kind {
        NotificationKind::NewRequest => notifier.send_new_request(&details).await?,
        NotificationKind::Approved => notifier.send_approved(&details).await?,
        NotificationKind::Declined => notifier.send_declined(&details).await?,
    }
    Ok(())
}
