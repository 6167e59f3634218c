use std::sync::Arc;

use mastery_core::model::LearnerId;
use storage::repository::ProgressRepository;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

enum WriteRequest {
    Save { learner: LearnerId, document: String },
    Flush(oneshot::Sender<()>),
}

/// Background writer that persists whole-document snapshots in order.
///
/// Enqueueing never waits on the store. A failed write is logged and dropped;
/// the next snapshot simply tries again.
#[derive(Clone)]
pub struct PersistenceWriter {
    tx: mpsc::UnboundedSender<WriteRequest>,
}

impl PersistenceWriter {
    /// Start the writer task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(repo: Arc<dyn ProgressRepository>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(drain(repo, rx));
        Self { tx }
    }

    /// Queue a serialized document for `learner`.
    pub fn enqueue(&self, learner: &LearnerId, document: String) {
        let request = WriteRequest::Save {
            learner: learner.clone(),
            document,
        };
        if self.tx.send(request).is_err() {
            warn!(learner = %learner, "progress writer stopped; snapshot not persisted");
        }
    }

    /// Wait until every snapshot queued so far has been attempted.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(WriteRequest::Flush(done)).is_err() {
            return;
        }
        let _ = wait.await;
    }
}

async fn drain(repo: Arc<dyn ProgressRepository>, mut rx: mpsc::UnboundedReceiver<WriteRequest>) {
    while let Some(request) = rx.recv().await {
        match request {
            WriteRequest::Save { learner, document } => {
                match repo.save_progress(&learner, &document).await {
                    Ok(()) => debug!(learner = %learner, bytes = document.len(), "progress saved"),
                    Err(err) => warn!(
                        learner = %learner,
                        error = %err,
                        "progress write failed; in-memory state kept"
                    ),
                }
            }
            WriteRequest::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}
