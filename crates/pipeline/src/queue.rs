use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

use riftcoach_core::AnalysisRequest;

/// Errors from enqueueing a request.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue is at capacity; the caller should tell the user to retry.
    #[error("queue full")]
    Full,

    /// The consuming side has shut down.
    #[error("queue closed")]
    Closed,

    /// The request failed to serialize.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Producer side of the task broker.
///
/// Payloads are stable JSON: a request enqueued before a process restart
/// deserializes after it, and a different broker backend can be swapped in
/// behind this trait without touching the dispatcher.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Enqueue one serialized request. Never blocks on analysis.
    async fn enqueue(&self, request: &AnalysisRequest) -> Result<(), QueueError>;
}

/// In-process broker over a bounded channel.
#[derive(Debug, Clone)]
pub struct InMemoryTaskQueue {
    tx: mpsc::Sender<String>,
}

impl InMemoryTaskQueue {
    /// Create a queue with the given capacity, returning the producer and
    /// the worker-side receiver.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, TaskReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, TaskReceiver { rx })
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, request: &AnalysisRequest) -> Result<(), QueueError> {
        let payload = serde_json::to_string(request)
            .map_err(|e| QueueError::Serialization(e.to_string()))?;

        // try_send keeps the dispatcher inside its acknowledgement window:
        // a full queue is reported as busy, never waited out.
        self.tx.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}

/// Worker side of the in-process broker.
#[derive(Debug)]
pub struct TaskReceiver {
    rx: mpsc::Receiver<String>,
}

impl TaskReceiver {
    /// Receive the next request. Returns `None` when all producers are
    /// gone and the queue is drained.
    ///
    /// A payload that fails to deserialize is logged and skipped; one
    /// poisoned message must not stall the queue.
    pub async fn recv(&mut self) -> Option<AnalysisRequest> {
        loop {
            let payload = self.rx.recv().await?;
            match serde_json::from_str(&payload) {
                Ok(request) => return Some(request),
                Err(e) => {
                    warn!(error = %e, "dropping undecodable queue payload");
                }
            }
        }
    }
}
