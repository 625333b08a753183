use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::queue::TaskReceiver;
use crate::task::AnalyzeMatch;

/// Consume the queue until it closes, running analyses under bounded
/// concurrency.
///
/// Each claimed request runs on its own spawned task holding a semaphore
/// permit; its five stages are sequential within that task. On shutdown
/// (all producers dropped) the loop drains in-flight work before
/// returning.
pub async fn run_worker(mut receiver: TaskReceiver, task: Arc<AnalyzeMatch>, concurrency: usize) {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let tracker = TaskTracker::new();

    info!(concurrency, "worker started");

    while let Some(request) = receiver.recv().await {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .expect("worker semaphore is never closed");
        let task = Arc::clone(&task);

        tracker.spawn(async move {
            let _permit = permit;
            let result = task.run(request).await;
            if result.programming_error {
                // Surfaced for the broker's dead-letter policy.
                error!(
                    request_id = %result.request_id,
                    stage = ?result.error_stage,
                    error = ?result.error_message,
                    "task hit a programming error"
                );
            } else if !result.success {
                warn!(
                    request_id = %result.request_id,
                    stage = ?result.error_stage,
                    error = ?result.error_message,
                    "task failed"
                );
            }
        });
    }

    tracker.close();
    tracker.wait().await;
    info!("worker drained and stopped");
}
