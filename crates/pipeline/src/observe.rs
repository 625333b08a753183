use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use riftcoach_core::CorrelationId;

/// Wrap one external call with start/end events bound to the correlation
/// id, measuring wall-clock duration.
///
/// Observes only: the future's output, success or failure, passes through
/// untouched.
pub async fn observed<F, T>(
    correlation_id: &CorrelationId,
    operation: &'static str,
    future: F,
) -> (T, Duration)
where
    F: Future<Output = T>,
{
    debug!(correlation_id = %correlation_id, operation, "call start");
    let started = Instant::now();
    let output = future.await;
    let duration = started.elapsed();
    debug!(
        correlation_id = %correlation_id,
        operation,
        duration_ms = %duration.as_millis(),
        "call end"
    );
    (output, duration)
}
