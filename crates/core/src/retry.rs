use std::time::Duration;

/// Strategy for computing delay between retry attempts.
///
/// Each variant clamps the computed delay so it never exceeds the configured
/// maximum.
#[derive(Debug, Clone)]
pub enum RetryStrategy {
    /// Exponential backoff: `base * multiplier^attempt`, optionally with
    /// deterministic jitter.
    Exponential {
        /// Initial delay before the first retry.
        base: Duration,
        /// Upper bound on the computed delay.
        max: Duration,
        /// Factor applied on each successive attempt.
        multiplier: f64,
        /// When `true`, a deterministic ±25% jitter is applied so that
        /// concurrent callers do not all retry at the same instant.
        jitter: bool,
    },
    /// Constant delay between every retry attempt.
    Constant {
        /// Fixed delay duration.
        delay: Duration,
    },
}

impl RetryStrategy {
    /// Backoff profile for vendor 5xx responses: base 500 ms, factor 2,
    /// ±25% jitter, capped at 30 s.
    #[must_use]
    pub fn vendor_backoff() -> Self {
        Self::Exponential {
            base: Duration::from_millis(500),
            max: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }

    /// Compute the delay duration for the given zero-based `attempt` number.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Self::Exponential {
                base,
                max,
                multiplier,
                jitter,
            } => {
                let base_secs = base.as_secs_f64();
                // `attempt` is a small retry count, wrapping cannot occur.
                #[allow(clippy::cast_possible_wrap)]
                let raw = base_secs * multiplier.powi(attempt as i32);

                let adjusted = if *jitter {
                    // Deterministic jitter: -25%, 0%, or +25% by attempt
                    // number. Spreads retries across a window without a
                    // random number generator.
                    let jitter_factor = 0.75 + 0.25 * f64::from(attempt % 3);
                    raw * jitter_factor
                } else {
                    raw
                };

                let clamped = adjusted.min(max.as_secs_f64());
                Duration::from_secs_f64(clamped)
            }
            Self::Constant { delay } => *delay,
        }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::vendor_backoff()
    }
}
