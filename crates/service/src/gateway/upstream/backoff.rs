use std::future::Future;
use std::time::Duration;

const RATE_LIMIT_BASE_DELAY: Duration = Duration::from_millis(1000);
pub(crate) const UNAVAILABLE_DELAY: Duration = Duration::from_millis(1000);

/// Wait before retrying after a 429: `1000ms * 2^attempt`, no jitter.
pub(crate) fn rate_limit_delay(attempt: u32) -> Duration {
    let multiplier = 1_u32 << attempt.min(10);
    RATE_LIMIT_BASE_DELAY.saturating_mul(multiplier)
}

/// Suspension point for backoff waits, swapped for a recording fake in tests.
pub trait Sleeper: Clone + Send + Sync + 'static {
    fn sleep(&self, delay: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
