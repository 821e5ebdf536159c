//! Injectable pauses for retry backoff and rate limiting.

use std::time::Duration;

use async_trait::async_trait;

/// Something that can wait. Production code uses [`TokioSleeper`]; tests
/// substitute a recorder so backoff can be asserted without real delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
