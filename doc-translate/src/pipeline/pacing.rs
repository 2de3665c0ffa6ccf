//! Fixed-rate pacing between generation calls.

use async_trait::async_trait;
use std::time::Duration;

/// Waits between consecutive segment calls.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Sleep for the same duration every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Pacer for FixedDelay {
    async fn pause(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// No waiting at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Pacer for NoDelay {
    async fn pause(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_waits_full_duration() {
        let pacer = FixedDelay::new(Duration::from_secs(2));
        let start = Instant::now();

        pacer.pause().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_returns_immediately() {
        let start = Instant::now();
        NoDelay.pause().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
