// ABOUTME: Delay abstraction used for rate limiting between page requests.
// ABOUTME: TokioScheduler sleeps on the tokio timer and can be cancelled through a CancellationToken.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Source of rate-limiting pauses.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Waits for `delay`. Returns false if the wait was cancelled.
    async fn delay(&self, delay: Duration) -> bool;
}

/// Real-time scheduler.
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler {
    cancel: CancellationToken,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler whose pauses end early once `cancel` fires.
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn delay(&self, delay: Duration) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
