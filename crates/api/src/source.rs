// ABOUTME: StatusSource port trait describing the two upstream endpoints the feed pipeline consumes.
// ABOUTME: Implemented by Client over HTTP and by in-memory fakes in tests.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::status::TimelineItem;

/// Upstream operations the feed pipeline depends on.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// URL of one timeline page. Used for duplicate-page detection and diagnostics.
    fn timeline_url(&self, user_id: &str, start: usize, count: usize) -> String;

    /// Fetch one page of a user's timeline.
    async fn user_timeline(
        &self,
        user_id: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<TimelineItem>, ApiError>;

    /// Fetch the untruncated text of one status.
    async fn full_text(&self, status_id: &str) -> Result<String, ApiError>;
}
