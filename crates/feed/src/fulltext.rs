// ABOUTME: Replaces truncated status text with the untruncated text from the single-status endpoint.
// ABOUTME: Items resolve concurrently on a bounded pool; one item's failure never affects another.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use statusfeed_api::{Status, StatusSource, TimelineItem};
use tracing::{debug, warn};

use crate::cache::{try_get, Cache, Lookup};
use crate::error::FeedError;
use crate::normalize::classify;

/// Appended to a status' text when its full text could not be fetched.
pub const FULL_TEXT_UNAVAILABLE: &str = " [full text unavailable]";

pub fn full_text_key(status_id: &str) -> String {
    format!("status:{status_id}:text")
}

/// Per-batch counters returned by [`FullTextResolver::resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub fetched: usize,
    pub cached: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Fetched,
    Cached,
    Failed,
    Skipped,
}

pub struct FullTextResolver<'a, S: ?Sized, C: ?Sized> {
    source: &'a S,
    cache: &'a C,
    ttl: Duration,
    concurrency: usize,
    force_refresh: bool,
}

impl<'a, S, C> FullTextResolver<'a, S, C>
where
    S: StatusSource + ?Sized,
    C: Cache + ?Sized,
{
    pub fn new(source: &'a S, cache: &'a C, ttl: Duration) -> Self {
        Self {
            source,
            cache,
            ttl,
            concurrency: 8,
            force_refresh: false,
        }
    }

    /// Upper bound on in-flight full-text requests. Zero is treated as one.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    /// Resolves every item in place and waits for all of them.
    ///
    /// Only statuses that pass classification are touched, plus their reshared
    /// status when that one passes too.
    pub async fn resolve(&self, items: &mut [TimelineItem]) -> ResolveStats {
        let outcomes: Vec<Vec<Outcome>> = stream::iter(items.iter_mut())
            .map(|item| self.resolve_item(item))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut stats = ResolveStats::default();
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Outcome::Fetched => stats.fetched += 1,
                Outcome::Cached => stats.cached += 1,
                Outcome::Failed => stats.failed += 1,
                Outcome::Skipped => {}
            }
        }
        debug!(
            fetched = stats.fetched,
            cached = stats.cached,
            failed = stats.failed,
            "full text resolution finished"
        );
        stats
    }

    async fn resolve_item(&self, item: &mut TimelineItem) -> Vec<Outcome> {
        let Some(status) = item.status.as_mut() else {
            return vec![Outcome::Skipped];
        };
        if classify(Some(&*status)).is_err() {
            return vec![Outcome::Skipped];
        }

        let mut outcomes = vec![self.resolve_status(status).await];
        if let Some(reshared) = status.reshared_status.as_deref_mut() {
            if classify(Some(&*reshared)).is_ok() {
                outcomes.push(self.resolve_status(reshared).await);
            }
        }
        outcomes
    }

    async fn resolve_status(&self, status: &mut Status) -> Outcome {
        if status.id.is_empty() {
            return Outcome::Skipped;
        }
        let id = status.id.clone();
        let key = full_text_key(&id);

        let result: Result<(String, Lookup), FeedError> =
            try_get(self.cache, &key, self.ttl, self.force_refresh, || async {
                self.source.full_text(&id).await.map_err(FeedError::from)
            })
            .await;

        match result {
            Ok((text, lookup)) => {
                status.text = Some(text);
                match lookup {
                    Lookup::Hit => Outcome::Cached,
                    Lookup::Miss => Outcome::Fetched,
                }
            }
            Err(e) => {
                warn!(status_id = %id, error = %e, "full text unavailable, keeping truncated text");
                let text = status.text.get_or_insert_with(String::new);
                if !text.ends_with(FULL_TEXT_UNAVAILABLE) {
                    text.push_str(FULL_TEXT_UNAVAILABLE);
                }
                Outcome::Failed
            }
        }
    }
}
