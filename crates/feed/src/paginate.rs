// ABOUTME: Sequential, rate-limited pagination over a user's timeline.
// ABOUTME: Modelled as a small state machine that always ends in Stopped with the items gathered so far.

use std::collections::HashSet;
use std::fmt;

use statusfeed_api::{StatusSource, TimelineItem};
use tracing::{debug, info, warn};

use crate::cache::{try_get, Cache, Lookup};
use crate::config::FeedOptions;
use crate::error::FeedError;
use crate::scheduler::Scheduler;

/// Why pagination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxPagesReached,
    ShortPage,
    EmptyPage,
    FetchError,
    DuplicateUrl,
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::MaxPagesReached => "max pages reached",
            StopReason::ShortPage => "short page",
            StopReason::EmptyPage => "empty page",
            StopReason::FetchError => "fetch error",
            StopReason::DuplicateUrl => "duplicate url",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    /// Zero-based page index.
    FetchingPage(u32),
    Stopped(StopReason),
}

/// Result of one pagination run. Items are deduplicated by status id and kept in
/// upstream order.
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    pub items: Vec<TimelineItem>,
    pub reason: StopReason,
    /// Pages obtained, from the cache or upstream.
    pub pages: u32,
}

pub fn page_key(user_id: &str, page: u32) -> String {
    format!("timeline:{user_id}:page:{page}")
}

#[derive(Default)]
struct Progress {
    items: Vec<TimelineItem>,
    seen_ids: HashSet<String>,
    seen_urls: HashSet<String>,
    pages: u32,
}

impl Progress {
    /// Appends the items whose status id was not seen yet. Items without an id are kept.
    fn absorb(&mut self, page: Vec<TimelineItem>) -> usize {
        let before = self.items.len();
        for item in page {
            let fresh = match item.status_id() {
                Some(id) => self.seen_ids.insert(id.to_string()),
                None => true,
            };
            if fresh {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }
}

pub struct PaginatedFetcher<'a, S: ?Sized, C: ?Sized, D: ?Sized> {
    source: &'a S,
    cache: &'a C,
    scheduler: &'a D,
    options: &'a FeedOptions,
}

impl<'a, S, C, D> PaginatedFetcher<'a, S, C, D>
where
    S: StatusSource + ?Sized,
    C: Cache + ?Sized,
    D: Scheduler + ?Sized,
{
    pub fn new(source: &'a S, cache: &'a C, scheduler: &'a D, options: &'a FeedOptions) -> Self {
        Self {
            source,
            cache,
            scheduler,
            options,
        }
    }

    /// Fetches pages of `user_id`'s timeline until a stop condition holds.
    ///
    /// Never fails: a page error ends the run with [`StopReason::FetchError`] and
    /// whatever was gathered before it.
    pub async fn fetch(&self, user_id: &str) -> Pagination {
        let mut progress = Progress::default();
        let mut state = FetchState::Idle;

        loop {
            state = match state {
                FetchState::Idle if self.options.max_pages == 0 => {
                    FetchState::Stopped(StopReason::MaxPagesReached)
                }
                FetchState::Idle => FetchState::FetchingPage(0),
                FetchState::FetchingPage(n) => self.step(user_id, n, &mut progress).await,
                FetchState::Stopped(reason) => {
                    info!(
                        user_id,
                        pages = progress.pages,
                        items = progress.items.len(),
                        reason = %reason,
                        "pagination stopped"
                    );
                    return Pagination {
                        items: progress.items,
                        reason,
                        pages: progress.pages,
                    };
                }
            };
        }
    }

    async fn step(&self, user_id: &str, page: u32, progress: &mut Progress) -> FetchState {
        let count = self.options.count_per_page;
        let start = page as usize * count;
        let url = self.source.timeline_url(user_id, start, count);
        if !progress.seen_urls.insert(url.clone()) {
            warn!(user_id, page, url = %url, "page url already fetched this run");
            return FetchState::Stopped(StopReason::DuplicateUrl);
        }

        let fetched: Result<(Vec<TimelineItem>, Lookup), FeedError> = try_get(
            self.cache,
            &page_key(user_id, page),
            self.options.page_ttl,
            self.options.force_refresh,
            || async {
                self.source
                    .user_timeline(user_id, start, count)
                    .await
                    .map_err(FeedError::from)
            },
        )
        .await;

        let (items, lookup) = match fetched {
            Ok(ok) => ok,
            Err(e) => {
                warn!(user_id, page, error = %e, "page fetch failed, keeping partial results");
                return FetchState::Stopped(StopReason::FetchError);
            }
        };
        progress.pages += 1;

        let received = items.len();
        if received == 0 {
            return FetchState::Stopped(StopReason::EmptyPage);
        }
        let added = progress.absorb(items);
        let cached = lookup == Lookup::Hit;
        debug!(user_id, page, received, added, cached, "page fetched");

        if received < count {
            return FetchState::Stopped(StopReason::ShortPage);
        }
        if page + 1 >= self.options.max_pages {
            return FetchState::Stopped(StopReason::MaxPagesReached);
        }
        if lookup == Lookup::Miss && !self.scheduler.delay(self.options.page_delay).await {
            return FetchState::Stopped(StopReason::Cancelled);
        }
        FetchState::FetchingPage(page + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, NoopCache};
    use crate::testing::{item, items, FakeSource, RecordingScheduler};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn options(max_pages: u32) -> FeedOptions {
        FeedOptions {
            max_pages,
            page_delay: Duration::from_millis(1500),
            ..FeedOptions::default()
        }
    }

    #[tokio::test]
    async fn short_page_stops_the_run() {
        let source = FakeSource::new()
            .with_page(0, items(0, 20))
            .with_page(20, items(20, 20))
            .with_page(40, items(40, 5));
        let scheduler = RecordingScheduler::new();
        let opts = options(5);

        let result = PaginatedFetcher::new(&source, &NoopCache, &scheduler, &opts)
            .fetch("u1")
            .await;

        assert_eq!(source.timeline_requests(), 3);
        assert_eq!(result.items.len(), 45);
        assert_eq!(result.reason, StopReason::ShortPage);
        assert_eq!(result.pages, 3);
        assert_eq!(source.requested_starts(), vec![0, 20, 40]);
        assert_eq!(scheduler.delays(), vec![Duration::from_millis(1500); 2]);
    }

    #[tokio::test]
    async fn max_pages_caps_requests() {
        let source = FakeSource::new().endless(20);
        let scheduler = RecordingScheduler::new();
        let opts = options(3);

        let result = PaginatedFetcher::new(&source, &NoopCache, &scheduler, &opts)
            .fetch("u1")
            .await;

        assert_eq!(source.timeline_requests(), 3);
        assert_eq!(result.items.len(), 60);
        assert_eq!(result.reason, StopReason::MaxPagesReached);
        assert_eq!(scheduler.delays().len(), 2, "no pause after the last page");
    }

    #[tokio::test]
    async fn items_repeated_across_pages_are_kept_once() {
        let mut second = items(20, 19);
        second.push(item("7", "seen on page one too"));
        let source = FakeSource::new()
            .with_page(0, items(0, 20))
            .with_page(20, second);
        let opts = options(2);

        let result = PaginatedFetcher::new(&source, &NoopCache, &RecordingScheduler::new(), &opts)
            .fetch("u1")
            .await;

        let sevens = result
            .items
            .iter()
            .filter(|i| i.status_id() == Some("7"))
            .count();
        assert_eq!(sevens, 1);
        assert_eq!(result.items.len(), 39);
        assert_eq!(
            result.items[7].status.as_ref().unwrap().text.as_deref(),
            Some("text 7"),
            "first occurrence wins"
        );
    }

    #[tokio::test]
    async fn fetch_error_keeps_partial_results() {
        let source = FakeSource::new()
            .with_page(0, items(0, 20))
            .with_failing_page(20);
        let opts = options(5);

        let result = PaginatedFetcher::new(&source, &NoopCache, &RecordingScheduler::new(), &opts)
            .fetch("u1")
            .await;

        assert_eq!(result.reason, StopReason::FetchError);
        assert_eq!(result.items.len(), 20);
        assert_eq!(result.pages, 1);
    }

    #[tokio::test]
    async fn empty_first_page() {
        let source = FakeSource::new();
        let opts = options(3);

        let result = PaginatedFetcher::new(&source, &NoopCache, &RecordingScheduler::new(), &opts)
            .fetch("u1")
            .await;

        assert_eq!(result.reason, StopReason::EmptyPage);
        assert!(result.items.is_empty());
        assert_eq!(source.timeline_requests(), 1);
    }

    #[tokio::test]
    async fn repeated_url_stops_the_run() {
        let source = FakeSource::new().endless(20).with_constant_url();
        let opts = options(5);

        let result = PaginatedFetcher::new(&source, &NoopCache, &RecordingScheduler::new(), &opts)
            .fetch("u1")
            .await;

        assert_eq!(result.reason, StopReason::DuplicateUrl);
        assert_eq!(source.timeline_requests(), 1);
        assert_eq!(result.items.len(), 20);
    }

    #[tokio::test]
    async fn cancelled_pause_stops_the_run() {
        let source = FakeSource::new().endless(20);
        let scheduler = RecordingScheduler::cancelling_on(1);
        let opts = options(5);

        let result = PaginatedFetcher::new(&source, &NoopCache, &scheduler, &opts)
            .fetch("u1")
            .await;

        assert_eq!(result.reason, StopReason::Cancelled);
        assert_eq!(source.timeline_requests(), 1);
        assert_eq!(result.items.len(), 20);
    }

    #[tokio::test]
    async fn cached_pages_skip_requests_and_pauses() {
        let source = FakeSource::new().endless(20);
        let cache = MemoryCache::new();
        let opts = options(2);

        let first = PaginatedFetcher::new(&source, &cache, &RecordingScheduler::new(), &opts)
            .fetch("u1")
            .await;
        assert_eq!(source.timeline_requests(), 2);

        let scheduler = RecordingScheduler::new();
        let second = PaginatedFetcher::new(&source, &cache, &scheduler, &opts)
            .fetch("u1")
            .await;

        assert_eq!(source.timeline_requests(), 2, "served from cache");
        assert!(scheduler.delays().is_empty());
        assert_eq!(second.items, first.items);
        assert_eq!(second.reason, StopReason::MaxPagesReached);
    }

    #[tokio::test]
    async fn zero_max_pages_issues_no_request() {
        let source = FakeSource::new().endless(20);
        let opts = options(0);

        let result = PaginatedFetcher::new(&source, &NoopCache, &RecordingScheduler::new(), &opts)
            .fetch("u1")
            .await;

        assert_eq!(result.reason, StopReason::MaxPagesReached);
        assert_eq!(source.timeline_requests(), 0);
    }
}
