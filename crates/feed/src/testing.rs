// ABOUTME: In-memory fakes of StatusSource and Scheduler for unit tests.
// ABOUTME: Fakes record every call so tests can assert request counts and pauses without sleeping.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use statusfeed_api::{ApiError, Author, Status, StatusSource, TimelineItem};

use crate::scheduler::Scheduler;

pub fn item(id: &str, text: &str) -> TimelineItem {
    TimelineItem {
        status: Some(Status {
            id: id.to_string(),
            text: Some(text.to_string()),
            author: Some(Author {
                name: Some(format!("user{id}")),
                ..Default::default()
            }),
            create_time: Some("2024-01-02 15:04:05".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// `count` items with ids `first..first + count`.
pub fn items(first: usize, count: usize) -> Vec<TimelineItem> {
    (first..first + count)
        .map(|n| item(&n.to_string(), &format!("text {n}")))
        .collect()
}

#[derive(Default)]
pub struct FakeSource {
    pages: HashMap<usize, Result<Vec<TimelineItem>, String>>,
    full_texts: HashMap<String, Result<String, String>>,
    endless_page_size: Option<usize>,
    constant_url: bool,
    timeline_requests: AtomicUsize,
    full_text_requests: AtomicUsize,
    requested_starts: Mutex<Vec<usize>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page served for `start`. Unknown starts serve an empty page.
    pub fn with_page(mut self, start: usize, items: Vec<TimelineItem>) -> Self {
        self.pages.insert(start, Ok(items));
        self
    }

    pub fn with_failing_page(mut self, start: usize) -> Self {
        self.pages.insert(start, Err("HTTP status 500".to_string()));
        self
    }

    /// Every unknown start serves a full page of fresh ids.
    pub fn endless(mut self, page_size: usize) -> Self {
        self.endless_page_size = Some(page_size);
        self
    }

    /// timeline_url ignores paging, simulating a broken pagination scheme.
    pub fn with_constant_url(mut self) -> Self {
        self.constant_url = true;
        self
    }

    pub fn with_full_text(mut self, id: &str, text: &str) -> Self {
        self.full_texts.insert(id.to_string(), Ok(text.to_string()));
        self
    }

    pub fn with_failing_full_text(mut self, id: &str) -> Self {
        self.full_texts
            .insert(id.to_string(), Err("HTTP status 404".to_string()));
        self
    }

    pub fn timeline_requests(&self) -> usize {
        self.timeline_requests.load(Ordering::SeqCst)
    }

    pub fn full_text_requests(&self) -> usize {
        self.full_text_requests.load(Ordering::SeqCst)
    }

    pub fn requested_starts(&self) -> Vec<usize> {
        self.requested_starts.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusSource for FakeSource {
    fn timeline_url(&self, user_id: &str, start: usize, count: usize) -> String {
        if self.constant_url {
            format!("fake://{user_id}")
        } else {
            format!("fake://{user_id}?start={start}&count={count}")
        }
    }

    async fn user_timeline(
        &self,
        user_id: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<TimelineItem>, ApiError> {
        self.timeline_requests.fetch_add(1, Ordering::SeqCst);
        self.requested_starts.lock().unwrap().push(start);
        match self.pages.get(&start) {
            Some(Ok(items)) => Ok(items.clone()),
            Some(Err(msg)) => Err(ApiError::fetch(
                self.timeline_url(user_id, start, count),
                "UserTimeline",
                Some(anyhow::anyhow!(msg.clone())),
            )),
            None => Ok(match self.endless_page_size {
                Some(size) => items(start, size),
                None => Vec::new(),
            }),
        }
    }

    async fn full_text(&self, status_id: &str) -> Result<String, ApiError> {
        self.full_text_requests.fetch_add(1, Ordering::SeqCst);
        match self.full_texts.get(status_id) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(msg)) => Err(ApiError::fetch(
                format!("fake://status/{status_id}"),
                "FullText",
                Some(anyhow::anyhow!(msg.clone())),
            )),
            None => Err(ApiError::fetch(
                format!("fake://status/{status_id}"),
                "FullText",
                Some(anyhow::anyhow!("unknown status")),
            )),
        }
    }
}

/// Scheduler that returns immediately and records each requested pause.
#[derive(Default)]
pub struct RecordingScheduler {
    delays: Mutex<Vec<Duration>>,
    cancel_on_call: Option<usize>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `n`th pause (1-based) reports cancellation.
    pub fn cancelling_on(n: usize) -> Self {
        Self {
            cancel_on_call: Some(n),
            ..Self::default()
        }
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scheduler for RecordingScheduler {
    async fn delay(&self, delay: Duration) -> bool {
        let mut delays = self.delays.lock().unwrap();
        delays.push(delay);
        self.cancel_on_call != Some(delays.len())
    }
}
