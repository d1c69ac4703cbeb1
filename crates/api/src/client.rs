// ABOUTME: The main Client struct that talks to the upstream status API over HTTP.
// ABOUTME: Provides async user_timeline() and full_text() requests with the required referer header.

use async_trait::async_trait;
use tracing::debug;

use crate::error::ApiError;
use crate::options::{ClientBuilder, Options};
use crate::resource::{fetch, FetchOptions};
use crate::source::StatusSource;
use crate::status::{FullText, TimelineItem, TimelinePage};

/// HTTP client for the status API.
#[derive(Debug, Clone)]
pub struct Client {
    opts: Options,
    http_client: reqwest::Client,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(opts: Options) -> Self {
        let http_client = opts.http_client.clone().unwrap_or_else(|| {
            reqwest::Client::builder()
                .user_agent(&opts.user_agent)
                .timeout(opts.timeout)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "falling back to default HTTP client");
                    reqwest::Client::new()
                })
        });

        Self { opts, http_client }
    }

    /// The options this client was built with.
    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// URL of a single status on the API.
    pub fn status_url(&self, status_id: &str) -> String {
        format!("{}/{}", self.opts.base_url, status_id)
    }

    fn fetch_options(&self) -> FetchOptions {
        let mut headers = self.opts.headers.clone();
        headers
            .entry("Referer".to_string())
            .or_insert_with(|| self.opts.referer.clone());
        FetchOptions { headers }
    }
}

#[async_trait]
impl StatusSource for Client {
    fn timeline_url(&self, user_id: &str, start: usize, count: usize) -> String {
        format!(
            "{}/user_timeline/{}?start={}&count={}",
            self.opts.base_url, user_id, start, count
        )
    }

    async fn user_timeline(
        &self,
        user_id: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<TimelineItem>, ApiError> {
        let url = self.timeline_url(user_id, start, count);
        debug!(%url, "fetching timeline page");
        let result = fetch(&self.http_client, &url, "UserTimeline", &self.fetch_options()).await?;
        let page: TimelinePage = result.json("UserTimeline")?;
        Ok(page.items)
    }

    async fn full_text(&self, status_id: &str) -> Result<String, ApiError> {
        let url = self.status_url(status_id);
        debug!(%url, "fetching full text");
        let result = fetch(&self.http_client, &url, "FullText", &self.fetch_options()).await?;
        let body: FullText = result.json("FullText")?;
        body.text.ok_or_else(|| {
            ApiError::decode(&url, "FullText", Some(anyhow::anyhow!("missing text field")))
        })
    }
}
