// ABOUTME: Builds a Feed for one user: paginate, filter, normalize, resolve full text, render, and link.
// ABOUTME: Nothing here is fatal; the worst outcome is an empty feed plus warnings in the log.

use chrono::{DateTime, Utc};
use statusfeed_api::{Status, StatusSource, TimelineItem};
use tracing::{info, warn};
use url::Url;

use crate::cache::Cache;
use crate::config::FeedOptions;
use crate::error::FeedError;
use crate::fulltext::FullTextResolver;
use crate::models::{Feed, FeedItem};
use crate::normalize::{classify, normalize_tree, PLACEHOLDER_AUTHOR_NAME};
use crate::paginate::PaginatedFetcher;
use crate::render::{render, MediaAccumulator};
use crate::scheduler::Scheduler;
use crate::time_parse::{format_pub_date, parse_upstream_time};

/// Generates the status feed of a user from its injected collaborators.
///
/// # Example
///
/// ```no_run
/// use statusfeed_api::Client;
/// use statusfeed_feed::{FeedAssembler, FeedOptions, MemoryCache, TokioScheduler};
///
/// # async fn run() {
/// let client = Client::builder().build();
/// let cache = MemoryCache::new();
/// let scheduler = TokioScheduler::new();
/// let feed = FeedAssembler::new(&client, &cache, &scheduler, FeedOptions::default())
///     .assemble("123456")
///     .await;
/// println!("{} items", feed.items.len());
/// # }
/// ```
pub struct FeedAssembler<'a, S: ?Sized, C: ?Sized, D: ?Sized> {
    source: &'a S,
    cache: &'a C,
    scheduler: &'a D,
    options: FeedOptions,
}

impl<'a, S, C, D> FeedAssembler<'a, S, C, D>
where
    S: StatusSource + ?Sized,
    C: Cache + ?Sized,
    D: Scheduler + ?Sized,
{
    pub fn new(source: &'a S, cache: &'a C, scheduler: &'a D, options: FeedOptions) -> Self {
        Self {
            source,
            cache,
            scheduler,
            options,
        }
    }

    pub fn options(&self) -> &FeedOptions {
        &self.options
    }

    pub async fn assemble(&self, user_id: &str) -> Feed {
        let opts = &self.options;
        let pagination = PaginatedFetcher::new(self.source, self.cache, self.scheduler, opts)
            .fetch(user_id)
            .await;

        let now = Utc::now();
        let mut items: Vec<TimelineItem> = pagination
            .items
            .into_iter()
            .filter(is_publishable)
            .collect();
        for item in &mut items {
            if let Some(status) = item.status.as_mut() {
                // Rejections surface later as placeholder text.
                let _ = normalize_tree(status, &now, opts.utc_offset_hours);
            }
        }

        FullTextResolver::new(self.source, self.cache, opts.full_text_ttl)
            .concurrency(opts.full_text_concurrency)
            .force_refresh(opts.force_refresh)
            .resolve(&mut items)
            .await;

        let feed_items: Vec<FeedItem> = items
            .iter()
            .filter_map(|item| match self.map_item(user_id, item) {
                Ok(feed_item) => Some(feed_item),
                Err(e) => {
                    warn!(user_id, status_id = item.status_id(), error = %e, "dropping item");
                    None
                }
            })
            .collect();

        info!(
            user_id,
            items = feed_items.len(),
            stop = %pagination.reason,
            "feed assembled"
        );
        self.feed(user_id, &items, feed_items)
    }

    fn map_item(&self, user_id: &str, item: &TimelineItem) -> Result<FeedItem, FeedError> {
        let opts = &self.options;
        let status = item
            .status
            .as_ref()
            .ok_or_else(|| FeedError::render("item has no status"))?;

        let mut media = MediaAccumulator::new();
        let rendered = render(status, &item.comments, &opts.render, &mut media);
        let link = derive_link(status, user_id, &opts.web_base)?;
        let guid = if status.id.is_empty() {
            link.clone()
        } else {
            status_guid(&opts.web_base, &status.id)
        };

        Ok(FeedItem {
            title: rendered.title,
            link,
            pub_date: status
                .create_time
                .as_deref()
                .and_then(|t| parse_upstream_time(t, opts.utc_offset_hours))
                .map(|dt: DateTime<Utc>| format_pub_date(&dt)),
            description: rendered.description,
            guid,
            author: classify(Some(status))
                .ok()
                .and_then(|_| status.author.as_ref()?.name.clone())
                .filter(|name| !name.is_empty()),
        })
    }

    fn feed(&self, user_id: &str, items: &[TimelineItem], feed_items: Vec<FeedItem>) -> Feed {
        let name = owner_name(items).unwrap_or(user_id);
        Feed {
            title: format!("{name}'s statuses"),
            link: format!(
                "{}/people/{}/statuses",
                self.options.mobile_base.trim_end_matches('/'),
                user_id
            ),
            description: format!("Latest Douban statuses of {name}"),
            items: feed_items,
        }
    }
}

fn is_publishable(item: &TimelineItem) -> bool {
    !item.deleted && item.status.as_ref().is_some_and(|s| !s.deleted)
}

/// Name of the first usable status author, taken as the timeline owner.
fn owner_name(items: &[TimelineItem]) -> Option<&str> {
    items
        .iter()
        .filter_map(|item| item.status.as_ref())
        .filter(|status| classify(Some(*status)).is_ok())
        .filter_map(|status| status.author.as_ref()?.name.as_deref())
        .find(|name| !name.is_empty() && *name != PLACEHOLDER_AUTHOR_NAME)
}

pub fn status_guid(web_base: &str, status_id: &str) -> String {
    format!("{}/status/{}", web_base.trim_end_matches('/'), status_id)
}

/// Item link: sanitized sharing URL, else the status URI, else a URL built from the ids.
pub fn derive_link(status: &Status, user_id: &str, web_base: &str) -> Result<String, FeedError> {
    if let Some(url) = status.sharing_url.as_deref().filter(|u| !u.is_empty()) {
        return Ok(url.to_string());
    }
    if let Some(url) = status
        .uri
        .as_deref()
        .and_then(|uri| rewrite_uri(uri, web_base))
    {
        return Ok(url);
    }
    if status.id.is_empty() {
        return Err(FeedError::link("status has no sharing url, uri, or id"));
    }
    Ok(format!(
        "{}/people/{}/status/{}/",
        web_base.trim_end_matches('/'),
        user_id,
        status.id
    ))
}

/// Maps an app-scheme URI such as `douban://douban.com/status/1` onto `web_base`.
/// Web URIs pass through unchanged.
pub fn rewrite_uri(uri: &str, web_base: &str) -> Option<String> {
    let parsed = Url::parse(uri).ok()?;
    if matches!(parsed.scheme(), "http" | "https") {
        return Some(uri.to_string());
    }
    let mut rewritten = Url::parse(web_base).ok()?.join(parsed.path()).ok()?;
    rewritten.set_query(parsed.query());
    Some(rewritten.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, NoopCache};
    use crate::fulltext::FULL_TEXT_UNAVAILABLE;
    use crate::normalize::FAILURE_URL_BASE;
    use crate::testing::{item, items, FakeSource, RecordingScheduler};
    use pretty_assertions::assert_eq;
    use statusfeed_api::{Author, Image, ImageSize};

    const WEB: &str = "https://www.douban.com";

    fn opts() -> FeedOptions {
        FeedOptions::default()
    }

    #[test]
    fn link_prefers_sharing_url_then_uri_then_fallback() {
        let mut s = Status {
            id: "42".into(),
            sharing_url: Some("https://www.douban.com/doubanapp/dispatch?uri=/status/42/".into()),
            uri: Some("douban://douban.com/status/42".into()),
            ..Default::default()
        };
        assert_eq!(
            derive_link(&s, "u1", WEB).unwrap(),
            "https://www.douban.com/doubanapp/dispatch?uri=/status/42/"
        );

        s.sharing_url = None;
        assert_eq!(
            derive_link(&s, "u1", WEB).unwrap(),
            "https://www.douban.com/status/42"
        );

        s.uri = None;
        assert_eq!(
            derive_link(&s, "u1", WEB).unwrap(),
            "https://www.douban.com/people/u1/status/42/"
        );

        s.id = String::new();
        assert!(matches!(derive_link(&s, "u1", WEB), Err(FeedError::Link(_))));
    }

    #[test]
    fn web_uris_are_kept_and_app_uris_rewritten() {
        assert_eq!(
            rewrite_uri("https://m.douban.com/status/1", WEB).as_deref(),
            Some("https://m.douban.com/status/1")
        );
        assert_eq!(
            rewrite_uri("douban://douban.com/note/7?x=1", WEB).as_deref(),
            Some("https://www.douban.com/note/7?x=1")
        );
        assert_eq!(rewrite_uri("not a uri", WEB), None);
    }

    #[tokio::test]
    async fn end_to_end_item_fields() {
        let mut raw = item("1", "hello");
        {
            let status = raw.status.as_mut().unwrap();
            status.author = Some(Author {
                name: Some("Bob".into()),
                ..Default::default()
            });
            status.images = vec![Image {
                large: Some(ImageSize {
                    url: Some("http://x/1.jpg".into()),
                    ..Default::default()
                }),
                ..Default::default()
            }];
            status.sharing_url = Some("https://www.douban.com/status/1/?_i=abc&utm_source=x".into());
        }
        let source = FakeSource::new()
            .with_page(0, vec![raw])
            .with_full_text("1", "hello");
        let feed = FeedAssembler::new(&source, &NoopCache, &RecordingScheduler::new(), opts())
            .assemble("u1")
            .await;

        assert_eq!(feed.title, "Bob's statuses");
        assert_eq!(feed.link, "https://m.douban.com/people/u1/statuses");
        assert_eq!(feed.items.len(), 1);
        let it = &feed.items[0];
        assert!(it.title.contains("Bob"));
        assert!(it.description.contains("hello"));
        assert!(it.description.contains("http://x/1.jpg"));
        assert_eq!(it.link, "https://www.douban.com/status/1/?_i=abc");
        assert_eq!(it.guid, "https://www.douban.com/status/1");
        assert_eq!(it.pub_date.as_deref(), Some("Tue, 02 Jan 2024 07:04:05 GMT"));
        assert_eq!(it.author.as_deref(), Some("Bob"));
    }

    #[tokio::test]
    async fn deleted_items_are_dropped_and_hidden_ones_become_placeholders() {
        let mut deleted = item("1", "gone");
        deleted.status.as_mut().unwrap().deleted = true;
        let mut item_deleted = item("2", "gone too");
        item_deleted.deleted = true;
        let mut hidden = item("3", "secret");
        hidden.status.as_mut().unwrap().hidden = true;
        let no_status = TimelineItem::default();
        let source = FakeSource::new().with_page(0, vec![deleted, item_deleted, hidden, no_status]);

        let feed = FeedAssembler::new(&source, &NoopCache, &RecordingScheduler::new(), opts())
            .assemble("u1")
            .await;

        assert_eq!(feed.items.len(), 1);
        let it = &feed.items[0];
        assert_eq!(it.title, "content hidden");
        assert_eq!(it.description, "content hidden");
        assert!(it.link.starts_with(FAILURE_URL_BASE));
        assert_eq!(it.author, None);
        assert_eq!(feed.title, "u1's statuses", "no usable author");
        assert_eq!(source.full_text_requests(), 0);
    }

    #[tokio::test]
    async fn empty_author_name_is_not_reported() {
        let mut raw = item("1", "x");
        raw.status.as_mut().unwrap().author = Some(Author {
            name: Some(String::new()),
            ..Default::default()
        });
        let source = FakeSource::new().with_page(0, vec![raw]).with_full_text("1", "x");

        let feed = FeedAssembler::new(&source, &NoopCache, &RecordingScheduler::new(), opts())
            .assemble("u1")
            .await;

        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].author, None);
        assert_eq!(feed.title, "u1's statuses");
    }

    #[tokio::test]
    async fn unparsable_time_omits_pub_date() {
        let mut raw = item("1", "x");
        raw.status.as_mut().unwrap().create_time = Some("yesterday".into());
        let source = FakeSource::new().with_page(0, vec![raw]).with_full_text("1", "x");

        let feed = FeedAssembler::new(&source, &NoopCache, &RecordingScheduler::new(), opts())
            .assemble("u1")
            .await;

        assert_eq!(feed.items[0].pub_date, None);
    }

    #[tokio::test]
    async fn partial_failures_still_produce_a_feed() {
        let source = FakeSource::new()
            .with_page(0, items(0, 20))
            .with_failing_page(20)
            .with_full_text("0", "zero in full")
            .with_failing_full_text("1");
        let cache = MemoryCache::new();

        let feed = FeedAssembler::new(&source, &cache, &RecordingScheduler::new(), opts())
            .assemble("u1")
            .await;

        assert_eq!(feed.items.len(), 20);
        assert!(feed.items[0].description.contains("zero in full"));
        assert!(feed.items[1]
            .description
            .contains(FULL_TEXT_UNAVAILABLE.trim()));
        assert_eq!(feed.title, "user0's statuses");
    }

    #[tokio::test]
    async fn empty_timeline_gives_empty_feed() {
        let source = FakeSource::new();
        let feed = FeedAssembler::new(&source, &NoopCache, &RecordingScheduler::new(), opts())
            .assemble("u1")
            .await;
        assert!(feed.items.is_empty());
        assert_eq!(feed.title, "u1's statuses");
    }
}
