// ABOUTME: Status validation and repair before rendering.
// ABOUTME: Classifies a status as usable or not and fills defaults so rendering never null-checks.

use std::fmt;

use chrono::{DateTime, Utc};
use statusfeed_api::{Author, Status};

use crate::time_parse::format_upstream_time;

pub const PLACEHOLDER_AUTHOR_NAME: &str = "[unknown author]";
pub const PLACEHOLDER_AUTHOR_URL: &str = "https://www.douban.com/people/1/";
pub const PLACEHOLDER_AUTHOR_AVATAR: &str = "https://img1.doubanio.com/icon/user_normal.jpg";

/// Base of the sentinel link given to unusable statuses.
pub const FAILURE_URL_BASE: &str = "https://www.douban.com/?feed_failed=";

/// Why a status cannot be rendered. The reason doubles as placeholder text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: String,
}

impl Rejection {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn with_msg(status: &Status, fallback: &str) -> Self {
        let reason = status
            .msg
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback);
        Self::new(reason)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Classifies a status without touching it. First match wins: missing, deleted,
/// hidden, then inaccessible (neither text nor uri).
pub fn classify(status: Option<&Status>) -> Result<(), Rejection> {
    let Some(status) = status else {
        return Err(Rejection::new("no content"));
    };
    if status.deleted {
        return Err(Rejection::with_msg(status, "content deleted"));
    }
    if status.hidden {
        return Err(Rejection::with_msg(status, "content hidden"));
    }
    if status.text.is_none() && status.uri.is_none() {
        return Err(Rejection::with_msg(status, "content inaccessible"));
    }
    Ok(())
}

/// Drops tracking parameters: everything from the first `&` on.
pub fn sanitize_sharing_url(url: &str) -> &str {
    match url.find('&') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Deterministic sentinel link for a status that failed classification at `now`.
pub fn failure_url(now: &DateTime<Utc>) -> String {
    format!("{}{}", FAILURE_URL_BASE, now.timestamp_millis())
}

/// Classifies `status` and repairs it in place.
///
/// Always: `sharing_url` is sanitized. Valid: author and its fields, `create_time`
/// and `entities` are filled. Invalid: `sharing_url` becomes the failure sentinel
/// and `create_time` is backfilled, so links and dates stay total.
pub fn normalize(
    status: Option<&mut Status>,
    now: &DateTime<Utc>,
    utc_offset_hours: i32,
) -> Result<(), Rejection> {
    let Some(status) = status else {
        return Err(Rejection::new("no content"));
    };

    if let Some(url) = status.sharing_url.take() {
        status.sharing_url = Some(sanitize_sharing_url(&url).to_string());
    }
    if status.create_time.is_none() {
        status.create_time = Some(format_upstream_time(now, utc_offset_hours));
    }

    if let Err(rejection) = classify(Some(&*status)) {
        status.sharing_url = Some(failure_url(now));
        return Err(rejection);
    }

    let author = status.author.get_or_insert_with(Author::default);
    author
        .url
        .get_or_insert_with(|| PLACEHOLDER_AUTHOR_URL.to_string());
    author
        .name
        .get_or_insert_with(|| PLACEHOLDER_AUTHOR_NAME.to_string());
    author
        .avatar
        .get_or_insert_with(|| PLACEHOLDER_AUTHOR_AVATAR.to_string());
    status.entities.get_or_insert_with(Vec::new);

    Ok(())
}

/// Normalizes a status and both of its one-level relations. Only the top-level
/// verdict is returned; nested rejections are rendered as placeholders later.
pub fn normalize_tree(
    status: &mut Status,
    now: &DateTime<Utc>,
    utc_offset_hours: i32,
) -> Result<(), Rejection> {
    let verdict = normalize(Some(&mut *status), now, utc_offset_hours);
    if let Some(reshared) = status.reshared_status.as_deref_mut() {
        let _ = normalize(Some(reshared), now, utc_offset_hours);
    }
    if let Some(parent) = status.parent_status.as_deref_mut() {
        let _ = normalize(Some(parent), now, utc_offset_hours);
    }
    verdict
}

/// Author fields with placeholders substituted, for statuses that passed [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorView<'a> {
    pub name: &'a str,
    pub url: &'a str,
    pub avatar: &'a str,
}

impl<'a> AuthorView<'a> {
    pub fn of(author: Option<&'a Author>) -> Self {
        fn pick<'a>(value: Option<&'a String>, fallback: &'static str) -> &'a str {
            value
                .map(String::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback)
        }
        Self {
            name: pick(author.and_then(|a| a.name.as_ref()), PLACEHOLDER_AUTHOR_NAME),
            url: pick(author.and_then(|a| a.url.as_ref()), PLACEHOLDER_AUTHOR_URL),
            avatar: pick(author.and_then(|a| a.avatar.as_ref()), PLACEHOLDER_AUTHOR_AVATAR),
        }
    }
}
