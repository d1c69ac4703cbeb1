// ABOUTME: Output models for generated feeds.
// ABOUTME: FeedItem is the externally visible unit; Feed carries channel metadata plus ordered items.

use serde::{Deserialize, Serialize};

/// A single generated feed entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// RFC 2822 date in GMT; absent when the upstream timestamp could not be parsed.
    #[serde(rename = "pubDate", skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,
    pub description: String,
    pub guid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// A generated feed with channel metadata and items in upstream order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<FeedItem>,
}
