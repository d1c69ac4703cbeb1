// ABOUTME: Error types for feed generation operations.
// ABOUTME: Provides FeedError enum with Cache, Render, Link, and Api variants.

use std::fmt;
use thiserror::Error;

use statusfeed_api::ApiError;

/// Errors that can occur while generating a feed.
///
/// None of these abort a whole run: callers log them and skip the affected
/// fragment, item, or page.
#[derive(Debug, Error)]
pub enum FeedError {
    /// A cached value could not be encoded or decoded.
    #[error("cache error: {0}")]
    Cache(String),

    /// A fragment of a status could not be rendered.
    #[error("render error: {0}")]
    Render(String),

    /// No usable link could be derived for an item.
    #[error("link error: {0}")]
    Link(String),

    /// The upstream request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl FeedError {
    /// Creates a Cache error from an underlying serialization error.
    pub fn cache(err: impl fmt::Display) -> Self {
        FeedError::Cache(err.to_string())
    }

    /// Creates a Render error with a custom message.
    pub fn render(msg: impl Into<String>) -> Self {
        FeedError::Render(msg.into())
    }

    /// Creates a Link error with a custom message.
    pub fn link(msg: impl Into<String>) -> Self {
        FeedError::Link(msg.into())
    }
}
