// ABOUTME: Feed generation library for statusfeed: turns a user's status timeline into RSS-style items.
// ABOUTME: Provides normalization, rendering, full-text resolution, pagination, assembly, caching, and RSS output.

pub mod assemble;
pub mod cache;
pub mod config;
pub mod error;
pub mod fulltext;
pub mod html_utils;
pub mod models;
pub mod normalize;
pub mod paginate;
pub mod render;
pub mod rss;
pub mod scheduler;
pub mod time_parse;

#[cfg(test)]
mod testing;

pub use assemble::{derive_link, rewrite_uri, FeedAssembler};
pub use cache::{try_get, Cache, Lookup, MemoryCache, NoopCache};
pub use config::{FeedOptions, RenderConfig, RouteOptions, DEFAULT_PAGES_COUNT};
pub use error::FeedError;
pub use fulltext::{FullTextResolver, ResolveStats, FULL_TEXT_UNAVAILABLE};
pub use models::{Feed, FeedItem};
pub use normalize::{classify, normalize, normalize_tree, Rejection};
pub use paginate::{FetchState, PaginatedFetcher, Pagination, StopReason};
pub use render::{render, MediaAccumulator, Rendered};
pub use scheduler::{Scheduler, TokioScheduler};
pub use time_parse::{format_pub_date, parse_upstream_time};
