// ABOUTME: Main library entry point for the upstream status API client.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, Options, ApiError, ErrorCode, StatusSource, and wire models.

//! Client for a paginated social-network status API.
//!
//! # Example
//!
//! ```no_run
//! use statusfeed_api::{ApiError, Client, StatusSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ApiError> {
//!     let client = Client::builder().build();
//!     let items = client.user_timeline("ahbei", 0, 20).await?;
//!     println!("{} items", items.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod options;
pub mod resource;
pub mod source;
pub mod status;

pub use crate::client::Client;
pub use crate::error::{ApiError, ErrorCode};
pub use crate::options::{ClientBuilder, Options, DEFAULT_BASE_URL, DEFAULT_REFERER};
pub use crate::source::StatusSource;
pub use crate::status::{
    Author, Card, Comment, Entity, FullText, Image, ImageSize, Status, TimelineItem, TimelinePage,
    VideoCard, VideoInfo, RESHARE_ACTIVITIES,
};
