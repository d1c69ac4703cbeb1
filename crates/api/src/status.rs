// ABOUTME: Wire models for timeline pages, statuses, comments, and their embedded media.
// ABOUTME: Deserialization is lenient so one malformed field never rejects a whole page.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Labels the upstream uses for a reshare activity.
pub const RESHARE_ACTIVITIES: &[&str] = &["转发", "repost", "reshare"];

/// Helper to deserialize null as default (empty vec, false, etc.)
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// Ids arrive as strings or numbers depending on the endpoint.
fn deserialize_lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// Offsets that are not non-negative integers become `None`.
fn deserialize_lenient_offset<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().map(|v| v as usize),
        Some(Value::String(s)) => s.trim().parse::<usize>().ok(),
        _ => None,
    })
}

/// Flags arrive as booleans, 0/1, or their string forms. Anything else is false.
fn deserialize_lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        _ => false,
    })
}

/// Ratings show up as a number, a numeric string, or `{"value": n}`.
fn deserialize_lenient_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    fn from_value(v: &Value) -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Object(map) => map.get("value").and_then(from_value),
            _ => None,
        }
    }
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(from_value))
}

/// Author of a status or comment. Every field may be missing upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub name: Option<String>,
    pub url: Option<String>,
    pub avatar: Option<String>,
}

/// Rich-text annotation over the half-open codepoint range `[start, end)` of a status text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entity {
    #[serde(deserialize_with = "deserialize_lenient_offset")]
    pub start: Option<usize>,
    #[serde(deserialize_with = "deserialize_lenient_offset")]
    pub end: Option<usize>,
    pub uri: Option<String>,
    pub title: Option<String>,
}

/// One size variant of a picture. Only the URL is consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSize {
    pub url: Option<String>,
}

/// A picture with its size variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub large: Option<ImageSize>,
    pub normal: Option<ImageSize>,
}

impl Image {
    /// The large variant's URL, falling back to the normal one. Empty URLs count as missing.
    pub fn best_url(&self) -> Option<&str> {
        fn url_of(size: &Option<ImageSize>) -> Option<&str> {
            size.as_ref()
                .and_then(|s| s.url.as_deref())
                .filter(|u| !u.is_empty())
        }
        url_of(&self.large).or_else(|| url_of(&self.normal))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoInfo {
    pub cover_url: Option<String>,
    pub video_url: Option<String>,
}

/// Structured link preview (book, movie, article, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Card {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub url: Option<String>,
    pub image: Option<Image>,
    #[serde(deserialize_with = "deserialize_lenient_rating")]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoCard {
    pub title: Option<String>,
    pub url: Option<String>,
    pub video_info: Option<VideoInfo>,
}

/// One activity record.
///
/// `parent_status` and `reshared_status` are at most one level deep; the upstream
/// never nests a reshare inside a reshare.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    #[serde(deserialize_with = "deserialize_lenient_id")]
    pub id: String,
    pub text: Option<String>,
    pub author: Option<Author>,
    pub create_time: Option<String>,
    pub entities: Option<Vec<Entity>>,
    #[serde(deserialize_with = "deserialize_null_default")]
    pub images: Vec<Image>,
    pub video_info: Option<VideoInfo>,
    pub card: Option<Card>,
    pub video_card: Option<VideoCard>,
    pub activity: Option<String>,
    pub uri: Option<String>,
    pub sharing_url: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_flag")]
    pub deleted: bool,
    #[serde(deserialize_with = "deserialize_lenient_flag")]
    pub hidden: bool,
    pub msg: Option<String>,
    pub parent_status: Option<Box<Status>>,
    pub reshared_status: Option<Box<Status>>,
}

impl Status {
    /// True when the activity label marks this status as a reshare.
    pub fn is_reshare(&self) -> bool {
        self.activity
            .as_deref()
            .map(|label| {
                let label = label.trim();
                RESHARE_ACTIVITIES
                    .iter()
                    .any(|known| label.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub text: Option<String>,
    pub author: Option<Author>,
}

/// One entry of a timeline page: a status plus the comments shown under it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineItem {
    pub status: Option<Status>,
    #[serde(deserialize_with = "deserialize_null_default")]
    pub comments: Vec<Comment>,
    #[serde(deserialize_with = "deserialize_lenient_flag")]
    pub deleted: bool,
}

impl TimelineItem {
    /// Id used for deduplication and cache keys, if the item carries a status.
    pub fn status_id(&self) -> Option<&str> {
        self.status
            .as_ref()
            .map(|s| s.id.as_str())
            .filter(|id| !id.is_empty())
    }
}

/// Body of the user timeline endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelinePage {
    #[serde(deserialize_with = "deserialize_null_default")]
    pub items: Vec<TimelineItem>,
}

/// Body of the single-status endpoint; only the untruncated text is consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullText {
    pub text: Option<String>,
}
