// ABOUTME: Rendering and pipeline configuration: RenderConfig, RouteOptions, and FeedOptions.
// ABOUTME: RouteOptions::from_query is the single defaulting function for the query-string options bag.

use std::time::Duration;

/// Presentation toggles consumed by the renderer. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub readable: bool,
    pub author_name_bold: bool,
    pub show_author_in_title: bool,
    pub show_author_in_desc: bool,
    pub show_author_avatar_in_desc: bool,
    pub show_emoji_for_retweet: bool,
    pub show_retweet_text_in_title: bool,
    pub add_link_for_pics: bool,
    pub show_timestamp_in_description: bool,
    pub show_comments: bool,
    pub width_of_pics: Option<u32>,
    pub height_of_pics: Option<u32>,
    pub size_of_author_avatar: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            readable: false,
            author_name_bold: false,
            show_author_in_title: true,
            show_author_in_desc: false,
            show_author_avatar_in_desc: false,
            show_emoji_for_retweet: false,
            show_retweet_text_in_title: false,
            add_link_for_pics: false,
            show_timestamp_in_description: false,
            show_comments: false,
            width_of_pics: None,
            height_of_pics: None,
            size_of_author_avatar: 48,
        }
    }
}

impl RenderConfig {
    /// Config used for an embedded reshared status: author shown by name only, no comments.
    pub fn nested(&self) -> Self {
        Self {
            show_author_in_desc: true,
            show_author_avatar_in_desc: false,
            show_comments: false,
            ..self.clone()
        }
    }
}

/// Options bag recognised on a feed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOptions {
    pub pages_count: u32,
    pub render: RenderConfig,
}

/// Default number of timeline pages per feed.
pub const DEFAULT_PAGES_COUNT: u32 = 3;

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            pages_count: DEFAULT_PAGES_COUNT,
            render: RenderConfig::default(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

fn parse_uint(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

impl RouteOptions {
    /// Parse a query-string shaped options bag, e.g. `readable=1&widthOfPics=200`.
    ///
    /// Unknown keys are ignored and unparsable values keep their default. A leading
    /// `?` is accepted.
    pub fn from_query(query: &str) -> Self {
        let mut opts = Self::default();
        let query = query.trim().trim_start_matches('?');
        let render = &mut opts.render;

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let flag = |current: bool| parse_bool(&value).unwrap_or(current);
            match key.as_ref() {
                "pagesCount" => {
                    if let Some(n) = parse_uint(&value).filter(|n| *n > 0) {
                        opts.pages_count = n;
                    }
                }
                "readable" => render.readable = flag(render.readable),
                "authorNameBold" => render.author_name_bold = flag(render.author_name_bold),
                "showAuthorInTitle" => {
                    render.show_author_in_title = flag(render.show_author_in_title)
                }
                "showAuthorInDesc" => render.show_author_in_desc = flag(render.show_author_in_desc),
                "showAuthorAvatarInDesc" => {
                    render.show_author_avatar_in_desc = flag(render.show_author_avatar_in_desc)
                }
                "showEmojiForRetweet" => {
                    render.show_emoji_for_retweet = flag(render.show_emoji_for_retweet)
                }
                "showRetweetTextInTitle" => {
                    render.show_retweet_text_in_title = flag(render.show_retweet_text_in_title)
                }
                "addLinkForPics" => render.add_link_for_pics = flag(render.add_link_for_pics),
                "showTimestampInDescription" => {
                    render.show_timestamp_in_description =
                        flag(render.show_timestamp_in_description)
                }
                "showComments" => render.show_comments = flag(render.show_comments),
                "widthOfPics" => {
                    if let Some(n) = parse_uint(&value) {
                        render.width_of_pics = Some(n);
                    }
                }
                "heightOfPics" => {
                    if let Some(n) = parse_uint(&value) {
                        render.height_of_pics = Some(n);
                    }
                }
                "sizeOfAuthorAvatar" => {
                    if let Some(n) = parse_uint(&value) {
                        render.size_of_author_avatar = n;
                    }
                }
                _ => {}
            }
        }

        opts
    }
}

/// Pipeline settings for one feed generation pass.
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub count_per_page: usize,
    pub max_pages: u32,
    /// Pause between two uncached page requests.
    pub page_delay: Duration,
    pub page_ttl: Duration,
    pub full_text_ttl: Duration,
    /// Upper bound on concurrent full-text requests.
    pub full_text_concurrency: usize,
    pub force_refresh: bool,
    pub web_base: String,
    pub mobile_base: String,
    /// Offset of upstream timestamps, which carry no zone.
    pub utc_offset_hours: i32,
    pub render: RenderConfig,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            count_per_page: 20,
            max_pages: DEFAULT_PAGES_COUNT,
            page_delay: Duration::from_secs(2),
            page_ttl: Duration::from_secs(300),
            full_text_ttl: Duration::from_secs(3600),
            full_text_concurrency: 8,
            force_refresh: false,
            web_base: "https://www.douban.com".to_string(),
            mobile_base: "https://m.douban.com".to_string(),
            utc_offset_hours: 8,
            render: RenderConfig::default(),
        }
    }
}

impl FeedOptions {
    /// Defaults overridden by a parsed route options bag.
    pub fn from_route(route: &RouteOptions) -> Self {
        Self {
            max_pages: route.pages_count,
            render: route.render.clone(),
            ..Self::default()
        }
    }

    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn full_text_concurrency(mut self, n: usize) -> Self {
        self.full_text_concurrency = n.max(1);
        self
    }

    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    /// Sets both link bases; trailing slashes are dropped.
    pub fn bases(mut self, web_base: impl Into<String>, mobile_base: impl Into<String>) -> Self {
        self.web_base = web_base.into().trim_end_matches('/').to_string();
        self.mobile_base = mobile_base.into().trim_end_matches('/').to_string();
        self
    }
}
