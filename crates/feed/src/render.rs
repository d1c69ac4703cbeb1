// ABOUTME: Turns one status (with its reshare, quoted parent, media, cards, and comments) into a title and HTML description.
// ABOUTME: Rendering never fails: a broken fragment is logged and left out, an unusable status becomes placeholder text.

use statusfeed_api::{Card, Comment, Entity, Image, Status, VideoCard, VideoInfo};
use tracing::{debug, warn};

use crate::config::RenderConfig;
use crate::error::FeedError;
use crate::html_utils::{
    anchor, char_slice, clip_chars, collapse_html_breaks, collapse_text_breaks, escape_html,
    text_to_html,
};
use crate::normalize::{classify, AuthorView};

/// Codepoints of status text echoed into a top-level title.
pub const TITLE_TEXT_LIMIT: usize = 100;

/// Codepoints of text echoed into a title from an embedded status.
pub const NESTED_TITLE_TEXT_LIMIT: usize = 50;

const CLEAR_BREAK: &str = r#"<br clear="both" /><div style="clear: both"></div>"#;
const BLOCKQUOTE_OPEN: &str = r#"<blockquote style="background: #80808010;border-top:1px solid #80808030;border-bottom:1px solid #80808030;margin:0;padding:5px 20px;">"#;

/// Rendered title (plain text) and description (HTML).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub title: String,
    pub description: String,
}

/// Zero-size copies of every picture rendered for one feed item, shared across the
/// recursive render of that item.
///
/// Readers that use the first `<img>` of a description as the thumbnail would
/// otherwise pick the author avatar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaAccumulator {
    prefixes: Vec<String>,
}

impl MediaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, url: &str) {
        self.prefixes.push(format!(
            r#"<img width="0" height="0" src="{}">"#,
            escape_html(url)
        ));
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// All collected prefixes, concatenated.
    pub fn to_html(&self) -> String {
        self.prefixes.concat()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Depth {
    Top,
    Nested,
}

impl Depth {
    fn title_limit(self) -> usize {
        match self {
            Depth::Top => TITLE_TEXT_LIMIT,
            Depth::Nested => NESTED_TITLE_TEXT_LIMIT,
        }
    }
}

/// Renders `status` and `comments` with `config`.
///
/// Pictures are also recorded in `media`; pass a fresh accumulator per feed item.
pub fn render(
    status: &Status,
    comments: &[Comment],
    config: &RenderConfig,
    media: &mut MediaAccumulator,
) -> Rendered {
    let mut rendered = render_at(status, comments, config, media, Depth::Top);
    if config.show_author_avatar_in_desc && !media.is_empty() {
        rendered.description = format!("{}{}", media.to_html(), rendered.description);
    }
    rendered
}

fn render_at(
    status: &Status,
    comments: &[Comment],
    config: &RenderConfig,
    media: &mut MediaAccumulator,
    depth: Depth,
) -> Rendered {
    if let Err(rejection) = classify(Some(status)) {
        return Rendered {
            title: rejection.reason.clone(),
            description: rejection.reason,
        };
    }

    let author = AuthorView::of(status.author.as_ref());
    let text = status.text.as_deref().unwrap_or_default();
    let limit = depth.title_limit();
    let is_reshare = status.is_reshare();
    let reshared = status.reshared_status.as_deref();

    let (activity_html, activity_text) = activity_phrase(status, reshared, is_reshare);

    let mut title = String::new();
    let mut description = String::new();

    // Author and activity
    let mut head = Vec::new();
    if config.show_author_in_title {
        head.push(author.name.to_string());
    }
    if !activity_text.is_empty() {
        head.push(activity_text);
    }
    if !head.is_empty() {
        title.push_str(&head.join(" "));
        title.push_str(": ");
    }

    if config.show_author_in_desc {
        description.push_str(&author_html(&author, config));
        if !activity_html.is_empty() {
            description.push_str("&ensp;");
            description.push_str(&activity_html);
        }
        description.push_str(": ");
    }

    if config.show_timestamp_in_description {
        if let Some(ts) = status.create_time.as_deref() {
            description.push_str(&format!("<br><small>{}</small><br>", escape_html(ts)));
        }
    }

    // Text with entity links
    let entities = status.entities.as_deref().unwrap_or_default();
    description.push_str(&substitute_entities(&status.id, text, entities));

    if let Some(card) = &status.card {
        let card_title = card.title.as_deref().unwrap_or_default();
        if card.rating.is_some() {
            title.push_str(&format!("《{}》", card_title));
        } else {
            title.push_str(&format!("「{}」", card_title));
        }
    }
    if !(is_reshare && !config.show_retweet_text_in_title) {
        title.push_str(&clip_chars(text, limit));
    }

    // Media
    description.push_str(&images_html(&status.images, config, media));
    if let Some(video) = &status.video_info {
        push_segment(
            &mut description,
            &status.id,
            "video",
            video_html(video).map(|html| format!("{}{}", block_break(config), html)),
        );
    }

    if let Some(parent) = status.parent_status.as_deref() {
        let marker = if config.show_emoji_for_retweet {
            " 🔁 "
        } else {
            " Fw: "
        };
        description.push_str(marker);
        if config.show_retweet_text_in_title {
            title.push_str(marker);
        }
        match classify(Some(parent)) {
            Ok(()) => {
                let parent_author = AuthorView::of(parent.author.as_ref());
                let parent_text = parent.text.as_deref().unwrap_or_default();
                description.push_str(&anchor(parent_author.url, &escape_html(parent_author.name)));
                description.push_str(":&ensp;");
                description.push_str(&text_to_html(parent_text));
                if config.show_retweet_text_in_title {
                    title.push_str(&format!(
                        "{}: {}",
                        parent_author.name,
                        clip_chars(parent_text, limit)
                    ));
                }
            }
            Err(rejection) => {
                description.push_str(&escape_html(&rejection.reason));
                if config.show_retweet_text_in_title {
                    title.push_str(&rejection.reason);
                }
            }
        }
    }

    if let Some(card) = &status.card {
        push_segment(&mut description, &status.id, "card", card_html(card, config));
    }

    if let Some(video_card) = &status.video_card {
        push_segment(
            &mut description,
            &status.id,
            "video card",
            video_card_html(video_card, config),
        );
    }

    if let Some(reshared) = reshared {
        description.push_str(&open_block(config));
        match classify(Some(reshared)) {
            Ok(()) if depth == Depth::Top => {
                let nested = render_at(reshared, &[], &config.nested(), media, Depth::Nested);
                description.push_str(&nested.description);
                append_title(
                    &mut title,
                    &clip_chars(
                        reshared.text.as_deref().unwrap_or_default(),
                        NESTED_TITLE_TEXT_LIMIT,
                    ),
                );
                if config.readable {
                    if let Some(url) = reshared.sharing_url.as_deref().filter(|u| !u.is_empty()) {
                        description.push_str(&format!(
                            "<br><br><small>Source: {}</small>",
                            anchor(url, &escape_html(url))
                        ));
                    }
                }
            }
            Ok(()) => {
                // The upstream never nests a reshare inside a reshare; show a one-line echo.
                debug!(status_id = %status.id, "reshare nested below the first level");
                let inner_author = AuthorView::of(reshared.author.as_ref());
                description.push_str(&anchor(inner_author.url, &escape_html(inner_author.name)));
                description.push_str(":&ensp;");
                description.push_str(&text_to_html(&clip_chars(
                    reshared.text.as_deref().unwrap_or_default(),
                    NESTED_TITLE_TEXT_LIMIT,
                )));
            }
            Err(rejection) => {
                description.push_str(&escape_html(&rejection.reason));
                append_title(&mut title, &rejection.reason);
            }
        }
        description.push_str(&close_block(config));
    }

    if config.show_comments && depth == Depth::Top {
        description.push_str(&comments_html(comments));
    }

    Rendered {
        title: collapse_text_breaks(&title),
        description: collapse_html_breaks(&description),
    }
}

fn activity_phrase(status: &Status, reshared: Option<&Status>, is_reshare: bool) -> (String, String) {
    if !is_reshare {
        let label = status.activity.as_deref().unwrap_or_default().trim();
        return (escape_html(label), label.to_string());
    }
    match classify(reshared) {
        Ok(()) => {
            let inner = AuthorView::of(reshared.and_then(|s| s.author.as_ref()));
            (
                format!(
                    "reshared {}'s post",
                    anchor(inner.url, &escape_html(inner.name))
                ),
                format!("reshared {}'s post", inner.name),
            )
        }
        Err(rejection) => (
            format!("reshared a post ({})", escape_html(&rejection.reason)),
            format!("reshared a post ({})", rejection.reason),
        ),
    }
}

fn author_html(author: &AuthorView<'_>, config: &RenderConfig) -> String {
    let mut inner = String::new();
    if config.show_author_avatar_in_desc {
        let size = config.size_of_author_avatar;
        inner.push_str(&format!(
            r#"<img width="{size}" height="{size}" src="{}"{} />"#,
            escape_html(author.avatar),
            if config.readable {
                r#" hspace="8" vspace="8" align="left""#
            } else {
                ""
            }
        ));
    }
    if config.author_name_bold {
        inner.push_str(&format!("<strong>{}</strong>", escape_html(author.name)));
    } else {
        inner.push_str(&escape_html(author.name));
    }
    anchor(author.url, &inner)
}

fn block_break(config: &RenderConfig) -> &'static str {
    if config.readable {
        CLEAR_BREAK
    } else {
        "<br>"
    }
}

fn open_block(config: &RenderConfig) -> String {
    if config.readable {
        format!("{}{}", CLEAR_BREAK, BLOCKQUOTE_OPEN)
    } else {
        "<br>".to_string()
    }
}

fn close_block(config: &RenderConfig) -> String {
    if config.readable {
        format!("{}</blockquote>", CLEAR_BREAK)
    } else {
        String::new()
    }
}

/// Appends an echo to the title, separated from earlier content by ` | `.
fn append_title(title: &mut String, echo: &str) {
    if echo.is_empty() {
        return;
    }
    let trimmed = title.trim_end();
    if trimmed.is_empty() || trimmed.ends_with(':') {
        title.push_str(echo);
    } else {
        title.push_str(" | ");
        title.push_str(echo);
    }
}

fn push_segment(
    description: &mut String,
    status_id: &str,
    segment: &str,
    result: Result<String, FeedError>,
) {
    match result {
        Ok(html) => description.push_str(&html),
        Err(e) => warn!(status_id, segment, error = %e, "skipping segment"),
    }
}

/// Replaces each entity span of `text` with a link, escaping everything else.
///
/// Entities are walked by ascending start. One with missing or non-ascending
/// offsets, an overlap with the previous span, or no uri/title is skipped.
pub fn substitute_entities(status_id: &str, text: &str, entities: &[Entity]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut ordered: Vec<&Entity> = entities.iter().collect();
    ordered.sort_by_key(|e| e.start.unwrap_or(usize::MAX));

    let mut out = String::with_capacity(text.len());
    let mut last_index = 0;
    for entity in ordered {
        match entity_span(entity, last_index, chars.len()) {
            Ok((start, end, uri, title)) => {
                out.push_str(&text_to_html(&char_slice(&chars, last_index, start)));
                out.push_str(&anchor(uri, &escape_html(title)));
                last_index = end;
            }
            Err(e) => warn!(status_id, error = %e, "skipping entity"),
        }
    }
    out.push_str(&text_to_html(&char_slice(&chars, last_index, chars.len())));
    out
}

fn entity_span(
    entity: &Entity,
    last_index: usize,
    len: usize,
) -> Result<(usize, usize, &str, &str), FeedError> {
    let (Some(start), Some(end)) = (entity.start, entity.end) else {
        return Err(FeedError::render("entity offsets missing or not integers"));
    };
    if start > end {
        return Err(FeedError::render(format!("entity end {end} before start {start}")));
    }
    if start < last_index {
        return Err(FeedError::render(format!(
            "entity at {start} overlaps previous span ending at {last_index}"
        )));
    }
    if end > len {
        return Err(FeedError::render(format!(
            "entity end {end} past text length {len}"
        )));
    }
    let uri = entity.uri.as_deref().filter(|u| !u.is_empty());
    let title = entity.title.as_deref().filter(|t| !t.is_empty());
    match (uri, title) {
        (Some(uri), Some(title)) => Ok((start, end, uri, title)),
        _ => Err(FeedError::render("entity without uri or title")),
    }
}

fn picture_html(url: &str, config: &RenderConfig) -> String {
    let mut attrs = String::new();
    let mut style = String::new();
    if config.readable {
        attrs.push_str(r#" vspace="8" hspace="4""#);
    }
    if let Some(width) = config.width_of_pics {
        attrs.push_str(&format!(r#" width="{width}""#));
        style.push_str(&format!("width: {width}px;"));
    }
    if let Some(height) = config.height_of_pics {
        attrs.push_str(&format!(r#" height="{height}""#));
        style.push_str(&format!("height: {height}px;"));
    }
    if !style.is_empty() {
        attrs.push_str(&format!(r#" style="{style}""#));
    }
    format!(r#"<img{attrs} src="{}">"#, escape_html(url))
}

fn images_html(images: &[Image], config: &RenderConfig, media: &mut MediaAccumulator) -> String {
    let urls: Vec<&str> = images.iter().filter_map(Image::best_url).collect();
    if urls.len() < images.len() {
        debug!(skipped = images.len() - urls.len(), "images without a usable url");
    }
    if urls.is_empty() {
        return String::new();
    }

    let mut html = block_break(config).to_string();
    for url in urls {
        media.push(url);
        let picture = picture_html(url, config);
        if config.add_link_for_pics {
            html.push_str(&anchor(url, &picture));
        } else {
            if !config.readable {
                html.push_str("<br>");
            }
            html.push_str(&picture);
        }
    }
    html
}

fn video_html(video: &VideoInfo) -> Result<String, FeedError> {
    let src = video.video_url.as_deref().filter(|s| !s.is_empty());
    let cover = video.cover_url.as_deref().filter(|s| !s.is_empty());
    match (src, cover) {
        (Some(src), Some(cover)) => Ok(format!(
            r#"<video src="{}" poster="{}" controls></video>"#,
            escape_html(src),
            escape_html(cover)
        )),
        (Some(src), None) => Ok(format!(
            r#"<video src="{}" controls></video>"#,
            escape_html(src)
        )),
        (None, Some(cover)) => Ok(format!(r#"<img src="{}">"#, escape_html(cover))),
        (None, None) => Err(FeedError::render("video without source or cover")),
    }
}

fn card_html(card: &Card, config: &RenderConfig) -> Result<String, FeedError> {
    let title = card.title.as_deref().filter(|t| !t.is_empty());
    let url = card.url.as_deref().filter(|u| !u.is_empty());
    if title.is_none() && url.is_none() {
        return Err(FeedError::render("card without title or url"));
    }

    let mut html = open_block(config);
    if let Some(image) = card.image.as_ref().and_then(Image::best_url) {
        html.push_str(&format!(
            r#"<img src="{}"{} />"#,
            escape_html(image),
            if config.readable {
                r#" vspace="0" hspace="12" align="left" height="75" style="height: 75px;""#
            } else {
                ""
            }
        ));
    }

    let mut inner = format!("<strong>{}</strong>", escape_html(title.unwrap_or_default()));
    if let Some(subtitle) = card.subtitle.as_deref().filter(|s| !s.is_empty()) {
        inner.push_str(&format!("<br><small>{}</small>", escape_html(subtitle)));
    }
    if let Some(rating) = card.rating {
        inner.push_str(&format!("<br><small>Rating: {}</small>", rating));
    }
    match url {
        Some(url) => html.push_str(&anchor(url, &inner)),
        None => html.push_str(&inner),
    }
    html.push_str(&close_block(config));
    Ok(html)
}

fn video_card_html(card: &VideoCard, config: &RenderConfig) -> Result<String, FeedError> {
    let title = card.title.as_deref().filter(|t| !t.is_empty());
    let url = card.url.as_deref().filter(|u| !u.is_empty());
    let media = card.video_info.as_ref().map(video_html).transpose();
    let media = match media {
        Ok(media) => media,
        Err(e) => {
            debug!(error = %e, "video card without playable media");
            None
        }
    };
    if title.is_none() && url.is_none() && media.is_none() {
        return Err(FeedError::render("empty video card"));
    }

    let mut html = open_block(config);
    if let Some(media) = media {
        html.push_str(&media);
        html.push_str("<br>");
    }
    let label = escape_html(title.or(url).unwrap_or_default());
    match url {
        Some(url) => html.push_str(&anchor(url, &label)),
        None => html.push_str(&label),
    }
    html.push_str(&close_block(config));
    Ok(html)
}

fn comments_html(comments: &[Comment]) -> String {
    let entries: Vec<String> = comments
        .iter()
        .filter_map(|comment| {
            let text = comment.text.as_deref().filter(|t| !t.trim().is_empty())?;
            let author = comment.author.as_ref()?;
            let name = author.name.as_deref().filter(|n| !n.is_empty())?;
            let who = match author.url.as_deref().filter(|u| !u.is_empty()) {
                Some(url) => anchor(url, &escape_html(name)),
                None => escape_html(name),
            };
            Some(format!("<li>{} — {}</li>", text_to_html(text), who))
        })
        .collect();

    if entries.is_empty() {
        return String::new();
    }
    format!("<br><strong>Comments</strong><ul>{}</ul>", entries.concat())
}
