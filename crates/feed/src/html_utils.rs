// ABOUTME: Markup utility functions for rendering status content.
// ABOUTME: Provides escaping, anchors, codepoint clipping, and line-break collapsing.

use once_cell::sync::Lazy;
use regex::Regex;

static BR_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(?:<br\s*/?>\s*){3,}").unwrap());
static NEWLINE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\r?\n[ \t]*){3,}").unwrap());

/// Escapes the characters that are significant in HTML text and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes plain text for HTML and turns newlines into `<br>`.
pub fn text_to_html(s: &str) -> String {
    escape_html(s).replace("\r\n", "\n").replace('\n', "<br>")
}

/// An anchor opening in a new tab. `inner_html` is inserted as-is.
pub fn anchor(href: &str, inner_html: &str) -> String {
    format!(
        r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
        escape_html(href),
        inner_html
    )
}

/// First `max` codepoints of `s`.
pub fn clip_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Codepoint slice `[start, end)` of `chars`, clamped to its bounds.
pub fn char_slice(chars: &[char], start: usize, end: usize) -> String {
    let end = end.min(chars.len());
    let start = start.min(end);
    chars[start..end].iter().collect()
}

/// Collapses runs of three or more `<br>` to two and trims surrounding whitespace.
pub fn collapse_html_breaks(s: &str) -> String {
    BR_RUN_RE.replace_all(s, "<br><br>").trim().to_string()
}

/// Collapses runs of three or more newlines to two and trims surrounding whitespace.
pub fn collapse_text_breaks(s: &str) -> String {
    NEWLINE_RUN_RE.replace_all(s, "\n\n").trim().to_string()
}
