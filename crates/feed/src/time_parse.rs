// ABOUTME: Time parsing for upstream status timestamps and RSS date formatting.
// ABOUTME: Zone-less timestamps are interpreted at a fixed UTC offset.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Parses an upstream `create_time`. Timestamps without a zone are taken to be at
/// `utc_offset_hours`. Returns None if no format matches.
pub fn parse_upstream_time(s: &str, utc_offset_hours: i32) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // Explicit offsets win over the assumed one
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }

    let offset = FixedOffset::east_opt(utc_offset_hours.checked_mul(3600)?)?;

    let formats_naive = [
        // "2024-01-02 15:04:05"
        "%Y-%m-%d %H:%M:%S",
        // "2024-01-02 15:04"
        "%Y-%m-%d %H:%M",
        // "2024-01-02T15:04:05"
        "%Y-%m-%dT%H:%M:%S",
    ];

    for fmt in &formats_naive {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }

    None
}

/// Formats a UTC datetime the way RSS readers expect `pubDate`.
pub fn format_pub_date(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Formats a UTC datetime back into the upstream's zone-less layout.
pub fn format_upstream_time(dt: &DateTime<Utc>, utc_offset_hours: i32) -> String {
    match FixedOffset::east_opt(utc_offset_hours.saturating_mul(3600)) {
        Some(offset) => dt.with_timezone(&offset).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}
