//! Timestamp normalization for WXR items.
//!
//! Flickr exports record `date_taken` as `YYYY-MM-DD HH:MM:SS` with no zone.
//! The value is the camera's wall-clock time, which we treat as local time
//! in the export's configured UTC offset (`posts.utc_offset`, default
//! `+00:00`). Each post needs that instant three ways:
//!
//! | Field | WXR element | Example |
//! |-------|-------------|---------|
//! | `local` | `wp:post_date` | `2015-06-08 05:46:43` |
//! | `gmt` | `wp:post_date_gmt` | `2015-06-07 22:46:43` (at `+07:00`) |
//! | `rfc2822` | `pubDate` | `Mon, 08 Jun 2015 05:46:43 +0700` |
//!
//! Unparseable input is an error. Nothing here falls back to the current
//! time; callers pick their own policy.

use chrono::{FixedOffset, NaiveDateTime};
use thiserror::Error;

const WP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const RFC2822_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

#[derive(Error, Debug, Clone, PartialEq)]
#[error("unparseable timestamp {input:?} (expected YYYY-MM-DD HH:MM:SS)")]
pub struct DateParseError {
    pub input: String,
}

/// One instant in the three textual forms WordPress wants.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDate {
    pub local: String,
    pub gmt: String,
    pub rfc2822: String,
}

/// Normalize a `YYYY-MM-DD HH:MM:SS` local timestamp.
pub fn normalize(timestamp: &str, offset: FixedOffset) -> Result<NormalizedDate, DateParseError> {
    let err = || DateParseError {
        input: timestamp.to_string(),
    };
    let naive = NaiveDateTime::parse_from_str(timestamp.trim(), WP_FORMAT).map_err(|_| err())?;
    let local = naive.and_local_timezone(offset).single().ok_or_else(err)?;

    Ok(NormalizedDate {
        local: local.format(WP_FORMAT).to_string(),
        gmt: local.naive_utc().format(WP_FORMAT).to_string(),
        rfc2822: local.format(RFC2822_FORMAT).to_string(),
    })
}

/// Parse a `+HH:MM` / `-HH:MM` offset (also accepts `Z` and `UTC`).
pub fn parse_utc_offset(text: &str) -> Option<FixedOffset> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("z") || text.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
