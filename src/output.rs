//! CLI output formatting for conversion results.
//!
//! # Format
//!
//! ```text
//! Source: flickr-data
//! Photos: 8 read → 8 posts, 8 attachments
//! Category: From Flickr
//!
//! Tags
//! 001 #aBitHiddenIsland (2 posts)
//!     Slug: abithiddenisland
//! 002 #livingDanang 2016 (3 posts)
//!     Slug: livingdanang-2016
//!
//! Skipped
//!     photo_123.json: malformed JSON in …
//!     photo 456: unparseable timestamp: "bogus"
//!
//! Notes
//!     1 photo without an original (post only, no attachment)
//!     Unknown album IDs: 72157000000000000
//!
//! Item IDs: 1–16
//! ```
//!
//! Sections with nothing to report are left out.
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::convert::Summary;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 photo`, `2 photos`.
fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Format what a conversion read and produced.
pub fn format_summary(summary: &Summary) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!("Source: {}", summary.source.display()));
    lines.push(format!(
        "Photos: {} read → {}, {}",
        summary.photos_read,
        plural(summary.posts, "post"),
        plural(summary.attachments, "attachment"),
    ));
    lines.push(format!("Category: {}", summary.category));

    if !summary.tags.is_empty() {
        lines.push(String::new());
        lines.push("Tags".to_string());
        for (i, tag) in summary.tags.iter().enumerate() {
            lines.push(format!(
                "{} {} ({})",
                format_index(i + 1),
                tag.name,
                plural(tag.posts, "post")
            ));
            lines.push(format!("{}Slug: {}", indent(1), tag.slug));
        }
    }

    if !summary.skipped_records.is_empty() || !summary.skipped_photos.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for (path, reason) in &summary.skipped_records {
            lines.push(format!("{}{}: {}", indent(1), file_name(path), reason));
        }
        for (id, reason) in &summary.skipped_photos {
            lines.push(format!("{}photo {}: {}", indent(1), id, reason));
        }
    }

    let mut notes = Vec::new();
    if summary.albums_missing {
        notes.push("albums.json missing or unreadable; no tags created".to_string());
    }
    if summary.missing_originals > 0 {
        notes.push(format!(
            "{} without an original (post only, no attachment)",
            plural(summary.missing_originals, "photo")
        ));
    }
    if summary.date_fallbacks > 0 {
        notes.push(format!(
            "{} dated from date_imported",
            plural(summary.date_fallbacks, "photo")
        ));
    }
    if !summary.unknown_albums.is_empty() {
        notes.push(format!(
            "Unknown album IDs: {}",
            summary.unknown_albums.join(", ")
        ));
    }
    if !notes.is_empty() {
        lines.push(String::new());
        lines.push("Notes".to_string());
        lines.extend(notes.into_iter().map(|n| format!("{}{}", indent(1), n)));
    }

    if let Some((first, last)) = summary.id_range {
        lines.push(String::new());
        lines.push(format!("Item IDs: {first}–{last}"));
    }

    lines
}

/// Format the result of `convert`: the summary plus where it went.
pub fn format_convert_output(summary: &Summary, output: &Path) -> Vec<String> {
    let mut lines = format_summary(summary);
    lines.push(format!("Wrote → {}", output.display()));
    lines
}

/// Print convert output to stdout.
pub fn print_convert_output(summary: &Summary, output: &Path) {
    for line in format_convert_output(summary, output) {
        println!("{}", line);
    }
}

/// Print check output to stdout.
pub fn print_check_output(summary: &Summary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}
