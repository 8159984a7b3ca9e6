//! Shared test utilities for the flickr-wxr test suite.
//!
//! Provides record builders for in-memory tests, a fixture copier for
//! filesystem tests, and lookups over rendered WXR text.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let report = load::load_export(tmp.path()).unwrap();
//! assert_eq!(report.photos.len(), 8);
//!
//! let p = photo_in("123", &["72157"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::config::ExportConfig;
use crate::mapping::MappingOptions;
use crate::types::{Album, Exif, Photo};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/export/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/export");
    for entry in std::fs::read_dir(&fixtures).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(entry.path(), tmp.path().join(entry.file_name())).unwrap();
    }
    tmp
}

// =========================================================================
// Record builders
// =========================================================================

/// A complete photo record dated 2015-06-08 05:46:43 with an original URL,
/// no description, no EXIF and no albums.
pub fn photo(id: &str, name: Option<&str>) -> Photo {
    Photo {
        id: id.to_string(),
        name: name.map(String::from),
        description: None,
        date_taken: "2015-06-08 05:46:43".to_string(),
        date_imported: None,
        original: Some(format!("https://live.staticflickr.com/{id}/{id}_o.jpg")),
        photopage: format!("https://www.flickr.com/photos/x/{id}/"),
        exif: Exif::new(),
        albums: Vec::new(),
    }
}

/// A named photo that belongs to the given albums.
pub fn photo_in(id: &str, albums: &[&str]) -> Photo {
    let mut p = photo(id, Some(&format!("Photo {id}")));
    p.albums = albums.iter().map(|a| a.to_string()).collect();
    p
}

pub fn album(id: &str, title: &str) -> Album {
    Album {
        id: id.to_string(),
        title: title.to_string(),
        photo_count: None,
    }
}

/// Mapping options from the stock config.
pub fn mapping_options() -> MappingOptions {
    let config = ExportConfig::default();
    MappingOptions {
        utc_offset: config.posts.offset(),
        category_name: config.category.name,
        category_slug: config.category.slug,
    }
}

// =========================================================================
// Rendered WXR lookups
// =========================================================================

/// Split rendered WXR into its `<item>` blocks.
pub fn items(xml: &str) -> Vec<&str> {
    xml.split("<item>")
        .skip(1)
        .map(|chunk| chunk.split("</item>").next().unwrap_or(chunk))
        .collect()
}

/// Items whose `wp:post_type` is `post_type`.
pub fn items_of_type<'a>(xml: &'a str, post_type: &str) -> Vec<&'a str> {
    let needle = format!("<wp:post_type><![CDATA[{post_type}]]></wp:post_type>");
    items(xml)
        .into_iter()
        .filter(|item| item.contains(&needle))
        .collect()
}

/// Text of the first `<tag>…</tag>` in `xml`. Panics if absent.
pub fn element_text<'a>(xml: &'a str, tag: &str) -> &'a str {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml
        .find(&open)
        .unwrap_or_else(|| panic!("<{tag}> not found in:\n{xml}"))
        + open.len();
    let end = xml[start..]
        .find(&close)
        .unwrap_or_else(|| panic!("</{tag}> not found"))
        + start;
    &xml[start..end]
}
