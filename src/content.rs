//! Post body assembly in Gutenberg block markup.
//!
//! Every post body is a sequence of self-contained blocks, each wrapped in
//! its `<!-- wp:… -->` / `<!-- /wp:… -->` comment pair and separated by a
//! blank line, which is what the block editor itself writes:
//!
//! ```text
//! <!-- wp:image {"id":2,"linkDestination":"none","sizeSlug":"large"} -->
//! <figure class="wp-block-image size-large"><img src="…" alt="…" class="wp-image-2"></figure>
//! <!-- /wp:image -->
//!
//! <!-- wp:paragraph -->
//! <p>Description, if any</p>
//! <!-- /wp:paragraph -->
//!
//! <!-- wp:paragraph -->
//! <p>Taken on 2015-06-08 05:46:43</p>
//! <!-- /wp:paragraph -->
//!
//! <!-- wp:paragraph -->
//! <p>Originally from: https://www.flickr.com/photos/…</p>
//! <!-- /wp:paragraph -->
//! ```
//!
//! The image block points at the Flickr original. WordPress's importer
//! rewrites that URL to the sideloaded copy once the attachment lands.
//! Photos without an original get no image block.
//!
//! Inner HTML is rendered with maud, so titles and descriptions are escaped.

use crate::slug::{slugify, strip_invisible};
use crate::types::Photo;
use maud::{Markup, html};

/// Post title: the photo's name, or a date-based fallback when it is blank.
pub fn title_for(photo: &Photo) -> String {
    let name = photo.name.as_deref().map(strip_invisible).unwrap_or_default();
    if !name.is_empty() {
        return name;
    }
    if photo.date_taken.trim().is_empty() {
        format!("Flickr photo {}", photo.id)
    } else {
        format!("Photo taken at {}", photo.date_taken.trim())
    }
}

/// Post slug derived from the title.
///
/// A photo with a blank name gets `photo-taken-at-{date}` with every
/// non-alphanumeric character of the date turned into a hyphen, so the
/// time keeps its separators. A named photo whose title has no ASCII
/// letters or digits left after slugifying falls back the same way.
pub fn slug_for(photo: &Photo, title: &str) -> String {
    if !has_name(photo) {
        return fallback_slug(photo);
    }
    match slugify(title) {
        s if s.is_empty() => fallback_slug(photo),
        s => s,
    }
}

fn has_name(photo: &Photo) -> bool {
    photo
        .name
        .as_deref()
        .map(|n| !strip_invisible(n).is_empty())
        .unwrap_or(false)
}

fn fallback_slug(photo: &Photo) -> String {
    let date = photo.date_taken.trim();
    if date.is_empty() {
        return slugify(&format!("flickr-photo-{}", photo.id));
    }
    let dashed: String = date
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    slugify(&format!("photo-taken-at-{dashed}"))
}

/// Wrap inner HTML in a block comment pair.
fn block(name: &str, attrs: Option<&serde_json::Value>, inner: Markup) -> String {
    let open = match attrs {
        Some(attrs) => format!("<!-- wp:{name} {attrs} -->"),
        None => format!("<!-- wp:{name} -->"),
    };
    format!("{open}\n{}\n<!-- /wp:{name} -->", inner.into_string())
}

fn image_block(url: &str, alt: &str, attachment_id: Option<u64>) -> String {
    let mut attrs = serde_json::json!({
        "sizeSlug": "large",
        "linkDestination": "none",
    });
    if let Some(id) = attachment_id {
        attrs["id"] = id.into();
    }
    let class = attachment_id.map(|id| format!("wp-image-{id}"));
    let inner = html! {
        figure class="wp-block-image size-large" {
            img src=(url) alt=(alt) class=[class];
        }
    };
    block("image", Some(&attrs), inner)
}

fn paragraph_block(text: &str) -> String {
    let inner = html! {
        p {
            @for (i, line) in text.lines().enumerate() {
                @if i > 0 { br; }
                (line)
            }
        }
    };
    block("paragraph", None, inner)
}

/// Assemble the post body for a photo.
///
/// `attachment_id` is the ID of the photo's attachment item, when it has
/// one, so the image block is linked to the media library entry. `taken_on`
/// is the capture timestamp; `None` when `date_taken` did not parse, in
/// which case the "Taken on" paragraph is left out.
pub fn assemble(
    photo: &Photo,
    title: &str,
    attachment_id: Option<u64>,
    taken_on: Option<&str>,
) -> String {
    let mut blocks = Vec::with_capacity(4);

    if let Some(url) = photo.original_url() {
        blocks.push(image_block(url, title, attachment_id));
    }
    if let Some(description) = photo.description_text() {
        blocks.push(paragraph_block(description));
    }
    if let Some(taken) = taken_on {
        blocks.push(paragraph_block(&format!("Taken on {taken}")));
    }
    blocks.push(paragraph_block(&format!(
        "Originally from: {}",
        photo.photopage
    )));

    blocks.join("\n\n")
}
