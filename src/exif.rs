//! EXIF → attachment description text.
//!
//! WordPress shows an attachment's `description` in the media library, so
//! the camera data Flickr kept for each photo is preserved there as a
//! bulleted list under a fixed marker line:
//!
//! ```text
//! flickr_exif_data:
//! • Make: Canon
//! • Model: Canon EOS 60D
//! • ISO: 200
//! ```
//!
//! Keys and values are written as-is, in source order.

use crate::types::Exif;

pub const EXIF_MARKER: &str = "flickr_exif_data:";

/// Render EXIF fields as description text. Empty input gives an empty
/// string; callers must then omit the description element entirely.
pub fn render(exif: &Exif) -> String {
    if exif.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(exif.len() + 1);
    lines.push(EXIF_MARKER.to_string());
    lines.extend(exif.iter().map(|(key, value)| format!("• {key}: {value}")));
    lines.join("\n")
}
