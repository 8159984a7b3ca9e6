//! URL slug generation for tags and posts.
//!
//! WordPress identifies terms and posts by slug, so every album title and
//! every photo title is run through [`slugify`] before it lands in the WXR
//! document. The rules are intentionally narrow:
//!
//! - `"Happy Baby in Danang 2017"` → `"happy-baby-in-danang-2017"`
//! - `"#livingDanang 2016"` → `"livingdanang-2016"`
//! - `"Job is both fun and colorful!"` → `"job-is-both-fun-and-colorful"`
//! - `"Sài Thành - Quận nhất"` → `"si-thnh-qun-nht"`
//!
//! ## ASCII only
//!
//! Characters outside `[a-z0-9]` are dropped, not transliterated. Accented
//! and non-Latin letters simply disappear from the slug. Existing WordPress
//! sites imported from earlier exports carry these exact slugs, so changing
//! the rule would break their permalinks.
//!
//! ## Invisible characters
//!
//! Flickr titles occasionally carry zero-width spaces, byte order marks or
//! bidi controls pasted in from other apps. [`strip_invisible`] removes them
//! from display text (post titles, tag names) so two titles that look equal
//! also compare equal.

/// Convert free text into a WordPress slug.
///
/// Lower-cases ASCII, drops everything except ASCII letters, digits, ASCII
/// whitespace and hyphens, collapses whitespace/hyphen runs into a single
/// `-`, and trims hyphens from both ends. The result is empty or matches
/// `^[a-z0-9]+(-[a-z0-9]+)*$`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().map(|c| c.to_ascii_lowercase()) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_ascii_whitespace() || c == '\x0B' || c == '-' {
            pending_dash = true;
        }
        // Anything else is dropped without breaking the current word.
    }

    slug
}

/// Whether `c` renders as nothing: zero-width, bidi formatting, BOM, or a
/// control character.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
    ) || c.is_control()
}

/// Remove invisible characters and trim surrounding whitespace.
pub fn strip_invisible(text: &str) -> String {
    text.chars()
        .filter(|c| !is_invisible(*c))
        .collect::<String>()
        .trim()
        .to_string()
}
