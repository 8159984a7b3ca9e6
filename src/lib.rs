//! # flickr-wxr
//!
//! Converts a Flickr account export into a WordPress eXtended RSS (WXR 1.2)
//! file that WordPress's built-in importer understands. Every photo becomes
//! a private post with its original attached as a media item; albums become
//! tags; one category marks everything as imported from Flickr.
//!
//! # Pipeline
//!
//! ```text
//! 1. Load     export dir  →  albums + photos     (JSON records, bad ones reported)
//! 2. Map      records     →  Mapping             (IDs, tags, posts, attachments)
//! 3. Build    Mapping     →  wxr::Document       (channel + ordered items)
//! 4. Render   Document    →  XML                 (quick-xml, written atomically)
//! ```
//!
//! Each stage is a plain function over in-memory values. Only loading and the
//! final write touch the filesystem, so everything in between is tested
//! without fixtures.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`load`] | Reads `albums.json` and `photo_*.json`, collecting per-record failures |
//! | [`types`] | Serde shapes of the export records (`Album`, `Photo`) |
//! | [`slug`] | WordPress-style slugs and invisible-character stripping |
//! | [`dates`] | `date_taken` → local, GMT and RFC 2822 forms |
//! | [`exif`] | EXIF fields → attachment description text |
//! | [`content`] | Post titles, slugs and Gutenberg block bodies |
//! | [`mapping`] | ID assignment, tags, post ↔ attachment linkage |
//! | [`wxr`] | WXR document model and XML rendering |
//! | [`convert`] | Orchestrates the pipeline and writes the output |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`output`] | CLI summary formatting |
//!
//! # Design Decisions
//!
//! ## IDs Are Assigned Once, In Order
//!
//! Post and attachment IDs come from a single [`mapping::IdSequence`] passed
//! in by the caller and walked in photo file order, so the same export
//! always produces the same document. Tags and the category use their own
//! term ID space.
//!
//! ## Indices, Not References
//!
//! An attachment stores the index of its post and a post stores the indices
//! of its tags. The object graph has no cycles and no shared ownership.
//!
//! ## Imports Stay Private
//!
//! Posts are written with status `private`. Nothing goes live on the target
//! site until someone reviews it there.

pub mod config;
pub mod content;
pub mod convert;
pub mod dates;
pub mod exif;
pub mod load;
pub mod mapping;
pub mod output;
pub mod slug;
pub mod types;
pub mod wxr;

#[cfg(test)]
pub(crate) mod test_helpers;
