//! Relationship mapping: photos and albums → posts, attachments and terms.
//!
//! This is where the WXR object graph gets its shape:
//!
//! ```text
//! Album ──referenced by ≥1 photo──▶ Tag
//! Photo ──────────────────────────▶ Post ◀── parent ── Attachment (if original URL)
//!                                     │
//!                                     ├── Tag*  (album memberships)
//!                                     └── Category "From Flickr"
//! ```
//!
//! ## IDs
//!
//! Posts and attachments share one flat ID space in WXR. An attachment's
//! `wp:post_parent` must point at its post's `wp:post_id`, and any collision
//! corrupts that linkage on import. IDs come from an [`IdSequence`] owned by
//! the caller and passed in explicitly. Photos are visited in input order:
//! each post takes the next ID and its attachment (if any) the one after.
//!
//! ## Linkage
//!
//! Nothing here holds references between entities. An [`Attachment`] stores
//! the index of its [`Post`], a post stores the index of its attachment and
//! of its tags. The whole graph is plain data.
//!
//! ## Degraded records
//!
//! - Photo without `original`: still becomes a post, but gets no
//!   attachment. Counted in [`Mapping::missing_originals`].
//! - Unparseable `date_taken`: `date_imported` is tried next. If neither
//!   parses, the photo is skipped and reported in [`Mapping::skipped`].
//! - Album ID not present in `albums.json`: ignored, listed in
//!   [`Mapping::unknown_albums`].
//!
//! ## Parallelism
//!
//! Date normalization, EXIF rendering and content assembly are pure per
//! photo and run on rayon with order-preserving `collect`. ID assignment
//! stays sequential, so output does not depend on scheduling.

use crate::content;
use crate::dates::{self, DateParseError, NormalizedDate};
use crate::exif;
use crate::slug::{slugify, strip_invisible};
use crate::types::{Album, Photo};
use chrono::FixedOffset;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Monotonic ID counter for one conversion run.
#[derive(Debug, Clone)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    pub fn new(first: u64) -> Self {
        Self { next: first }
    }

    /// Take the next ID.
    pub fn allocate(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The ID the next call to [`allocate`](Self::allocate) will return.
    pub fn peek(&self) -> u64 {
        self.next
    }
}

/// Knobs the mapper needs from the export config.
#[derive(Debug, Clone)]
pub struct MappingOptions {
    pub utc_offset: FixedOffset,
    pub category_name: String,
    pub category_slug: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub term_id: u64,
    pub name: String,
    pub slug: String,
}

/// An album that at least one photo belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub term_id: u64,
    pub album_id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: u64,
    pub photo_id: String,
    pub title: String,
    pub slug: String,
    pub dates: NormalizedDate,
    /// Gutenberg block markup.
    pub content: String,
    pub photopage: String,
    /// Indices into [`Mapping::tags`], in album membership order.
    pub tags: Vec<usize>,
    /// Index into [`Mapping::attachments`].
    pub attachment: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub id: u64,
    /// Index into [`Mapping::posts`].
    pub post: usize,
    pub url: String,
    pub title: String,
    pub slug: String,
    pub dates: NormalizedDate,
    /// EXIF rendering; empty means no description element.
    pub description: String,
}

/// A photo that could not become a post.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPhoto {
    pub photo_id: String,
    pub error: DateParseError,
}

/// The resolved object graph for one export.
#[derive(Debug, Clone)]
pub struct Mapping {
    pub category: Category,
    pub tags: Vec<Tag>,
    pub posts: Vec<Post>,
    pub attachments: Vec<Attachment>,
    pub skipped: Vec<SkippedPhoto>,
    /// Posts created without an attachment.
    pub missing_originals: usize,
    /// Posts dated from `date_imported` because `date_taken` did not parse.
    pub date_fallbacks: usize,
    /// Album IDs referenced by photos but absent from `albums.json`.
    pub unknown_albums: Vec<String>,
}

impl Mapping {
    pub fn post_for(&self, attachment: &Attachment) -> &Post {
        &self.posts[attachment.post]
    }

    pub fn attachment_for(&self, post: &Post) -> Option<&Attachment> {
        post.attachment.map(|i| &self.attachments[i])
    }
}

/// Per-photo work that needs no IDs.
struct Prepared<'a> {
    photo: &'a Photo,
    title: String,
    slug: String,
    dates: NormalizedDate,
    date_fallback: bool,
    exif_text: String,
}

/// Resolve a photo's dates: `date_taken` first, then `date_imported`.
fn resolve_dates(
    photo: &Photo,
    offset: FixedOffset,
) -> Result<(NormalizedDate, bool), DateParseError> {
    match dates::normalize(&photo.date_taken, offset) {
        Ok(d) => Ok((d, false)),
        Err(err) => match photo.date_imported.as_deref() {
            Some(imported) => dates::normalize(imported, offset)
                .map(|d| (d, true))
                .map_err(|_| err),
            None => Err(err),
        },
    }
}

fn prepare(photo: &Photo, offset: FixedOffset) -> Result<Prepared<'_>, SkippedPhoto> {
    let (dates, date_fallback) = resolve_dates(photo, offset).map_err(|error| SkippedPhoto {
        photo_id: photo.id.clone(),
        error,
    })?;
    let title = content::title_for(photo);
    let slug = content::slug_for(photo, &title);
    Ok(Prepared {
        photo,
        title,
        slug,
        dates,
        date_fallback,
        exif_text: exif::render(&photo.exif),
    })
}

/// Build tags for the referenced albums, in `albums` order. Returns the tags and an album ID → tag index lookup.
fn build_tags(
    albums: &[Album],
    referenced: &HashSet<&str>,
    term_ids: &mut IdSequence,
) -> (Vec<Tag>, HashMap<String, usize>) {
    let mut tags = Vec::new();
    let mut index = HashMap::new();
    let mut used_slugs = HashSet::new();

    for album in albums {
        if !referenced.contains(album.id.as_str()) || index.contains_key(&album.id) {
            continue;
        }
        let name = strip_invisible(&album.title);
        let base = match slugify(&name) {
            s if s.is_empty() => slugify(&format!("album-{}", album.id)),
            s => s,
        };
        let mut slug = base.clone();
        let mut n = 2;
        while !used_slugs.insert(slug.clone()) {
            slug = format!("{base}-{n}");
            n += 1;
        }

        index.insert(album.id.clone(), tags.len());
        tags.push(Tag {
            term_id: term_ids.allocate(),
            album_id: album.id.clone(),
            name,
            slug,
        });
    }

    (tags, index)
}

/// Map an export into posts, attachments, tags and the category.
pub fn map_export(
    albums: &[Album],
    photos: &[Photo],
    options: &MappingOptions,
    ids: &mut IdSequence,
) -> Mapping {
    let prepared: Vec<Result<Prepared<'_>, SkippedPhoto>> = photos
        .par_iter()
        .map(|photo| prepare(photo, options.utc_offset))
        .collect();

    let mut kept = Vec::with_capacity(prepared.len());
    let mut skipped = Vec::new();
    for result in prepared {
        match result {
            Ok(p) => kept.push(p),
            Err(skip) => {
                tracing::warn!(photo = %skip.photo_id, error = %skip.error, "skipping photo");
                skipped.push(skip);
            }
        }
    }

    // Terms have their own small ID space; the category comes first.
    let mut term_ids = IdSequence::new(1);
    let category = Category {
        term_id: term_ids.allocate(),
        name: options.category_name.clone(),
        slug: options.category_slug.clone(),
    };

    let referenced: HashSet<&str> = kept
        .iter()
        .flat_map(|p| p.photo.albums.iter().map(String::as_str))
        .collect();
    let (tags, tag_index) = build_tags(albums, &referenced, &mut term_ids);

    let mut unknown_albums: Vec<String> = referenced
        .iter()
        .filter(|id| !tag_index.contains_key(**id))
        .map(|id| id.to_string())
        .collect();
    unknown_albums.sort();
    for id in &unknown_albums {
        tracing::warn!(album = %id, "photo references an album missing from albums.json");
    }

    // Sequential ID assignment, in input order.
    let mut posts = Vec::with_capacity(kept.len());
    let mut attachments = Vec::new();
    let mut missing_originals = 0;
    let mut date_fallbacks = 0;

    for p in &kept {
        let post_index = posts.len();
        let post_id = ids.allocate();

        let attachment = match p.photo.original_url() {
            Some(url) => {
                attachments.push(Attachment {
                    id: ids.allocate(),
                    post: post_index,
                    url: url.to_string(),
                    title: p.title.clone(),
                    slug: format!("{}-image", p.slug),
                    dates: p.dates.clone(),
                    description: p.exif_text.clone(),
                });
                Some(attachments.len() - 1)
            }
            None => {
                tracing::debug!(photo = %p.photo.id, "no original URL; post without attachment");
                missing_originals += 1;
                None
            }
        };

        if p.date_fallback {
            tracing::debug!(photo = %p.photo.id, "dated from date_imported");
            date_fallbacks += 1;
        }

        let mut post_tags = Vec::new();
        for album_id in &p.photo.albums {
            if let Some(&t) = tag_index.get(album_id) {
                if !post_tags.contains(&t) {
                    post_tags.push(t);
                }
            }
        }

        posts.push(Post {
            id: post_id,
            photo_id: p.photo.id.clone(),
            title: p.title.clone(),
            slug: p.slug.clone(),
            dates: p.dates.clone(),
            content: String::new(),
            photopage: p.photo.photopage.clone(),
            tags: post_tags,
            attachment,
        });
    }

    // Content needs the attachment ID, so it is assembled after numbering.
    let contents: Vec<String> = kept
        .par_iter()
        .zip(posts.par_iter())
        .map(|(p, post)| {
            let attachment_id = post.attachment.map(|i| attachments[i].id);
            let taken_on = (!p.date_fallback).then(|| p.photo.date_taken.trim());
            content::assemble(p.photo, &p.title, attachment_id, taken_on)
        })
        .collect();
    for (post, body) in posts.iter_mut().zip(contents) {
        post.content = body;
    }

    Mapping {
        category,
        tags,
        posts,
        attachments,
        skipped,
        missing_originals,
        date_fallbacks,
        unknown_albums,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{album, mapping_options, photo, photo_in};

    fn map(albums: &[Album], photos: &[Photo]) -> Mapping {
        map_export(albums, photos, &mapping_options(), &mut IdSequence::new(1))
    }

    #[test]
    fn id_sequence_is_monotonic() {
        let mut ids = IdSequence::new(10);
        assert_eq!(ids.allocate(), 10);
        assert_eq!(ids.allocate(), 11);
        assert_eq!(ids.peek(), 12);
    }

    #[test]
    fn post_and_attachment_ids_interleave_without_collision() {
        let photos = vec![photo("a", Some("A")), photo("b", Some("B")), photo("c", Some("C"))];
        let m = map(&[], &photos);

        let post_ids: Vec<u64> = m.posts.iter().map(|p| p.id).collect();
        let att_ids: Vec<u64> = m.attachments.iter().map(|a| a.id).collect();
        assert_eq!(post_ids, [1, 3, 5]);
        assert_eq!(att_ids, [2, 4, 6]);
        for a in &m.attachments {
            assert_eq!(m.post_for(a).attachment.map(|i| m.attachments[i].id), Some(a.id));
        }
    }

    #[test]
    fn ids_continue_from_caller_sequence() {
        let mut ids = IdSequence::new(500);
        let m = map_export(&[], &[photo("a", Some("A"))], &mapping_options(), &mut ids);
        assert_eq!(m.posts[0].id, 500);
        assert_eq!(m.attachments[0].id, 501);
        assert_eq!(ids.peek(), 502);
    }

    #[test]
    fn photo_without_original_gets_post_but_no_attachment() {
        let mut bare = photo("b", Some("No asset"));
        bare.original = None;
        let photos = vec![photo("a", Some("A")), bare, photo("c", Some("C"))];
        let m = map(&[], &photos);

        assert_eq!(m.posts.len(), 3);
        assert_eq!(m.attachments.len(), 2);
        assert_eq!(m.missing_originals, 1);
        assert!(m.posts[1].attachment.is_none());
        assert!(!m.posts[1].content.contains("wp:image"));
        // Numbering stays contiguous around the gap
        let ids: Vec<u64> = m.posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, [1, 3, 4]);
        assert_eq!(m.attachments[1].id, 5);
        assert_eq!(m.post_for(&m.attachments[1]).photo_id, "c");
    }

    #[test]
    fn only_referenced_albums_become_tags() {
        let albums = vec![
            album("1", "#aBitHiddenIsland"),
            album("2", "Never used"),
            album("3", "#livingDanang 2016"),
        ];
        let photos = vec![photo_in("a", &["3"]), photo_in("b", &["1", "3"])];
        let m = map(&albums, &photos);

        let names: Vec<&str> = m.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["#aBitHiddenIsland", "#livingDanang 2016"]);
        let slugs: Vec<&str> = m.tags.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, ["abithiddenisland", "livingdanang-2016"]);
    }

    #[test]
    fn posts_link_their_albums_in_membership_order() {
        let albums = vec![album("1", "One"), album("2", "Two")];
        let photos = vec![photo_in("a", &["2", "1", "2"]), photo_in("b", &[])];
        let m = map(&albums, &photos);

        let tag_names: Vec<&str> = m.posts[0]
            .tags
            .iter()
            .map(|&t| m.tags[t].name.as_str())
            .collect();
        assert_eq!(tag_names, ["Two", "One"]);
        assert!(m.posts[1].tags.is_empty());
    }

    #[test]
    fn unknown_album_ids_are_reported_not_tagged() {
        let albums = vec![album("1", "One")];
        let photos = vec![photo_in("a", &["1", "404"])];
        let m = map(&albums, &photos);
        assert_eq!(m.tags.len(), 1);
        assert_eq!(m.posts[0].tags, [0]);
        assert_eq!(m.unknown_albums, ["404"]);
    }

    #[test]
    fn duplicate_album_entries_make_one_tag() {
        let albums = vec![album("1", "One"), album("1", "One again")];
        let m = map(&albums, &[photo_in("a", &["1"])]);
        assert_eq!(m.tags.len(), 1);
        assert_eq!(m.tags[0].name, "One");
    }

    #[test]
    fn colliding_tag_slugs_get_suffixes() {
        let albums = vec![album("1", "Hue!"), album("2", "hue"), album("3", "日本")];
        let m = map(&albums, &[photo_in("a", &["1", "2", "3"])]);
        let slugs: Vec<&str> = m.tags.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, ["hue", "hue-2", "album-3"]);
    }

    #[test]
    fn category_and_tag_term_ids() {
        let albums = vec![album("1", "One"), album("2", "Two")];
        let m = map(&albums, &[photo_in("a", &["1", "2"])]);
        assert_eq!(m.category.term_id, 1);
        assert_eq!(m.category.slug, "from-flickr");
        assert_eq!(m.category.name, "From Flickr");
        let term_ids: Vec<u64> = m.tags.iter().map(|t| t.term_id).collect();
        assert_eq!(term_ids, [2, 3]);
    }

    #[test]
    fn bad_date_taken_falls_back_to_date_imported() {
        let mut p = photo("a", Some("A"));
        p.date_taken = "sometime in 2015".into();
        p.date_imported = Some("2016-01-02 03:04:05".into());
        let m = map(&[], &[p]);
        assert_eq!(m.posts.len(), 1);
        assert_eq!(m.posts[0].dates.local, "2016-01-02 03:04:05");
        assert_eq!(m.date_fallbacks, 1);
        assert!(!m.posts[0].content.contains("Taken on"));
    }

    #[test]
    fn blank_name_post_slug_uses_dashed_date() {
        let m = map(&[], &[photo("a", None)]);
        assert_eq!(m.posts[0].title, "Photo taken at 2015-06-08 05:46:43");
        assert_eq!(m.posts[0].slug, "photo-taken-at-2015-06-08-05-46-43");
        assert_eq!(m.attachments[0].slug, "photo-taken-at-2015-06-08-05-46-43-image");
    }

    #[test]
    fn photo_with_no_usable_date_is_skipped() {
        let mut p = photo("bad", Some("A"));
        p.date_taken = "garbage".into();
        p.date_imported = Some("also garbage".into());
        let m = map(&[], &[photo("ok", Some("B")), p]);
        assert_eq!(m.posts.len(), 1);
        assert_eq!(m.skipped.len(), 1);
        assert_eq!(m.skipped[0].photo_id, "bad");
        assert_eq!(m.skipped[0].error.input, "garbage");
    }

    #[test]
    fn albums_of_skipped_photos_do_not_create_tags() {
        let mut p = photo_in("bad", &["1"]);
        p.date_taken = "garbage".into();
        let m = map(&[album("1", "One")], &[p]);
        assert!(m.tags.is_empty());
    }

    #[test]
    fn attachment_carries_exif_description() {
        let mut p = photo("a", Some("A"));
        p.exif.insert("Make".into(), "Canon".into());
        let m = map(&[], &[p, photo("b", Some("B"))]);
        assert_eq!(m.attachments[0].description, "flickr_exif_data:\n• Make: Canon");
        assert_eq!(m.attachments[1].description, "");
    }

    #[test]
    fn content_references_attachment_id() {
        let m = map(&[], &[photo("a", Some("A")), photo("b", Some("B"))]);
        assert!(m.posts[1].content.contains(r#""id":4"#));
        assert!(m.posts[1].content.contains("wp-image-4"));
    }

    #[test]
    fn output_is_deterministic() {
        let photos: Vec<Photo> = (0..50)
            .map(|i| photo(&i.to_string(), Some(format!("Photo {i}").as_str())))
            .collect();
        let a = map(&[], &photos);
        let b = map(&[], &photos);
        let ids_a: Vec<(u64, &str)> = a.posts.iter().map(|p| (p.id, p.photo_id.as_str())).collect();
        let ids_b: Vec<(u64, &str)> = b.posts.iter().map(|p| (p.id, p.photo_id.as_str())).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(a.posts[49].photo_id, "49");
        assert_eq!(a.posts[49].id, 99);
    }
}
