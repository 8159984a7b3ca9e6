//! End-to-end conversion: load → map → build → render → write.
//!
//! [`check`] stops after mapping, so it touches nothing on disk. [`convert`]
//! renders the document in memory first and only then writes it, through a
//! temp file in the target directory that is persisted over the output path.
//! Any failure along the way leaves no output file behind.

use crate::config::{ConfigError, ExportConfig};
use crate::load::{self, LoadError};
use crate::mapping::{IdSequence, Mapping, MappingOptions, map_export};
use crate::wxr::{self, WxrError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("WXR error: {0}")]
    Wxr(#[from] WxrError),
    #[error("IO error writing output: {0}")]
    Io(#[from] std::io::Error),
    #[error("No usable photo records in {0}")]
    NoUsablePhotos(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagSummary {
    pub name: String,
    pub slug: String,
    pub posts: usize,
}

/// What a run read, produced and skipped.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub source: PathBuf,
    pub photos_read: usize,
    /// Photo files that could not be read or decoded, with the reason.
    pub skipped_records: Vec<(PathBuf, String)>,
    /// Photos with no usable date, by photo ID, with the reason.
    pub skipped_photos: Vec<(String, String)>,
    pub albums_missing: bool,
    pub category: String,
    pub tags: Vec<TagSummary>,
    pub posts: usize,
    pub attachments: usize,
    pub missing_originals: usize,
    pub date_fallbacks: usize,
    pub unknown_albums: Vec<String>,
    /// Lowest and highest item ID assigned.
    pub id_range: Option<(u64, u64)>,
}

fn summarize(source: &Path, report: &load::LoadReport, mapping: &Mapping) -> Summary {
    let tags = mapping
        .tags
        .iter()
        .enumerate()
        .map(|(i, tag)| TagSummary {
            name: tag.name.clone(),
            slug: tag.slug.clone(),
            posts: mapping.posts.iter().filter(|p| p.tags.contains(&i)).count(),
        })
        .collect();

    let ids = mapping
        .posts
        .iter()
        .map(|p| p.id)
        .chain(mapping.attachments.iter().map(|a| a.id));
    let id_range = ids.clone().min().zip(ids.max());

    Summary {
        source: source.to_path_buf(),
        photos_read: report.photos.len(),
        skipped_records: report
            .skipped
            .iter()
            .map(|s| (s.path.clone(), s.error.to_string()))
            .collect(),
        skipped_photos: mapping
            .skipped
            .iter()
            .map(|s| (s.photo_id.clone(), s.error.to_string()))
            .collect(),
        albums_missing: report.albums_missing,
        category: mapping.category.name.clone(),
        tags,
        posts: mapping.posts.len(),
        attachments: mapping.attachments.len(),
        missing_originals: mapping.missing_originals,
        date_fallbacks: mapping.date_fallbacks,
        unknown_albums: mapping.unknown_albums.clone(),
        id_range,
    }
}

fn mapping_options(config: &ExportConfig) -> MappingOptions {
    MappingOptions {
        utc_offset: config.posts.offset(),
        category_name: config.category.name.clone(),
        category_slug: config.category.slug.clone(),
    }
}

/// Load and map an export without rendering anything.
fn load_and_map(source: &Path, config: &ExportConfig) -> Result<(Mapping, Summary), ConvertError> {
    let report = load::load_export(source)?;
    let mut ids = IdSequence::new(config.posts.first_id);
    let mapping = map_export(&report.albums, &report.photos, &mapping_options(config), &mut ids);
    let summary = summarize(source, &report, &mapping);

    if mapping.posts.is_empty() {
        return Err(ConvertError::NoUsablePhotos(source.to_path_buf()));
    }
    Ok((mapping, summary))
}

/// Validate an export: load and map it, report what a conversion would do.
pub fn check(source: &Path, config: &ExportConfig) -> Result<Summary, ConvertError> {
    load_and_map(source, config).map(|(_, summary)| summary)
}

/// Render an export to a WXR string.
pub fn render(source: &Path, config: &ExportConfig) -> Result<(String, Summary), ConvertError> {
    let (mapping, summary) = load_and_map(source, config)?;
    let document = wxr::build(&mapping, config);
    let xml = wxr::render(&document)?;
    Ok((xml, summary))
}

/// Convert an export and write the WXR document to `output`.
pub fn convert(
    source: &Path,
    output: &Path,
    config: &ExportConfig,
) -> Result<Summary, ConvertError> {
    let (xml, summary) = render(source, config)?;
    write_atomic(output, xml.as_bytes())?;
    tracing::info!(output = %output.display(), bytes = xml.len(), "wrote WXR document");
    Ok(summary)
}

/// Write `contents` to `path` via a sibling temp file.
///
/// The temp file is removed on any error, so `path` is either untouched or
/// fully written.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
