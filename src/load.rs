//! Export directory loading.
//!
//! A Flickr account export unpacks into a flat directory:
//!
//! ```text
//! flickr-data/
//! ├── config.toml            # Converter configuration (optional)
//! ├── albums.json            # {"albums": [{id, title, photo_count, …}]}
//! ├── photo_5234567890.json  # One record per photo
//! ├── photo_5234567891.json
//! └── …
//! ```
//!
//! Photo records are read in file name order so repeated runs assign the
//! same IDs. A record that can't be read or decoded is skipped and reported
//! in [`LoadReport::skipped`]; the rest of the export still loads. A missing
//! or malformed `albums.json` is treated as an empty album list.

use crate::types::{Album, AlbumList, Photo};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ALBUMS_FILE: &str = "albums.json";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Export directory not found: {0}")]
    InputNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single record was skipped.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("malformed JSON in {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct SkippedRecord {
    pub path: PathBuf,
    pub error: RecordError,
}

/// Everything read from an export directory.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub albums: Vec<Album>,
    pub photos: Vec<Photo>,
    pub skipped: Vec<SkippedRecord>,
    /// `albums.json` was absent or unreadable.
    pub albums_missing: bool,
}

/// Load `albums.json` and every `photo_*.json` under `dir`.
pub fn load_export(dir: &Path) -> Result<LoadReport, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::InputNotFound(dir.to_path_buf()));
    }

    let mut report = LoadReport::default();

    match read_record::<AlbumList>(&dir.join(ALBUMS_FILE)) {
        Ok(list) => report.albums = list.albums,
        Err(RecordError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(dir = %dir.display(), "no albums.json; continuing without albums");
            report.albums_missing = true;
        }
        Err(e) => {
            tracing::warn!(error = %e, "unreadable albums.json; continuing without albums");
            report.albums_missing = true;
        }
    }

    for path in photo_files(dir)? {
        match read_record::<Photo>(&path) {
            Ok(photo) => report.photos.push(photo),
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "skipping photo record");
                report.skipped.push(SkippedRecord { path, error });
            }
        }
    }

    tracing::info!(
        albums = report.albums.len(),
        photos = report.photos.len(),
        skipped = report.skipped.len(),
        "loaded export"
    );
    Ok(report)
}

/// `photo_*.json` files directly under `dir`, sorted by name.
fn photo_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_photo_record(p))
        .collect();

    files.sort();
    Ok(files)
}

fn is_photo_record(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    name.starts_with("photo_")
        && path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
}

fn read_record<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, RecordError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| RecordError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn loads_fixture_export() {
        let tmp = setup_fixtures();
        let report = load_export(tmp.path()).unwrap();

        assert_eq!(report.albums.len(), 4);
        assert_eq!(report.photos.len(), 8);
        assert!(report.skipped.is_empty());
        assert!(!report.albums_missing);
    }

    #[test]
    fn photos_in_file_name_order() {
        let tmp = TempDir::new().unwrap();
        for id in ["30", "10", "20"] {
            write(
                tmp.path(),
                &format!("photo_{id}.json"),
                &format!(r#"{{"id": "{id}", "date_taken": "2015-06-08 05:46:43"}}"#),
            );
        }

        let report = load_export(tmp.path()).unwrap();
        let ids: Vec<&str> = report.photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["10", "20", "30"]);
    }

    #[test]
    fn other_files_are_ignored() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "photo_1.json", r#"{"id": "1"}"#);
        write(tmp.path(), "config.toml", "");
        write(tmp.path(), "account_profile.json", "{}");
        write(tmp.path(), "photo_2.txt", "not a record");
        fs::create_dir(tmp.path().join("photo_dir.json")).unwrap();

        let report = load_export(tmp.path()).unwrap();
        assert_eq!(report.photos.len(), 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn malformed_photo_is_skipped_and_reported() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "photo_1.json", r#"{"id": "1"}"#);
        write(tmp.path(), "photo_2.json", r#"{"id": "2", "#);
        write(tmp.path(), "photo_3.json", r#"{"name": "no id"}"#);

        let report = load_export(tmp.path()).unwrap();
        assert_eq!(report.photos.len(), 1);
        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped[0].path.ends_with("photo_2.json"));
        assert!(matches!(
            report.skipped[0].error,
            RecordError::Malformed { .. }
        ));
        assert!(report.skipped[1].path.ends_with("photo_3.json"));
    }

    #[test]
    fn missing_albums_file_is_empty_list() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "photo_1.json", r#"{"id": "1"}"#);

        let report = load_export(tmp.path()).unwrap();
        assert!(report.albums.is_empty());
        assert!(report.albums_missing);
        assert_eq!(report.photos.len(), 1);
    }

    #[test]
    fn malformed_albums_file_is_empty_list() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), ALBUMS_FILE, "[not json");

        let report = load_export(tmp.path()).unwrap();
        assert!(report.albums.is_empty());
        assert!(report.albums_missing);
    }

    #[test]
    fn missing_directory_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let err = load_export(&missing).unwrap_err();
        assert!(matches!(err, LoadError::InputNotFound(p) if p == missing));
    }

    #[test]
    fn empty_directory_loads_nothing() {
        let tmp = TempDir::new().unwrap();
        let report = load_export(tmp.path()).unwrap();
        assert!(report.photos.is_empty());
        assert!(report.skipped.is_empty());
    }
}
