//! Input record shapes from a Flickr data export.
//!
//! These mirror the JSON Flickr writes into an account export archive:
//! one `albums.json` and one `photo_<id>.json` per photo. Exports differ
//! slightly between vintages (numbers sometimes arrive quoted, album
//! memberships sometimes as bare IDs and sometimes as `{id, title, url}`
//! objects), so deserialization is lenient about scalars and strict about
//! structure. Unknown fields are ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Ordered EXIF fields, in the order the source record lists them.
pub type Exif = IndexMap<String, String>;

/// Contents of `albums.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumList {
    #[serde(default)]
    pub albums: Vec<Album>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    #[serde(deserialize_with = "scalar_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// As reported by Flickr. Informational only, never used for iteration.
    #[serde(default, deserialize_with = "lenient_count")]
    pub photo_count: Option<u64>,
}

/// One `photo_<id>.json` record.
#[derive(Debug, Clone, Deserialize)]
pub struct Photo {
    #[serde(deserialize_with = "scalar_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date_taken: String,
    #[serde(default)]
    pub date_imported: Option<String>,
    /// Full-resolution asset URL. Without it no attachment is created.
    #[serde(default)]
    pub original: Option<String>,
    #[serde(default)]
    pub photopage: String,
    #[serde(default, deserialize_with = "exif_map")]
    pub exif: Exif,
    #[serde(default, deserialize_with = "album_ids")]
    pub albums: Vec<String>,
}

impl Photo {
    /// The original asset URL, if present and non-blank.
    pub fn original_url(&self) -> Option<&str> {
        self.original
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The description, if present and non-blank.
    pub fn description_text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Render a JSON scalar as the string Flickr meant. `null` and containers
/// yield `None`.
fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(value).ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn exif_map<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Exif, D::Error> {
    let raw: Option<IndexMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key, v)))
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AlbumRef {
    Id(#[serde(deserialize_with = "scalar_string")] String),
    Object {
        #[serde(deserialize_with = "scalar_string")]
        id: String,
    },
}

fn album_ids<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw: Option<Vec<AlbumRef>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|r| match r {
            AlbumRef::Id(id) | AlbumRef::Object { id } => id,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_photo_record() {
        let json = r#"{
            "id": "18471428145",
            "name": "Job is both fun and colorful!",
            "description": "",
            "date_taken": "2015-06-08 05:46:43",
            "original": "https://live.staticflickr.com/5333/18471428145_abc_o.jpg",
            "photopage": "https://www.flickr.com/photos/someone/18471428145/",
            "exif": {"Make": "Canon", "Model": "EOS 60D", "ISO": 200},
            "albums": ["72157652936442124"],
            "count_views": "12"
        }"#;
        let photo: Photo = serde_json::from_str(json).unwrap();
        assert_eq!(photo.id, "18471428145");
        assert_eq!(photo.description_text(), None);
        assert!(photo.original_url().unwrap().starts_with("https://live.staticflickr.com/"));
        let keys: Vec<&str> = photo.exif.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Make", "Model", "ISO"]);
        assert_eq!(photo.exif["ISO"], "200");
        assert_eq!(photo.albums, ["72157652936442124"]);
    }

    #[test]
    fn minimal_photo_record() {
        let photo: Photo = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(photo.id, "42");
        assert!(photo.name.is_none());
        assert!(photo.exif.is_empty());
        assert!(photo.albums.is_empty());
        assert_eq!(photo.original_url(), None);
    }

    #[test]
    fn null_exif_and_blank_original() {
        let photo: Photo =
            serde_json::from_str(r#"{"id": "1", "exif": null, "original": "  "}"#).unwrap();
        assert!(photo.exif.is_empty());
        assert_eq!(photo.original_url(), None);
    }

    #[test]
    fn exif_null_values_are_dropped() {
        let photo: Photo =
            serde_json::from_str(r#"{"id": "1", "exif": {"Make": null, "Flash": false}}"#).unwrap();
        assert_eq!(photo.exif.len(), 1);
        assert_eq!(photo.exif["Flash"], "false");
    }

    #[test]
    fn album_memberships_as_objects() {
        let json = r#"{"id": "1", "albums": [{"id": "7215", "title": "x", "url": "u"}, "7216"]}"#;
        let photo: Photo = serde_json::from_str(json).unwrap();
        assert_eq!(photo.albums, ["7215", "7216"]);
    }

    #[test]
    fn album_list_with_quoted_counts() {
        let json = r##"{"albums": [
            {"id": "1", "title": "#livingDanang 2016", "photo_count": "12"},
            {"id": 2, "title": "Central Highlands (Vietnam) 2015", "photo_count": 3},
            {"id": "3", "title": "Empty"}
        ]}"##;
        let list: AlbumList = serde_json::from_str(json).unwrap();
        assert_eq!(list.albums.len(), 3);
        assert_eq!(list.albums[0].photo_count, Some(12));
        assert_eq!(list.albums[1].id, "2");
        assert_eq!(list.albums[2].photo_count, None);
    }

    #[test]
    fn photo_without_id_is_rejected() {
        assert!(serde_json::from_str::<Photo>(r#"{"name": "x"}"#).is_err());
    }
}
