//! Export configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by a user file, either `--config <file>` or `config.toml` in
//! the export directory.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [channel]
//! title = "Flickr Photos"
//! link = "https://example.com"
//! description = "Photos imported from Flickr"
//! language = "en-US"
//! base_site_url = ""          # Empty = same as link
//! base_blog_url = ""          # Empty = same as link
//! author_login = ""           # Empty = no wp:author, empty dc:creator
//! author_display_name = ""
//!
//! [category]
//! name = "From Flickr"
//! slug = "from-flickr"
//!
//! [posts]
//! first_id = 1                # First synthetic post/attachment ID
//! utc_offset = "+00:00"       # Offset of the export's local timestamps
//! comment_status = "closed"   # "open" or "closed"
//!
//! [processing]
//! max_processes = 4           # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [channel]
//! link = "https://photos.example.org"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::dates::parse_utc_offset;
use crate::slug::slugify;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Export configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// WXR channel metadata.
    pub channel: ChannelConfig,
    /// The provenance category attached to every post.
    pub category: CategoryConfig,
    /// Post ID, date and discussion settings.
    pub posts: PostsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ExportConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel.link.trim().is_empty() {
            return Err(ConfigError::Validation(
                "channel.link must not be empty".into(),
            ));
        }
        if self.category.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category.name must not be empty".into(),
            ));
        }
        if self.category.slug.is_empty() || slugify(&self.category.slug) != self.category.slug {
            return Err(ConfigError::Validation(format!(
                "category.slug {:?} is not a valid slug (try {:?})",
                self.category.slug,
                slugify(&self.category.name)
            )));
        }
        if self.posts.first_id == 0 {
            return Err(ConfigError::Validation(
                "posts.first_id must be at least 1".into(),
            ));
        }
        if parse_utc_offset(&self.posts.utc_offset).is_none() {
            return Err(ConfigError::Validation(format!(
                "posts.utc_offset {:?} must look like +HH:MM or -HH:MM",
                self.posts.utc_offset
            )));
        }
        if !matches!(self.posts.comment_status.as_str(), "open" | "closed") {
            return Err(ConfigError::Validation(
                "posts.comment_status must be \"open\" or \"closed\"".into(),
            ));
        }
        Ok(())
    }
}

/// WXR channel metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelConfig {
    pub title: String,
    /// Site URL written to the channel `link`.
    pub link: String,
    pub description: String,
    pub language: String,
    /// `wp:base_site_url`; empty means the same as `link`.
    pub base_site_url: String,
    /// `wp:base_blog_url`; empty means the same as `link`.
    pub base_blog_url: String,
    /// WordPress login to attribute posts to. Empty leaves attribution to
    /// the importer's author mapping step.
    pub author_login: String,
    pub author_display_name: String,
}

impl ChannelConfig {
    pub fn site_url(&self) -> &str {
        non_empty_or(&self.base_site_url, &self.link)
    }

    pub fn blog_url(&self) -> &str {
        non_empty_or(&self.base_blog_url, &self.link)
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            title: "Flickr Photos".to_string(),
            link: "https://example.com".to_string(),
            description: "Photos imported from Flickr".to_string(),
            language: "en-US".to_string(),
            base_site_url: String::new(),
            base_blog_url: String::new(),
            author_login: String::new(),
            author_display_name: String::new(),
        }
    }
}

/// The fixed provenance category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoryConfig {
    pub name: String,
    pub slug: String,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            name: "From Flickr".to_string(),
            slug: "from-flickr".to_string(),
        }
    }
}

/// Post ID, date and discussion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostsConfig {
    /// First synthetic ID. Posts and attachments share one sequence.
    pub first_id: u64,
    /// UTC offset the export's `date_taken` values are recorded in.
    pub utc_offset: String,
    /// `wp:comment_status` / `wp:ping_status` for every item.
    pub comment_status: String,
}

impl PostsConfig {
    /// The parsed offset. Falls back to UTC for unvalidated configs.
    pub fn offset(&self) -> FixedOffset {
        parse_utc_offset(&self.utc_offset).unwrap_or_else(|| Utc.fix())
    }
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self {
            first_id: 1,
            utc_offset: "+00:00".to_string(),
            comment_status: "closed".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel rendering workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ExportConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ExportConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ExportConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for an export directory.
///
/// An explicit `config_file` must exist. Without one, `config.toml` in the
/// export directory is used when present, stock defaults otherwise.
pub fn load_config(
    export_dir: &Path,
    config_file: Option<&Path>,
) -> Result<ExportConfig, ConfigError> {
    let overlay = match config_file {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str(&content)?)
        }
        None => load_raw_config(&export_dir.join("config.toml"))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# flickr-wxr Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as config.toml in the Flickr export directory, or pass
# it explicitly with --config. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# WXR channel
# ---------------------------------------------------------------------------
[channel]
# Shown by the importer; WordPress does not copy it into site settings.
title = "Flickr Photos"

# URL of the site the export targets.
link = "https://example.com"

description = "Photos imported from Flickr"
language = "en-US"

# wp:base_site_url / wp:base_blog_url. Empty = same as link.
base_site_url = ""
base_blog_url = ""

# WordPress login to attribute posts to. Empty = no wp:author entry;
# the importer then asks which user should own the posts.
author_login = ""
author_display_name = ""

# ---------------------------------------------------------------------------
# Provenance category (attached to every imported post)
# ---------------------------------------------------------------------------
[category]
name = "From Flickr"
slug = "from-flickr"

# ---------------------------------------------------------------------------
# Posts
# ---------------------------------------------------------------------------
[posts]
# First synthetic ID. Each photo takes one ID for its post and, when it has
# an original image URL, the next one for its attachment.
first_id = 1

# UTC offset of the export's date_taken values (e.g. "+07:00").
# Drives wp:post_date_gmt and pubDate.
utc_offset = "+00:00"

# "open" or "closed"; applies to comments and pings.
comment_status = "closed"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for rendering post content.
# Omit to auto-detect (= number of CPU cores). Values above the core
# count are clamped down.
# max_processes = 4
"##
}
