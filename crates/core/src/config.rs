//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into services. Nothing
//! below reads the process environment except [`CoreConfig::from_env`], and that is only
//! called from binaries; every component can therefore be built against temporary
//! directories in tests.

use crate::constants::{
    DEFAULT_IMAGE_EXTENSIONS, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_STORE_DIR, DEFAULT_THUMBNAIL_DIR,
    DEFAULT_THUMBNAIL_SIZE,
};
use crate::{CoreError, CoreResult};
use filedrop_types::FileKey;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    store_dir: PathBuf,
    thumbnail_dir: PathBuf,
    thumbnails_enabled: bool,
    thumbnail_size: u32,
    image_extensions: Vec<String>,
    max_upload_bytes: u64,
    public_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Create a `CoreConfig` over the given directories with every other setting at its
    /// default.
    pub fn new(store_dir: PathBuf, thumbnail_dir: PathBuf) -> Self {
        Self {
            store_dir,
            thumbnail_dir,
            thumbnails_enabled: true,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_owned())
                .collect(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            public_dir: None,
        }
    }

    /// Build the configuration from `FILEDROP_*` environment variables.
    ///
    /// Intended to be called exactly once, from a binary's `main`.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidConfig` if any variable is set to an unusable value.
    pub fn from_env() -> CoreResult<Self> {
        let var = |name: &str| std::env::var(name).ok();

        let store_dir = var("FILEDROP_STORE_DIR").unwrap_or_else(|| DEFAULT_STORE_DIR.into());
        let thumbnail_dir =
            var("FILEDROP_THUMBNAIL_DIR").unwrap_or_else(|| DEFAULT_THUMBNAIL_DIR.into());

        let mut cfg = Self::new(store_dir.into(), thumbnail_dir.into())
            .with_thumbnails(parse_bool(
                "FILEDROP_THUMBNAILS",
                var("FILEDROP_THUMBNAILS"),
                true,
            )?)
            .with_thumbnail_size(parse_positive(
                "FILEDROP_THUMBNAIL_SIZE",
                var("FILEDROP_THUMBNAIL_SIZE"),
                u64::from(DEFAULT_THUMBNAIL_SIZE),
            )?)?
            .with_max_upload_bytes(parse_positive(
                "FILEDROP_MAX_UPLOAD_BYTES",
                var("FILEDROP_MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
            )?)?;

        if let Some(extensions) = parse_extensions(var("FILEDROP_IMAGE_EXTENSIONS"))? {
            cfg = cfg.with_image_extensions(extensions)?;
        }
        if let Some(public_dir) = var("FILEDROP_PUBLIC_DIR").filter(|v| !v.trim().is_empty()) {
            cfg = cfg.with_public_dir(public_dir.into());
        }

        Ok(cfg)
    }

    #[must_use]
    pub fn with_thumbnails(mut self, enabled: bool) -> Self {
        self.thumbnails_enabled = enabled;
        self
    }

    /// Set the bounding box edge thumbnails are fitted into.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidConfig` if `size` is zero or does not fit in a `u32`.
    pub fn with_thumbnail_size(mut self, size: u64) -> CoreResult<Self> {
        self.thumbnail_size = u32::try_from(size)
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| {
                CoreError::InvalidConfig(format!("thumbnail size must be 1..=u32::MAX, got {size}"))
            })?;
        Ok(self)
    }

    /// Set the extensions (case-insensitive, with or without a leading dot) that qualify an
    /// upload for thumbnail generation.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidConfig` if no non-empty extension remains.
    pub fn with_image_extensions<I, S>(mut self, extensions: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalised: Vec<String> = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        if normalised.is_empty() {
            return Err(CoreError::InvalidConfig(
                "image extension list cannot be empty".into(),
            ));
        }
        self.image_extensions = normalised;
        Ok(self)
    }

    /// Set the largest accepted upload.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidConfig` if `bytes` is zero.
    pub fn with_max_upload_bytes(mut self, bytes: u64) -> CoreResult<Self> {
        if bytes == 0 {
            return Err(CoreError::InvalidConfig(
                "maximum upload size must be greater than zero".into(),
            ));
        }
        self.max_upload_bytes = bytes;
        Ok(self)
    }

    #[must_use]
    pub fn with_public_dir(mut self, public_dir: PathBuf) -> Self {
        self.public_dir = Some(public_dir);
        self
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    pub fn thumbnail_dir(&self) -> &Path {
        &self.thumbnail_dir
    }

    pub fn thumbnails_enabled(&self) -> bool {
        self.thumbnails_enabled
    }

    pub fn thumbnail_size(&self) -> u32 {
        self.thumbnail_size
    }

    pub fn image_extensions(&self) -> &[String] {
        &self.image_extensions
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub fn public_dir(&self) -> Option<&Path> {
        self.public_dir.as_deref()
    }

    /// Whether an upload under `key` qualifies for thumbnail generation.
    ///
    /// Only the extension is consulted; content is not sniffed.
    pub fn is_image(&self, key: &FileKey) -> bool {
        key.extension()
            .is_some_and(|ext| self.image_extensions.iter().any(|known| *known == ext))
    }

    /// Create the store and thumbnail directories if they are missing.
    ///
    /// Meant for process startup: failure here should stop the process before it serves
    /// traffic.
    pub fn ensure_directories(&self) -> CoreResult<()> {
        for dir in [&self.store_dir, &self.thumbnail_dir] {
            std::fs::create_dir_all(dir).map_err(|source| CoreError::DirectoryCreation {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Parse a boolean flag from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `default`.
pub fn parse_bool(name: &str, value: Option<String>, default: bool) -> CoreResult<bool> {
    let Some(value) = value.map(|v| v.trim().to_ascii_lowercase()).filter(|v| !v.is_empty())
    else {
        return Ok(default);
    };

    match value.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(CoreError::InvalidConfig(format!(
            "{name} must be a boolean, got {other:?}"
        ))),
    }
}

/// Parse a strictly positive integer from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `default`.
pub fn parse_positive(name: &str, value: Option<String>, default: u64) -> CoreResult<u64> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };

    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(CoreError::InvalidConfig(format!(
            "{name} must be a positive integer, got {value:?}"
        ))),
    }
}

/// Parse a comma-separated extension list.
///
/// Returns `Ok(None)` when `value` is `None` or blank, so the caller keeps its default.
pub fn parse_extensions(value: Option<String>) -> CoreResult<Option<Vec<String>>> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };

    let extensions: Vec<String> = value
        .split(',')
        .map(|ext| ext.trim().to_string())
        .filter(|ext| !ext.is_empty())
        .collect();
    if extensions.is_empty() {
        return Err(CoreError::InvalidConfig(format!(
            "FILEDROP_IMAGE_EXTENSIONS has no extensions: {value:?}"
        )));
    }
    Ok(Some(extensions))
}
