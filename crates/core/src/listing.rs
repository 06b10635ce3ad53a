//! Listing assembly.
//!
//! Joins the store's entries with thumbnail presence into the records clients see. The join
//! takes no lock against concurrent uploads or thumbnail generation: each field is read from
//! a complete underlying state, but size and thumbnail presence may come from different
//! points in time when a write races the listing.

use crate::constants::THUMBNAIL_URL_PREFIX;
use crate::{CoreConfig, CoreResult};
use api_shared::FileRecord;
use chrono::SecondsFormat;
use filedrop_files::{FileStore, StoredFile};
use filedrop_types::FileKey;
use std::path::PathBuf;

/// Builds file listings from a store and, optionally, a thumbnail directory.
#[derive(Debug, Clone)]
pub struct ListingService {
    store: FileStore,
    thumbnail_dir: Option<PathBuf>,
}

impl ListingService {
    /// `thumbnail_dir` of `None` lists files without ever attaching a thumbnail reference.
    pub fn new(store: FileStore, thumbnail_dir: Option<PathBuf>) -> Self {
        Self {
            store,
            thumbnail_dir,
        }
    }

    /// Listing service honouring the configured thumbnail capability.
    pub fn from_config(store: FileStore, cfg: &CoreConfig) -> Self {
        let thumbnail_dir = cfg
            .thumbnails_enabled()
            .then(|| cfg.thumbnail_dir().to_path_buf());
        Self::new(store, thumbnail_dir)
    }

    /// Lists every stored file in directory enumeration order.
    ///
    /// Entries whose metadata cannot be read are skipped by the store rather than failing
    /// the listing.
    ///
    /// # Errors
    /// Returns `CoreError::Files` if the store directory itself cannot be read.
    pub fn list(&self) -> CoreResult<Vec<FileRecord>> {
        let records = self
            .store
            .list()?
            .into_iter()
            .map(|stored| self.record_for(stored))
            .collect();
        Ok(records)
    }

    fn record_for(&self, stored: StoredFile) -> FileRecord {
        let thumbnail_url = self
            .has_thumbnail(&stored.name)
            .then(|| thumbnail_url(&stored.name));

        FileRecord {
            name: stored.name.to_string(),
            size: stored.size_bytes,
            mod_time: stored.modified.to_rfc3339_opts(SecondsFormat::Secs, true),
            thumbnail_url,
        }
    }

    fn has_thumbnail(&self, name: &FileKey) -> bool {
        self.thumbnail_dir
            .as_ref()
            .is_some_and(|dir| dir.join(name.as_str()).exists())
    }
}

/// Relative locator under which the thumbnail for `name` is served.
pub fn thumbnail_url(name: &FileKey) -> String {
    format!(
        "{}/{}",
        THUMBNAIL_URL_PREFIX,
        urlencoding::encode(name.as_str())
    )
}
