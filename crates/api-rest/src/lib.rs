//! # API REST
//!
//! Request/response front-end for filedrop.
//!
//! Handles:
//! - Multipart uploads into the shared store, scheduling thumbnails for images
//! - The joined file listing and downloads by sanitised name
//! - Read-only access to thumbnails by sanitised name (and optionally a public asset directory)
//! - OpenAPI/Swagger documentation and CORS
//!
//! Uses `filedrop-core` for storage, listing and thumbnail hand-off.

#![warn(rust_2018_idioms)]

mod errors;
mod routes;

pub use routes::{router, ApiDoc};

use filedrop_core::{
    CoreConfig, CoreResult, FileStore, ListingService, ThumbnailScheduler, UploadService,
};
use std::sync::Arc;

/// Application state shared across REST API handlers
///
/// Every handler reaches the store through these services; none of them holds a lock, so
/// the FTP front-end writing into the same directory is observed as soon as its writes land.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    uploads: UploadService,
    listing: ListingService,
    thumbnails: FileStore,
}

impl AppState {
    /// Build the state over the configured store.
    ///
    /// `scheduler` receives thumbnail jobs for image uploads; pass `None` (or disable
    /// thumbnails in `cfg`) to run without thumbnails.
    ///
    /// # Errors
    /// Returns `CoreError::Files` if the store or thumbnail directory does not exist.
    pub fn new(
        cfg: Arc<CoreConfig>,
        scheduler: Option<Arc<dyn ThumbnailScheduler>>,
    ) -> CoreResult<Self> {
        let store = FileStore::new(cfg.store_dir())?.with_max_file_size(cfg.max_upload_bytes());
        let listing = ListingService::from_config(store.clone(), &cfg);
        let uploads = UploadService::new(store, cfg.clone(), scheduler);
        let thumbnails = FileStore::new(cfg.thumbnail_dir())?;

        Ok(Self {
            cfg,
            uploads,
            listing,
            thumbnails,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }
}
