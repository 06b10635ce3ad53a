//! Upload handling shared by the request/response front-end and the CLI.
//!
//! An upload is written to the store first; only after the write has landed is a thumbnail
//! job handed to the scheduler, and only for names with a recognised image extension. The
//! scheduler's outcome never affects the upload's result.

use crate::thumbnails::{ThumbnailJob, ThumbnailScheduler};
use crate::{CoreConfig, CoreResult};
use filedrop_files::{FileStore, StoredFile};
use std::io::Read;
use std::sync::Arc;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uploaded {
    pub stored: StoredFile,
    pub thumbnail_scheduled: bool,
}

/// Writes uploads into the store and schedules thumbnails for images.
#[derive(Debug, Clone)]
pub struct UploadService {
    store: FileStore,
    cfg: Arc<CoreConfig>,
    scheduler: Option<Arc<dyn ThumbnailScheduler>>,
}

impl UploadService {
    /// `scheduler` is ignored when thumbnails are disabled in `cfg`.
    pub fn new(
        store: FileStore,
        cfg: Arc<CoreConfig>,
        scheduler: Option<Arc<dyn ThumbnailScheduler>>,
    ) -> Self {
        let scheduler = scheduler.filter(|_| cfg.thumbnails_enabled());
        Self {
            store,
            cfg,
            scheduler,
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Store `content` under the sanitised `raw_name`, then schedule a thumbnail if the name
    /// is image-eligible.
    ///
    /// # Errors
    /// Returns `CoreError::Files` if the name is unusable, the content is too large for the
    /// store, or the write fails. No thumbnail is scheduled in those cases.
    pub fn put(&self, raw_name: &str, content: impl Read) -> CoreResult<Uploaded> {
        let stored = self.store.put(raw_name, content)?;
        tracing::info!(name = %stored.name, size = stored.size_bytes, "stored upload");

        let thumbnail_scheduled = match &self.scheduler {
            Some(scheduler) if self.cfg.is_image(&stored.name) => {
                scheduler.submit(ThumbnailJob {
                    source: self.store.path_for(&stored.name),
                    name: stored.name.clone(),
                });
                true
            }
            _ => false,
        };

        Ok(Uploaded {
            stored,
            thumbnail_scheduled,
        })
    }
}
