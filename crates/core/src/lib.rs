//! # filedrop Core
//!
//! Core logic shared by every filedrop front-end:
//! - Runtime configuration resolved at startup (`config`)
//! - Thumbnail generation and the hand-off from uploads to it (`thumbnails`)
//! - Listing assembly joining stored files with thumbnails (`listing`)
//! - Upload handling for the request/response path (`uploads`)
//!
//! **No transport concerns**: HTTP routing, multipart parsing and the FTP engine belong in
//! `api-rest` and `api-ftp`.

pub mod config;
pub mod constants;
mod error;
pub mod listing;
pub mod thumbnails;
pub mod uploads;

pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use filedrop_files::{FileStore, FilesError, StoredFile};
pub use filedrop_types::FileKey;
pub use listing::ListingService;
pub use thumbnails::{
    DetachedScheduler, InlineScheduler, ThumbnailError, ThumbnailGenerator, ThumbnailJob,
    ThumbnailScheduler,
};
pub use uploads::{UploadService, Uploaded};
