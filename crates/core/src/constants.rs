//! Constants used throughout the filedrop core crate.
//!
//! Defaults here apply only when no explicit configuration is supplied.

/// Default directory for stored files.
pub const DEFAULT_STORE_DIR: &str = "uploads";

/// Default directory for generated thumbnails.
pub const DEFAULT_THUMBNAIL_DIR: &str = "thumbnails";

/// Default bounding box edge, in pixels, that thumbnails are fitted into.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 100;

/// Default largest accepted upload (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Extensions that qualify an upload for thumbnail generation, unless configured otherwise.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// URL path prefix under which the thumbnail directory is served.
pub const THUMBNAIL_URL_PREFIX: &str = "/thumbnails";
