//! filedrop File Store
//!
//! This crate provides the single logical file store shared by every filedrop front-end.
//!
//! ## Design Principles
//!
//! - The store is a flat directory: one stored file per single-segment name
//! - Names are sanitised with [`FileKey`] on every entry point, so no read or write can
//!   escape the root directory
//! - Writes are staged and renamed into place, so a reader sees either the previous complete
//!   content or the new complete content, never a truncated file
//! - There are no in-process locks: the filesystem is the only consistency mechanism, which
//!   lets other processes (the FTP engine) write into the same root without coordination
//!
//! ## Storage Layout
//!
//! ```text
//! <store root>/
//! ├── cat.png
//! ├── notes.txt
//! └── .partial/        # staged writes, renamed into place when complete
//!     └── 3f1c….png
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use filedrop_files::FileStore;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileStore::new(Path::new("uploads"))?.with_max_file_size(10 << 20);
//! let stored = store.put("notes.txt", &b"hello"[..])?;
//! assert_eq!(stored.size_bytes, 5);
//! # Ok(())
//! # }
//! ```

mod constants;
mod store;

pub use constants::STAGING_DIR_NAME;
pub use filedrop_types::{FileKey, FileKeyError};
pub use store::{discard_staged, staging_path_in, FileStore, OpenedFile, StoredFile};

/// Errors that can occur during file store operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory does not exist or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// The requested name cannot be reduced to a usable single-segment key
    #[error("Invalid file name: {0}")]
    InvalidName(#[from] FileKeyError),

    /// No stored file exists under the key
    #[error("File not found: {0}")]
    NotFound(FileKey),

    /// Content exceeded the store's size limit; nothing was written
    #[error("File exceeds the maximum size of {limit} bytes")]
    TooLarge { limit: u64 },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
