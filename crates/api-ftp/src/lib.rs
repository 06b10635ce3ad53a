//! # API FTP
//!
//! Stateful-transfer front-end for filedrop.
//!
//! Handles:
//! - Running an FTP engine (libunftp with its filesystem back-end) rooted at the store
//!   directory
//! - Gating sessions behind the single shared credential pair
//!
//! Sessions share the store directory. Root-level uploads are staged and renamed into place
//! (see [`StagedFilesystem`]), so they show up in REST listings only once complete. The FTP
//! front-end never schedules thumbnails; those are only produced for uploads arriving over
//! REST (or generated later from the CLI).

#![warn(rust_2018_idioms)]

pub mod auth;
pub mod server;
pub mod storage;

pub use auth::SharedCredentialAuthenticator;
pub use server::{build_server, serve, FtpConfig};
pub use storage::StagedFilesystem;

#[derive(Debug, thiserror::Error)]
pub enum FtpError {
    #[error("invalid FTP configuration: {0}")]
    InvalidConfig(String),
    #[error("store root {path} is not usable: {source}", path = path.display())]
    StoreRoot {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("FTP server error: {0}")]
    Server(#[from] libunftp::ServerError),
}
