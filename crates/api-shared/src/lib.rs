//! # API Shared
//!
//! Shared definitions for the filedrop front-ends.
//!
//! Contains:
//! - Response records returned by the REST API (`records` module)
//! - Shared services like `HealthService`
//! - The shared credential pair check used by the FTP gateway
//!
//! Used by `filedrop-core`, `api-rest` and `api-ftp`.

pub mod auth;
pub mod health;
pub mod records;

pub use auth::{AuthError, SharedCredentials};
pub use health::HealthService;
pub use records::{FileRecord, HealthRes, UploadRes};
