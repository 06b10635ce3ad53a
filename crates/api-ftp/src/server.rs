use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use api_shared::SharedCredentials;
use filedrop_types::NonEmptyText;
use libunftp::auth::DefaultUser;
use libunftp::{Server, ServerBuilder};

use crate::{FtpError, SharedCredentialAuthenticator, StagedFilesystem};

pub const DEFAULT_FTP_ADDR: &str = "0.0.0.0:2121";
pub const DEFAULT_FTP_USER: &str = "admin";
pub const DEFAULT_FTP_PASSWORD: &str = "admin";

const GREETING: &str = "filedrop FTP ready";

/// Runtime settings for the FTP front-end.
#[derive(Debug, Clone)]
pub struct FtpConfig {
    pub addr: String,
    pub credentials: SharedCredentials,
}

impl FtpConfig {
    pub fn new(addr: impl Into<String>, credentials: SharedCredentials) -> Self {
        Self {
            addr: addr.into(),
            credentials,
        }
    }

    /// Read settings from the process environment.
    ///
    /// - `FILEDROP_FTP_ADDR` (default `0.0.0.0:2121`)
    /// - `FILEDROP_FTP_USER` (default `admin`)
    /// - `FILEDROP_FTP_PASSWORD` (default `admin`)
    pub fn from_env() -> Result<Self, FtpError> {
        Self::from_values(
            std::env::var("FILEDROP_FTP_ADDR").ok(),
            std::env::var("FILEDROP_FTP_USER").ok(),
            std::env::var("FILEDROP_FTP_PASSWORD").ok(),
        )
    }

    fn from_values(
        addr: Option<String>,
        user: Option<String>,
        password: Option<String>,
    ) -> Result<Self, FtpError> {
        let addr = addr.unwrap_or_else(|| DEFAULT_FTP_ADDR.into());
        if addr.trim().is_empty() {
            return Err(FtpError::InvalidConfig(
                "FILEDROP_FTP_ADDR must not be empty".into(),
            ));
        }

        let user = user.unwrap_or_else(|| DEFAULT_FTP_USER.into());
        let user = NonEmptyText::new(&user).map_err(|_| {
            FtpError::InvalidConfig("FILEDROP_FTP_USER must not be empty".into())
        })?;
        let password = password.unwrap_or_else(|| DEFAULT_FTP_PASSWORD.into());

        Ok(Self::new(addr, SharedCredentials::new(user, password)))
    }
}

/// Build an FTP server whose sessions all share `store_root` as their filesystem root.
///
/// The root must already exist as a directory; it is checked here so a bad root fails at
/// startup rather than on the first login.
pub fn build_server(
    store_root: &Path,
    cfg: &FtpConfig,
) -> Result<Server<StagedFilesystem, DefaultUser>, FtpError> {
    let root: PathBuf = store_root.to_path_buf();
    match std::fs::metadata(&root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(FtpError::StoreRoot {
                path: root,
                source: io::Error::other("not a directory"),
            })
        }
        Err(source) => return Err(FtpError::StoreRoot { path: root, source }),
    }

    let authenticator = SharedCredentialAuthenticator::new(cfg.credentials.clone());
    let server = ServerBuilder::with_authenticator(
        Box::new(move || StagedFilesystem::new(root.clone())),
        Arc::new(authenticator),
    )
    .greeting(GREETING)
    .build()?;

    Ok(server)
}

/// Serve FTP on `cfg.addr` until the listener fails.
pub async fn serve(store_root: &Path, cfg: &FtpConfig) -> Result<(), FtpError> {
    let server = build_server(store_root, cfg)?;
    tracing::info!(
        "-- Starting filedrop FTP on {} (root {})",
        cfg.addr,
        store_root.display()
    );
    server.listen(cfg.addr.clone()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = FtpConfig::from_values(None, None, None).unwrap();
        assert_eq!(cfg.addr, DEFAULT_FTP_ADDR);
        assert_eq!(cfg.credentials.username(), DEFAULT_FTP_USER);
        assert!(cfg.credentials.validate("admin", Some("admin")).is_ok());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = FtpConfig::from_values(
            Some("127.0.0.1:2222".into()),
            Some("uploader".into()),
            Some("s3cret".into()),
        )
        .unwrap();
        assert_eq!(cfg.addr, "127.0.0.1:2222");
        assert!(cfg.credentials.validate("uploader", Some("s3cret")).is_ok());
        assert!(cfg.credentials.validate("admin", Some("admin")).is_err());
    }

    #[test]
    fn blank_user_is_rejected() {
        let err = FtpConfig::from_values(None, Some("   ".into()), None).unwrap_err();
        assert!(matches!(err, FtpError::InvalidConfig(_)));
    }

    #[test]
    fn blank_addr_is_rejected() {
        let err = FtpConfig::from_values(Some(String::new()), None, None).unwrap_err();
        assert!(matches!(err, FtpError::InvalidConfig(_)));
    }

    #[test]
    fn missing_store_root_fails_at_build() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let cfg = FtpConfig::from_values(None, None, None).unwrap();
        let err = build_server(&missing, &cfg).err().unwrap();
        assert!(matches!(err, FtpError::StoreRoot { .. }));
    }

    #[test]
    fn file_as_store_root_fails_at_build() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        let cfg = FtpConfig::from_values(None, None, None).unwrap();
        let err = build_server(&file, &cfg).err().unwrap();
        assert!(matches!(err, FtpError::StoreRoot { .. }));
    }
}
