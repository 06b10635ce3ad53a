//! Standalone FTP server binary.
//!
//! Runs the FTP front-end on its own, against the configured store directory. The
//! workspace's `filedrop-run` binary runs it alongside the REST front-end.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_ftp::{serve, FtpConfig};
use filedrop_core::CoreConfig;

/// Main entry point for the filedrop FTP server
///
/// # Environment Variables
/// - `FILEDROP_FTP_ADDR`, `FILEDROP_FTP_USER`, `FILEDROP_FTP_PASSWORD`: see `FtpConfig::from_env`
/// - `FILEDROP_STORE_DIR`: the directory sessions are rooted at
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("filedrop=info".parse()?)
                .add_directive("api_ftp=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::from_env()?;
    cfg.ensure_directories()?;
    let ftp = FtpConfig::from_env()?;

    serve(cfg.store_dir(), &ftp).await?;
    Ok(())
}
