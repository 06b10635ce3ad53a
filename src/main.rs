use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_ftp::FtpConfig;
use api_rest::{AppState, router};
use filedrop_core::{CoreConfig, DetachedScheduler, ThumbnailGenerator, ThumbnailScheduler};

/// Main entry point for filedrop
///
/// Starts both front-ends concurrently over one store directory:
/// - REST server on port 8080 (configurable via FILEDROP_REST_ADDR)
/// - FTP server on port 2121 (configurable via FILEDROP_FTP_ADDR)
///
/// Files stored through either front-end are visible through the other. Thumbnails are only
/// produced for REST uploads, on a background worker.
///
/// # Environment Variables
/// - `FILEDROP_REST_ADDR`: REST server address (default: "0.0.0.0:8080")
/// - `FILEDROP_FTP_ADDR`, `FILEDROP_FTP_USER`, `FILEDROP_FTP_PASSWORD`: FTP listener and login
/// - `FILEDROP_STORE_DIR`, `FILEDROP_THUMBNAIL_DIR`, `FILEDROP_THUMBNAILS`, ...: see
///   `CoreConfig::from_env`
///
/// # Returns
/// * `Ok(())` - If a server shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup, or either server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("filedrop=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("api_ftp=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("FILEDROP_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());

    let cfg = Arc::new(CoreConfig::from_env()?);
    cfg.ensure_directories()?;
    let ftp_cfg = FtpConfig::from_env()?;

    let scheduler: Arc<dyn ThumbnailScheduler> =
        Arc::new(DetachedScheduler::spawn(ThumbnailGenerator::from_config(&cfg)));
    let state = AppState::new(cfg.clone(), Some(scheduler))?;

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    tracing::info!("++ Starting filedrop REST on {}", rest_addr);
    let rest_server = tokio::spawn(async move { axum::serve(listener, router(state)).await });

    let store_dir = cfg.store_dir().to_path_buf();
    let ftp_server = tokio::spawn(async move { api_ftp::serve(&store_dir, &ftp_cfg).await });

    // Either front-end stopping takes the process down with it.
    tokio::select! {
        res = rest_server => res??,
        res = ftp_server => res??,
    }

    Ok(())
}
