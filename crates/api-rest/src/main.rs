//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the request/response front-end on its own.
//!
//! ## Intended use
//! Useful for development when the FTP front-end is not needed. The workspace's main
//! `filedrop-run` binary runs both front-ends concurrently against the same store.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use filedrop_core::{CoreConfig, DetachedScheduler, ThumbnailGenerator, ThumbnailScheduler};

/// Main entry point for the filedrop REST API server
///
/// # Environment Variables
/// - `FILEDROP_REST_ADDR`: Server address (default: "0.0.0.0:8080")
/// - `FILEDROP_*`: storage and thumbnail settings, see `CoreConfig::from_env`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the store directories cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("filedrop=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("FILEDROP_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());

    let cfg = Arc::new(CoreConfig::from_env()?);
    cfg.ensure_directories()?;

    let scheduler: Arc<dyn ThumbnailScheduler> =
        Arc::new(DetachedScheduler::spawn(ThumbnailGenerator::from_config(&cfg)));
    let state = AppState::new(cfg, Some(scheduler))?;

    tracing::info!("-- Starting filedrop REST API on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
