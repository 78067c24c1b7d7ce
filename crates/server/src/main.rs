//! nrfeed server entry point.
//!
//! Boots the HTTP server that turns NPR program pages into podcast feeds.
//! Logs are JSON on stderr, filtered by `RUST_LOG` (default `info`).

use std::sync::Arc;

use anyhow::{Context, Result};
use nrfeed_client::{FetchConfig, HttpTransport, PodcastRenderer, RateLimitedFetcher};
use nrfeed_core::config::AppConfig;
use nrfeed_core::{CacheDb, Clock, FeedLocks, FeedRegistry, SystemClock};
use tracing_subscriber::EnvFilter;

mod error;
mod feed;
mod routes;

use feed::{FeedMemo, FeedService};
use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let state = build_state(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, "starting nrfeed server");

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("nrfeed server stopped");
    Ok(())
}

async fn build_state(config: &AppConfig) -> Result<AppState> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let registry = Arc::new(FeedRegistry::load(&config.feeds_path)?);
    let store = CacheDb::open(&config.db_path).await?;
    let locks = FeedLocks::new(&config.lock_dir)?;

    let transport = HttpTransport::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    })?;
    let fetcher = RateLimitedFetcher::new(Arc::new(transport), config.rate_limit_window(), clock.clone());

    let service = Arc::new(FeedService::new(
        registry,
        store,
        locks,
        fetcher,
        Arc::new(PodcastRenderer::new()),
        clock.clone(),
        config.freshness_window(),
    ));
    let feeds = Arc::new(FeedMemo::new(service, config.memo_window(), clock));

    tracing::info!(
        db_path = %config.db_path.display(),
        lock_dir = %config.lock_dir.display(),
        freshness_secs = config.freshness_secs,
        rate_limit_secs = config.rate_limit_secs,
        memo_secs = config.memo_secs,
        "feed pipeline ready"
    );

    Ok(AppState { feeds })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
