//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use docportal_core::Config;
use docportal_infra::LogFormat;
use docportal_services::PortalServices;
use std::sync::Arc;
use std::time::Duration;

/// Interval between sweeps of expired failed-auth entries.
const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    let log_format: LogFormat = config
        .log_format()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid LOG_FORMAT: {}", e))?;
    docportal_infra::init_telemetry(log_format, "docportal-api", env!("CARGO_PKG_VERSION"))
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let store = docportal_store::create_record_store(&config)
        .await
        .context("Failed to initialize record store")?;
    let services = PortalServices::from_config(&config, store.clone())
        .context("Failed to initialize portal services")?;

    let state = Arc::new(AppState::new(config.clone(), store, services));
    spawn_limiter_cleanup(&state);

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

fn spawn_limiter_cleanup(state: &Arc<AppState>) {
    let limiter = state.auth_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.cleanup_expired().await;
        }
    });
}
