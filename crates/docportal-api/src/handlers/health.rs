//! Health check

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

use crate::state::AppState;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub record_store: String,
    pub record_store_backend: String,
    pub identity_provider: String,
    pub notification_sender: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Record store unavailable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let record_store = match tokio::time::timeout(CHECK_TIMEOUT, state.store.health_check()).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Record store health check failed");
            format!("unhealthy: {}", e)
        }
        Err(_) => {
            tracing::error!("Record store health check timed out");
            "timeout".to_string()
        }
    };
    let healthy = record_store == "healthy";
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        record_store,
        record_store_backend: state.store.backend_type().to_string(),
        identity_provider: state.services.identity.provider_name().to_string(),
        notification_sender: state.services.notifier.sender_name().to_string(),
    };
    (status, Json(body))
}
