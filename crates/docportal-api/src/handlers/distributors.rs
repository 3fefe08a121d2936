//! Distributor organization handlers

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use docportal_core::models::Distributor;
use docportal_infra::ErrorResponse;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::ActorContext;
use crate::error::HttpAppError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/distributors",
    tag = "distributors",
    responses(
        (status = 200, description = "Organizations visible to the caller", body = [Distributor]),
        (status = 403, description = "Not permitted", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, ctx), fields(actor_id = %ctx.actor.id))]
pub async fn list_distributors(
    State(state): State<Arc<AppState>>,
    ctx: ActorContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let distributors = state.services.accounts.list_distributors(&ctx.actor).await?;
    Ok(Json(distributors))
}

#[utoipa::path(
    get,
    path = "/api/v1/distributors/{id}",
    tag = "distributors",
    params(("id" = Uuid, Path, description = "Distributor ID")),
    responses(
        (status = 200, description = "Organization", body = Distributor),
        (status = 403, description = "Not permitted", body = ErrorResponse),
        (status = 404, description = "Organization not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, ctx), fields(actor_id = %ctx.actor.id))]
pub async fn get_distributor(
    State(state): State<Arc<AppState>>,
    ctx: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let distributor = state.services.accounts.get_distributor(&ctx.actor, id).await?;
    Ok(Json(distributor))
}
