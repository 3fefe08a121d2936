//! Self-service handlers for the signed-in account.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use docportal_core::models::Account;
use docportal_infra::ErrorResponse;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::ActorContext;
use crate::error::{HttpAppError, ValidatedJson};
use crate::middleware::audit;
use crate::state::AppState;
use crate::utils::client::ClientInfo;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNameRequest {
    pub display_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "me",
    responses(
        (status = 200, description = "The signed-in account", body = Account),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_me(ctx: ActorContext) -> impl IntoResponse {
    Json(ctx.account)
}

#[utoipa::path(
    patch,
    path = "/api/v1/me/name",
    tag = "me",
    request_body = UpdateNameRequest,
    responses(
        (status = 200, description = "Name updated", body = Account),
        (status = 400, description = "Invalid name", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, ctx), fields(account_id = %ctx.actor.id))]
pub async fn update_my_name(
    State(state): State<Arc<AppState>>,
    ctx: ActorContext,
    ValidatedJson(request): ValidatedJson<UpdateNameRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let account = state
        .services
        .accounts
        .update_own_name(&ctx.actor, &request.display_name)
        .await?;
    Ok(Json(account))
}

#[utoipa::path(
    post,
    path = "/api/v1/me/password",
    tag = "me",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed; other sessions are signed out"),
        (status = 400, description = "Wrong current password or weak new password", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, ctx, client, request), fields(account_id = %ctx.actor.id))]
pub async fn change_my_password(
    State(state): State<Arc<AppState>>,
    ctx: ActorContext,
    client: ClientInfo,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .services
        .accounts
        .update_own_password(&ctx.actor, &request.current_password, &request.new_password)
        .await?;
    audit::log_password_changed(&ctx.actor, &client);
    Ok(StatusCode::NO_CONTENT)
}
