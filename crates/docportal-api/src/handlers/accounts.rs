//! Account management handlers
//!
//! Every handler passes the authenticated actor to the lifecycle service, which
//! runs the authorization check before touching any record.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use docportal_core::models::{Account, AccountPatch, CreateAccountInput, OperationWarning};
use docportal_core::AppError;
use docportal_infra::ErrorResponse;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::ActorContext;
use crate::error::{HttpAppError, ValidatedJson};
use crate::handlers::AccountOutcomeResponse;
use crate::middleware::audit;
use crate::state::AppState;
use crate::utils::client::ClientInfo;

/// Body of the dedicated delete endpoint. `adminUserId` must name the caller.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountRequest {
    pub user_id: Uuid,
    pub admin_user_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountResponse {
    pub deleted_user_id: Uuid,
    pub warnings: Vec<OperationWarning>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamAdminRequest {
    pub is_admin: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    tag = "accounts",
    responses(
        (status = 200, description = "Accounts visible to the caller", body = [Account]),
        (status = 403, description = "Not permitted", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, ctx), fields(actor_id = %ctx.actor.id))]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    ctx: ActorContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let accounts = state.services.accounts.list_accounts(&ctx.actor).await?;
    Ok(Json(accounts))
}

#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    tag = "accounts",
    request_body = CreateAccountInput,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not permitted", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, ctx, client, input), fields(actor_id = %ctx.actor.id, role = %input.role))]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    ctx: ActorContext,
    client: ClientInfo,
    ValidatedJson(input): ValidatedJson<CreateAccountInput>,
) -> Result<impl IntoResponse, HttpAppError> {
    let account = state
        .services
        .accounts
        .create_account(&ctx.actor, input)
        .await?;
    audit::log_account_created(&ctx.actor, &account, &client);
    Ok((StatusCode::CREATED, Json(account)))
}

#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}",
    tag = "accounts",
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account", body = Account),
        (status = 403, description = "Not permitted", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, ctx), fields(actor_id = %ctx.actor.id))]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    ctx: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let account = state.services.accounts.get_account(&ctx.actor, id).await?;
    Ok(Json(account))
}

#[utoipa::path(
    patch,
    path = "/api/v1/accounts/{id}",
    tag = "accounts",
    params(("id" = Uuid, Path, description = "Account ID")),
    request_body = AccountPatch,
    responses(
        (status = 200, description = "Account updated", body = AccountOutcomeResponse),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 403, description = "Not permitted", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, ctx, client, patch), fields(actor_id = %ctx.actor.id))]
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    ctx: ActorContext,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    ValidatedJson(patch): ValidatedJson<AccountPatch>,
) -> Result<impl IntoResponse, HttpAppError> {
    let new_role = patch.role;
    let outcome = state
        .services
        .accounts
        .update_account(&ctx.actor, id, patch)
        .await?;
    if let Some(role) = new_role {
        audit::log_permission_changed(
            &ctx.actor,
            &outcome.value,
            serde_json::json!({ "role": role }),
            &client,
        );
    }
    Ok(Json(AccountOutcomeResponse::from(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/v1/accounts/delete",
    tag = "accounts",
    request_body = DeleteAccountRequest,
    responses(
        (status = 200, description = "Account deleted", body = DeleteAccountResponse),
        (status = 400, description = "Missing userId or adminUserId", body = ErrorResponse),
        (status = 403, description = "Not permitted or last admin", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 502, description = "Sign-in identity could not be removed", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, ctx, client), fields(actor_id = %ctx.actor.id))]
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    ctx: ActorContext,
    client: ClientInfo,
    ValidatedJson(request): ValidatedJson<DeleteAccountRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if request.admin_user_id != ctx.actor.id {
        return Err(AppError::Forbidden(
            "adminUserId does not match the authenticated account".to_string(),
        )
        .into());
    }
    let outcome = state
        .services
        .accounts
        .delete_account(&ctx.actor, request.user_id)
        .await?;
    audit::log_account_deleted(&ctx.actor, &outcome.value, &outcome.warnings, &client);
    Ok(Json(DeleteAccountResponse {
        deleted_user_id: outcome.value.id,
        warnings: outcome.warnings,
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/accounts/{id}/team-admin",
    tag = "accounts",
    params(("id" = Uuid, Path, description = "Distributor team member ID")),
    request_body = TeamAdminRequest,
    responses(
        (status = 200, description = "Team admin rights updated", body = Account),
        (status = 403, description = "Not permitted or last admin", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, ctx, client), fields(actor_id = %ctx.actor.id))]
pub async fn set_team_admin(
    State(state): State<Arc<AppState>>,
    ctx: ActorContext,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<TeamAdminRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let account = state
        .services
        .accounts
        .set_team_admin(&ctx.actor, id, request.is_admin)
        .await?;
    audit::log_permission_changed(
        &ctx.actor,
        &account,
        serde_json::json!({ "teamAdmin": request.is_admin }),
        &client,
    );
    Ok(Json(account))
}
