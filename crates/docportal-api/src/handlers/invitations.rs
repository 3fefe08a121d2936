//! Invitation handlers
//!
//! Issuing, resending, revoking and listing require a session. Lookup and
//! acceptance are public: the invitation token is the credential.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use docportal_core::models::{
    InvitationPreview, InvitationRequest, InvitationSummary, OperationWarning,
};
use docportal_infra::ErrorResponse;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::ActorContext;
use crate::error::{HttpAppError, ValidatedJson};
use crate::handlers::AccountOutcomeResponse;
use crate::middleware::audit::{self, AuditEventType};
use crate::state::AppState;
use crate::utils::client::ClientInfo;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitationOutcomeResponse {
    pub invitation: InvitationSummary,
    pub warnings: Vec<OperationWarning>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LookupQuery {
    /// Token from the invitation link
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInvitationRequest {
    pub token: String,
    pub password: String,
    /// Overrides the name the inviter entered
    #[serde(default)]
    pub display_name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/invitations",
    tag = "invitations",
    responses(
        (status = 200, description = "Invitations visible to the caller", body = [InvitationSummary]),
        (status = 403, description = "Not permitted", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, ctx), fields(actor_id = %ctx.actor.id))]
pub async fn list_invitations(
    State(state): State<Arc<AppState>>,
    ctx: ActorContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let invitations = state.services.invitations.list_invitations(&ctx.actor).await?;
    Ok(Json(invitations))
}

#[utoipa::path(
    post,
    path = "/api/v1/invitations",
    tag = "invitations",
    request_body = InvitationRequest,
    responses(
        (status = 201, description = "Invitation issued", body = InvitationOutcomeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Only distributors can invite", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, ctx, client, request), fields(actor_id = %ctx.actor.id))]
pub async fn create_invitation(
    State(state): State<Arc<AppState>>,
    ctx: ActorContext,
    client: ClientInfo,
    ValidatedJson(request): ValidatedJson<InvitationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let outcome = state
        .services
        .invitations
        .create_invitation(&ctx.actor, request)
        .await?;
    audit::log_invitation_event(
        AuditEventType::InvitationIssued,
        Some(&ctx.actor),
        outcome.value.id,
        &client,
    );
    let now = Utc::now();
    Ok((
        StatusCode::CREATED,
        Json(InvitationOutcomeResponse {
            invitation: InvitationSummary::observed(&outcome.value, now),
            warnings: outcome.warnings,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/invitations/{id}/resend",
    tag = "invitations",
    params(("id" = Uuid, Path, description = "Invitation ID")),
    responses(
        (status = 200, description = "Invitation email sent again", body = InvitationSummary),
        (status = 409, description = "Invitation expired", body = ErrorResponse),
        (status = 502, description = "Email could not be delivered", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, ctx), fields(actor_id = %ctx.actor.id))]
pub async fn resend_invitation(
    State(state): State<Arc<AppState>>,
    ctx: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let invitation = state
        .services
        .invitations
        .resend_invitation(&ctx.actor, id)
        .await?;
    Ok(Json(InvitationSummary::observed(&invitation, Utc::now())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/invitations/{id}",
    tag = "invitations",
    params(("id" = Uuid, Path, description = "Invitation ID")),
    responses(
        (status = 204, description = "Invitation revoked"),
        (status = 403, description = "Not permitted", body = ErrorResponse),
        (status = 404, description = "Invitation not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, ctx, client), fields(actor_id = %ctx.actor.id))]
pub async fn delete_invitation(
    State(state): State<Arc<AppState>>,
    ctx: ActorContext,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .services
        .invitations
        .delete_invitation(&ctx.actor, id)
        .await?;
    audit::log_invitation_event(AuditEventType::InvitationRevoked, Some(&ctx.actor), id, &client);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/invitations/lookup",
    tag = "invitations",
    params(LookupQuery),
    responses(
        (status = 200, description = "Invitation preview", body = InvitationPreview),
        (status = 404, description = "Unknown token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query))]
pub async fn lookup_invitation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LookupQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let preview = state
        .services
        .invitations
        .lookup_invitation(&query.token)
        .await?;
    Ok(Json(preview))
}

#[utoipa::path(
    post,
    path = "/api/v1/invitations/accept",
    tag = "invitations",
    request_body = AcceptInvitationRequest,
    responses(
        (status = 201, description = "Account created from the invitation", body = AccountOutcomeResponse),
        (status = 404, description = "Unknown token", body = ErrorResponse),
        (status = 409, description = "Invitation already used or expired", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, client, request))]
pub async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    ValidatedJson(request): ValidatedJson<AcceptInvitationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let outcome = state
        .services
        .invitations
        .accept_invitation(
            &request.token,
            &request.password,
            request.display_name.as_deref(),
        )
        .await?;
    audit::log_invitation_accepted(&outcome.value, &client);
    Ok((StatusCode::CREATED, Json(AccountOutcomeResponse::from(outcome))))
}
