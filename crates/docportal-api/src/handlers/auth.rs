//! Sign-in and password reset handlers (public routes)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use docportal_core::models::Account;
use docportal_core::{AppError, ErrorKind, ErrorMetadata};
use docportal_infra::ErrorResponse;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{HttpAppError, ValidatedJson};
use crate::handlers::MessageResponse;
use crate::middleware::audit;
use crate::state::AppState;
use crate::utils::client::ClientInfo;

/// Shown for every reset request so it never reveals whether the email exists.
pub const RESET_REQUESTED_MESSAGE: &str =
    "If an account exists for that email, a password reset link has been sent";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignInRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    /// Bearer token for authenticated routes
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub account: Account,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordResetRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPasswordResetRequest {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
    pub new_password: String,
}

async fn ensure_not_blocked(state: &AppState, client: &ClientInfo) -> Result<(), HttpAppError> {
    if state.auth_limiter.is_blocked(&client.ip).await {
        audit::log_rate_limit_exceeded(client);
        return Err(HttpAppError(AppError::TooManyRequests(
            "Too many failed authentication attempts".to_string(),
        )));
    }
    Ok(())
}

/// Counts authentication-kind failures against the client.
async fn note_failure(state: &AppState, client: &ClientInfo, err: &AppError) {
    if err.error_kind() == ErrorKind::Authentication
        && state.auth_limiter.record_failure(&client.ip).await
    {
        audit::log_rate_limit_exceeded(client);
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-in",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 429, description = "Too many failed attempts", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, client, request))]
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    ValidatedJson(request): ValidatedJson<SignInRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    ensure_not_blocked(&state, &client).await?;

    match state
        .services
        .accounts
        .sign_in(&request.email, &request.password)
        .await
    {
        Ok(signed_in) => {
            state.auth_limiter.clear(&client.ip).await;
            audit::log_authentication_attempt(Some(signed_in.account.id), &client, true, None);
            Ok(Json(SignInResponse {
                token: signed_in.session.token,
                expires_at: signed_in.session.expires_at,
                account: signed_in.account,
            }))
        }
        Err(err) => {
            audit::log_authentication_attempt(None, &client, false, Some(err.to_string()));
            note_failure(&state, &client, &err).await;
            Err(err.into())
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset",
    tag = "auth",
    request_body = PasswordResetRequest,
    responses(
        (status = 202, description = "Reset link sent if the account exists", body = MessageResponse),
        (status = 400, description = "Malformed email", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, client, request))]
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    ValidatedJson(request): ValidatedJson<PasswordResetRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    state
        .services
        .password_resets
        .request_password_reset(&request.email)
        .await?;
    audit::log_password_reset_requested(&client);
    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new(RESET_REQUESTED_MESSAGE)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset/confirm",
    tag = "auth",
    request_body = ConfirmPasswordResetRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Password does not meet the policy", body = ErrorResponse),
        (status = 401, description = "Invalid or expired token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, client, request))]
pub async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    ValidatedJson(request): ValidatedJson<ConfirmPasswordResetRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    ensure_not_blocked(&state, &client).await?;

    if let Err(err) = state
        .services
        .password_resets
        .complete_password_reset(&request.token, &request.new_password)
        .await
    {
        audit::log_password_reset_completed(&client, Some(err.to_string()));
        note_failure(&state, &client, &err).await;
        return Err(err.into());
    }
    audit::log_password_reset_completed(&client, None);
    Ok(Json(MessageResponse::new("Password updated; sign in again")))
}
