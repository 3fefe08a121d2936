use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use docportal_core::{AppError, ErrorKind, ErrorMetadata};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::auth::context::ActorContext;
use crate::error::HttpAppError;
use crate::middleware::audit;
use crate::state::AppState;
use crate::utils::client::ClientInfo;

const BEARER_PREFIX: &str = "Bearer ";

/// Resolves the Bearer session token to an active account and stores it as the
/// request's [`ActorContext`]. Failed attempts count against the client's limit.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let socket_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = ClientInfo::from_parts(
        request.headers(),
        socket_addr.as_ref(),
        state.trusted_proxy_count,
    );

    if state.auth_limiter.is_blocked(&client.ip).await {
        audit::log_rate_limit_exceeded(&client);
        return too_many_failures();
    }

    let header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());
    let token = match header.map(|h| h.strip_prefix(BEARER_PREFIX).map(str::trim)) {
        Some(Some(token)) if !token.is_empty() => token.to_string(),
        Some(_) => return reject(&state, &client, unauthorized("Invalid authorization header format")).await,
        None => return reject(&state, &client, unauthorized("Missing authorization header")).await,
    };

    let account = match state.services.accounts.authenticate(&token).await {
        Ok(account) => account,
        Err(err) if err.error_kind() == ErrorKind::Authentication => {
            return reject(&state, &client, err).await
        }
        Err(err) => return HttpAppError(err).into_response(),
    };
    if !account.active {
        return reject(&state, &client, unauthorized("Account is disabled")).await;
    }

    tracing::debug!(account_id = %account.id, role = %account.role, "Request authenticated");
    request.extensions_mut().insert(ActorContext::new(account));
    next.run(request).await
}

async fn reject(state: &AppState, client: &ClientInfo, err: AppError) -> Response {
    audit::log_authentication_attempt(None, client, false, Some(err.to_string()));
    if state.auth_limiter.record_failure(&client.ip).await {
        audit::log_rate_limit_exceeded(client);
    }
    HttpAppError(err).into_response()
}

fn unauthorized(message: &str) -> AppError {
    AppError::Unauthorized(message.to_string())
}

fn too_many_failures() -> Response {
    HttpAppError(AppError::TooManyRequests(
        "Too many failed authentication attempts".to_string(),
    ))
    .into_response()
}
