//! Route configuration and setup

use crate::api_doc;
use crate::auth::auth_middleware;
use crate::constants::{API_PREFIX, MAX_BODY_BYTES};
use crate::handlers;
use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, patch, post, put},
    Router,
};
use docportal_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa_rapidoc::RapiDoc;

const DEFAULT_CONCURRENCY_LIMIT: usize = 10_000;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let protected = protected_routes().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    let concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_CONCURRENCY_LIMIT)
        .max(1);

    let app = public_routes()
        .merge(protected)
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", api_doc::openapi()).path("/docs"))
        .layer(ConcurrencyLimitLayer::new(concurrency_limit))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any));
    }

    let origins = config
        .cors_origins()
        .iter()
        .map(|o| o.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(Any))
}

/// Public routes (no authentication required)
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            &format!("{}/auth/sign-in", API_PREFIX),
            post(handlers::auth::sign_in),
        )
        .route(
            &format!("{}/auth/password-reset", API_PREFIX),
            post(handlers::auth::request_password_reset),
        )
        .route(
            &format!("{}/auth/password-reset/confirm", API_PREFIX),
            post(handlers::auth::confirm_password_reset),
        )
        .route(
            &format!("{}/invitations/lookup", API_PREFIX),
            get(handlers::invitations::lookup_invitation),
        )
        .route(
            &format!("{}/invitations/accept", API_PREFIX),
            post(handlers::invitations::accept_invitation),
        )
}

/// Protected routes (require a session).
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(me_routes())
        .merge(account_routes())
        .merge(distributor_routes())
        .merge(invitation_routes())
}

fn me_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(&format!("{}/me", API_PREFIX), get(handlers::me::get_me))
        .route(
            &format!("{}/me/name", API_PREFIX),
            patch(handlers::me::update_my_name),
        )
        .route(
            &format!("{}/me/password", API_PREFIX),
            post(handlers::me::change_my_password),
        )
}

fn account_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/accounts", API_PREFIX),
            get(handlers::accounts::list_accounts).post(handlers::accounts::create_account),
        )
        .route(
            &format!("{}/accounts/delete", API_PREFIX),
            post(handlers::accounts::delete_account),
        )
        .route(
            &format!("{}/accounts/{{id}}", API_PREFIX),
            get(handlers::accounts::get_account).patch(handlers::accounts::update_account),
        )
        .route(
            &format!("{}/accounts/{{id}}/team-admin", API_PREFIX),
            put(handlers::accounts::set_team_admin),
        )
}

fn distributor_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/distributors", API_PREFIX),
            get(handlers::distributors::list_distributors),
        )
        .route(
            &format!("{}/distributors/{{id}}", API_PREFIX),
            get(handlers::distributors::get_distributor),
        )
}

fn invitation_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/invitations", API_PREFIX),
            get(handlers::invitations::list_invitations)
                .post(handlers::invitations::create_invitation),
        )
        .route(
            &format!("{}/invitations/{{id}}/resend", API_PREFIX),
            post(handlers::invitations::resend_invitation),
        )
        .route(
            &format!("{}/invitations/{{id}}", API_PREFIX),
            delete(handlers::invitations::delete_invitation),
        )
}
