use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use docportal_core::models::Account;
use docportal_core::{Actor, AppError};

use crate::error::HttpAppError;

/// The authenticated account behind a request, reloaded from the record store on
/// every request so role and tenancy changes apply immediately.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub actor: Actor,
    pub account: Account,
}

impl ActorContext {
    pub fn new(account: Account) -> Self {
        Self {
            actor: Actor::from_account(&account),
            account,
        }
    }
}

impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ActorContext>()
            .cloned()
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Authentication required".to_string())))
    }
}
