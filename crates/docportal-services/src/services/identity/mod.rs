//! Identity provider contract
//!
//! The identity provider owns credentials: it registers sign-in identities, verifies
//! passwords and session tokens, and issues the stable account id the portal keys
//! accounts by. Provisioning goes through it with service credentials, so an
//! acting administrator's session is never touched.

pub mod local;
pub mod password;

pub use local::LocalIdentityProvider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docportal_core::AppError;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Email already in use: {0}")]
    EmailAlreadyInUse(String),

    #[error("Weak password: {0}")]
    WeakPassword(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Current password does not match")]
    WrongCurrentPassword,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Identity not found")]
    NotFound,

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailAlreadyInUse(email) => AppError::DuplicateEmail(email),
            IdentityError::WeakPassword(msg) => AppError::WeakPassword(msg),
            IdentityError::InvalidEmail(msg) => AppError::InvalidEmail(msg),
            IdentityError::InvalidOrExpiredToken => AppError::InvalidOrExpiredToken,
            IdentityError::WrongCurrentPassword => AppError::WrongCurrentPassword,
            IdentityError::InvalidCredentials => {
                AppError::Unauthorized("Invalid email or password".to_string())
            }
            IdentityError::NotFound => AppError::NotFound("Identity not found".to_string()),
            IdentityError::Unavailable(msg) => AppError::IdentityProvider(msg),
        }
    }
}

/// Signed session issued on sign-in.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub account_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Registers a sign-in identity and returns its account id.
    async fn create_identity(&self, email: &str, password: &str) -> IdentityResult<Uuid>;

    /// Resolves a session token to the account id it was issued for.
    async fn verify_identity(&self, token: &str) -> IdentityResult<Uuid>;

    /// Removes the identity. `NotFound` when it is already gone.
    async fn delete_identity(&self, id: Uuid) -> IdentityResult<()>;

    async fn change_password(&self, id: Uuid, current: &str, new_password: &str)
        -> IdentityResult<()>;

    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<Session>;

    /// Sets a password without the current one (reset flow).
    async fn set_password(&self, id: Uuid, new_password: &str) -> IdentityResult<()>;

    fn provider_name(&self) -> &'static str;
}
