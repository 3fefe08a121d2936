//! Error types module
//!
//! All failures the portal core can report are unified under [`AppError`]. Each variant
//! self-describes how it is presented to clients through [`ErrorMetadata`], and belongs
//! to one [`ErrorKind`] of the portal's error taxonomy.

use std::io;

use serde::Serialize;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues and denied operations
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Error taxonomy shared by errors and non-fatal warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    RateLimited,
    Upstream,
    Cascade,
    Internal,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "DUPLICATE_EMAIL")
    fn error_code(&self) -> &'static str;

    /// Taxonomy bucket of the error
    fn error_kind(&self) -> ErrorKind;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Message shown to clients for every authorization denial except the last-admin rule.
pub const GENERIC_DENIAL_MESSAGE: &str = "You do not have permission to perform this operation";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Weak password: {0}")]
    WeakPassword(String),

    #[error("Current password does not match")]
    WrongCurrentPassword,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Operation would leave the organization without an admin")]
    LastAdmin,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invitation not found")]
    InvitationNotFound,

    #[error("Invitation expired")]
    InvitationExpired,

    #[error("Invitation already used")]
    InvitationAlreadyUsed,

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Identity deletion failed: {0}")]
    IdentityDeletionFailed(String),

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    #[error("Notification delivery failed: {0}")]
    Notification(String),

    #[error("Record store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Store(format!("Document (de)serialization failed: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Static metadata for each variant: (http_status, error_code, kind, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    ErrorKind,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    use ErrorKind as K;
    match err {
        AppError::Validation(_) => (
            400,
            "VALIDATION_ERROR",
            K::Validation,
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidEmail(_) => (
            400,
            "INVALID_EMAIL",
            K::Validation,
            false,
            Some("Provide a valid email address"),
            false,
            LogLevel::Debug,
        ),
        AppError::WeakPassword(_) => (
            400,
            "WEAK_PASSWORD",
            K::Validation,
            false,
            Some("Choose a longer password"),
            false,
            LogLevel::Debug,
        ),
        AppError::WrongCurrentPassword => (
            400,
            "WRONG_CURRENT_PASSWORD",
            K::Validation,
            false,
            Some("Re-enter your current password"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            K::Authentication,
            false,
            Some("Sign in and retry with a valid session token"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidOrExpiredToken => (
            401,
            "INVALID_OR_EXPIRED_TOKEN",
            K::Authentication,
            false,
            Some("Sign in again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "AUTHORIZATION_ERROR",
            K::Authorization,
            false,
            None,
            false,
            LogLevel::Warn,
        ),
        AppError::LastAdmin => (
            403,
            "LAST_ADMIN",
            K::Authorization,
            false,
            Some("Grant admin rights to another team member first"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            K::NotFound,
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::DuplicateEmail(_) => (
            409,
            "DUPLICATE_EMAIL",
            K::Conflict,
            false,
            Some("Use a different email address"),
            false,
            LogLevel::Debug,
        ),
        AppError::Conflict(_) => (
            409,
            "CONFLICT",
            K::Conflict,
            false,
            None,
            false,
            LogLevel::Debug,
        ),
        AppError::InvitationNotFound => (
            404,
            "INVITATION_NOT_FOUND",
            K::NotFound,
            false,
            Some("Check the invitation link"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvitationExpired => (
            409,
            "INVITATION_EXPIRED",
            K::Conflict,
            false,
            Some("Ask the inviter for a new invitation"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvitationAlreadyUsed => (
            409,
            "INVITATION_ALREADY_USED",
            K::Conflict,
            false,
            Some("Sign in with the account created from this invitation"),
            false,
            LogLevel::Debug,
        ),
        AppError::TooManyRequests(_) => (
            429,
            "TOO_MANY_REQUESTS",
            K::RateLimited,
            true,
            Some("Wait before retrying"),
            false,
            LogLevel::Warn,
        ),
        AppError::IdentityDeletionFailed(_) => (
            502,
            "IDENTITY_DELETION_FAILED",
            K::Upstream,
            true,
            Some("Retry the deletion; the account was left intact"),
            true,
            LogLevel::Error,
        ),
        AppError::IdentityProvider(_) => (
            502,
            "IDENTITY_PROVIDER_ERROR",
            K::Upstream,
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Notification(_) => (
            502,
            "NOTIFICATION_FAILED",
            K::Upstream,
            true,
            Some("Retry sending"),
            true,
            LogLevel::Warn,
        ),
        AppError::Store(_) => (
            500,
            "RECORD_STORE_ERROR",
            K::Internal,
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            K::Internal,
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Validation(_) => "Validation",
            AppError::InvalidEmail(_) => "InvalidEmail",
            AppError::WeakPassword(_) => "WeakPassword",
            AppError::WrongCurrentPassword => "WrongCurrentPassword",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::InvalidOrExpiredToken => "InvalidOrExpiredToken",
            AppError::Forbidden(_) => "Forbidden",
            AppError::LastAdmin => "LastAdmin",
            AppError::NotFound(_) => "NotFound",
            AppError::DuplicateEmail(_) => "DuplicateEmail",
            AppError::Conflict(_) => "Conflict",
            AppError::InvitationNotFound => "InvitationNotFound",
            AppError::InvitationExpired => "InvitationExpired",
            AppError::InvitationAlreadyUsed => "InvitationAlreadyUsed",
            AppError::TooManyRequests(_) => "TooManyRequests",
            AppError::IdentityDeletionFailed(_) => "IdentityDeletionFailed",
            AppError::IdentityProvider(_) => "IdentityProvider",
            AppError::Notification(_) => "Notification",
            AppError::Store(_) => "Store",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn error_kind(&self) -> ErrorKind {
        app_error_static_metadata(self).2
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).4
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).5
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).6
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(ref msg)
            | AppError::InvalidEmail(ref msg)
            | AppError::WeakPassword(ref msg)
            | AppError::Unauthorized(ref msg)
            | AppError::NotFound(ref msg)
            | AppError::Conflict(ref msg)
            | AppError::TooManyRequests(ref msg) => msg.clone(),
            AppError::WrongCurrentPassword => "Current password does not match".to_string(),
            AppError::InvalidOrExpiredToken => "Invalid or expired token".to_string(),
            AppError::Forbidden(_) => GENERIC_DENIAL_MESSAGE.to_string(),
            AppError::LastAdmin => {
                "The organization must keep at least one admin member".to_string()
            }
            AppError::DuplicateEmail(_) => "This email address is already registered".to_string(),
            AppError::InvitationNotFound => "Invitation not found".to_string(),
            AppError::InvitationExpired => "This invitation has expired".to_string(),
            AppError::InvitationAlreadyUsed => "This invitation has already been used".to_string(),
            AppError::IdentityDeletionFailed(_) => {
                "Failed to remove the account's sign-in identity".to_string()
            }
            AppError::IdentityProvider(_) => "Identity provider unavailable".to_string(),
            AppError::Notification(_) => "Failed to deliver notification".to_string(),
            AppError::Store(_) => "Failed to access record store".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_forbidden_hides_reason() {
        let err = AppError::Forbidden("actor outside target organization".to_string());
        assert_eq!(err.http_status_code(), 403);
        assert_eq!(err.error_code(), "AUTHORIZATION_ERROR");
        assert_eq!(err.error_kind(), ErrorKind::Authorization);
        assert_eq!(err.client_message(), GENERIC_DENIAL_MESSAGE);
        assert!(err.to_string().contains("outside target organization"));
    }

    #[test]
    fn test_error_metadata_last_admin_names_itself() {
        let err = AppError::LastAdmin;
        assert_eq!(err.http_status_code(), 403);
        assert_eq!(err.error_code(), "LAST_ADMIN");
        assert!(err.client_message().contains("at least one admin"));
    }

    #[test]
    fn test_error_metadata_invitation_states() {
        for (err, code) in [
            (AppError::InvitationExpired, "INVITATION_EXPIRED"),
            (AppError::InvitationAlreadyUsed, "INVITATION_ALREADY_USED"),
        ] {
            assert_eq!(err.http_status_code(), 409);
            assert_eq!(err.error_code(), code);
            assert_eq!(err.error_kind(), ErrorKind::Conflict);
        }
        assert_eq!(AppError::InvitationNotFound.http_status_code(), 404);
    }

    #[test]
    fn test_error_metadata_store_is_sensitive() {
        let err = AppError::Store("connection refused".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Failed to access record store");
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_wrong_current_password_is_validation() {
        let err = AppError::WrongCurrentPassword;
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_detailed_message_walks_source_chain() {
        let inner = anyhow::anyhow!("socket closed").context("sending welcome");
        let err = AppError::from(inner);
        assert_eq!(err.error_type(), "Internal");
        assert!(err.detailed_message().contains("socket closed"));
    }
}
