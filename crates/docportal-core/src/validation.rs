//! Input validation shared by provisioning, invitations and self-service.

use validator::ValidateEmail;

use crate::error::AppError;

pub const MAX_DISPLAY_NAME_LENGTH: usize = 120;
pub const MAX_COMPANY_NAME_LENGTH: usize = 200;
pub const MAX_PASSWORD_LENGTH: usize = 256;

/// Lowercased, trimmed email used as the identity key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates and normalizes an email address.
pub fn validate_email(email: &str) -> Result<String, AppError> {
    let normalized = normalize_email(email);
    if normalized.is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }
    if !normalized.validate_email() {
        return Err(AppError::InvalidEmail(format!(
            "'{}' is not a valid email address",
            normalized
        )));
    }
    Ok(normalized)
}

/// Validates a display name and returns it trimmed.
pub fn validate_display_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("displayName is required".to_string()));
    }
    if trimmed.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "displayName must be at most {} characters",
            MAX_DISPLAY_NAME_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_company_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("companyName is required".to_string()));
    }
    if trimmed.chars().count() > MAX_COMPANY_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "companyName must be at most {} characters",
            MAX_COMPANY_NAME_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

/// Password policy: presence plus minimum and maximum length.
pub fn validate_password(password: &str, min_length: usize) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }
    let length = password.chars().count();
    if length < min_length {
        return Err(AppError::WeakPassword(format!(
            "password must be at least {} characters",
            min_length
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(AppError::WeakPassword(format!(
            "password must be at most {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
