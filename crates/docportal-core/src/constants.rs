//! Portal-wide constants.

/// Invitations expire this many days after creation.
pub const DEFAULT_INVITATION_TTL_DAYS: i64 = 7;

pub const DEFAULT_PASSWORD_MIN_LENGTH: usize = 8;

/// Password reset links are valid for one hour.
pub const DEFAULT_PASSWORD_RESET_TTL_MINUTES: i64 = 60;

/// Random bytes behind an invitation token (hex encoded, 64 chars).
pub const INVITATION_TOKEN_BYTES: usize = 32;

/// Random bytes behind the secret half of a password reset token.
pub const RESET_SECRET_BYTES: usize = 32;

pub const ACCEPT_INVITATION_PATH: &str = "/accept-invitation";
pub const RESET_PASSWORD_PATH: &str = "/reset-password";

/// Record store collections.
pub mod collections {
    pub const USERS: &str = "users";
    pub const DISTRIBUTORS: &str = "distributors";
    pub const INVITATIONS: &str = "invitations";
    pub const IDENTITIES: &str = "identities";
    pub const PASSWORD_RESETS: &str = "password_resets";
}
