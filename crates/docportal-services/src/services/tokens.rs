//! Opaque credentials handed out in links: invitation tokens and password reset tokens.

use docportal_core::constants::{
    ACCEPT_INVITATION_PATH, INVITATION_TOKEN_BYTES, RESET_PASSWORD_PATH, RESET_SECRET_BYTES,
};
use docportal_core::models::InviteRole;
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

fn random_hex(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    hex::encode(bytes)
}

/// 256-bit random invitation token, hex encoded.
pub fn generate_invitation_token() -> String {
    random_hex(INVITATION_TOKEN_BYTES)
}

/// Password reset token: `<reset id>.<secret>`. Only the secret's hash is persisted.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub reset_id: Uuid,
    pub secret: String,
}

impl ResetToken {
    pub fn generate() -> Self {
        Self {
            reset_id: Uuid::new_v4(),
            secret: random_hex(RESET_SECRET_BYTES),
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        let (id, secret) = token.trim().split_once('.')?;
        let reset_id = Uuid::parse_str(id).ok()?;
        if secret.is_empty() {
            return None;
        }
        Some(Self {
            reset_id,
            secret: secret.to_string(),
        })
    }

    pub fn secret_hash(&self) -> String {
        hash_secret(&self.secret)
    }

    /// Constant-time comparison against a stored hash.
    pub fn matches(&self, stored_hash: &str) -> bool {
        self.secret_hash()
            .as_bytes()
            .ct_eq(stored_hash.as_bytes())
            .into()
    }
}

impl std::fmt::Display for ResetToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.reset_id, self.secret)
    }
}

pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// `<base>/accept-invitation?token=<t>&role=<r>`
pub fn invitation_link(base_url: &str, token: &str, role: InviteRole) -> String {
    format!(
        "{}{}?token={}&role={}",
        base_url.trim_end_matches('/'),
        ACCEPT_INVITATION_PATH,
        token,
        role
    )
}

pub fn password_reset_link(base_url: &str, token: &ResetToken) -> String {
    format!(
        "{}{}?token={}",
        base_url.trim_end_matches('/'),
        RESET_PASSWORD_PATH,
        token
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invitation_tokens_are_long_and_distinct() {
        let a = generate_invitation_token();
        let b = generate_invitation_token();
        assert_eq!(a.len(), INVITATION_TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_invitation_link_shape() {
        let link = invitation_link("https://portal.example.com/", "abc", InviteRole::Installer);
        assert_eq!(
            link,
            "https://portal.example.com/accept-invitation?token=abc&role=installer"
        );
    }

    #[test]
    fn test_reset_token_parse_and_match() {
        let token = ResetToken::generate();
        let stored = token.secret_hash();
        let parsed = ResetToken::parse(&token.to_string()).unwrap();
        assert_eq!(parsed.reset_id, token.reset_id);
        assert!(parsed.matches(&stored));

        let forged = ResetToken {
            reset_id: token.reset_id,
            secret: "00".repeat(RESET_SECRET_BYTES),
        };
        assert!(!forged.matches(&stored));
    }

    #[test]
    fn test_reset_token_rejects_malformed() {
        assert!(ResetToken::parse("no-dot").is_none());
        assert!(ResetToken::parse("not-a-uuid.secret").is_none());
        assert!(ResetToken::parse(&format!("{}.", Uuid::new_v4())).is_none());
    }
}
