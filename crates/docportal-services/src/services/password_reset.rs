use chrono::{Duration, Utc};
use docportal_core::models::PasswordReset;
use docportal_core::validation::{validate_email, validate_password};
use docportal_core::AppError;
use docportal_db::Repositories;
use std::sync::Arc;

use super::identity::{IdentityError, IdentityProvider};
use super::notification::{NotificationSender, TemplateKind, TemplateVars};
use super::tokens::{password_reset_link, ResetToken};

/// Password reset by emailed single-use token.
#[derive(Clone)]
pub struct PasswordResetService {
    repos: Repositories,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn NotificationSender>,
    base_url: String,
    ttl_minutes: i64,
    password_min_length: usize,
}

impl PasswordResetService {
    pub fn new(
        repos: Repositories,
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn NotificationSender>,
        base_url: impl Into<String>,
        ttl_minutes: i64,
        password_min_length: usize,
    ) -> Self {
        Self {
            repos,
            identity,
            notifier,
            base_url: base_url.into(),
            ttl_minutes,
            password_min_length,
        }
    }

    /// Success-shaped whether or not the email belongs to an account.
    #[tracing::instrument(skip(self, email))]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let email = validate_email(email)?;
        let Some(account) = self.repos.accounts.find_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };
        if !account.active {
            tracing::debug!(account_id = %account.id, "Password reset requested for inactive account");
            return Ok(());
        }

        let token = ResetToken::generate();
        let now = Utc::now();
        let reset = PasswordReset {
            id: token.reset_id,
            account_id: account.id,
            secret_hash: token.secret_hash(),
            created_at: now,
            expires_at: now + Duration::minutes(self.ttl_minutes),
            used_at: None,
        };
        self.repos.password_resets.insert(&reset).await?;

        let vars: TemplateVars = [
            ("name", account.display_name.clone()),
            ("link", password_reset_link(&self.base_url, &token)),
            ("expires_in_minutes", self.ttl_minutes.to_string()),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
        if let Err(e) = self
            .notifier
            .send(TemplateKind::PasswordReset, &account.email, &vars)
            .await
        {
            tracing::error!(account_id = %account.id, error = %e, "Password reset email not delivered");
        } else {
            tracing::info!(account_id = %account.id, "Password reset issued");
        }
        Ok(())
    }

    /// Consume a reset token and set the new password.
    #[tracing::instrument(skip(self, token, new_password))]
    pub async fn complete_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        validate_password(new_password, self.password_min_length)?;
        let token = ResetToken::parse(token).ok_or(AppError::InvalidOrExpiredToken)?;
        let reset = self
            .repos
            .password_resets
            .find(token.reset_id)
            .await?
            .ok_or(AppError::InvalidOrExpiredToken)?;
        if !token.matches(&reset.secret_hash) || !reset.is_usable(Utc::now()) {
            return Err(AppError::InvalidOrExpiredToken);
        }

        if !self.repos.password_resets.mark_used(reset.id, Utc::now()).await? {
            return Err(AppError::InvalidOrExpiredToken);
        }
        match self.identity.set_password(reset.account_id, new_password).await {
            Ok(()) => {}
            Err(IdentityError::NotFound) => return Err(AppError::InvalidOrExpiredToken),
            Err(e) => return Err(e.into()),
        }
        tracing::info!(account_id = %reset.account_id, "Password reset completed");
        Ok(())
    }
}
