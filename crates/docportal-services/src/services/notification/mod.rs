//! Notification sender contract
//!
//! Messages are addressed by template kind plus a flat map of variables. Callers
//! treat delivery failure as non-fatal and surface it as a warning.

pub mod log;
pub mod smtp;
pub mod templates;

pub use self::log::LogNotificationSender;
pub use smtp::SmtpNotificationSender;
pub use templates::{render, RenderedMessage};

use async_trait::async_trait;
use docportal_core::models::InviteRole;
use docportal_core::{AppError, Config};
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    PasswordReset,
    InstallerInvitation,
    UserInvitation,
    DistributorInvitation,
    ShareNotification,
    Welcome,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::PasswordReset => "password-reset",
            TemplateKind::InstallerInvitation => "installer-invitation",
            TemplateKind::UserInvitation => "user-invitation",
            TemplateKind::DistributorInvitation => "distributor-invitation",
            TemplateKind::ShareNotification => "share-notification",
            TemplateKind::Welcome => "welcome",
        }
    }

    pub fn for_invitation(role: InviteRole) -> Self {
        match role {
            InviteRole::Installer => TemplateKind::InstallerInvitation,
            InviteRole::User => TemplateKind::UserInvitation,
            InviteRole::Distributor => TemplateKind::DistributorInvitation,
        }
    }
}

impl Display for TemplateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Flat string-keyed template variables.
pub type TemplateVars = HashMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Delivery failed: {0}")]
    Transport(String),

    #[error("Notification sender misconfigured: {0}")]
    Config(String),
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        AppError::Notification(err.to_string())
    }
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(
        &self,
        kind: TemplateKind,
        to: &str,
        vars: &TemplateVars,
    ) -> Result<(), NotificationError>;

    fn sender_name(&self) -> &'static str;
}

/// SMTP when email is enabled, otherwise a sender that only logs.
pub fn create_notification_sender(
    config: &Config,
) -> Result<Arc<dyn NotificationSender>, NotificationError> {
    match SmtpNotificationSender::from_config(config)? {
        Some(smtp) => Ok(Arc::new(smtp)),
        None => {
            tracing::info!("Email disabled; notifications are logged only");
            Ok(Arc::new(LogNotificationSender::new()))
        }
    }
}
