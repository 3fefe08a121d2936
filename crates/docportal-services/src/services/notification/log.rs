use async_trait::async_trait;

use super::templates::render;
use super::{NotificationError, NotificationSender, TemplateKind, TemplateVars};

/// Writes notifications to the log instead of delivering them. Bodies carry
/// credentials (invitation and reset links), so they only go out at debug level.
#[derive(Debug, Clone, Default)]
pub struct LogNotificationSender;

impl LogNotificationSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send(
        &self,
        kind: TemplateKind,
        to: &str,
        vars: &TemplateVars,
    ) -> Result<(), NotificationError> {
        let message = render(kind, vars);
        tracing::info!(template = %kind, to = %to, subject = %message.subject, "Notification (not delivered)");
        tracing::debug!(template = %kind, body = %message.body, "Notification body");
        Ok(())
    }

    fn sender_name(&self) -> &'static str {
        "log"
    }
}
