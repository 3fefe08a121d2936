use async_trait::async_trait;
use docportal_core::Config;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use super::templates::render;
use super::{NotificationError, NotificationSender, TemplateKind, TemplateVars};

/// Sends rendered templates as plain-text email over SMTP.
#[derive(Clone)]
pub struct SmtpNotificationSender {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpNotificationSender {
    /// `None` when email is disabled. Misconfigured SMTP settings are an error.
    pub fn from_config(config: &Config) -> Result<Option<Self>, NotificationError> {
        if !config.email_enabled() {
            tracing::debug!("Email disabled (EMAIL_ENABLED=false)");
            return Ok(None);
        }
        let host = config
            .smtp_host()
            .ok_or_else(|| NotificationError::Config("SMTP_HOST is not set".to_string()))?;
        let from: Mailbox = config
            .smtp_from()
            .ok_or_else(|| NotificationError::Config("SMTP_FROM is not set".to_string()))?
            .parse()
            .map_err(|e| NotificationError::Config(format!("Invalid SMTP_FROM: {}", e)))?;
        let port = config.smtp_port();
        let credentials = match (config.smtp_username(), config.smtp_password()) {
            (Some(user), Some(password)) => {
                Some(Credentials::new(user.to_string(), password.to_string()))
            }
            _ => None,
        };

        let builder = if config.smtp_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| NotificationError::Config(format!("Invalid SMTP relay: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let builder = builder.port(port);
        let builder = match credentials {
            Some(credentials) => builder.credentials(credentials),
            None => builder,
        };

        tracing::info!(
            host = %host,
            port = port,
            tls = config.smtp_tls(),
            "Notification sender initialized (SMTP)"
        );
        Ok(Some(Self {
            mailer: Arc::new(builder.build()),
            from,
        }))
    }
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    #[tracing::instrument(skip(self, vars), fields(template = %kind))]
    async fn send(
        &self,
        kind: TemplateKind,
        to: &str,
        vars: &TemplateVars,
    ) -> Result<(), NotificationError> {
        let to_addr: Mailbox = to
            .parse()
            .map_err(|_| NotificationError::InvalidRecipient(to.to_string()))?;
        let message = render(kind, vars);

        let email = Message::builder()
            .from(self.from.clone())
            .to(to_addr)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .map_err(|e| NotificationError::Build(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;
        tracing::info!(template = %kind, "Notification email sent");
        Ok(())
    }

    fn sender_name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_email_yields_no_sender() {
        let config = Config::default();
        assert!(!config.email_enabled());
        assert!(SmtpNotificationSender::from_config(&config).unwrap().is_none());
    }
}
