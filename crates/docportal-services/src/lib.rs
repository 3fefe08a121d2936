//! Document portal services layer
//!
//! Account lifecycle, invitations and password reset, plus the identity provider
//! and notification sender they call out to. The API crate depends on this
//! facade; HTTP handling stays there.

pub mod services;

pub use services::accounts::{AccountService, SignedIn};
pub use services::identity::{
    IdentityError, IdentityProvider, IdentityResult, LocalIdentityProvider, Session,
};
pub use services::invitations::InvitationService;
pub use services::notification::{
    create_notification_sender, LogNotificationSender, NotificationError, NotificationSender,
    SmtpNotificationSender, TemplateKind, TemplateVars,
};
pub use services::password_reset::PasswordResetService;

use docportal_core::Config;
use docportal_db::Repositories;
use docportal_store::RecordStore;
use std::sync::Arc;

/// Every portal service over one record store.
#[derive(Clone)]
pub struct PortalServices {
    pub accounts: AccountService,
    pub invitations: InvitationService,
    pub password_resets: PasswordResetService,
    pub identity: Arc<dyn IdentityProvider>,
    pub notifier: Arc<dyn NotificationSender>,
}

impl PortalServices {
    pub fn new(
        config: &Config,
        store: Arc<dyn RecordStore>,
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        let repos = Repositories::new(store);
        let accounts = AccountService::new(
            repos.clone(),
            identity.clone(),
            config.password_min_length(),
        );
        let invitations = InvitationService::new(
            repos.clone(),
            accounts.clone(),
            notifier.clone(),
            config.portal_base_url(),
            config.invitation_ttl_days(),
        );
        let password_resets = PasswordResetService::new(
            repos,
            identity.clone(),
            notifier.clone(),
            config.portal_base_url(),
            config.password_reset_ttl_minutes(),
            config.password_min_length(),
        );
        Self {
            accounts,
            invitations,
            password_resets,
            identity,
            notifier,
        }
    }

    /// Built-in identity provider and the configured notification sender.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self, NotificationError> {
        let identities = docportal_db::IdentityRepository::new(store.clone());
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(LocalIdentityProvider::from_config(config, identities));
        let notifier = create_notification_sender(config)?;
        tracing::info!(
            identity_provider = identity.provider_name(),
            notification_sender = notifier.sender_name(),
            "Portal services initialized"
        );
        Ok(Self::new(config, store, identity, notifier))
    }
}
