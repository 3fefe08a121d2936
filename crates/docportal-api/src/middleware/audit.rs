//! Security audit logging
//!
//! Structured records for security-relevant events, emitted on the `audit` tracing
//! target as one serialized JSON entry each:
//! - Sign-in attempts and session rejections
//! - Account provisioning and deletion
//! - Role and team-admin changes
//! - Invitations issued, accepted and revoked
//! - Password resets
//! - Failed-auth lockouts

use docportal_core::models::{Account, OperationWarning, Role};
use docportal_core::Actor;
use serde::Serialize;
use uuid::Uuid;

use crate::utils::client::ClientInfo;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    AuthenticationSuccess,
    AuthenticationFailure,
    AccountCreated,
    AccountDeleted,
    PermissionChanged,
    InvitationIssued,
    InvitationAccepted,
    InvitationRevoked,
    PasswordResetRequested,
    PasswordResetCompleted,
    PasswordChanged,
    RateLimitExceeded,
}

/// Structured audit log entry
#[derive(Debug, Serialize)]
pub struct AuditLogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub event_type: AuditEventType,
    /// Account performing the operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_role: Option<Role>,
    /// Account or invitation the operation applied to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributor_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AuditLogEntry {
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            event_type,
            actor_id: None,
            actor_role: None,
            target_id: None,
            distributor_id: None,
            client_ip: None,
            user_agent: None,
            details: None,
            success: true,
            error_message: None,
        }
    }

    pub fn with_actor(mut self, actor: &Actor) -> Self {
        self.actor_id = Some(actor.id);
        self.actor_role = Some(actor.role);
        self
    }

    pub fn with_target(mut self, target_id: Uuid) -> Self {
        self.target_id = Some(target_id);
        self
    }

    pub fn with_distributor(mut self, distributor_id: Option<Uuid>) -> Self {
        self.distributor_id = distributor_id;
        self
    }

    pub fn with_client(mut self, client: &ClientInfo) -> Self {
        self.client_ip = Some(client.ip.clone());
        self.user_agent = client.user_agent.clone();
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_failure(mut self, error_message: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = Some(error_message.into());
        self
    }

    /// Emit on the `audit` target: INFO for successes, WARN for failures.
    pub fn log(&self) {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());

        if self.success {
            tracing::event!(
                target: "audit",
                tracing::Level::INFO,
                audit_entry = %json,
                event_type = ?self.event_type,
                actor_id = ?self.actor_id,
                target_id = ?self.target_id,
                success = self.success,
                "Security audit log"
            );
        } else {
            tracing::event!(
                target: "audit",
                tracing::Level::WARN,
                audit_entry = %json,
                event_type = ?self.event_type,
                actor_id = ?self.actor_id,
                target_id = ?self.target_id,
                success = self.success,
                error = ?self.error_message,
                "Security audit log - failure"
            );
        }
    }
}

fn warning_codes(warnings: &[OperationWarning]) -> Vec<&str> {
    warnings.iter().map(|w| w.code.as_str()).collect()
}

pub fn log_authentication_attempt(
    account_id: Option<Uuid>,
    client: &ClientInfo,
    success: bool,
    error_message: Option<String>,
) {
    let event_type = if success {
        AuditEventType::AuthenticationSuccess
    } else {
        AuditEventType::AuthenticationFailure
    };
    let mut entry = AuditLogEntry::new(event_type).with_client(client);
    if let Some(id) = account_id {
        entry = entry.with_target(id);
    }
    if let Some(error) = error_message {
        entry = entry.with_failure(error);
    }
    entry.log();
}

pub fn log_account_created(actor: &Actor, account: &Account, client: &ClientInfo) {
    AuditLogEntry::new(AuditEventType::AccountCreated)
        .with_actor(actor)
        .with_target(account.id)
        .with_distributor(account.organization_id())
        .with_client(client)
        .with_details(serde_json::json!({ "role": account.role }))
        .log();
}

pub fn log_account_deleted(
    actor: &Actor,
    account: &Account,
    warnings: &[OperationWarning],
    client: &ClientInfo,
) {
    AuditLogEntry::new(AuditEventType::AccountDeleted)
        .with_actor(actor)
        .with_target(account.id)
        .with_distributor(account.organization_id())
        .with_client(client)
        .with_details(serde_json::json!({
            "role": account.role,
            "warnings": warning_codes(warnings),
        }))
        .log();
}

pub fn log_permission_changed(
    actor: &Actor,
    account: &Account,
    change: serde_json::Value,
    client: &ClientInfo,
) {
    AuditLogEntry::new(AuditEventType::PermissionChanged)
        .with_actor(actor)
        .with_target(account.id)
        .with_distributor(account.organization_id())
        .with_client(client)
        .with_details(change)
        .log();
}

pub fn log_invitation_event(
    event_type: AuditEventType,
    actor: Option<&Actor>,
    invitation_id: Uuid,
    client: &ClientInfo,
) {
    let mut entry = AuditLogEntry::new(event_type)
        .with_target(invitation_id)
        .with_client(client);
    if let Some(actor) = actor {
        entry = entry.with_actor(actor);
    }
    entry.log();
}

pub fn log_invitation_accepted(account: &Account, client: &ClientInfo) {
    AuditLogEntry::new(AuditEventType::InvitationAccepted)
        .with_target(account.id)
        .with_distributor(account.organization_id())
        .with_client(client)
        .with_details(serde_json::json!({ "role": account.role }))
        .log();
}

/// The account is never named here: a request for an unknown email looks the same.
pub fn log_password_reset_requested(client: &ClientInfo) {
    AuditLogEntry::new(AuditEventType::PasswordResetRequested)
        .with_client(client)
        .log();
}

pub fn log_password_reset_completed(client: &ClientInfo, error_message: Option<String>) {
    let mut entry = AuditLogEntry::new(AuditEventType::PasswordResetCompleted).with_client(client);
    if let Some(error) = error_message {
        entry = entry.with_failure(error);
    }
    entry.log();
}

pub fn log_password_changed(actor: &Actor, client: &ClientInfo) {
    AuditLogEntry::new(AuditEventType::PasswordChanged)
        .with_actor(actor)
        .with_target(actor.id)
        .with_client(client)
        .log();
}

pub fn log_rate_limit_exceeded(client: &ClientInfo) {
    AuditLogEntry::new(AuditEventType::RateLimitExceeded)
        .with_client(client)
        .with_failure("Too many failed authentication attempts")
        .log();
}
