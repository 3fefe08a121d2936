use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::distributor::NewOrganization;
use super::role::InviteRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
}

/// Pending or terminated invitation. The token is the only credential needed to redeem it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: InviteRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Organization the invited distributor founds on acceptance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_organization: Option<NewOrganization>,
    pub inviter_id: Uuid,
    pub inviter_name: String,
    #[serde(default)]
    pub inviter_company: String,
    pub token: String,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Invitation {
    pub fn expiry_for(created_at: DateTime<Utc>, ttl_days: i64) -> DateTime<Utc> {
        created_at + Duration::days(ttl_days)
    }

    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Status as observed at `now`. Expiry is derived, so a stored `pending` past
    /// `expires_at` reads as `expired`. Accepted is terminal.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        match self.status {
            InvitationStatus::Accepted => InvitationStatus::Accepted,
            InvitationStatus::Expired => InvitationStatus::Expired,
            InvitationStatus::Pending if self.is_past_expiry(now) => InvitationStatus::Expired,
            InvitationStatus::Pending => InvitationStatus::Pending,
        }
    }
}

/// Invitation as shown to the inviter. The token is withheld.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitationSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: InviteRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_organization: Option<NewOrganization>,
    pub inviter_id: Uuid,
    pub inviter_name: String,
    pub inviter_company: String,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
}

impl InvitationSummary {
    pub fn observed(invitation: &Invitation, now: DateTime<Utc>) -> Self {
        Self {
            id: invitation.id,
            email: invitation.email.clone(),
            name: invitation.name.clone(),
            role: invitation.role,
            company_name: invitation.company_name.clone(),
            new_organization: invitation.new_organization.clone(),
            inviter_id: invitation.inviter_id,
            inviter_name: invitation.inviter_name.clone(),
            inviter_company: invitation.inviter_company.clone(),
            status: invitation.effective_status(now),
            created_at: invitation.created_at,
            expires_at: invitation.expires_at,
            accepted_at: invitation.accepted_at,
        }
    }
}

/// Public preview served to the acceptance page.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitationPreview {
    pub email: String,
    pub name: String,
    pub role: InviteRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_organization: Option<NewOrganization>,
    pub inviter_name: String,
    pub inviter_company: String,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
}

impl InvitationPreview {
    pub fn observed(invitation: &Invitation, now: DateTime<Utc>) -> Self {
        Self {
            email: invitation.email.clone(),
            name: invitation.name.clone(),
            role: invitation.role,
            company_name: invitation.company_name.clone(),
            new_organization: invitation.new_organization.clone(),
            inviter_name: invitation.inviter_name.clone(),
            inviter_company: invitation.inviter_company.clone(),
            status: invitation.effective_status(now),
            expires_at: invitation.expires_at,
        }
    }
}

/// Request to invite someone into the inviter's distributor network. A
/// distributor invitation carrying `newOrganization` founds that organization
/// instead of joining the inviter's team.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitationRequest {
    pub email: String,
    pub name: String,
    pub role: InviteRole,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub new_organization: Option<NewOrganization>,
}
