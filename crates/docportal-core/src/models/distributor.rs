use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Distributor organization. Invariant: `admin_members ⊆ team_members`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Distributor {
    pub id: Uuid,
    pub company_name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub address: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub team_members: Vec<Uuid>,
    #[serde(default)]
    pub admin_members: Vec<Uuid>,
}

impl Distributor {
    /// Organization founded by `founder`, who becomes its sole team and admin member.
    pub fn founded_by(
        id: Uuid,
        founder: Uuid,
        details: NewOrganization,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            company_name: details.company_name,
            contact_email: details.contact_email.unwrap_or_default(),
            contact_phone: details.contact_phone.unwrap_or_default(),
            address: details.address.unwrap_or_default(),
            active: true,
            created_at: now,
            team_members: vec![founder],
            admin_members: vec![founder],
        }
    }

    pub fn is_admin_member(&self, account_id: Uuid) -> bool {
        self.admin_members.contains(&account_id)
    }

    /// True when `account_id` is the only entry of `admin_members`.
    pub fn is_last_admin(&self, account_id: Uuid) -> bool {
        self.admin_members.len() == 1 && self.admin_members[0] == account_id
    }

    /// First admin member other than `excluding`, used to re-home managed accounts.
    pub fn first_admin_except(&self, excluding: Uuid) -> Option<Uuid> {
        self.admin_members.iter().copied().find(|id| *id != excluding)
    }
}

/// Details for an organization created together with its first distributor account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewOrganization {
    pub company_name: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}
