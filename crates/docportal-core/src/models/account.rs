use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::distributor::NewOrganization;
use super::role::Role;

/// Portal account. `id` equals the identity provider's account id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distributor_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_distributor_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_users: Option<Vec<Uuid>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

impl Account {
    /// Organization the account belongs to, for distributor team members and
    /// for installer/user accounts alike.
    pub fn organization_id(&self) -> Option<Uuid> {
        match self.role {
            Role::Admin => None,
            _ => self.distributor_id,
        }
    }

    pub fn is_org_admin(&self) -> bool {
        self.role == Role::Distributor && self.is_distributor_admin.unwrap_or(false)
    }

    pub fn managed_users(&self) -> &[Uuid] {
        self.managed_users.as_deref().unwrap_or(&[])
    }
}

/// Input to account provisioning, shared by direct creation and invitation acceptance.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountInput {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub role: Role,
    /// Existing organization to attach to.
    #[serde(default)]
    pub distributor_id: Option<Uuid>,
    /// Organization to create, with the new distributor account as its first admin.
    #[serde(default)]
    pub new_organization: Option<NewOrganization>,
    #[serde(default)]
    pub company_name: Option<String>,
    /// Also add a new distributor team member to `adminMembers`.
    #[serde(default)]
    pub grant_team_admin: bool,
}

/// Fields an account update may touch.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.role.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(role: Role) -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            display_name: "A".to_string(),
            role,
            active: true,
            created_at: Utc::now(),
            last_login: None,
            created_by: None,
            distributor_id: Some(Uuid::new_v4()),
            is_distributor_admin: Some(true),
            managed_users: None,
            company_name: None,
        }
    }

    #[test]
    fn test_org_admin_requires_distributor_role() {
        assert!(account(Role::Distributor).is_org_admin());
        assert!(!account(Role::Installer).is_org_admin());
    }

    #[test]
    fn test_admin_has_no_organization() {
        assert!(account(Role::Admin).organization_id().is_none());
        assert!(account(Role::User).organization_id().is_some());
    }

    #[test]
    fn test_create_input_defaults() {
        let input: CreateAccountInput = serde_json::from_value(serde_json::json!({
            "email": "i@example.com",
            "password": "longenough",
            "displayName": "Inst",
            "role": "installer"
        }))
        .unwrap();
        assert!(input.distributor_id.is_none());
        assert!(input.new_organization.is_none());
        assert!(!input.grant_team_admin);
    }

    #[test]
    fn test_account_document_omits_absent_tenancy() {
        let mut a = account(Role::Admin);
        a.distributor_id = None;
        a.is_distributor_admin = None;
        let doc = serde_json::to_value(&a).unwrap();
        assert!(doc.get("distributorId").is_none());
        assert!(doc.get("managedUsers").is_none());
        assert_eq!(doc["displayName"], "A");
        assert!(doc["lastLogin"].is_null());
    }
}
