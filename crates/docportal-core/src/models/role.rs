use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Account role. Closed set; capabilities per role live in [`crate::authorization`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Distributor,
    Installer,
    User,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Distributor, Role::Installer, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Distributor => "distributor",
            Role::Installer => "installer",
            Role::User => "user",
        }
    }

    /// Roles owned by a distributor organization through `managedUsers`.
    pub fn is_managed(&self) -> bool {
        matches!(self, Role::Installer | Role::User)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "distributor" => Ok(Role::Distributor),
            "installer" => Ok(Role::Installer),
            "user" => Ok(Role::User),
            other => Err(AppError::Validation(format!("Unknown role: {}", other))),
        }
    }
}

/// Roles an invitation may carry. Admins are never invited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InviteRole {
    Distributor,
    Installer,
    User,
}

impl InviteRole {
    pub fn as_role(&self) -> Role {
        match self {
            InviteRole::Distributor => Role::Distributor,
            InviteRole::Installer => Role::Installer,
            InviteRole::User => Role::User,
        }
    }
}

impl From<InviteRole> for Role {
    fn from(role: InviteRole) -> Self {
        role.as_role()
    }
}

impl TryFrom<Role> for InviteRole {
    type Error = AppError;

    fn try_from(role: Role) -> Result<Self, Self::Error> {
        match role {
            Role::Distributor => Ok(InviteRole::Distributor),
            Role::Installer => Ok(InviteRole::Installer),
            Role::User => Ok(InviteRole::User),
            Role::Admin => Err(AppError::Validation(
                "Admin accounts cannot be invited".to_string(),
            )),
        }
    }
}

impl Display for InviteRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.as_role().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert_eq!(" Installer ".parse::<Role>().unwrap(), Role::Installer);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_invite_role_rejects_admin() {
        assert!(InviteRole::try_from(Role::Admin).is_err());
        assert_eq!(
            InviteRole::try_from(Role::User).unwrap().as_role(),
            Role::User
        );
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Distributor).unwrap();
        assert_eq!(json, "\"distributor\"");
    }
}
