//! Authorization engine
//!
//! [`can_perform`] is a pure decision function: given the acting account, an
//! operation and a description of the target, it answers allow or deny. It performs
//! no I/O. Facts that require reads (such as whether the target is the last admin of
//! its organization) are resolved by the caller and passed in on the target.
//!
//! Role capabilities live in one table, [`capabilities`], keyed by role and the
//! organization-admin flag. The match over `(Role, bool)` is exhaustive, so a new role
//! does not compile until its row is written.

use std::fmt::{Display, Formatter, Result as FmtResult};

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Account, Distributor, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Invite,
    /// Non-role attributes: display name, password.
    Update,
    ChangeRole,
    Delete,
    /// Grant or revoke organization admin membership.
    ManageTeamAdmins,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Invite => "invite",
            Operation::Update => "update",
            Operation::ChangeRole => "change_role",
            Operation::Delete => "delete",
            Operation::ManageTeamAdmins => "manage_team_admins",
        };
        f.write_str(name)
    }
}

/// The account performing an operation, passed explicitly to every check.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub active: bool,
    pub distributor_id: Option<Uuid>,
    pub is_distributor_admin: bool,
}

impl Actor {
    pub fn from_account(account: &Account) -> Self {
        Self {
            id: account.id,
            role: account.role,
            active: account.active,
            distributor_id: account.organization_id(),
            is_distributor_admin: account.is_org_admin(),
        }
    }
}

impl From<&Account> for Actor {
    fn from(account: &Account) -> Self {
        Actor::from_account(account)
    }
}

/// Account-shaped target. `id` is `None` when the account does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountTarget {
    pub id: Option<Uuid>,
    pub role: Role,
    pub distributor_id: Option<Uuid>,
    pub new_role: Option<Role>,
    pub removes_last_admin: bool,
}

impl AccountTarget {
    pub fn prospective(role: Role, distributor_id: Option<Uuid>) -> Self {
        Self {
            id: None,
            role,
            distributor_id,
            new_role: None,
            removes_last_admin: false,
        }
    }

    pub fn existing(account: &Account) -> Self {
        Self {
            id: Some(account.id),
            role: account.role,
            distributor_id: account.organization_id(),
            new_role: None,
            removes_last_admin: false,
        }
    }

    pub fn with_new_role(mut self, role: Role) -> Self {
        self.new_role = Some(role);
        self
    }

    /// Marks the operation as one that would leave the target's organization
    /// without an admin member.
    pub fn removing_last_admin(mut self, removes: bool) -> Self {
        self.removes_last_admin = removes;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target<'a> {
    Account(AccountTarget),
    Distributor { id: Uuid },
    /// Role-gated document visibility.
    Document { access_roles: &'a [Role] },
}

impl Target<'_> {
    pub fn account(account: &Account) -> Self {
        Target::Account(AccountTarget::existing(account))
    }

    pub fn distributor(distributor: &Distributor) -> Self {
        Target::Distributor { id: distributor.id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    InactiveActor,
    NotPermitted { role: Role, operation: Operation },
    OutsideOrganization,
    RoleOutOfScope(Role),
    NotOwnAccount,
    DocumentRoleNotPermitted(Role),
    LastAdmin,
}

impl Display for DenyReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DenyReason::InactiveActor => write!(f, "actor account is inactive"),
            DenyReason::NotPermitted { role, operation } => {
                write!(f, "role {} may not {}", role, operation)
            }
            DenyReason::OutsideOrganization => {
                write!(f, "target is outside the actor's organization")
            }
            DenyReason::RoleOutOfScope(role) => {
                write!(f, "role {} is not manageable by the actor", role)
            }
            DenyReason::NotOwnAccount => write!(f, "target is not the actor's own account"),
            DenyReason::DocumentRoleNotPermitted(role) => {
                write!(f, "document is not visible to role {}", role)
            }
            DenyReason::LastAdmin => write!(f, "would remove the organization's last admin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Converts a denial into the error surfaced to callers. Only the last-admin
    /// rule keeps a specific client message.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::LastAdmin) => Err(AppError::LastAdmin),
            Decision::Deny(reason) => Err(AppError::Forbidden(reason.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Any account or organization.
    Any,
    /// Accounts of the actor's organization whose role (and new role) is listed.
    Organization(&'static [Role]),
    /// The actor's organization record.
    OwnOrganization,
    /// The actor's own account, role untouched.
    OwnAccount,
    /// A distributor account founding an organization that does not exist yet.
    NewOrganization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    pub operation: Operation,
    pub scope: Scope,
}

const fn cap(operation: Operation, scope: Scope) -> Capability {
    Capability { operation, scope }
}

const TEAM_ROLES: &[Role] = &[Role::Distributor, Role::Installer, Role::User];
const MANAGED_ROLES: &[Role] = &[Role::Installer, Role::User];
const DISTRIBUTOR_ROLE: &[Role] = &[Role::Distributor];

const ADMIN_CAPABILITIES: &[Capability] = &[
    cap(Operation::Read, Scope::Any),
    cap(Operation::Create, Scope::Any),
    cap(Operation::Invite, Scope::Any),
    cap(Operation::Update, Scope::Any),
    cap(Operation::ChangeRole, Scope::Any),
    cap(Operation::Delete, Scope::Any),
    cap(Operation::ManageTeamAdmins, Scope::Any),
];

const ORG_ADMIN_CAPABILITIES: &[Capability] = &[
    cap(Operation::Read, Scope::OwnOrganization),
    cap(Operation::Read, Scope::OwnAccount),
    cap(Operation::Read, Scope::Organization(TEAM_ROLES)),
    cap(Operation::Update, Scope::OwnAccount),
    cap(Operation::Update, Scope::Organization(TEAM_ROLES)),
    cap(Operation::Create, Scope::Organization(TEAM_ROLES)),
    cap(Operation::Invite, Scope::Organization(TEAM_ROLES)),
    cap(Operation::Invite, Scope::NewOrganization),
    cap(Operation::ChangeRole, Scope::Organization(MANAGED_ROLES)),
    cap(Operation::Delete, Scope::Organization(TEAM_ROLES)),
    cap(Operation::ManageTeamAdmins, Scope::Organization(DISTRIBUTOR_ROLE)),
];

const TEAM_MEMBER_CAPABILITIES: &[Capability] = &[
    cap(Operation::Read, Scope::OwnOrganization),
    cap(Operation::Read, Scope::OwnAccount),
    cap(Operation::Read, Scope::Organization(TEAM_ROLES)),
    cap(Operation::Update, Scope::OwnAccount),
];

const MANAGED_CAPABILITIES: &[Capability] = &[
    cap(Operation::Read, Scope::OwnAccount),
    cap(Operation::Update, Scope::OwnAccount),
];

/// Capability table: role × organization-admin flag → (operation, scope) rows.
pub fn capabilities(role: Role, org_admin: bool) -> &'static [Capability] {
    match (role, org_admin) {
        (Role::Admin, _) => ADMIN_CAPABILITIES,
        (Role::Distributor, true) => ORG_ADMIN_CAPABILITIES,
        (Role::Distributor, false) => TEAM_MEMBER_CAPABILITIES,
        (Role::Installer, _) | (Role::User, _) => MANAGED_CAPABILITIES,
    }
}

fn scope_admits(scope: Scope, actor: &Actor, target: &Target<'_>) -> Result<(), DenyReason> {
    match (scope, target) {
        (Scope::Any, Target::Account(_)) | (Scope::Any, Target::Distributor { .. }) => Ok(()),
        (Scope::OwnOrganization, Target::Distributor { id }) => {
            if actor.distributor_id == Some(*id) {
                Ok(())
            } else {
                Err(DenyReason::OutsideOrganization)
            }
        }
        (Scope::OwnAccount, Target::Account(account)) => {
            if account.id != Some(actor.id) {
                Err(DenyReason::NotOwnAccount)
            } else if account.new_role.is_some() {
                Err(DenyReason::RoleOutOfScope(account.role))
            } else {
                Ok(())
            }
        }
        (Scope::Organization(roles), Target::Account(account)) => {
            let same_org =
                actor.distributor_id.is_some() && account.distributor_id == actor.distributor_id;
            if !same_org {
                return Err(DenyReason::OutsideOrganization);
            }
            if !roles.contains(&account.role) {
                return Err(DenyReason::RoleOutOfScope(account.role));
            }
            match account.new_role {
                Some(new_role) if !roles.contains(&new_role) => {
                    Err(DenyReason::RoleOutOfScope(new_role))
                }
                _ => Ok(()),
            }
        }
        (Scope::NewOrganization, Target::Account(account)) => {
            let founding = account.id.is_none()
                && account.distributor_id.is_none()
                && account.role == Role::Distributor;
            if founding {
                Ok(())
            } else {
                Err(DenyReason::OutsideOrganization)
            }
        }
        (_, Target::Account(_)) => Err(DenyReason::NotOwnAccount),
        (_, Target::Distributor { .. }) => Err(DenyReason::OutsideOrganization),
        (_, Target::Document { .. }) => Err(DenyReason::DocumentRoleNotPermitted(actor.role)),
    }
}

fn removes_admin(operation: Operation, target: &Target<'_>) -> bool {
    matches!(
        operation,
        Operation::Delete | Operation::ChangeRole | Operation::ManageTeamAdmins
    ) && matches!(target, Target::Account(account) if account.removes_last_admin)
}

/// Decides whether `actor` may perform `operation` on `target`. Default deny.
pub fn can_perform(actor: &Actor, operation: Operation, target: &Target<'_>) -> Decision {
    if !actor.active {
        return Decision::Deny(DenyReason::InactiveActor);
    }

    if let Target::Document { access_roles } = target {
        return match operation {
            Operation::Read if access_roles.contains(&actor.role) => Decision::Allow,
            Operation::Read => Decision::Deny(DenyReason::DocumentRoleNotPermitted(actor.role)),
            _ => Decision::Deny(DenyReason::NotPermitted {
                role: actor.role,
                operation,
            }),
        };
    }

    let org_admin = actor.is_distributor_admin && actor.role == Role::Distributor;
    let rows = capabilities(actor.role, org_admin);
    let mut first_denial = None;
    let mut allowed = false;
    for row in rows.iter().filter(|row| row.operation == operation) {
        match scope_admits(row.scope, actor, target) {
            Ok(()) => {
                allowed = true;
                break;
            }
            Err(reason) => {
                first_denial.get_or_insert(reason);
            }
        }
    }

    if !allowed {
        return Decision::Deny(first_denial.unwrap_or(DenyReason::NotPermitted {
            role: actor.role,
            operation,
        }));
    }

    if removes_admin(operation, target) {
        return Decision::Deny(DenyReason::LastAdmin);
    }

    Decision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, org: Option<Uuid>, org_admin: bool) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
            active: true,
            distributor_id: org,
            is_distributor_admin: org_admin,
        }
    }

    fn in_org(role: Role, org: Uuid) -> Target<'static> {
        Target::Account(AccountTarget {
            id: Some(Uuid::new_v4()),
            role,
            distributor_id: Some(org),
            new_role: None,
            removes_last_admin: false,
        })
    }

    #[test]
    fn test_admin_may_do_anything_on_accounts_and_distributors() {
        let admin = actor(Role::Admin, None, false);
        let org = Uuid::new_v4();
        for op in [
            Operation::Read,
            Operation::Create,
            Operation::Update,
            Operation::ChangeRole,
            Operation::Delete,
        ] {
            assert!(can_perform(&admin, op, &in_org(Role::Installer, org)).is_allowed());
        }
        let distributor = Target::Distributor { id: org };
        assert!(can_perform(&admin, Operation::Read, &distributor).is_allowed());
    }

    #[test]
    fn test_org_admin_manages_own_org_only() {
        let org = Uuid::new_v4();
        let d = actor(Role::Distributor, Some(org), true);
        let create = Target::Account(AccountTarget::prospective(Role::Installer, Some(org)));
        assert!(can_perform(&d, Operation::Create, &create).is_allowed());

        let other = Target::Account(AccountTarget::prospective(
            Role::Installer,
            Some(Uuid::new_v4()),
        ));
        assert_eq!(
            can_perform(&d, Operation::Create, &other),
            Decision::Deny(DenyReason::OutsideOrganization)
        );
    }

    #[test]
    fn test_org_admin_may_not_create_admins_or_escalate() {
        let org = Uuid::new_v4();
        let d = actor(Role::Distributor, Some(org), true);
        let admin_target = Target::Account(AccountTarget::prospective(Role::Admin, Some(org)));
        assert!(!can_perform(&d, Operation::Create, &admin_target).is_allowed());

        let escalate = Target::Account(AccountTarget {
            new_role: Some(Role::Admin),
            ..AccountTarget::prospective(Role::Installer, Some(org))
        });
        assert_eq!(
            can_perform(&d, Operation::ChangeRole, &escalate),
            Decision::Deny(DenyReason::RoleOutOfScope(Role::Admin))
        );

        let swap = Target::Account(AccountTarget {
            new_role: Some(Role::User),
            ..AccountTarget::prospective(Role::Installer, Some(org))
        });
        assert!(can_perform(&d, Operation::ChangeRole, &swap).is_allowed());
    }

    #[test]
    fn test_org_admin_may_invite_but_not_create_a_new_organization_founder() {
        let org = Uuid::new_v4();
        let d = actor(Role::Distributor, Some(org), true);
        let founder = Target::Account(AccountTarget::prospective(Role::Distributor, None));
        assert!(can_perform(&d, Operation::Invite, &founder).is_allowed());
        assert_eq!(
            can_perform(&d, Operation::Create, &founder),
            Decision::Deny(DenyReason::OutsideOrganization)
        );

        let orphan_installer = Target::Account(AccountTarget::prospective(Role::Installer, None));
        assert!(!can_perform(&d, Operation::Invite, &orphan_installer).is_allowed());

        let member = actor(Role::Distributor, Some(org), false);
        assert!(!can_perform(&member, Operation::Invite, &founder).is_allowed());
    }

    #[test]
    fn test_team_member_is_read_only() {
        let org = Uuid::new_v4();
        let d = actor(Role::Distributor, Some(org), false);
        assert!(can_perform(&d, Operation::Read, &in_org(Role::Installer, org)).is_allowed());
        assert!(can_perform(&d, Operation::Read, &Target::Distributor { id: org }).is_allowed());
        for op in [Operation::Create, Operation::Invite, Operation::Delete] {
            assert!(!can_perform(&d, op, &in_org(Role::Installer, org)).is_allowed());
        }
    }

    #[test]
    fn test_managed_accounts_touch_only_themselves() {
        let org = Uuid::new_v4();
        let user = actor(Role::User, Some(org), false);
        let own = Target::Account(AccountTarget {
            id: Some(user.id),
            ..AccountTarget::prospective(Role::User, Some(org))
        });
        assert!(can_perform(&user, Operation::Read, &own).is_allowed());
        assert!(can_perform(&user, Operation::Update, &own).is_allowed());
        assert!(!can_perform(&user, Operation::Delete, &own).is_allowed());

        let own_role_change = Target::Account(AccountTarget {
            id: Some(user.id),
            new_role: Some(Role::Installer),
            ..AccountTarget::prospective(Role::User, Some(org))
        });
        assert!(!can_perform(&user, Operation::ChangeRole, &own_role_change).is_allowed());
        assert!(!can_perform(&user, Operation::Read, &in_org(Role::User, org)).is_allowed());
    }

    #[test]
    fn test_inactive_actor_is_denied() {
        let mut admin = actor(Role::Admin, None, false);
        admin.active = false;
        assert_eq!(
            can_perform(&admin, Operation::Read, &in_org(Role::User, Uuid::new_v4())),
            Decision::Deny(DenyReason::InactiveActor)
        );
    }

    #[test]
    fn test_last_admin_removal_rejected_for_every_actor() {
        let org = Uuid::new_v4();
        let target = Target::Account(
            AccountTarget::prospective(Role::Distributor, Some(org)).removing_last_admin(true),
        );
        let admin = actor(Role::Admin, None, false);
        let org_admin = actor(Role::Distributor, Some(org), true);
        for a in [admin, org_admin] {
            let decision = can_perform(&a, Operation::Delete, &target);
            assert_eq!(decision, Decision::Deny(DenyReason::LastAdmin));
            assert!(matches!(decision.into_result(), Err(AppError::LastAdmin)));
        }
    }

    #[test]
    fn test_document_visibility_follows_access_roles() {
        let installer = actor(Role::Installer, Some(Uuid::new_v4()), false);
        let visible_roles = [Role::Installer, Role::Distributor];
        let hidden_roles = [Role::User];
        let visible = Target::Document { access_roles: &visible_roles };
        let hidden = Target::Document { access_roles: &hidden_roles };
        assert!(can_perform(&installer, Operation::Read, &visible).is_allowed());
        assert!(!can_perform(&installer, Operation::Read, &hidden).is_allowed());
        let admin = actor(Role::Admin, None, false);
        assert!(!can_perform(&admin, Operation::Read, &hidden).is_allowed());
    }

    #[test]
    fn test_every_role_has_a_capability_row() {
        for role in Role::ALL {
            for flag in [false, true] {
                assert!(!capabilities(role, flag).is_empty());
            }
        }
    }

    #[test]
    fn test_generic_denial_reaches_client_as_forbidden() {
        let user = actor(Role::User, Some(Uuid::new_v4()), false);
        let err = can_perform(&user, Operation::Create, &in_org(Role::User, Uuid::new_v4()))
            .into_result()
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
