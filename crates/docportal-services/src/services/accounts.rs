//! Account lifecycle
//!
//! Creates, updates and deletes accounts and keeps the derived membership lists
//! (`teamMembers`, `adminMembers`, `managedUsers`) consistent. Every operation takes
//! the acting account explicitly and asks the authorization engine before any
//! external call.
//!
//! Creation commits at the identity provider: once the identity is registered the
//! remaining writes are compensated on failure so a retry is not blocked by
//! `DuplicateEmail`. Deletion removes the identity first, then the record, then
//! cascades out of every list; cascade failures come back as warnings.

use chrono::Utc;
use docportal_core::models::{
    Account, AccountPatch, CreateAccountInput, Distributor, InvitationStatus, NewOrganization,
    OperationWarning, Outcome, Role,
};
use docportal_core::validation::{
    validate_company_name, validate_display_name, validate_email, validate_password,
};
use docportal_core::{can_perform, AccountTarget, Actor, AppError, DenyReason, Operation, Target};
use docportal_db::Repositories;
use std::sync::Arc;
use uuid::Uuid;

use super::identity::{IdentityError, IdentityProvider, Session};

/// Where a new account lands in the tenancy.
#[derive(Debug, Clone)]
enum Placement {
    Platform,
    FoundOrganization(NewOrganization),
    JoinTeam { organization: Uuid, as_admin: bool },
    Managed { organization: Uuid, manager: Uuid },
}

#[derive(Debug, Clone)]
struct CreationPlan {
    email: String,
    display_name: String,
    role: Role,
    company_name: Option<String>,
    placement: Placement,
}

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub session: Session,
    pub account: Account,
}

fn authorize(actor: &Actor, operation: Operation, target: &Target<'_>) -> Result<(), AppError> {
    let decision = can_perform(actor, operation, target);
    if !decision.is_allowed() {
        tracing::warn!(
            actor_id = %actor.id,
            actor_role = %actor.role,
            operation = %operation,
            decision = ?decision,
            "Operation denied"
        );
    }
    decision.into_result()
}

fn ensure_active(actor: &Actor) -> Result<(), AppError> {
    if actor.active {
        Ok(())
    } else {
        Err(AppError::Forbidden(DenyReason::InactiveActor.to_string()))
    }
}

fn cascade_warning(step: &str, account_id: Uuid, err: &AppError) -> OperationWarning {
    tracing::warn!(account_id = %account_id, step = step, error = %err, "Cascade step failed");
    OperationWarning::cascade(step, err)
}

#[derive(Clone)]
pub struct AccountService {
    repos: Repositories,
    identity: Arc<dyn IdentityProvider>,
    password_min_length: usize,
}

impl AccountService {
    pub fn new(
        repos: Repositories,
        identity: Arc<dyn IdentityProvider>,
        password_min_length: usize,
    ) -> Self {
        Self {
            repos,
            identity,
            password_min_length,
        }
    }

    /// Provision an account on behalf of `creator`.
    #[tracing::instrument(skip(self, creator, input), fields(creator_id = %creator.id, role = %input.role))]
    pub async fn create_account(
        &self,
        creator: &Actor,
        input: CreateAccountInput,
    ) -> Result<Account, AppError> {
        self.provision(creator, input, Operation::Create).await
    }

    /// Provision the account an invitation was redeemed into, authorized as
    /// the inviter's `invite` rather than a direct creation.
    #[tracing::instrument(skip(self, inviter, input), fields(inviter_id = %inviter.id, role = %input.role))]
    pub(crate) async fn create_invited_account(
        &self,
        inviter: &Actor,
        input: CreateAccountInput,
    ) -> Result<Account, AppError> {
        self.provision(inviter, input, Operation::Invite).await
    }

    async fn provision(
        &self,
        creator: &Actor,
        input: CreateAccountInput,
        operation: Operation,
    ) -> Result<Account, AppError> {
        let plan = self.plan_creation(creator, &input, operation).await?;
        let id = self.register_identity(&plan.email, &input.password).await?;

        match self.write_account(creator, &plan, id).await {
            Ok(account) => {
                tracing::info!(
                    account_id = %account.id,
                    role = %account.role,
                    distributor_id = ?account.distributor_id,
                    "Account created"
                );
                Ok(account)
            }
            Err(err) => {
                tracing::error!(account_id = %id, error = %err, "Account write failed; rolling back identity");
                self.roll_back_identity(id).await;
                Err(err)
            }
        }
    }

    async fn plan_creation(
        &self,
        creator: &Actor,
        input: &CreateAccountInput,
        operation: Operation,
    ) -> Result<CreationPlan, AppError> {
        let email = validate_email(&input.email)?;
        let display_name = validate_display_name(&input.display_name)?;
        validate_password(&input.password, self.password_min_length)?;
        let company_name = match (input.role, input.company_name.as_deref()) {
            (Role::Installer, Some(name)) if !name.trim().is_empty() => {
                Some(validate_company_name(name)?)
            }
            _ => None,
        };

        let placement = match input.role {
            Role::Admin => {
                if input.distributor_id.is_some() || input.new_organization.is_some() {
                    return Err(AppError::Validation(
                        "admin accounts do not belong to an organization".to_string(),
                    ));
                }
                authorize(
                    creator,
                    operation,
                    &Target::Account(AccountTarget::prospective(Role::Admin, None)),
                )?;
                Placement::Platform
            }
            Role::Distributor => {
                if input.new_organization.is_some() && input.distributor_id.is_some() {
                    return Err(AppError::Validation(
                        "provide either distributorId or newOrganization, not both".to_string(),
                    ));
                }
                if let Some(details) = &input.new_organization {
                    let mut details = details.clone();
                    details.company_name = validate_company_name(&details.company_name)?;
                    authorize(
                        creator,
                        operation,
                        &Target::Account(AccountTarget::prospective(Role::Distributor, None)),
                    )?;
                    Placement::FoundOrganization(details)
                } else {
                    let organization = input
                        .distributor_id
                        .or(creator.distributor_id)
                        .ok_or_else(|| {
                            AppError::Validation(
                                "distributor accounts need distributorId or newOrganization"
                                    .to_string(),
                            )
                        })?;
                    let target = Target::Account(AccountTarget::prospective(
                        Role::Distributor,
                        Some(organization),
                    ));
                    authorize(creator, operation, &target)?;
                    if input.grant_team_admin {
                        authorize(creator, Operation::ManageTeamAdmins, &target)?;
                    }
                    self.active_organization(organization).await?;
                    Placement::JoinTeam {
                        organization,
                        as_admin: input.grant_team_admin,
                    }
                }
            }
            Role::Installer | Role::User => {
                if input.new_organization.is_some() {
                    return Err(AppError::Validation(
                        "only distributor accounts can found an organization".to_string(),
                    ));
                }
                let organization = input
                    .distributor_id
                    .or(creator.distributor_id)
                    .ok_or_else(|| {
                        AppError::Validation(
                            "distributorId is required for installer and user accounts".to_string(),
                        )
                    })?;
                authorize(
                    creator,
                    operation,
                    &Target::Account(AccountTarget::prospective(input.role, Some(organization))),
                )?;
                let org = self.active_organization(organization).await?;
                // Admin-created accounts are attributed to the organization's first admin.
                let manager = if creator.role == Role::Distributor
                    && creator.distributor_id == Some(organization)
                {
                    creator.id
                } else {
                    org.admin_members.first().copied().ok_or_else(|| {
                        AppError::Validation(format!(
                            "distributor {} has no admin member to manage the account",
                            organization
                        ))
                    })?
                };
                Placement::Managed {
                    organization,
                    manager,
                }
            }
        };

        Ok(CreationPlan {
            email,
            display_name,
            role: input.role,
            company_name,
            placement,
        })
    }

    async fn active_organization(&self, id: Uuid) -> Result<Distributor, AppError> {
        let org = self
            .repos
            .distributors
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Distributor {} not found", id)))?;
        if !org.active {
            return Err(AppError::Validation(format!(
                "distributor {} is not active",
                id
            )));
        }
        Ok(org)
    }

    async fn register_identity(&self, email: &str, password: &str) -> Result<Uuid, AppError> {
        self.identity
            .create_identity(email, password)
            .await
            .map_err(|err| match err {
                IdentityError::EmailAlreadyInUse(_) => AppError::DuplicateEmail(email.to_string()),
                other => AppError::from(other),
            })
    }

    async fn write_account(
        &self,
        creator: &Actor,
        plan: &CreationPlan,
        id: Uuid,
    ) -> Result<Account, AppError> {
        let now = Utc::now();
        let mut account = Account {
            id,
            email: plan.email.clone(),
            display_name: plan.display_name.clone(),
            role: plan.role,
            active: true,
            created_at: now,
            last_login: None,
            created_by: Some(creator.id),
            distributor_id: None,
            is_distributor_admin: None,
            managed_users: None,
            company_name: plan.company_name.clone(),
        };

        match &plan.placement {
            Placement::Platform => {
                self.repos.accounts.insert(&account).await?;
            }
            Placement::FoundOrganization(details) => {
                let org = Distributor::founded_by(Uuid::new_v4(), id, details.clone(), now);
                account.distributor_id = Some(org.id);
                account.is_distributor_admin = Some(true);
                account.managed_users = Some(Vec::new());

                self.repos.distributors.insert(&org).await?;
                if let Err(err) = self.repos.accounts.insert(&account).await {
                    self.discard_organization(org.id).await;
                    return Err(err);
                }
            }
            Placement::JoinTeam {
                organization,
                as_admin,
            } => {
                account.distributor_id = Some(*organization);
                account.is_distributor_admin = Some(*as_admin);
                account.managed_users = Some(Vec::new());

                self.repos.accounts.insert(&account).await?;
                let joined = if *as_admin {
                    self.repos.distributors.add_admin_member(*organization, id).await
                } else {
                    self.repos.distributors.add_team_member(*organization, id).await
                };
                if let Err(err) = joined {
                    if let Err(e) = self.repos.distributors.remove_member(*organization, id).await {
                        tracing::error!(account_id = %id, error = %e, "Rollback failed: team membership left behind");
                    }
                    self.discard_account(id).await;
                    return Err(err);
                }
            }
            Placement::Managed {
                organization,
                manager,
            } => {
                account.distributor_id = Some(*organization);

                self.repos.accounts.insert(&account).await?;
                if let Err(err) = self.repos.accounts.add_managed_users(*manager, &[id]).await {
                    self.discard_account(id).await;
                    return Err(err);
                }
            }
        }

        Ok(account)
    }

    async fn roll_back_identity(&self, id: Uuid) {
        match self.identity.delete_identity(id).await {
            Ok(()) | Err(IdentityError::NotFound) => {}
            Err(e) => {
                tracing::error!(account_id = %id, error = %e, "Rollback failed: identity remains registered");
            }
        }
    }

    async fn discard_account(&self, id: Uuid) {
        if let Err(e) = self.repos.accounts.delete(id).await {
            tracing::error!(account_id = %id, error = %e, "Rollback failed: account record remains");
        }
    }

    async fn discard_organization(&self, id: Uuid) {
        if let Err(e) = self.repos.distributors.delete(id).await {
            tracing::error!(distributor_id = %id, error = %e, "Rollback failed: orphaned organization remains");
        }
    }

    /// Whether removing the account's admin membership would leave its
    /// organization without an admin.
    async fn would_remove_last_admin(&self, account: &Account) -> Result<bool, AppError> {
        let Some(org_id) = account
            .distributor_id
            .filter(|_| account.role == Role::Distributor)
        else {
            return Ok(false);
        };
        Ok(self
            .repos
            .distributors
            .find(org_id)
            .await?
            .map(|org| org.is_last_admin(account.id))
            .unwrap_or(false))
    }

    /// Update display name and/or role. Role changes keep the tenancy shape
    /// (installer ⇄ user) or promote to platform admin.
    #[tracing::instrument(skip(self, actor, patch), fields(actor_id = %actor.id, account_id = %id))]
    pub async fn update_account(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: AccountPatch,
    ) -> Result<Outcome<Account>, AppError> {
        if patch.is_empty() {
            return Err(AppError::Validation(
                "nothing to update: provide displayName or role".to_string(),
            ));
        }
        let account = self.repos.accounts.get(id).await?;

        let display_name = patch
            .display_name
            .as_deref()
            .map(validate_display_name)
            .transpose()?;
        if display_name.is_some() {
            authorize(actor, Operation::Update, &Target::account(&account))?;
        }

        let role_change = patch.role.filter(|role| *role != account.role);
        if let Some(new_role) = role_change {
            let removes_last_admin = self.would_remove_last_admin(&account).await?;
            let target = AccountTarget::existing(&account)
                .with_new_role(new_role)
                .removing_last_admin(removes_last_admin);
            authorize(actor, Operation::ChangeRole, &Target::Account(target))?;

            match (account.role, new_role) {
                (Role::Installer, Role::User) | (Role::User, Role::Installer) => {}
                (_, Role::Admin) => {}
                (from, to) => {
                    return Err(AppError::Validation(format!(
                        "changing role from {} to {} is not supported",
                        from, to
                    )));
                }
            }
        }

        let mut warnings = Vec::new();
        if let Some(name) = &display_name {
            self.repos.accounts.set_display_name(id, name).await?;
        }
        if let Some(new_role) = role_change {
            if new_role == Role::Admin {
                self.repos.accounts.promote_to_admin(id).await?;
                warnings = self.detach_memberships(&account).await;
                tracing::info!(account_id = %id, from = %account.role, "Account promoted to admin");
            } else {
                self.repos.accounts.set_role(id, new_role).await?;
                tracing::info!(account_id = %id, from = %account.role, to = %new_role, "Account role changed");
            }
        }

        let updated = self.repos.accounts.get(id).await?;
        Ok(Outcome::with_warnings(updated, warnings))
    }

    /// Delete an account and cascade it out of every list.
    ///
    /// The identity goes first; if that fails the record is kept. The record
    /// delete then decides between concurrent callers: the loser gets `NotFound`.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id, account_id = %id))]
    pub async fn delete_account(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<Outcome<Account>, AppError> {
        let account = self.repos.accounts.get(id).await?;
        let removes_last_admin = self.would_remove_last_admin(&account).await?;
        authorize(
            actor,
            Operation::Delete,
            &Target::Account(
                AccountTarget::existing(&account).removing_last_admin(removes_last_admin),
            ),
        )?;

        match self.identity.delete_identity(id).await {
            Ok(()) => {}
            Err(IdentityError::NotFound) => {
                tracing::warn!(account_id = %id, "Identity already removed; deleting the remaining account record");
            }
            Err(err) => {
                tracing::error!(account_id = %id, error = %err, "Identity deletion failed; account kept");
                return Err(AppError::IdentityDeletionFailed(err.to_string()));
            }
        }

        if !self.repos.accounts.delete(id).await? {
            return Err(AppError::NotFound(format!("Account {} not found", id)));
        }

        let mut warnings = self.detach_memberships(&account).await;
        warnings.extend(self.revoke_outstanding(&account).await);

        tracing::info!(
            account_id = %id,
            role = %account.role,
            warnings = warnings.len(),
            "Account deleted"
        );
        Ok(Outcome::with_warnings(account, warnings))
    }

    /// Removes the account from every `managedUsers`, `teamMembers` and
    /// `adminMembers` list, and hands its own managed accounts to the
    /// organization's remaining first admin.
    async fn detach_memberships(&self, account: &Account) -> Vec<OperationWarning> {
        let mut warnings = Vec::new();

        match self.repos.accounts.find_managers_of(account.id).await {
            Ok(managers) => {
                for manager in managers {
                    if let Err(e) = self
                        .repos
                        .accounts
                        .remove_managed_user(manager.id, account.id)
                        .await
                    {
                        warnings.push(cascade_warning("remove from managedUsers", account.id, &e));
                    }
                }
            }
            Err(e) => warnings.push(cascade_warning("find managing distributors", account.id, &e)),
        }

        match self.repos.distributors.find_referencing(account.id).await {
            Ok(orgs) => {
                for org in orgs {
                    let removed = self.repos.distributors.remove_member(org.id, account.id).await;
                    if let Err(e) = removed {
                        warnings.push(cascade_warning("remove from team", account.id, &e));
                    }
                }
            }
            Err(e) => warnings.push(cascade_warning("find organizations", account.id, &e)),
        }

        if !account.managed_users().is_empty() {
            if let Err(e) = self.rehome_managed_users(account).await {
                warnings.push(cascade_warning("re-home managed accounts", account.id, &e));
            }
        }

        warnings
    }

    async fn rehome_managed_users(&self, account: &Account) -> Result<(), AppError> {
        let org_id = account.distributor_id.ok_or_else(|| {
            AppError::Conflict("distributor account has no organization".to_string())
        })?;
        let org = self.repos.distributors.get(org_id).await?;
        let heir = org.first_admin_except(account.id).ok_or_else(|| {
            AppError::Conflict(format!(
                "distributor {} has no remaining admin to take over managed accounts",
                org_id
            ))
        })?;
        self.repos
            .accounts
            .add_managed_users(heir, account.managed_users())
            .await?;
        tracing::info!(
            from = %account.id,
            to = %heir,
            count = account.managed_users().len(),
            "Managed accounts re-homed"
        );
        Ok(())
    }

    /// Drops pending invitations issued by the account and its reset grants.
    async fn revoke_outstanding(&self, account: &Account) -> Vec<OperationWarning> {
        let mut warnings = Vec::new();
        let now = Utc::now();

        match self.repos.invitations.list_by_inviter(account.id).await {
            Ok(invitations) => {
                for invitation in invitations
                    .iter()
                    .filter(|inv| inv.effective_status(now) == InvitationStatus::Pending)
                {
                    if let Err(e) = self.repos.invitations.delete(invitation.id).await {
                        warnings.push(cascade_warning("revoke pending invitation", account.id, &e));
                    }
                }
            }
            Err(e) => warnings.push(cascade_warning("find pending invitations", account.id, &e)),
        }

        if let Err(e) = self.repos.password_resets.delete_for_account(account.id).await {
            warnings.push(cascade_warning("drop password resets", account.id, &e));
        }

        warnings
    }

    #[tracing::instrument(skip(self, actor, display_name), fields(actor_id = %actor.id))]
    pub async fn update_own_name(
        &self,
        actor: &Actor,
        display_name: &str,
    ) -> Result<Account, AppError> {
        let display_name = validate_display_name(display_name)?;
        let account = self.repos.accounts.get(actor.id).await?;
        authorize(actor, Operation::Update, &Target::account(&account))?;
        self.repos
            .accounts
            .set_display_name(actor.id, &display_name)
            .await?;
        self.repos.accounts.get(actor.id).await
    }

    /// Password change re-authenticates with the current password first.
    #[tracing::instrument(skip(self, actor, current, new_password), fields(actor_id = %actor.id))]
    pub async fn update_own_password(
        &self,
        actor: &Actor,
        current: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if current.is_empty() {
            return Err(AppError::Validation("currentPassword is required".to_string()));
        }
        validate_password(new_password, self.password_min_length)?;
        let account = self.repos.accounts.get(actor.id).await?;
        authorize(actor, Operation::Update, &Target::account(&account))?;

        self.identity
            .change_password(actor.id, current, new_password)
            .await?;
        tracing::info!(account_id = %actor.id, "Password changed");
        Ok(())
    }

    /// Grant or revoke organization admin membership on a distributor team member.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id, account_id = %id))]
    pub async fn set_team_admin(
        &self,
        actor: &Actor,
        id: Uuid,
        grant: bool,
    ) -> Result<Account, AppError> {
        let account = self.repos.accounts.get(id).await?;
        let org_id = match (account.role, account.distributor_id) {
            (Role::Distributor, Some(org_id)) => org_id,
            _ => {
                return Err(AppError::Validation(
                    "only distributor team members can be organization admins".to_string(),
                ))
            }
        };
        let org = self.repos.distributors.get(org_id).await?;
        let removes_last_admin = !grant && org.is_last_admin(id);
        authorize(
            actor,
            Operation::ManageTeamAdmins,
            &Target::Account(
                AccountTarget::existing(&account).removing_last_admin(removes_last_admin),
            ),
        )?;

        if grant {
            self.repos.distributors.add_admin_member(org_id, id).await?;
            self.repos.accounts.set_distributor_admin(id, true).await?;
        } else if org.is_admin_member(id) {
            self.repos.distributors.remove_admin_member(org_id, id).await?;
            // A concurrent revoke may have taken the other admin out meanwhile.
            let after = self.repos.distributors.get(org_id).await?;
            if after.admin_members.is_empty() {
                self.repos.distributors.add_admin_member(org_id, id).await?;
                return Err(AppError::LastAdmin);
            }
            self.repos.accounts.set_distributor_admin(id, false).await?;
        } else if account.is_org_admin() {
            self.repos.accounts.set_distributor_admin(id, false).await?;
        }

        tracing::info!(account_id = %id, distributor_id = %org_id, grant = grant, "Team admin membership changed");
        self.repos.accounts.get(id).await
    }

    pub async fn get_account(&self, actor: &Actor, id: Uuid) -> Result<Account, AppError> {
        let account = self.repos.accounts.get(id).await?;
        authorize(actor, Operation::Read, &Target::account(&account))?;
        Ok(account)
    }

    /// Admin: every account. Distributor: its organization. Others: themselves.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn list_accounts(&self, actor: &Actor) -> Result<Vec<Account>, AppError> {
        ensure_active(actor)?;
        let candidates = match actor.role {
            Role::Admin => self.repos.accounts.list_all().await?,
            Role::Distributor => match actor.distributor_id {
                Some(org_id) => self.repos.accounts.list_by_organization(org_id).await?,
                None => Vec::new(),
            },
            Role::Installer | Role::User => {
                self.repos.accounts.find(actor.id).await?.into_iter().collect()
            }
        };
        Ok(candidates
            .into_iter()
            .filter(|account| {
                can_perform(actor, Operation::Read, &Target::account(account)).is_allowed()
            })
            .collect())
    }

    pub async fn get_distributor(&self, actor: &Actor, id: Uuid) -> Result<Distributor, AppError> {
        let org = self.repos.distributors.get(id).await?;
        authorize(actor, Operation::Read, &Target::distributor(&org))?;
        Ok(org)
    }

    pub async fn list_distributors(&self, actor: &Actor) -> Result<Vec<Distributor>, AppError> {
        ensure_active(actor)?;
        let candidates = match (actor.role, actor.distributor_id) {
            (Role::Admin, _) => self.repos.distributors.list_all().await?,
            (_, Some(org_id)) => self.repos.distributors.find(org_id).await?.into_iter().collect(),
            (_, None) => Vec::new(),
        };
        Ok(candidates
            .into_iter()
            .filter(|org| {
                can_perform(actor, Operation::Read, &Target::distributor(org)).is_allowed()
            })
            .collect())
    }

    /// Resolve a session token to its account.
    pub async fn authenticate(&self, token: &str) -> Result<Account, AppError> {
        let id = self.identity.verify_identity(token).await?;
        self.repos
            .accounts
            .find(id)
            .await?
            .ok_or(AppError::InvalidOrExpiredToken)
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AppError> {
        let session = self.identity.sign_in(email, password).await?;
        let account = self
            .repos
            .accounts
            .find(session.account_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;
        if !account.active {
            return Err(AppError::Unauthorized("Account is disabled".to_string()));
        }
        if let Err(e) = self.record_login(account.id).await {
            tracing::warn!(account_id = %account.id, error = %e, "Failed to record login");
        }
        Ok(SignedIn { session, account })
    }

    pub async fn record_login(&self, id: Uuid) -> Result<(), AppError> {
        self.repos.accounts.record_login(id, Utc::now()).await
    }

    /// First platform admin, provisioned with service credentials. Refused once
    /// any admin exists.
    #[tracing::instrument(skip(self, password, display_name))]
    pub async fn bootstrap_admin(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Account, AppError> {
        if self.repos.accounts.admin_exists().await? {
            return Err(AppError::Conflict("An admin account already exists".to_string()));
        }
        let email = validate_email(email)?;
        let display_name = validate_display_name(display_name)?;
        validate_password(password, self.password_min_length)?;

        let id = self.register_identity(&email, password).await?;
        let account = Account {
            id,
            email,
            display_name,
            role: Role::Admin,
            active: true,
            created_at: Utc::now(),
            last_login: None,
            created_by: None,
            distributor_id: None,
            is_distributor_admin: None,
            managed_users: None,
            company_name: None,
        };
        if let Err(err) = self.repos.accounts.insert(&account).await {
            self.roll_back_identity(id).await;
            return Err(err);
        }
        tracing::info!(account_id = %id, "Platform admin bootstrapped");
        Ok(account)
    }
}
