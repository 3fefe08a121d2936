//! Invitation manager
//!
//! pending → accepted when redeemed before `expiresAt`; pending → expired once
//! observed past `expiresAt`. Expiry is derived on read, so a stored `pending`
//! past its expiry is never redeemable. The `expired` status is written back
//! best-effort when observed.

use chrono::Utc;
use docportal_core::models::{
    Account, CreateAccountInput, Invitation, InvitationPreview, InvitationRequest,
    InvitationStatus, InvitationSummary, InviteRole, OperationWarning, Outcome, Role,
};
use docportal_core::validation::{validate_company_name, validate_display_name, validate_email};
use docportal_core::{can_perform, AccountTarget, Actor, AppError, DenyReason, Operation, Target};
use docportal_db::Repositories;
use std::sync::Arc;
use uuid::Uuid;

use super::accounts::AccountService;
use super::notification::{NotificationSender, TemplateKind, TemplateVars};
use super::tokens::{generate_invitation_token, invitation_link};

const TOKEN_ATTEMPTS: usize = 5;

fn template_vars<const N: usize>(pairs: [(&str, String); N]) -> TemplateVars {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn not_permitted(actor: &Actor, operation: Operation) -> AppError {
    AppError::Forbidden(
        DenyReason::NotPermitted {
            role: actor.role,
            operation,
        }
        .to_string(),
    )
}

#[derive(Clone)]
pub struct InvitationService {
    repos: Repositories,
    accounts: AccountService,
    notifier: Arc<dyn NotificationSender>,
    base_url: String,
    ttl_days: i64,
}

impl InvitationService {
    pub fn new(
        repos: Repositories,
        accounts: AccountService,
        notifier: Arc<dyn NotificationSender>,
        base_url: impl Into<String>,
        ttl_days: i64,
    ) -> Self {
        Self {
            repos,
            accounts,
            notifier,
            base_url: base_url.into(),
            ttl_days,
        }
    }

    /// Issue an invitation into the inviter's organization, or for a
    /// distributor founding the organization named in `newOrganization`. A
    /// failed send keeps the invitation and comes back as a warning.
    #[tracing::instrument(skip(self, inviter, request), fields(inviter_id = %inviter.id, role = %request.role))]
    pub async fn create_invitation(
        &self,
        inviter: &Actor,
        request: InvitationRequest,
    ) -> Result<Outcome<Invitation>, AppError> {
        if inviter.role != Role::Distributor {
            return Err(not_permitted(inviter, Operation::Invite));
        }
        let email = validate_email(&request.email)?;
        let name = validate_display_name(&request.name)?;
        let company_name = match request.role {
            InviteRole::Installer => Some(validate_company_name(
                request.company_name.as_deref().unwrap_or_default(),
            )?),
            _ => {
                if request
                    .company_name
                    .as_deref()
                    .is_some_and(|company| !company.trim().is_empty())
                {
                    return Err(AppError::Validation(
                        "companyName is only used for installer invitations".to_string(),
                    ));
                }
                None
            }
        };
        let new_organization = match (request.role, request.new_organization) {
            (_, None) => None,
            (InviteRole::Distributor, Some(mut details)) => {
                details.company_name = validate_company_name(&details.company_name)?;
                Some(details)
            }
            (_, Some(_)) => {
                return Err(AppError::Validation(
                    "newOrganization is only used for distributor invitations".to_string(),
                ))
            }
        };
        let organization = if new_organization.is_some() {
            None
        } else {
            inviter.distributor_id
        };
        can_perform(
            inviter,
            Operation::Invite,
            &Target::Account(AccountTarget::prospective(
                request.role.as_role(),
                organization,
            )),
        )
        .into_result()?;

        if self.repos.accounts.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let inviter_account = self.repos.accounts.get(inviter.id).await?;
        let inviter_company = match inviter.distributor_id {
            Some(org_id) => self
                .repos
                .distributors
                .find(org_id)
                .await?
                .map(|org| org.company_name)
                .unwrap_or_default(),
            None => String::new(),
        };

        let now = Utc::now();
        let invitation = Invitation {
            id: Uuid::new_v4(),
            email,
            name,
            role: request.role,
            company_name,
            new_organization,
            inviter_id: inviter.id,
            inviter_name: inviter_account.display_name,
            inviter_company,
            token: self.unique_token().await?,
            status: InvitationStatus::Pending,
            created_at: now,
            expires_at: Invitation::expiry_for(now, self.ttl_days),
            accepted_at: None,
        };
        self.repos.invitations.insert(&invitation).await?;
        tracing::info!(
            invitation_id = %invitation.id,
            role = %invitation.role,
            expires_at = %invitation.expires_at,
            "Invitation created"
        );

        let mut warnings = Vec::new();
        if let Err(err) = self.notify_invitee(&invitation).await {
            tracing::warn!(invitation_id = %invitation.id, error = %err, "Invitation saved but not delivered");
            warnings.push(OperationWarning::notification(&err));
        }
        Ok(Outcome::with_warnings(invitation, warnings))
    }

    async fn unique_token(&self) -> Result<String, AppError> {
        for _ in 0..TOKEN_ATTEMPTS {
            let token = generate_invitation_token();
            if !self.repos.invitations.token_exists(&token).await? {
                return Ok(token);
            }
            tracing::warn!("Invitation token collision; regenerating");
        }
        Err(AppError::Internal(
            "Could not generate a unique invitation token".to_string(),
        ))
    }

    async fn notify_invitee(&self, invitation: &Invitation) -> Result<(), AppError> {
        let organization = match &invitation.new_organization {
            Some(details) => details.company_name.clone(),
            None => invitation.inviter_company.clone(),
        };
        let vars = template_vars([
            ("name", invitation.name.clone()),
            ("email", invitation.email.clone()),
            ("role", invitation.role.to_string()),
            ("company_name", invitation.company_name.clone().unwrap_or_default()),
            ("inviter_name", invitation.inviter_name.clone()),
            ("inviter_company", invitation.inviter_company.clone()),
            ("organization", organization),
            (
                "link",
                invitation_link(&self.base_url, &invitation.token, invitation.role),
            ),
            (
                "expires_at",
                invitation.expires_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            ),
        ]);
        self.notifier
            .send(
                TemplateKind::for_invitation(invitation.role),
                &invitation.email,
                &vars,
            )
            .await?;
        Ok(())
    }

    /// Persist an observed expiry. Failures only cost a later re-observation.
    async fn observe_expiry(&self, invitation: &Invitation) {
        if invitation.status != InvitationStatus::Pending {
            return;
        }
        if let Err(e) = self.repos.invitations.mark_expired(invitation.id).await {
            tracing::debug!(invitation_id = %invitation.id, error = %e, "Could not record invitation expiry");
        }
    }

    /// Only the inviter or a platform admin may manage an invitation.
    fn authorize_owner(
        &self,
        actor: &Actor,
        invitation: &Invitation,
        operation: Operation,
    ) -> Result<(), AppError> {
        if !actor.active {
            return Err(AppError::Forbidden(DenyReason::InactiveActor.to_string()));
        }
        if actor.role == Role::Admin || actor.id == invitation.inviter_id {
            Ok(())
        } else {
            Err(not_permitted(actor, operation))
        }
    }

    /// Re-send with the same token. The expiry is not extended.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id, invitation_id = %id))]
    pub async fn resend_invitation(&self, actor: &Actor, id: Uuid) -> Result<Invitation, AppError> {
        let invitation = self
            .repos
            .invitations
            .find(id)
            .await?
            .ok_or(AppError::InvitationNotFound)?;
        self.authorize_owner(actor, &invitation, Operation::Invite)?;

        match invitation.effective_status(Utc::now()) {
            InvitationStatus::Accepted => return Err(AppError::InvitationAlreadyUsed),
            InvitationStatus::Expired => {
                self.observe_expiry(&invitation).await;
                return Err(AppError::InvitationExpired);
            }
            InvitationStatus::Pending => {}
        }

        self.notify_invitee(&invitation).await?;
        tracing::info!(invitation_id = %id, "Invitation re-sent");
        Ok(invitation)
    }

    /// Redeem a token into an account, created as the inviter inside the
    /// inviter's organization or as the founder of the invited organization.
    /// The invitation stays pending if creation fails.
    #[tracing::instrument(skip(self, token, password, display_name))]
    pub async fn accept_invitation(
        &self,
        token: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Outcome<Account>, AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::InvitationNotFound);
        }
        let invitation = self
            .repos
            .invitations
            .find_by_token(token)
            .await?
            .ok_or(AppError::InvitationNotFound)?;

        let now = Utc::now();
        match invitation.effective_status(now) {
            InvitationStatus::Accepted => return Err(AppError::InvitationAlreadyUsed),
            InvitationStatus::Expired => {
                self.observe_expiry(&invitation).await;
                return Err(AppError::InvitationExpired);
            }
            InvitationStatus::Pending => {}
        }

        let inviter_account = self
            .repos
            .accounts
            .find(invitation.inviter_id)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(
                    "The account that sent this invitation no longer exists".to_string(),
                )
            })?;
        let inviter = Actor::from_account(&inviter_account);

        let display_name = display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&invitation.name);
        let (distributor_id, new_organization) = match &invitation.new_organization {
            Some(details) => (None, Some(details.clone())),
            None => (inviter_account.organization_id(), None),
        };
        let input = CreateAccountInput {
            email: invitation.email.clone(),
            password: password.to_string(),
            display_name: display_name.to_string(),
            role: invitation.role.as_role(),
            distributor_id,
            new_organization,
            company_name: invitation.company_name.clone(),
            grant_team_admin: false,
        };

        let account = match self.accounts.create_invited_account(&inviter, input).await {
            Ok(account) => account,
            // The invited email is registered already: a concurrent redemption won.
            Err(AppError::DuplicateEmail(_)) => return Err(AppError::InvitationAlreadyUsed),
            Err(err) => return Err(err),
        };

        let mut warnings = Vec::new();
        match self.repos.invitations.mark_accepted(invitation.id, now).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(invitation_id = %invitation.id, "Invitation was no longer pending when marked accepted");
            }
            Err(e) => {
                tracing::error!(invitation_id = %invitation.id, error = %e, "Account created but invitation not marked accepted");
                warnings.push(OperationWarning::cascade("mark invitation accepted", &e));
            }
        }

        let welcome = template_vars([
            ("name", account.display_name.clone()),
            ("email", account.email.clone()),
            ("link", self.base_url.clone()),
        ]);
        if let Err(e) = self
            .notifier
            .send(TemplateKind::Welcome, &account.email, &welcome)
            .await
        {
            let err = AppError::from(e);
            tracing::warn!(account_id = %account.id, error = %err, "Welcome notification failed");
            warnings.push(OperationWarning::notification(&err));
        }

        tracing::info!(
            invitation_id = %invitation.id,
            account_id = %account.id,
            role = %account.role,
            "Invitation accepted"
        );
        Ok(Outcome::with_warnings(account, warnings))
    }

    /// Revoke an invitation.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id, invitation_id = %id))]
    pub async fn delete_invitation(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        let invitation = self
            .repos
            .invitations
            .find(id)
            .await?
            .ok_or(AppError::InvitationNotFound)?;
        self.authorize_owner(actor, &invitation, Operation::Delete)?;
        if !self.repos.invitations.delete(id).await? {
            return Err(AppError::InvitationNotFound);
        }
        tracing::info!(invitation_id = %id, "Invitation deleted");
        Ok(())
    }

    /// Public preview for the acceptance page.
    pub async fn lookup_invitation(&self, token: &str) -> Result<InvitationPreview, AppError> {
        let invitation = self
            .repos
            .invitations
            .find_by_token(token.trim())
            .await?
            .ok_or(AppError::InvitationNotFound)?;
        let now = Utc::now();
        if invitation.effective_status(now) == InvitationStatus::Expired {
            self.observe_expiry(&invitation).await;
        }
        Ok(InvitationPreview::observed(&invitation, now))
    }

    /// Admin: all invitations. Distributor: the ones it issued.
    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn list_invitations(
        &self,
        actor: &Actor,
    ) -> Result<Vec<InvitationSummary>, AppError> {
        if !actor.active {
            return Err(AppError::Forbidden(DenyReason::InactiveActor.to_string()));
        }
        let invitations = match actor.role {
            Role::Admin => self.repos.invitations.list_all().await?,
            Role::Distributor => self.repos.invitations.list_by_inviter(actor.id).await?,
            Role::Installer | Role::User => return Err(not_permitted(actor, Operation::Read)),
        };
        let now = Utc::now();
        Ok(invitations
            .iter()
            .map(|invitation| InvitationSummary::observed(invitation, now))
            .collect())
    }
}
