//! OpenAPI documentation, served at `/api-docs/openapi.json` and browsable at `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;
use docportal_core::models;
use docportal_infra::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Document Portal API",
        version = "0.1.0",
        description = "Account provisioning and authorization for the distributor document portal. Platform admins, distributor organizations, installers and end users; invitations and password reset. Versioned routes live under /api/v1/."
    ),
    paths(
        handlers::health::health_check,
        // Auth
        handlers::auth::sign_in,
        handlers::auth::request_password_reset,
        handlers::auth::confirm_password_reset,
        // Self-service
        handlers::me::get_me,
        handlers::me::update_my_name,
        handlers::me::change_my_password,
        // Accounts
        handlers::accounts::list_accounts,
        handlers::accounts::create_account,
        handlers::accounts::get_account,
        handlers::accounts::update_account,
        handlers::accounts::delete_account,
        handlers::accounts::set_team_admin,
        // Distributors
        handlers::distributors::list_distributors,
        handlers::distributors::get_distributor,
        // Invitations
        handlers::invitations::list_invitations,
        handlers::invitations::create_invitation,
        handlers::invitations::resend_invitation,
        handlers::invitations::delete_invitation,
        handlers::invitations::lookup_invitation,
        handlers::invitations::accept_invitation,
    ),
    components(
        schemas(
            models::Account,
            models::Role,
            models::InviteRole,
            models::Distributor,
            models::NewOrganization,
            models::CreateAccountInput,
            models::AccountPatch,
            models::InvitationRequest,
            models::InvitationSummary,
            models::InvitationPreview,
            models::InvitationStatus,
            models::OperationWarning,
            docportal_core::ErrorKind,
            ErrorResponse,
            handlers::AccountOutcomeResponse,
            handlers::MessageResponse,
            handlers::health::HealthResponse,
            handlers::auth::SignInRequest,
            handlers::auth::SignInResponse,
            handlers::auth::PasswordResetRequest,
            handlers::auth::ConfirmPasswordResetRequest,
            handlers::me::UpdateNameRequest,
            handlers::me::ChangePasswordRequest,
            handlers::accounts::DeleteAccountRequest,
            handlers::accounts::DeleteAccountResponse,
            handlers::accounts::TeamAdminRequest,
            handlers::invitations::InvitationOutcomeResponse,
            handlers::invitations::AcceptInvitationRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Sign-in and password reset"),
        (name = "me", description = "The signed-in account"),
        (name = "accounts", description = "Account lifecycle"),
        (name = "distributors", description = "Distributor organizations"),
        (name = "invitations", description = "Invitations into a distributor network")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
