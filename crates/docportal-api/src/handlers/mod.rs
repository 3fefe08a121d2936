//! HTTP handlers, one module per resource.

pub mod accounts;
pub mod auth;
pub mod distributors;
pub mod health;
pub mod invitations;
pub mod me;

use docportal_core::models::{Account, OperationWarning, Outcome};
use serde::Serialize;
use utoipa::ToSchema;

/// An account plus the non-fatal warnings its operation produced.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountOutcomeResponse {
    pub account: Account,
    pub warnings: Vec<OperationWarning>,
}

impl From<Outcome<Account>> for AccountOutcomeResponse {
    fn from(outcome: Outcome<Account>) -> Self {
        Self {
            account: outcome.value,
            warnings: outcome.warnings,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
