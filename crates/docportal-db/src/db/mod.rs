//! Repositories for the portal's record store collections.

pub mod accounts;
pub mod distributors;
pub mod identities;
pub mod invitations;
pub mod password_resets;

pub use accounts::AccountRepository;
pub use distributors::DistributorRepository;
pub use identities::{IdentityRecord, IdentityRepository};
pub use invitations::InvitationRepository;
pub use password_resets::PasswordResetRepository;

use serde_json::Value;
use uuid::Uuid;

pub(crate) fn id_value(id: Uuid) -> Value {
    Value::String(id.to_string())
}
