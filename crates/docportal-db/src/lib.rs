//! Document portal repositories
//!
//! Typed access to the record store collections. Each repository owns one
//! collection and speaks in domain models; list fields are only touched through
//! the store's idempotent `array_union` / `array_remove`.

pub mod db;

pub use db::{
    AccountRepository, DistributorRepository, IdentityRecord, IdentityRepository,
    InvitationRepository, PasswordResetRepository,
};

use docportal_store::RecordStore;
use std::sync::Arc;

/// All repositories over one record store.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: AccountRepository,
    pub distributors: DistributorRepository,
    pub invitations: InvitationRepository,
    pub identities: IdentityRepository,
    pub password_resets: PasswordResetRepository,
}

impl Repositories {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            accounts: AccountRepository::new(store.clone()),
            distributors: DistributorRepository::new(store.clone()),
            invitations: InvitationRepository::new(store.clone()),
            identities: IdentityRepository::new(store.clone()),
            password_resets: PasswordResetRepository::new(store),
        }
    }
}
