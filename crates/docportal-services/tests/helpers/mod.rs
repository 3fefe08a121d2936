//! Shared fixtures for service tests: an in-memory portal with controllable
//! identity provider, notification sender and record store doubles.

#![allow(dead_code)]

use async_trait::async_trait;
use docportal_core::models::{Account, CreateAccountInput, NewOrganization, Role};
use docportal_core::{Actor, Config};
use docportal_db::{IdentityRepository, Repositories};
use docportal_services::{
    IdentityError, IdentityProvider, IdentityResult, LocalIdentityProvider, NotificationError,
    NotificationSender, PortalServices, Session, TemplateKind, TemplateVars,
};
use docportal_store::{
    Document, Filter, MemoryRecordStore, RecordStore, SetOptions, StoreError, StoreResult,
    StoredDocument,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const PASSWORD: &str = "Sup3r-secret";

#[derive(Debug, Clone)]
pub struct SentNotification {
    pub kind: TemplateKind,
    pub to: String,
    pub vars: TemplateVars,
}

/// Records every message; fails every send while `failing` is set.
#[derive(Default)]
pub struct RecordingNotificationSender {
    sent: Mutex<Vec<SentNotification>>,
    failing: AtomicBool,
}

impl RecordingNotificationSender {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_to(&self, to: &str) -> Option<SentNotification> {
        self.sent().into_iter().rev().find(|n| n.to == to)
    }
}

#[async_trait]
impl NotificationSender for RecordingNotificationSender {
    async fn send(
        &self,
        kind: TemplateKind,
        to: &str,
        vars: &TemplateVars,
    ) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Transport("smtp relay unreachable".to_string()));
        }
        self.sent.lock().unwrap().push(SentNotification {
            kind,
            to: to.to_string(),
            vars: vars.clone(),
        });
        Ok(())
    }

    fn sender_name(&self) -> &'static str {
        "recording"
    }
}

/// Local identity provider whose deletes can be made to fail.
pub struct FlakyIdentityProvider {
    inner: LocalIdentityProvider,
    fail_deletes: AtomicBool,
}

impl FlakyIdentityProvider {
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for FlakyIdentityProvider {
    async fn create_identity(&self, email: &str, password: &str) -> IdentityResult<Uuid> {
        self.inner.create_identity(email, password).await
    }

    async fn verify_identity(&self, token: &str) -> IdentityResult<Uuid> {
        self.inner.verify_identity(token).await
    }

    async fn delete_identity(&self, id: Uuid) -> IdentityResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(IdentityError::Unavailable("identity backend timeout".to_string()));
        }
        self.inner.delete_identity(id).await
    }

    async fn change_password(
        &self,
        id: Uuid,
        current: &str,
        new_password: &str,
    ) -> IdentityResult<()> {
        self.inner.change_password(id, current, new_password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<Session> {
        self.inner.sign_in(email, password).await
    }

    async fn set_password(&self, id: Uuid, new_password: &str) -> IdentityResult<()> {
        self.inner.set_password(id, new_password).await
    }

    fn provider_name(&self) -> &'static str {
        "flaky-local"
    }
}

/// Memory store that can refuse writes to one collection, or list updates.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryRecordStore,
    failing_creates: Mutex<Option<String>>,
    fail_array_ops: AtomicBool,
}

impl FaultyStore {
    pub fn fail_creates_in(&self, collection: Option<&str>) {
        *self.failing_creates.lock().unwrap() = collection.map(str::to_string);
    }

    pub fn set_fail_array_ops(&self, fail: bool) {
        self.fail_array_ops.store(fail, Ordering::SeqCst);
    }

    fn check_create(&self, collection: &str) -> StoreResult<()> {
        match self.failing_creates.lock().unwrap().as_deref() {
            Some(failing) if failing == collection => {
                Err(StoreError::BackendError("connection reset".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn check_array(&self) -> StoreResult<()> {
        if self.fail_array_ops.load(Ordering::SeqCst) {
            Err(StoreError::BackendError("write timeout".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for FaultyStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document> {
        self.inner.get(collection, id).await
    }

    async fn query(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<StoredDocument>> {
        self.inner.query(collection, filter).await
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        data: Document,
        options: SetOptions,
    ) -> StoreResult<()> {
        self.inner.set(collection, id, data, options).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
        only_if: &Filter,
    ) -> StoreResult<bool> {
        self.inner.update(collection, id, patch, only_if).await
    }

    async fn create(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        self.check_create(collection)?;
        self.inner.create(collection, id, data).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        self.inner.delete(collection, id).await
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[Value],
    ) -> StoreResult<()> {
        self.check_array()?;
        self.inner.array_union(collection, id, field, values).await
    }

    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[Value],
    ) -> StoreResult<()> {
        self.check_array()?;
        self.inner.array_remove(collection, id, field, values).await
    }

    fn backend_type(&self) -> &'static str {
        "faulty-memory"
    }
}

pub struct TestPortal {
    pub config: Config,
    pub store: Arc<FaultyStore>,
    pub repos: Repositories,
    pub identity: Arc<FlakyIdentityProvider>,
    pub outbox: Arc<RecordingNotificationSender>,
    pub services: PortalServices,
}

pub fn setup() -> TestPortal {
    let config = Config::default();
    let store = Arc::new(FaultyStore::default());
    let record_store: Arc<dyn RecordStore> = store.clone();
    let identity = Arc::new(FlakyIdentityProvider {
        inner: LocalIdentityProvider::from_config(
            &config,
            IdentityRepository::new(record_store.clone()),
        ),
        fail_deletes: AtomicBool::new(false),
    });
    let outbox = Arc::new(RecordingNotificationSender::default());
    let services = PortalServices::new(
        &config,
        record_store.clone(),
        identity.clone(),
        outbox.clone(),
    );
    TestPortal {
        config,
        store,
        repos: Repositories::new(record_store),
        identity,
        outbox,
        services,
    }
}

pub fn input(email: &str, role: Role) -> CreateAccountInput {
    CreateAccountInput {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        display_name: email.split('@').next().unwrap_or("someone").to_string(),
        role,
        distributor_id: None,
        new_organization: None,
        company_name: None,
        grant_team_admin: false,
    }
}

pub fn organization(name: &str) -> NewOrganization {
    NewOrganization {
        company_name: name.to_string(),
        contact_email: None,
        contact_phone: None,
        address: None,
    }
}

impl TestPortal {
    pub async fn admin(&self) -> Account {
        self.services
            .accounts
            .bootstrap_admin("root@portal.test", PASSWORD, "Root")
            .await
            .unwrap()
    }

    /// Distributor founding a new organization, created by `admin`.
    pub async fn founder(&self, admin: &Account, email: &str, company: &str) -> Account {
        let mut input = input(email, Role::Distributor);
        input.new_organization = Some(organization(company));
        self.services
            .accounts
            .create_account(&Actor::from_account(admin), input)
            .await
            .unwrap()
    }

    pub async fn create(&self, creator: &Account, email: &str, role: Role) -> Account {
        self.services
            .accounts
            .create_account(&Actor::from_account(creator), input(email, role))
            .await
            .unwrap()
    }

    pub async fn reload(&self, account: &Account) -> Account {
        self.repos.accounts.get(account.id).await.unwrap()
    }

    pub async fn actor(&self, account: &Account) -> Actor {
        Actor::from_account(&self.reload(account).await)
    }

    pub async fn account_count(&self) -> usize {
        self.store.inner.count("users").await
    }

    pub async fn identity_count(&self) -> usize {
        self.store.inner.count("identities").await
    }
}
