//! Test helpers: an in-memory portal behind the real router.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use docportal_api::constants;
use docportal_api::setup::routes;
use docportal_api::state::AppState;
use docportal_core::{Config, PortalConfig};
use docportal_db::IdentityRepository;
use docportal_services::{
    LocalIdentityProvider, NotificationError, NotificationSender, PortalServices, TemplateKind,
    TemplateVars,
};
use docportal_store::{MemoryRecordStore, RecordStore};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub const PASSWORD: &str = "Sup3r-secret";
pub const ADMIN_EMAIL: &str = "root@portal.test";
pub const MAX_AUTH_FAILURES: u32 = 3;

/// API path prefix for tests (e.g. `/api/v1`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

#[derive(Debug, Clone)]
pub struct Sent {
    pub kind: TemplateKind,
    pub to: String,
    pub vars: TemplateVars,
}

#[derive(Default)]
pub struct Outbox {
    sent: Mutex<Vec<Sent>>,
}

impl Outbox {
    pub fn last_to(&self, to: &str) -> Option<Sent> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|s| s.to == to)
            .cloned()
    }

    /// Token query parameter of the last link sent to `to`.
    pub fn token_for(&self, to: &str) -> String {
        let sent = self.last_to(to).expect("message sent");
        let link = &sent.vars["link"];
        let query = link.split("token=").nth(1).expect("token in link");
        query.split('&').next().unwrap_or_default().to_string()
    }
}

#[async_trait]
impl NotificationSender for Outbox {
    async fn send(
        &self,
        kind: TemplateKind,
        to: &str,
        vars: &TemplateVars,
    ) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(Sent {
            kind,
            to: to.to_string(),
            vars: vars.clone(),
        });
        Ok(())
    }

    fn sender_name(&self) -> &'static str {
        "outbox"
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub outbox: Arc<Outbox>,
}

pub fn setup_test_app() -> TestApp {
    let mut portal = PortalConfig::default();
    portal.base.auth_max_failures = MAX_AUTH_FAILURES;
    let config = Config(Box::new(portal));

    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let identity = Arc::new(LocalIdentityProvider::from_config(
        &config,
        IdentityRepository::new(store.clone()),
    ));
    let outbox = Arc::new(Outbox::default());
    let services = PortalServices::new(&config, store.clone(), identity, outbox.clone());
    let state = Arc::new(AppState::new(config.clone(), store, services));

    let router = routes::setup_routes(&config, state.clone()).expect("routes");
    let server = TestServer::new(router).expect("test server");
    TestApp {
        server,
        state,
        outbox,
    }
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> String {
        let response = self
            .server
            .post(&api_path("/auth/sign-in"))
            .json(&json!({ "email": email, "password": password }))
            .await;
        assert_eq!(response.status_code(), 200, "sign in {email}");
        let body: Value = response.json();
        body["token"].as_str().expect("token").to_string()
    }

    /// Bootstraps the platform admin and returns its session token.
    pub async fn admin_token(&self) -> String {
        self.state
            .services
            .accounts
            .bootstrap_admin(ADMIN_EMAIL, PASSWORD, "Root")
            .await
            .expect("bootstrap admin");
        self.sign_in(ADMIN_EMAIL, PASSWORD).await
    }

    /// Creates an account through the API and returns its JSON.
    pub async fn create_account(&self, token: &str, body: Value) -> Value {
        let response = self
            .server
            .post(&api_path("/accounts"))
            .add_header("Authorization", bearer(token))
            .json(&body)
            .await;
        assert_eq!(response.status_code(), 201, "create account: {}", response.text());
        response.json()
    }

    /// A distributor founding a new organization.
    pub async fn founder(&self, admin_token: &str, email: &str, company: &str) -> Value {
        self.create_account(
            admin_token,
            json!({
                "email": email,
                "password": PASSWORD,
                "displayName": "Founder",
                "role": "distributor",
                "newOrganization": { "companyName": company }
            }),
        )
        .await
    }
}
