//! Application state shared by every handler.

use docportal_core::Config;
use docportal_services::PortalServices;
use docportal_store::RecordStore;
use std::sync::Arc;

use crate::auth::AuthFailureLimiter;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub services: PortalServices,
    pub store: Arc<dyn RecordStore>,
    pub auth_limiter: AuthFailureLimiter,
    pub trusted_proxy_count: usize,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn RecordStore>, services: PortalServices) -> Self {
        let auth_limiter = AuthFailureLimiter::new(
            config.auth_max_failures(),
            config.auth_failure_window_secs(),
        );
        let trusted_proxy_count = std::env::var("TRUSTED_PROXY_COUNT")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(crate::constants::DEFAULT_TRUSTED_PROXY_COUNT);
        Self {
            config,
            services,
            store,
            auth_limiter,
            trusted_proxy_count,
        }
    }
}
