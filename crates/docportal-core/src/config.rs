//! Configuration module
//!
//! Settings are read from the environment (with `.env` support through `dotenvy`)
//! and validated once at startup.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::constants::{
    DEFAULT_INVITATION_TTL_DAYS, DEFAULT_PASSWORD_MIN_LENGTH, DEFAULT_PASSWORD_RESET_TTL_MINUTES,
};

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_HOURS: i64 = 24;
const AUTH_MAX_FAILURES: u32 = 10;
const AUTH_FAILURE_WINDOW_SECS: u64 = 300;
const DEV_JWT_SECRET: &str = "development-only-secret-change-me-0123456789";

/// Record store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStoreBackend {
    Memory,
    Postgres,
}

impl FromStr for RecordStoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(RecordStoreBackend::Memory),
            "postgres" | "postgresql" => Ok(RecordStoreBackend::Postgres),
            _ => Err(anyhow::anyhow!("Invalid record store backend: {}", s)),
        }
    }
}

impl Display for RecordStoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RecordStoreBackend::Memory => write!(f, "memory"),
            RecordStoreBackend::Postgres => write!(f, "postgres"),
        }
    }
}

/// Server-level settings.
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub environment: String,
    pub log_format: String,
    pub auth_max_failures: u32,
    pub auth_failure_window_secs: u64,
}

/// Portal configuration.
#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub base: BaseConfig,
    pub store_backend: RecordStoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub portal_base_url: String,
    pub invitation_ttl_days: i64,
    pub password_min_length: usize,
    pub password_reset_ttl_minutes: i64,
    pub email_enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig {
                server_port: 3000,
                cors_origins: vec!["*".to_string()],
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: JWT_EXPIRY_HOURS,
                environment: "development".to_string(),
                log_format: "compact".to_string(),
                auth_max_failures: AUTH_MAX_FAILURES,
                auth_failure_window_secs: AUTH_FAILURE_WINDOW_SECS,
            },
            store_backend: RecordStoreBackend::Memory,
            database_url: None,
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            portal_base_url: "http://localhost:3000".to_string(),
            invitation_ttl_days: DEFAULT_INVITATION_TTL_DAYS,
            password_min_length: DEFAULT_PASSWORD_MIN_LENGTH,
            password_reset_ttl_minutes: DEFAULT_PASSWORD_RESET_TTL_MINUTES,
            email_enabled: false,
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: None,
            smtp_tls: true,
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let defaults = PortalConfig::default();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| defaults.base.environment.clone());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let store_backend = match env_opt("RECORD_STORE_BACKEND") {
            Some(value) => value.parse::<RecordStoreBackend>()?,
            None if env_opt("DATABASE_URL").is_some() => RecordStoreBackend::Postgres,
            None => RecordStoreBackend::Memory,
        };

        let base = BaseConfig {
            server_port: env_parse("PORT", defaults.base.server_port),
            cors_origins,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            jwt_expiry_hours: env_parse("JWT_EXPIRY_HOURS", JWT_EXPIRY_HOURS),
            environment,
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
            auth_max_failures: env_parse("AUTH_MAX_FAILURES", AUTH_MAX_FAILURES),
            auth_failure_window_secs: env_parse(
                "AUTH_FAILURE_WINDOW_SECS",
                AUTH_FAILURE_WINDOW_SECS,
            ),
        };

        Ok(Self {
            base,
            store_backend,
            database_url: env_opt("DATABASE_URL"),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_parse("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            portal_base_url: env::var("PORTAL_BASE_URL")
                .unwrap_or(defaults.portal_base_url)
                .trim_end_matches('/')
                .to_string(),
            invitation_ttl_days: env_parse("INVITATION_TTL_DAYS", DEFAULT_INVITATION_TTL_DAYS),
            password_min_length: env_parse("PASSWORD_MIN_LENGTH", DEFAULT_PASSWORD_MIN_LENGTH),
            password_reset_ttl_minutes: env_parse(
                "PASSWORD_RESET_TTL_MINUTES",
                DEFAULT_PASSWORD_RESET_TTL_MINUTES,
            ),
            email_enabled: env_bool("EMAIL_ENABLED", false),
            smtp_host: env_opt("SMTP_HOST"),
            smtp_port: env_parse("SMTP_PORT", defaults.smtp_port),
            smtp_username: env_opt("SMTP_USER"),
            smtp_password: env_opt("SMTP_PASSWORD"),
            smtp_from: env_opt("SMTP_FROM"),
            smtp_tls: env_bool("SMTP_TLS", true),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if self.base.jwt_expiry_hours <= 0 {
            return Err(anyhow::anyhow!("JWT_EXPIRY_HOURS must be positive"));
        }

        let is_production = is_production_environment(&self.base.environment);
        if is_production && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.store_backend == RecordStoreBackend::Postgres {
            match self.database_url.as_deref() {
                Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {}
                Some(_) => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ))
                }
                None => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be set when RECORD_STORE_BACKEND=postgres"
                    ))
                }
            }
        }

        if is_production && self.store_backend == RecordStoreBackend::Memory {
            return Err(anyhow::anyhow!(
                "The in-memory record store is not durable; use RECORD_STORE_BACKEND=postgres in production"
            ));
        }

        if !(self.portal_base_url.starts_with("http://")
            || self.portal_base_url.starts_with("https://"))
        {
            return Err(anyhow::anyhow!(
                "PORTAL_BASE_URL must be an absolute http(s) URL"
            ));
        }

        if self.invitation_ttl_days <= 0 {
            return Err(anyhow::anyhow!("INVITATION_TTL_DAYS must be positive"));
        }

        if self.password_min_length < 6 {
            return Err(anyhow::anyhow!("PASSWORD_MIN_LENGTH must be at least 6"));
        }

        if self.email_enabled && (self.smtp_host.is_none() || self.smtp_from.is_none()) {
            return Err(anyhow::anyhow!(
                "EMAIL_ENABLED=true requires SMTP_HOST and SMTP_FROM to be set"
            ));
        }

        Ok(())
    }
}

pub fn is_production_environment(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

/// Application configuration.
#[derive(Clone, Debug, Default)]
pub struct Config(pub Box<PortalConfig>);

impl Config {
    fn inner(&self) -> &PortalConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Config(Box::new(PortalConfig::from_env()?)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn is_production(&self) -> bool {
        is_production_environment(&self.inner().base.environment)
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn jwt_expiry_hours(&self) -> i64 {
        self.inner().base.jwt_expiry_hours
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn auth_max_failures(&self) -> u32 {
        self.inner().base.auth_max_failures
    }

    pub fn auth_failure_window_secs(&self) -> u64 {
        self.inner().base.auth_failure_window_secs
    }

    pub fn store_backend(&self) -> RecordStoreBackend {
        self.inner().store_backend
    }

    pub fn database_url(&self) -> Option<&str> {
        self.inner().database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().db_timeout_seconds
    }

    pub fn portal_base_url(&self) -> &str {
        &self.inner().portal_base_url
    }

    pub fn invitation_ttl_days(&self) -> i64 {
        self.inner().invitation_ttl_days
    }

    pub fn password_min_length(&self) -> usize {
        self.inner().password_min_length
    }

    pub fn password_reset_ttl_minutes(&self) -> i64 {
        self.inner().password_reset_ttl_minutes
    }

    pub fn email_enabled(&self) -> bool {
        self.inner().email_enabled
    }

    pub fn smtp_host(&self) -> Option<&str> {
        self.inner().smtp_host.as_deref()
    }

    pub fn smtp_port(&self) -> u16 {
        self.inner().smtp_port
    }

    pub fn smtp_username(&self) -> Option<&str> {
        self.inner().smtp_username.as_deref()
    }

    pub fn smtp_password(&self) -> Option<&str> {
        self.inner().smtp_password.as_deref()
    }

    pub fn smtp_from(&self) -> Option<&str> {
        self.inner().smtp_from.as_deref()
    }

    pub fn smtp_tls(&self) -> bool {
        self.inner().smtp_tls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut cfg = PortalConfig::default();
        cfg.base.jwt_secret = "short".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let mut cfg = PortalConfig::default();
        cfg.base.environment = "production".to_string();
        cfg.store_backend = RecordStoreBackend::Postgres;
        cfg.database_url = Some("postgres://portal@localhost/portal".to_string());
        assert!(cfg.validate().is_err());
        cfg.base.cors_origins = vec!["https://portal.example.com".to_string()];
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_postgres_backend_requires_database_url() {
        let mut cfg = PortalConfig::default();
        cfg.store_backend = RecordStoreBackend::Postgres;
        assert!(cfg.validate().is_err());
        cfg.database_url = Some("mysql://nope".to_string());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_email_requires_smtp_settings() {
        let mut cfg = PortalConfig::default();
        cfg.email_enabled = true;
        assert!(cfg.validate().is_err());
        cfg.smtp_host = Some("smtp.example.com".to_string());
        cfg.smtp_from = Some("portal@example.com".to_string());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(
            "Postgres".parse::<RecordStoreBackend>().unwrap(),
            RecordStoreBackend::Postgres
        );
        assert!("redis".parse::<RecordStoreBackend>().is_err());
    }
}
