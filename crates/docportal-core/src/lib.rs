//! Document portal core library
//!
//! Domain models, the authorization engine, error types, configuration and input
//! validation shared by every portal crate.

pub mod authorization;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod validation;

pub use authorization::{can_perform, AccountTarget, Actor, Decision, DenyReason, Operation, Target};
pub use config::{Config, PortalConfig, RecordStoreBackend};
pub use error::{AppError, ErrorKind, ErrorMetadata, LogLevel};
