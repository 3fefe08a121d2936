//! HTTP middleware
//!
//! Request IDs and security headers come from `docportal-infra`; audit logging is
//! specific to this API.

pub mod audit;

pub use docportal_infra::{request_id_middleware, security_headers_middleware};
