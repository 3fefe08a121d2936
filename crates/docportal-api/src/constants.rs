//! API constants

/// Prefix for every versioned route.
pub const API_PREFIX: &str = "/api/v1";

/// Request bodies are small JSON documents.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Proxies in front of the server whose `X-Forwarded-For` entries are trusted.
pub const DEFAULT_TRUSTED_PROXY_COUNT: usize = 1;
