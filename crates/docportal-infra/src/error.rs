//! HTTP error body
//!
//! Only the response shape lives here. The `IntoResponse` conversion for
//! `docportal_core::AppError` is in the API crate: the orphan rule forbids
//! implementing axum's trait for a core type in a third crate.

use docportal_core::ErrorKind;
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response format
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    /// Stable machine-readable code, e.g. `DUPLICATE_EMAIL`
    pub code: String,
    pub kind: ErrorKind,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
