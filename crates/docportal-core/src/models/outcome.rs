use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, ErrorKind, ErrorMetadata};

/// Non-fatal problem surfaced next to a successful result.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperationWarning {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
}

impl OperationWarning {
    /// A post-commit list cleanup that did not complete.
    pub fn cascade(step: impl Into<String>, err: &AppError) -> Self {
        Self {
            kind: ErrorKind::Cascade,
            code: "CASCADE_INCOMPLETE".to_string(),
            message: format!("{}: {}", step.into(), err.client_message()),
        }
    }

    /// A notification that could not be delivered.
    pub fn notification(err: &AppError) -> Self {
        Self {
            kind: ErrorKind::Upstream,
            code: "NOTIFICATION_FAILED".to_string(),
            message: err.client_message(),
        }
    }
}

/// Successful result plus the warnings collected on the way.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<OperationWarning>,
}

impl<T> Outcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<OperationWarning>) -> Self {
        Self { value, warnings }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}
