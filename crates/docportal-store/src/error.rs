use crate::StoreError;
use docportal_core::AppError;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                AppError::NotFound(format!("{} {} not found", singular(&collection), id))
            }
            StoreError::AlreadyExists { collection, id } => {
                AppError::Conflict(format!("{} {} already exists", singular(&collection), id))
            }
            other => AppError::Store(other.to_string()),
        }
    }
}

fn singular(collection: &str) -> &str {
    match collection {
        "users" => "Account",
        "distributors" => "Distributor",
        "invitations" => "Invitation",
        "identities" => "Identity",
        "password_resets" => "Password reset",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_app_not_found() {
        let err: AppError = StoreError::not_found("users", "abc").into();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Account abc not found"));
    }

    #[test]
    fn test_backend_error_maps_to_store() {
        let err: AppError = StoreError::BackendError("down".to_string()).into();
        assert!(matches!(err, AppError::Store(_)));
    }
}
