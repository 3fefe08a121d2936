use chrono::{DateTime, Utc};
use docportal_core::constants::collections::PASSWORD_RESETS;
use docportal_core::models::PasswordReset;
use docportal_core::AppError;
use docportal_store::{from_document, to_document, Filter, RecordStore};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::id_value;

/// Repository for password reset grants
#[derive(Clone)]
pub struct PasswordResetRepository {
    store: Arc<dyn RecordStore>,
}

impl PasswordResetRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, reset), fields(db.collection = PASSWORD_RESETS, db.operation = "create", db.record_id = %reset.id))]
    pub async fn insert(&self, reset: &PasswordReset) -> Result<(), AppError> {
        self.store
            .create(PASSWORD_RESETS, &reset.id.to_string(), to_document(reset)?)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.collection = PASSWORD_RESETS, db.operation = "get", db.record_id = %id))]
    pub async fn find(&self, id: Uuid) -> Result<Option<PasswordReset>, AppError> {
        match self.store.get(PASSWORD_RESETS, &id.to_string()).await {
            Ok(doc) => Ok(Some(from_document(doc)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns false when the grant was deleted in the meantime.
    #[tracing::instrument(skip(self), fields(db.collection = PASSWORD_RESETS, db.operation = "merge", db.record_id = %id))]
    pub async fn mark_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError> {
        let result = self
            .store
            .update(
                PASSWORD_RESETS,
                &id.to_string(),
                json!({ "usedAt": at }),
                &Filter::all(),
            )
            .await;
        match result {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Drops every outstanding grant of an account. Returns how many were removed.
    #[tracing::instrument(skip(self), fields(db.collection = PASSWORD_RESETS, db.operation = "delete"))]
    pub async fn delete_for_account(&self, account_id: Uuid) -> Result<usize, AppError> {
        let docs = self
            .store
            .query(
                PASSWORD_RESETS,
                &Filter::all().eq("accountId", id_value(account_id)),
            )
            .await?;
        let mut removed = 0;
        for doc in docs {
            if self.store.delete(PASSWORD_RESETS, &doc.id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use docportal_store::MemoryRecordStore;

    #[tokio::test]
    async fn test_mark_used_and_cleanup() {
        let repo = PasswordResetRepository::new(Arc::new(MemoryRecordStore::new()));
        let account_id = Uuid::new_v4();
        let now = Utc::now();
        let reset = PasswordReset {
            id: Uuid::new_v4(),
            account_id,
            secret_hash: "h".to_string(),
            created_at: now,
            expires_at: now + Duration::hours(1),
            used_at: None,
        };
        repo.insert(&reset).await.unwrap();
        assert!(repo.find(reset.id).await.unwrap().unwrap().is_usable(now));

        assert!(repo.mark_used(reset.id, now).await.unwrap());
        assert!(!repo.find(reset.id).await.unwrap().unwrap().is_usable(now));

        assert_eq!(repo.delete_for_account(account_id).await.unwrap(), 1);
        assert!(repo.find(reset.id).await.unwrap().is_none());
        assert!(!repo.mark_used(reset.id, now).await.unwrap());
    }
}
