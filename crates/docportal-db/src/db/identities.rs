use chrono::{DateTime, Utc};
use docportal_core::constants::collections::IDENTITIES;
use docportal_core::AppError;
use docportal_store::{from_document, to_document, Filter, RecordStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::id_value;

/// Sign-in identity, keyed by normalized email so registration is insert-if-absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_changed_at: Option<DateTime<Utc>>,
}

/// Repository for sign-in identities
#[derive(Clone)]
pub struct IdentityRepository {
    store: Arc<dyn RecordStore>,
}

impl IdentityRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Returns `Ok(false)` when the email is already registered.
    #[tracing::instrument(skip(self, record), fields(db.collection = IDENTITIES, db.operation = "create"))]
    pub async fn create(&self, record: &IdentityRecord) -> Result<bool, AppError> {
        match self
            .store
            .create(IDENTITIES, &record.email, to_document(record)?)
            .await
        {
            Ok(()) => Ok(true),
            Err(StoreError::AlreadyExists { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self), fields(db.collection = IDENTITIES, db.operation = "get"))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, AppError> {
        match self.store.get(IDENTITIES, email).await {
            Ok(doc) => Ok(Some(from_document(doc)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self), fields(db.collection = IDENTITIES, db.operation = "query", db.record_id = %id))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<IdentityRecord>, AppError> {
        let docs = self
            .store
            .query(IDENTITIES, &Filter::all().eq("id", id_value(id)))
            .await?;
        match docs.into_iter().next() {
            Some(doc) => Ok(Some(from_document(doc.data)?)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self, password_hash), fields(db.collection = IDENTITIES, db.operation = "merge"))]
    pub async fn update_password_hash(
        &self,
        email: &str,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.store
            .update(
                IDENTITIES,
                email,
                json!({ "passwordHash": password_hash, "passwordChangedAt": at }),
                &Filter::all(),
            )
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.collection = IDENTITIES, db.operation = "delete"))]
    pub async fn delete(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.store.delete(IDENTITIES, email).await?)
    }
}
