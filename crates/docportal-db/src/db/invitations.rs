use chrono::{DateTime, Utc};
use docportal_core::constants::collections::INVITATIONS;
use docportal_core::models::{Invitation, InvitationStatus};
use docportal_core::AppError;
use docportal_store::{from_document, to_document, Document, Filter, RecordStore};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::id_value;

/// Repository for invitations
#[derive(Clone)]
pub struct InvitationRepository {
    store: Arc<dyn RecordStore>,
}

impl InvitationRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, invitation), fields(db.collection = INVITATIONS, db.operation = "create", db.record_id = %invitation.id))]
    pub async fn insert(&self, invitation: &Invitation) -> Result<(), AppError> {
        self.store
            .create(
                INVITATIONS,
                &invitation.id.to_string(),
                to_document(invitation)?,
            )
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.collection = INVITATIONS, db.operation = "get", db.record_id = %id))]
    pub async fn find(&self, id: Uuid) -> Result<Option<Invitation>, AppError> {
        match self.store.get(INVITATIONS, &id.to_string()).await {
            Ok(doc) => Ok(Some(from_document(doc)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self, token), fields(db.collection = INVITATIONS, db.operation = "query"))]
    pub async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, AppError> {
        let docs = self
            .store
            .query(INVITATIONS, &Filter::all().eq("token", token))
            .await?;
        match docs.into_iter().next() {
            Some(doc) => Ok(Some(from_document(doc.data)?)),
            None => Ok(None),
        }
    }

    pub async fn token_exists(&self, token: &str) -> Result<bool, AppError> {
        Ok(self.find_by_token(token).await?.is_some())
    }

    #[tracing::instrument(skip(self), fields(db.collection = INVITATIONS, db.operation = "query"))]
    pub async fn list_all(&self) -> Result<Vec<Invitation>, AppError> {
        self.query(Filter::all()).await
    }

    #[tracing::instrument(skip(self), fields(db.collection = INVITATIONS, db.operation = "query"))]
    pub async fn list_by_inviter(&self, inviter_id: Uuid) -> Result<Vec<Invitation>, AppError> {
        self.query(Filter::all().eq("inviterId", id_value(inviter_id)))
            .await
    }

    /// pending → accepted. Returns false when the invitation is no longer pending,
    /// `NotFound` when it was deleted.
    #[tracing::instrument(skip(self), fields(db.collection = INVITATIONS, db.operation = "merge", db.record_id = %id))]
    pub async fn mark_accepted(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError> {
        self.transition_from_pending(
            id,
            json!({ "status": InvitationStatus::Accepted, "acceptedAt": at }),
        )
        .await
    }

    /// pending → expired. Returns false when the invitation is no longer pending.
    #[tracing::instrument(skip(self), fields(db.collection = INVITATIONS, db.operation = "merge", db.record_id = %id))]
    pub async fn mark_expired(&self, id: Uuid) -> Result<bool, AppError> {
        self.transition_from_pending(id, json!({ "status": InvitationStatus::Expired }))
            .await
    }

    async fn transition_from_pending(&self, id: Uuid, fields: Document) -> Result<bool, AppError> {
        let pending = Filter::all().eq("status", json!(InvitationStatus::Pending));
        Ok(self
            .store
            .update(INVITATIONS, &id.to_string(), fields, &pending)
            .await?)
    }

    #[tracing::instrument(skip(self), fields(db.collection = INVITATIONS, db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.store.delete(INVITATIONS, &id.to_string()).await?)
    }

    async fn query(&self, filter: Filter) -> Result<Vec<Invitation>, AppError> {
        let docs = self.store.query(INVITATIONS, &filter).await?;
        docs.into_iter()
            .map(|doc| from_document(doc.data).map_err(AppError::from))
            .collect()
    }
}
