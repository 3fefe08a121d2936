use docportal_core::constants::collections::DISTRIBUTORS;
use docportal_core::models::Distributor;
use docportal_core::AppError;
use docportal_store::{from_document, to_document, Filter, RecordStore};
use std::sync::Arc;
use uuid::Uuid;

use super::id_value;

const TEAM_MEMBERS: &str = "teamMembers";
const ADMIN_MEMBERS: &str = "adminMembers";

/// Repository for distributor organizations
#[derive(Clone)]
pub struct DistributorRepository {
    store: Arc<dyn RecordStore>,
}

impl DistributorRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self), fields(db.collection = DISTRIBUTORS, db.operation = "get", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Distributor, AppError> {
        let doc = self.store.get(DISTRIBUTORS, &id.to_string()).await?;
        Ok(from_document(doc)?)
    }

    #[tracing::instrument(skip(self), fields(db.collection = DISTRIBUTORS, db.operation = "get", db.record_id = %id))]
    pub async fn find(&self, id: Uuid) -> Result<Option<Distributor>, AppError> {
        match self.store.get(DISTRIBUTORS, &id.to_string()).await {
            Ok(doc) => Ok(Some(from_document(doc)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self, distributor), fields(db.collection = DISTRIBUTORS, db.operation = "create", db.record_id = %distributor.id))]
    pub async fn insert(&self, distributor: &Distributor) -> Result<(), AppError> {
        self.store
            .create(
                DISTRIBUTORS,
                &distributor.id.to_string(),
                to_document(distributor)?,
            )
            .await?;
        Ok(())
    }

    /// Compensating removal of an organization whose founding account was never written
    #[tracing::instrument(skip(self), fields(db.collection = DISTRIBUTORS, db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.store.delete(DISTRIBUTORS, &id.to_string()).await?)
    }

    #[tracing::instrument(skip(self), fields(db.collection = DISTRIBUTORS, db.operation = "query"))]
    pub async fn list_all(&self) -> Result<Vec<Distributor>, AppError> {
        self.query(Filter::all()).await
    }

    #[tracing::instrument(skip(self), fields(db.collection = DISTRIBUTORS, db.operation = "array_union"))]
    pub async fn add_team_member(&self, id: Uuid, account_id: Uuid) -> Result<(), AppError> {
        self.store
            .array_union(DISTRIBUTORS, &id.to_string(), TEAM_MEMBERS, &[id_value(account_id)])
            .await?;
        Ok(())
    }

    /// Adds to `adminMembers`, and to `teamMembers` first so the subset invariant holds
    /// at every intermediate state.
    #[tracing::instrument(skip(self), fields(db.collection = DISTRIBUTORS, db.operation = "array_union"))]
    pub async fn add_admin_member(&self, id: Uuid, account_id: Uuid) -> Result<(), AppError> {
        self.add_team_member(id, account_id).await?;
        self.store
            .array_union(DISTRIBUTORS, &id.to_string(), ADMIN_MEMBERS, &[id_value(account_id)])
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.collection = DISTRIBUTORS, db.operation = "array_remove"))]
    pub async fn remove_admin_member(&self, id: Uuid, account_id: Uuid) -> Result<(), AppError> {
        self.store
            .array_remove(DISTRIBUTORS, &id.to_string(), ADMIN_MEMBERS, &[id_value(account_id)])
            .await?;
        Ok(())
    }

    /// Removes from `adminMembers` before `teamMembers`, keeping the subset invariant.
    #[tracing::instrument(skip(self), fields(db.collection = DISTRIBUTORS, db.operation = "array_remove"))]
    pub async fn remove_member(&self, id: Uuid, account_id: Uuid) -> Result<(), AppError> {
        self.remove_admin_member(id, account_id).await?;
        self.store
            .array_remove(DISTRIBUTORS, &id.to_string(), TEAM_MEMBERS, &[id_value(account_id)])
            .await?;
        Ok(())
    }

    /// Organizations whose team or admin list references the account
    #[tracing::instrument(skip(self), fields(db.collection = DISTRIBUTORS, db.operation = "query"))]
    pub async fn find_referencing(&self, account_id: Uuid) -> Result<Vec<Distributor>, AppError> {
        let mut found = self
            .query(Filter::all().array_contains(TEAM_MEMBERS, id_value(account_id)))
            .await?;
        for org in self
            .query(Filter::all().array_contains(ADMIN_MEMBERS, id_value(account_id)))
            .await?
        {
            if !found.iter().any(|existing| existing.id == org.id) {
                found.push(org);
            }
        }
        Ok(found)
    }

    async fn query(&self, filter: Filter) -> Result<Vec<Distributor>, AppError> {
        let docs = self.store.query(DISTRIBUTORS, &filter).await?;
        docs.into_iter()
            .map(|doc| from_document(doc.data).map_err(AppError::from))
            .collect()
    }
}
