use chrono::{DateTime, Utc};
use docportal_core::constants::collections::USERS;
use docportal_core::models::{Account, Role};
use docportal_core::AppError;
use docportal_store::{from_document, to_document, Document, Filter, RecordStore};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::id_value;

/// Repository for portal accounts (`users` collection)
#[derive(Clone)]
pub struct AccountRepository {
    store: Arc<dyn RecordStore>,
}

impl AccountRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Get account by id, failing with `NotFound` when absent
    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "get", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Account, AppError> {
        let doc = self.store.get(USERS, &id.to_string()).await?;
        Ok(from_document(doc)?)
    }

    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "get", db.record_id = %id))]
    pub async fn find(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        match self.store.get(USERS, &id.to_string()).await {
            Ok(doc) => Ok(Some(from_document(doc)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Email must already be normalized
    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "query"))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let docs = self
            .store
            .query(USERS, &Filter::all().eq("email", email))
            .await?;
        match docs.into_iter().next() {
            Some(doc) => Ok(Some(from_document(doc.data)?)),
            None => Ok(None),
        }
    }

    /// Insert a new account; fails with `Conflict` if the id is taken
    #[tracing::instrument(skip(self, account), fields(db.collection = USERS, db.operation = "create", db.record_id = %account.id))]
    pub async fn insert(&self, account: &Account) -> Result<(), AppError> {
        self.store
            .create(USERS, &account.id.to_string(), to_document(account)?)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "merge", db.record_id = %id))]
    pub async fn set_display_name(&self, id: Uuid, display_name: &str) -> Result<(), AppError> {
        self.patch(id, json!({ "displayName": display_name })).await
    }

    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "merge", db.record_id = %id))]
    pub async fn set_distributor_admin(&self, id: Uuid, is_admin: bool) -> Result<(), AppError> {
        self.patch(id, json!({ "isDistributorAdmin": is_admin })).await
    }

    /// Role change that keeps the tenancy links (installer ⇄ user).
    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "merge", db.record_id = %id))]
    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<(), AppError> {
        self.patch(id, json!({ "role": role })).await
    }

    /// Promotion to platform admin. Tenancy fields are nulled, which reads back as absent.
    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "merge", db.record_id = %id))]
    pub async fn promote_to_admin(&self, id: Uuid) -> Result<(), AppError> {
        self.patch(
            id,
            json!({
                "role": Role::Admin,
                "distributorId": null,
                "isDistributorAdmin": null,
                "managedUsers": null,
                "companyName": null,
            }),
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "merge", db.record_id = %id))]
    pub async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        self.patch(id, json!({ "lastLogin": at })).await
    }

    /// Delete an account. Returns whether this call removed it.
    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.store.delete(USERS, &id.to_string()).await?)
    }

    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "query"))]
    pub async fn list_all(&self) -> Result<Vec<Account>, AppError> {
        self.query(Filter::all()).await
    }

    /// Accounts whose `distributorId` is the organization
    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "query"))]
    pub async fn list_by_organization(
        &self,
        distributor_id: Uuid,
    ) -> Result<Vec<Account>, AppError> {
        self.query(Filter::all().eq("distributorId", id_value(distributor_id)))
            .await
    }

    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "query"))]
    pub async fn list_by_role(&self, role: Role) -> Result<Vec<Account>, AppError> {
        self.query(Filter::all().eq("role", role.as_str())).await
    }

    /// Distributor accounts listing `managed_id` in `managedUsers`
    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "query"))]
    pub async fn find_managers_of(&self, managed_id: Uuid) -> Result<Vec<Account>, AppError> {
        self.query(Filter::all().array_contains("managedUsers", id_value(managed_id)))
            .await
    }

    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "array_union"))]
    pub async fn add_managed_users(&self, manager_id: Uuid, ids: &[Uuid]) -> Result<(), AppError> {
        let values: Vec<_> = ids.iter().copied().map(id_value).collect();
        self.store
            .array_union(USERS, &manager_id.to_string(), "managedUsers", &values)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "array_remove"))]
    pub async fn remove_managed_user(&self, manager_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.store
            .array_remove(USERS, &manager_id.to_string(), "managedUsers", &[id_value(id)])
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.collection = USERS, db.operation = "query"))]
    pub async fn admin_exists(&self) -> Result<bool, AppError> {
        Ok(!self.list_by_role(Role::Admin).await?.is_empty())
    }

    /// Merge fields into an existing account. A deleted account stays deleted.
    async fn patch(&self, id: Uuid, fields: Document) -> Result<(), AppError> {
        self.store
            .update(USERS, &id.to_string(), fields, &Filter::all())
            .await?;
        Ok(())
    }

    async fn query(&self, filter: Filter) -> Result<Vec<Account>, AppError> {
        let docs = self.store.query(USERS, &filter).await?;
        docs.into_iter()
            .map(|doc| from_document(doc.data).map_err(AppError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docportal_store::MemoryRecordStore;

    fn account(role: Role, org: Option<Uuid>) -> Account {
        Account {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4()),
            display_name: "Someone".to_string(),
            role,
            active: true,
            created_at: Utc::now(),
            last_login: None,
            created_by: None,
            distributor_id: org,
            is_distributor_admin: None,
            managed_users: None,
            company_name: None,
        }
    }

    fn repo() -> AccountRepository {
        AccountRepository::new(Arc::new(MemoryRecordStore::new()))
    }

    #[tokio::test]
    async fn test_insert_get_roundtrip_and_duplicate_id() {
        let repo = repo();
        let a = account(Role::Installer, Some(Uuid::new_v4()));
        repo.insert(&a).await.unwrap();
        assert_eq!(repo.get(a.id).await.unwrap(), a);
        assert!(matches!(repo.insert(&a).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_managed_users_merge_and_lookup() {
        let repo = repo();
        let mut manager = account(Role::Distributor, Some(Uuid::new_v4()));
        manager.managed_users = Some(Vec::new());
        repo.insert(&manager).await.unwrap();
        let managed = Uuid::new_v4();

        repo.add_managed_users(manager.id, &[managed]).await.unwrap();
        repo.add_managed_users(manager.id, &[managed]).await.unwrap();
        assert_eq!(repo.get(manager.id).await.unwrap().managed_users(), &[managed]);

        let managers = repo.find_managers_of(managed).await.unwrap();
        assert_eq!(managers.len(), 1);
        assert_eq!(managers[0].id, manager.id);

        repo.remove_managed_user(manager.id, managed).await.unwrap();
        assert!(repo.find_managers_of(managed).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_organization_and_email() {
        let repo = repo();
        let org = Uuid::new_v4();
        let a = account(Role::User, Some(org));
        let b = account(Role::Installer, Some(Uuid::new_v4()));
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();
        let in_org = repo.list_by_organization(org).await.unwrap();
        assert_eq!(in_org.len(), 1);
        assert_eq!(repo.find_by_email(&b.email).await.unwrap().unwrap().id, b.id);
        assert!(!repo.admin_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_field_writes_after_delete_are_not_found() {
        let repo = repo();
        let kept = account(Role::User, Some(Uuid::new_v4()));
        let gone = account(Role::Installer, Some(Uuid::new_v4()));
        repo.insert(&kept).await.unwrap();
        repo.insert(&gone).await.unwrap();
        assert!(repo.delete(gone.id).await.unwrap());

        assert!(matches!(
            repo.set_display_name(gone.id, "Ghost").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repo.record_login(gone.id, Utc::now()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repo.promote_to_admin(gone.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(repo.find(gone.id).await.unwrap().is_none());
        assert!(!repo.delete(gone.id).await.unwrap());
        let listed = repo.list_all().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_promote_to_admin_clears_tenancy() {
        let repo = repo();
        let mut a = account(Role::Distributor, Some(Uuid::new_v4()));
        a.is_distributor_admin = Some(true);
        a.managed_users = Some(vec![Uuid::new_v4()]);
        repo.insert(&a).await.unwrap();

        repo.promote_to_admin(a.id).await.unwrap();
        let stored = repo.get(a.id).await.unwrap();
        assert_eq!(stored.role, Role::Admin);
        assert!(stored.distributor_id.is_none());
        assert!(stored.managed_users.is_none());
        assert!(stored.is_distributor_admin.is_none());
        assert!(repo.admin_exists().await.unwrap());
    }
}
