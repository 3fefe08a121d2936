//! In-process record store
//!
//! Documents live in a map behind a single lock, so every operation is atomic
//! with respect to the others. Used for development and tests.

use crate::traits::{
    array_field, ensure_object, merge_into, Document, Filter, RecordStore, SetOptions,
    StoreError, StoreResult, StoredDocument,
};
use async_trait::async_trait;
use docportal_core::models::id_set;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    data: Document,
}

#[derive(Debug, Default)]
struct Collections {
    next_seq: u64,
    docs: HashMap<String, HashMap<String, Entry>>,
}

impl Collections {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        let guard = self.inner.read().await;
        guard.docs.get(collection).map(HashMap::len).unwrap_or(0)
    }

    async fn update_array<F>(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        f: F,
    ) -> StoreResult<()>
    where
        F: FnOnce(&mut Vec<Value>) -> bool + Send,
    {
        let mut guard = self.inner.write().await;
        let entry = guard
            .docs
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let mut items = array_field(&entry.data, field);
        if f(&mut items) {
            if let Some(object) = entry.data.as_object_mut() {
                object.insert(field.to_string(), Value::Array(items));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document> {
        let guard = self.inner.read().await;
        guard
            .docs
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|entry| entry.data.clone())
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn query(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<StoredDocument>> {
        let guard = self.inner.read().await;
        let Some(docs) = guard.docs.get(collection) else {
            return Ok(Vec::new());
        };
        let mut matched: Vec<(u64, StoredDocument)> = docs
            .iter()
            .filter(|(_, entry)| filter.matches(&entry.data))
            .map(|(id, entry)| {
                (
                    entry.seq,
                    StoredDocument {
                        id: id.clone(),
                        data: entry.data.clone(),
                    },
                )
            })
            .collect();
        matched.sort_by_key(|(seq, _)| *seq);
        Ok(matched.into_iter().map(|(_, doc)| doc).collect())
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        data: Document,
        options: SetOptions,
    ) -> StoreResult<()> {
        ensure_object(&data)?;
        let mut guard = self.inner.write().await;
        let seq = guard.next_seq();
        let docs = guard.docs.entry(collection.to_string()).or_default();
        match docs.get_mut(id) {
            Some(entry) if options.merge => merge_into(&mut entry.data, data)?,
            Some(entry) => entry.data = data,
            None => {
                docs.insert(id.to_string(), Entry { seq, data });
            }
        }
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
        only_if: &Filter,
    ) -> StoreResult<bool> {
        ensure_object(&patch)?;
        let mut guard = self.inner.write().await;
        let entry = guard
            .docs
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        if !only_if.matches(&entry.data) {
            return Ok(false);
        }
        merge_into(&mut entry.data, patch)?;
        Ok(true)
    }

    async fn create(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        ensure_object(&data)?;
        let mut guard = self.inner.write().await;
        let seq = guard.next_seq();
        let docs = guard.docs.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::already_exists(collection, id));
        }
        docs.insert(id.to_string(), Entry { seq, data });
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut guard = self.inner.write().await;
        Ok(guard
            .docs
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some())
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[Value],
    ) -> StoreResult<()> {
        self.update_array(collection, id, field, |items| id_set::add_all(items, values))
            .await
    }

    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[Value],
    ) -> StoreResult<()> {
        self.update_array(collection, id, field, |items| {
            id_set::remove_all(items, values)
        })
        .await
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryRecordStore::new();
        let err = store.get("users", "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_set_merge_and_replace() {
        let store = MemoryRecordStore::new();
        store
            .set("users", "1", json!({"a": 1, "b": 2}), SetOptions::replace())
            .await
            .unwrap();
        store
            .set("users", "1", json!({"b": 3}), SetOptions::merge())
            .await
            .unwrap();
        assert_eq!(store.get("users", "1").await.unwrap(), json!({"a": 1, "b": 3}));
        store
            .set("users", "1", json!({"c": 1}), SetOptions::replace())
            .await
            .unwrap();
        assert_eq!(store.get("users", "1").await.unwrap(), json!({"c": 1}));
    }

    #[tokio::test]
    async fn test_update_never_recreates_a_deleted_document() {
        let store = MemoryRecordStore::new();
        store.create("users", "1", json!({"id": "1", "displayName": "A"})).await.unwrap();
        assert!(store
            .update("users", "1", json!({"displayName": "B"}), &Filter::all())
            .await
            .unwrap());
        assert_eq!(store.get("users", "1").await.unwrap()["displayName"], "B");

        store.delete("users", "1").await.unwrap();
        let err = store
            .update("users", "1", json!({"displayName": "C"}), &Filter::all())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.count("users").await, 0);
    }

    #[tokio::test]
    async fn test_update_skips_when_condition_does_not_hold() {
        let store = MemoryRecordStore::new();
        store
            .create("invitations", "i", json!({"status": "accepted"}))
            .await
            .unwrap();
        let pending = Filter::all().eq("status", "pending");
        assert!(!store
            .update("invitations", "i", json!({"status": "expired"}), &pending)
            .await
            .unwrap());
        assert_eq!(store.get("invitations", "i").await.unwrap()["status"], "accepted");
    }

    #[tokio::test]
    async fn test_create_is_insert_if_absent() {
        let store = MemoryRecordStore::new();
        store.create("identities", "e", json!({"x": 1})).await.unwrap();
        let err = store.create("identities", "e", json!({"x": 2})).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(store.get("identities", "e").await.unwrap(), json!({"x": 1}));
    }

    #[tokio::test]
    async fn test_delete_reports_existence_once() {
        let store = MemoryRecordStore::new();
        store.create("users", "1", json!({})).await.unwrap();
        assert!(store.delete("users", "1").await.unwrap());
        assert!(!store.delete("users", "1").await.unwrap());
    }

    #[tokio::test]
    async fn test_query_returns_insertion_order() {
        let store = MemoryRecordStore::new();
        for (id, role) in [("c", "user"), ("a", "installer"), ("b", "user")] {
            store.create("users", id, json!({"role": role})).await.unwrap();
        }
        let users = store
            .query("users", &Filter::all().eq("role", "user"))
            .await
            .unwrap();
        let ids: Vec<_> = users.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_concurrent_array_union_keeps_every_id() {
        let store = MemoryRecordStore::new();
        store
            .create("distributors", "d", json!({"teamMembers": []}))
            .await
            .unwrap();
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .array_union("distributors", "d", "teamMembers", &[json!(i.to_string())])
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        let doc = store.get("distributors", "d").await.unwrap();
        assert_eq!(doc["teamMembers"].as_array().unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_array_remove_is_idempotent() {
        let store = MemoryRecordStore::new();
        store
            .create("distributors", "d", json!({"adminMembers": ["x", "y"]}))
            .await
            .unwrap();
        for _ in 0..2 {
            store
                .array_remove("distributors", "d", "adminMembers", &[json!("x")])
                .await
                .unwrap();
        }
        let doc = store.get("distributors", "d").await.unwrap();
        assert_eq!(doc["adminMembers"], json!(["y"]));
        let err = store
            .array_remove("distributors", "missing", "adminMembers", &[json!("x")])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
