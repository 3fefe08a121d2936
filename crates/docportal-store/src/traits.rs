//! Record store abstraction
//!
//! A durable keyed-document store: JSON object documents addressed by
//! `(collection, id)`. Single-document writes are atomic; nothing spans documents.

use async_trait::async_trait;
use docportal_core::models::id_set;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored document. Always a JSON object.
pub type Document = Value;

/// Record store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Document already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Record store backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn already_exists(collection: &str, id: &str) -> Self {
        StoreError::AlreadyExists {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document plus the key it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Top-level field equals the value.
    Eq { field: String, value: Value },
    /// Top-level array field contains the value.
    ArrayContains { field: String, value: Value },
}

/// Conjunction of field conditions. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn array_contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::ArrayContains {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Eq { field, value } => document.get(field) == Some(value),
            Condition::ArrayContains { field, value } => document
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
        })
    }
}

/// `set` behavior: replace the whole document, or merge top-level fields into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOptions {
    pub merge: bool,
}

impl SetOptions {
    pub fn replace() -> Self {
        Self { merge: false }
    }

    pub fn merge() -> Self {
        Self { merge: true }
    }
}

/// Record store abstraction trait
///
/// The list operations default to read-modify-write, which can lose a concurrent
/// append. Backends that can do better override them with an atomic update.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a document, failing with [`StoreError::NotFound`] when absent.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document>;

    /// Documents of `collection` matching `filter`, oldest first.
    async fn query(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<StoredDocument>>;

    /// Write a document. With `merge`, top-level fields are merged into an
    /// existing document; the document is created when absent either way.
    /// Field patches to records that may have been deleted go through
    /// [`RecordStore::update`] instead.
    async fn set(
        &self,
        collection: &str,
        id: &str,
        data: Document,
        options: SetOptions,
    ) -> StoreResult<()>;

    /// Merge top-level fields into an existing document, failing with
    /// [`StoreError::NotFound`] when it is absent. The patch is applied only while
    /// the stored document matches `only_if`; returns whether it was applied.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
        only_if: &Filter,
    ) -> StoreResult<bool>;

    /// Insert only if absent, failing with [`StoreError::AlreadyExists`].
    async fn create(&self, collection: &str, id: &str, data: Document) -> StoreResult<()>;

    /// Delete a document. Returns whether it existed.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// Add each value to an array field if absent. Missing field is treated as empty.
    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[Value],
    ) -> StoreResult<()> {
        let document = self.get(collection, id).await?;
        let mut items = array_field(&document, field);
        if id_set::add_all(&mut items, values) {
            let patch = single_field(field, Value::Array(items));
            self.update(collection, id, patch, &Filter::all()).await?;
        }
        Ok(())
    }

    /// Remove every occurrence of each value from an array field.
    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[Value],
    ) -> StoreResult<()> {
        let document = self.get(collection, id).await?;
        let mut items = array_field(&document, field);
        if id_set::remove_all(&mut items, values) {
            let patch = single_field(field, Value::Array(items));
            self.update(collection, id, patch, &Filter::all()).await?;
        }
        Ok(())
    }

    /// Cheap connectivity check.
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Get the backend type name
    fn backend_type(&self) -> &'static str;
}

pub(crate) fn array_field(document: &Document, field: &str) -> Vec<Value> {
    document
        .get(field)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn single_field(field: &str, value: Value) -> Document {
    let mut map = Map::new();
    map.insert(field.to_string(), value);
    Value::Object(map)
}

/// Shallow merge of `patch` into `target`. Both must be objects.
pub(crate) fn merge_into(target: &mut Document, patch: Document) -> StoreResult<()> {
    let Value::Object(patch) = patch else {
        return Err(StoreError::InvalidDocument(
            "merge patch must be a JSON object".to_string(),
        ));
    };
    let Value::Object(existing) = target else {
        return Err(StoreError::InvalidDocument(
            "stored document is not a JSON object".to_string(),
        ));
    };
    for (key, value) in patch {
        existing.insert(key, value);
    }
    Ok(())
}

pub(crate) fn ensure_object(data: &Document) -> StoreResult<()> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument(
            "documents must be JSON objects".to_string(),
        ))
    }
}

/// Serialize a typed record into a document.
pub fn to_document<T: Serialize>(record: &T) -> StoreResult<Document> {
    let value = serde_json::to_value(record)
        .map_err(|e| StoreError::InvalidDocument(format!("serialization failed: {}", e)))?;
    ensure_object(&value)?;
    Ok(value)
}

/// Deserialize a document into a typed record.
pub fn from_document<T: DeserializeOwned>(document: Document) -> StoreResult<T> {
    serde_json::from_value(document)
        .map_err(|e| StoreError::InvalidDocument(format!("deserialization failed: {}", e)))
}
