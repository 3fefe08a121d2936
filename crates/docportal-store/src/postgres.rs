//! PostgreSQL record store
//!
//! Every document is one row of the `records` table, keyed by `(collection, id)`
//! with its body in a `jsonb` column. Filters compile to `@>` containment so the
//! GIN index serves them. List operations run as a single `UPDATE`, which Postgres
//! serializes per row.

use crate::traits::{
    ensure_object, Condition, Document, Filter, RecordStore, SetOptions, StoreError, StoreResult,
    StoredDocument,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Row};

const UNIQUE_VIOLATION: &str = "23505";

const ARRAY_UNION_SQL: &str = r#"
UPDATE records
SET data = jsonb_set(
        data,
        ARRAY[$3::text],
        (
            SELECT COALESCE(jsonb_agg(elem ORDER BY first_pos), '[]'::jsonb)
            FROM (
                SELECT elem, MIN(pos) AS first_pos
                FROM (
                    SELECT existing.elem, existing.pos
                    FROM jsonb_array_elements(
                        CASE WHEN jsonb_typeof(data -> $3::text) = 'array'
                             THEN data -> $3::text
                             ELSE '[]'::jsonb END
                    ) WITH ORDINALITY AS existing(elem, pos)
                    UNION ALL
                    SELECT added.elem, added.pos + 1000000000
                    FROM jsonb_array_elements($4::jsonb) WITH ORDINALITY AS added(elem, pos)
                ) AS combined
                GROUP BY elem
            ) AS deduplicated
        ),
        true
    ),
    updated_at = now()
WHERE collection = $1 AND id = $2
"#;

const ARRAY_REMOVE_SQL: &str = r#"
UPDATE records
SET data = jsonb_set(
        data,
        ARRAY[$3::text],
        (
            SELECT COALESCE(jsonb_agg(existing.elem ORDER BY existing.pos), '[]'::jsonb)
            FROM jsonb_array_elements(
                CASE WHEN jsonb_typeof(data -> $3::text) = 'array'
                     THEN data -> $3::text
                     ELSE '[]'::jsonb END
            ) WITH ORDINALITY AS existing(elem, pos)
            WHERE NOT ($4::jsonb @> jsonb_build_array(existing.elem))
        ),
        true
    ),
    updated_at = now()
WHERE collection = $1 AND id = $2
"#;

#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::BackendError(format!("Migration failed: {}", e)))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn backend_error(err: sqlx::Error) -> StoreError {
    StoreError::BackendError(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

/// Containment document for one condition: `{field: value}` or `{field: [value]}`.
fn containment(condition: &Condition) -> Value {
    let mut map = Map::new();
    match condition {
        Condition::Eq { field, value } => {
            map.insert(field.clone(), value.clone());
        }
        Condition::ArrayContains { field, value } => {
            map.insert(field.clone(), Value::Array(vec![value.clone()]));
        }
    }
    Value::Object(map)
}

fn push_conditions(builder: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    for condition in &filter.conditions {
        builder.push(" AND data @> ");
        builder.push_bind(Json(containment(condition)));
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    #[tracing::instrument(skip(self), fields(db.table = "records", db.operation = "select"))]
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document> {
        let row = sqlx::query("SELECT data FROM records WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?;

        match row {
            Some(row) => {
                let Json(data): Json<Value> = row.try_get("data").map_err(backend_error)?;
                Ok(data)
            }
            None => Err(StoreError::not_found(collection, id)),
        }
    }

    #[tracing::instrument(skip(self, filter), fields(db.table = "records", db.operation = "select"))]
    async fn query(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<StoredDocument>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, data FROM records WHERE collection = ");
        builder.push_bind(collection);
        push_conditions(&mut builder, filter);
        builder.push(" ORDER BY created_at, id");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(backend_error)?;

        rows.into_iter()
            .map(|row| {
                let id: String = row.try_get("id").map_err(backend_error)?;
                let Json(data): Json<Value> = row.try_get("data").map_err(backend_error)?;
                Ok(StoredDocument { id, data })
            })
            .collect()
    }

    #[tracing::instrument(skip(self, data), fields(db.table = "records", db.operation = "upsert"))]
    async fn set(
        &self,
        collection: &str,
        id: &str,
        data: Document,
        options: SetOptions,
    ) -> StoreResult<()> {
        ensure_object(&data)?;
        let sql = if options.merge {
            "INSERT INTO records (collection, id, data) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id)
             DO UPDATE SET data = records.data || EXCLUDED.data, updated_at = now()"
        } else {
            "INSERT INTO records (collection, id, data) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id)
             DO UPDATE SET data = EXCLUDED.data, updated_at = now()"
        };

        sqlx::query(sql)
            .bind(collection)
            .bind(id)
            .bind(Json(data))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::already_exists(collection, id)
                } else {
                    backend_error(e)
                }
            })?;
        Ok(())
    }

    #[tracing::instrument(skip(self, patch, only_if), fields(db.table = "records", db.operation = "update"))]
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
        only_if: &Filter,
    ) -> StoreResult<bool> {
        ensure_object(&patch)?;
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE records SET data = data || ");
        builder.push_bind(Json(patch));
        builder.push(", updated_at = now() WHERE collection = ");
        builder.push_bind(collection);
        builder.push(" AND id = ");
        builder.push_bind(id);
        push_conditions(&mut builder, only_if);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::already_exists(collection, id)
                } else {
                    backend_error(e)
                }
            })?;
        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Nothing matched: either the row is gone or the condition failed.
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM records WHERE collection = $1 AND id = $2)",
        )
        .bind(collection)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(backend_error)?;
        if exists {
            Ok(false)
        } else {
            Err(StoreError::not_found(collection, id))
        }
    }

    #[tracing::instrument(skip(self, data), fields(db.table = "records", db.operation = "insert"))]
    async fn create(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        ensure_object(&data)?;
        let result = sqlx::query(
            "INSERT INTO records (collection, id, data) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id) DO NOTHING",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(data))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::already_exists(collection, id)
            } else {
                backend_error(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::already_exists(collection, id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "records", db.operation = "delete"))]
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM records WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self, values), fields(db.table = "records", db.operation = "update"))]
    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[Value],
    ) -> StoreResult<()> {
        let result = sqlx::query(ARRAY_UNION_SQL)
            .bind(collection)
            .bind(id)
            .bind(field)
            .bind(Json(values.to_vec()))
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, values), fields(db.table = "records", db.operation = "update"))]
    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: &[Value],
    ) -> StoreResult<()> {
        let result = sqlx::query(ARRAY_REMOVE_SQL)
            .bind(collection)
            .bind(id)
            .bind(field)
            .bind(Json(values.to_vec()))
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(backend_error)
    }

    fn backend_type(&self) -> &'static str {
        "postgres"
    }
}
