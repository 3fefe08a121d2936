#[cfg(feature = "store-postgres")]
use crate::PostgresRecordStore;
use crate::{MemoryRecordStore, RecordStore, StoreError, StoreResult};
use docportal_core::{Config, RecordStoreBackend};
use std::sync::Arc;

/// Create a record store backend based on configuration
pub async fn create_record_store(config: &Config) -> StoreResult<Arc<dyn RecordStore>> {
    match config.store_backend() {
        RecordStoreBackend::Memory => {
            tracing::warn!("Using the in-memory record store; data is lost on restart");
            Ok(Arc::new(MemoryRecordStore::new()))
        }

        #[cfg(feature = "store-postgres")]
        RecordStoreBackend::Postgres => {
            use sqlx::postgres::PgPoolOptions;
            use std::time::Duration;

            let url = config.database_url().ok_or_else(|| {
                StoreError::ConfigError("DATABASE_URL not configured".to_string())
            })?;
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections())
                .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
                .connect(url)
                .await
                .map_err(|e| StoreError::BackendError(format!("Failed to connect: {}", e)))?;

            let store = PostgresRecordStore::new(pool);
            store.migrate().await?;
            tracing::info!(
                max_connections = config.db_max_connections(),
                "Connected to PostgreSQL record store"
            );
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "store-postgres"))]
        RecordStoreBackend::Postgres => Err(StoreError::ConfigError(
            "Postgres record store not available (store-postgres feature not enabled)".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_config_builds_memory_store() {
        let store = create_record_store(&Config::default()).await.unwrap();
        assert_eq!(store.backend_type(), "memory");
    }
}
