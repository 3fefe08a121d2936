//! Document portal record store
//!
//! The [`RecordStore`] trait is the keyed-document contract the portal persists
//! through, with an in-memory backend and a PostgreSQL (`jsonb`) backend.

mod error;
pub mod factory;
pub mod memory;
#[cfg(feature = "store-postgres")]
pub mod postgres;
pub mod traits;

pub use factory::create_record_store;
pub use memory::MemoryRecordStore;
#[cfg(feature = "store-postgres")]
pub use postgres::PostgresRecordStore;
pub use traits::{
    from_document, to_document, Condition, Document, Filter, RecordStore, SetOptions, StoreError,
    StoreResult, StoredDocument,
};
