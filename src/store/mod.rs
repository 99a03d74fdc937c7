//! Persistence and blob boundaries.
//!
//! The admin layer only talks to these traits. `PgStore` is the production
//! `DataStore`, `HttpBlobStore` the production `BlobStore`, and
//! `testing::MemoryStore` implements both for tests.

pub mod blob;
pub mod error;
pub mod query;
pub mod rpc;

use async_trait::async_trait;
use serde_json::Value;

use crate::database::record::Record;

pub use blob::HttpBlobStore;
pub use error::StoreError;
pub use query::{OrderBy, Query, SortDirection};
pub use rpc::Rpc;

#[async_trait]
pub trait DataStore: Send + Sync {
    /// Fetch every row of a collection that matches the query, in query order
    async fn select(&self, collection: &str, query: &Query) -> Result<Vec<Record>, StoreError>;

    /// Insert a new row; the backend assigns `id` and `created_at`
    async fn insert(&self, collection: &str, record: Record) -> Result<Record, StoreError>;

    /// Overwrite the non-system fields of the row with the given id
    async fn update(&self, collection: &str, id: &str, record: Record) -> Result<Record, StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Insert, or overwrite the row whose `conflict_key` column matches
    async fn upsert(&self, collection: &str, conflict_key: &str, record: Record) -> Result<Record, StoreError>;

    /// Invoke a stored procedure
    async fn call(&self, rpc: Rpc) -> Result<Value, StoreError>;

    /// Cheap connectivity check
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes at `bucket/path` and return the public URL
    async fn upload_blob(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<String, StoreError>;
}
