/// Record store abstraction
///
/// Records are untyped JSON documents grouped into collections and addressed
/// by id. The store provides no locking: callers must not issue concurrent
/// writes for the same id.

pub mod file;

pub use file::FileStore;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;

/// Collection holding check records
pub const CHECKS: &str = "checks";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {collection}/{id} not found")]
    NotFound { collection: String, id: String },
    #[error("record {collection}/{id} already exists")]
    AlreadyExists { collection: String, id: String },
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Store trait for abstracting record persistence
#[async_trait]
pub trait Store: Send + Sync {
    /// Ids of every record in a collection
    async fn list(&self, collection: &str) -> Result<BTreeSet<String>, StoreError>;

    /// Read a record
    async fn read(&self, collection: &str, id: &str) -> Result<Value, StoreError>;

    /// Create a record, failing if the id is taken
    async fn create(&self, collection: &str, id: &str, record: &Value) -> Result<(), StoreError>;

    /// Overwrite an existing record
    async fn update(&self, collection: &str, id: &str, record: &Value) -> Result<(), StoreError>;

    /// Delete a record
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}
