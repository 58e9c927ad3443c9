//! Durable key-value store boundary.
//!
//! The subsystem persists everything as serialized records under fixed string
//! keys; the mechanism behind those keys (browser storage, Redis, a table) is
//! somebody else's problem. Services receive an `Arc<dyn KeyValueStore>` so
//! each request or test can run against isolated state - no process-wide
//! tables.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur at the store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A read against the backing store failed.
    #[error("store read failed: {0}")]
    Read(String),

    /// A write against the backing store failed.
    #[error("store write failed: {0}")]
    Write(String),
}

/// Abstract durable key-value persistence.
///
/// Values are opaque strings; callers are responsible for serialization.
/// Implementations must be safe to share across concurrent tasks.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any existing value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove the value stored under `key`. Removing a missing key is not an
    /// error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
