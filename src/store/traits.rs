//! `KeyValueStore` trait — the storage gateway used for onboarding persistence.

use async_trait::async_trait;

use crate::error::StorageError;

/// Opaque string-keyed durable store.
///
/// `get` reports absence as `Ok(None)`, never as an error. `set` is
/// all-or-nothing: a failed write leaves any previous value in place.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
