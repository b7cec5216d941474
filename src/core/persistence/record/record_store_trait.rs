use async_trait::async_trait;

use crate::core::persistence::record::record_entity::{Record, RecordKey};
use crate::errors::StoreError;

/// Backend seam for a keyed record store.
///
/// A missing record is `Ok(None)`, not an error; callers decide what a miss means.
#[async_trait]
pub trait RecordStoreTrait: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    async fn fetch(&self, key: &RecordKey) -> Result<Option<Record>, StoreError>;

    /// Unconditional overwrite. Returns the record as stored.
    async fn persist(&self, key: &RecordKey, record: &Record) -> Result<Record, StoreError>;

    /// Release the session. The owning handle calls this at most once.
    fn release(&self) -> Result<(), StoreError>;
}
