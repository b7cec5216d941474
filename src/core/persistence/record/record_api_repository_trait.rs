use async_trait::async_trait;

use crate::core::persistence::record::record_entity::{Record, RecordKey};
use crate::core::persistence::record::record_store_trait::RecordStoreTrait;
use crate::core::util::retry_util::{retry_with_backoff, RetryPolicy};
use crate::errors::StoreError;

/// Caller-facing record repository: the backend's operations wrapped in the retry policy.
#[async_trait]
pub trait RecordApiRepository: Send + Sync {
    fn store(&self) -> &dyn RecordStoreTrait;

    fn retry_policy(&self) -> &RetryPolicy;

    async fn fetch(&self, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        let store = self.store();
        retry_with_backoff(self.retry_policy(), "fetch", || store.fetch(key)).await
    }

    async fn persist(&self, key: &RecordKey, record: &Record) -> Result<Record, StoreError> {
        let store = self.store();
        retry_with_backoff(self.retry_policy(), "persist", || store.persist(key, record)).await
    }
}
