use tracing::{debug, info, warn};

use crate::core::client::datastore::datastore_client::DatastoreClient;
use crate::core::config::store_config::{StoreBackend, StoreConfig};
use crate::core::persistence::record::record_api_repository_trait::RecordApiRepository;
use crate::core::persistence::record::record_datastore_adapter::RecordDatastoreAdapter;
use crate::core::persistence::record::record_fs_adapter::RecordFsAdapter;
use crate::core::persistence::record::record_store_trait::RecordStoreTrait;
use crate::core::util::retry_util::RetryPolicy;
use crate::errors::StoreError;

/// An open session on a record store.
///
/// Released exactly once: by `close()`, or on drop if `close()` was never reached.
pub struct StoreHandle {
    store: Box<dyn RecordStoreTrait>,
    retry: RetryPolicy,
    released: bool,
}

impl StoreHandle {
    pub fn new(store: Box<dyn RecordStoreTrait>, retry: RetryPolicy) -> Self {
        Self {
            store,
            retry,
            released: false,
        }
    }

    /// Connect to the configured backend. An empty namespace never produces a handle.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        if config.namespace.trim().is_empty() {
            return Err(StoreError::Connection("namespace must not be empty".into()));
        }

        let store: Box<dyn RecordStoreTrait> = match config.backend {
            StoreBackend::Datastore => {
                let client = DatastoreClient::new(
                    &config.namespace,
                    config.emulator_host.as_deref(),
                    config.access_token.clone(),
                    config.retry_policy().attempt_timeout,
                )?;
                Box::new(RecordDatastoreAdapter::new(client))
            }
            StoreBackend::Fs => Box::new(RecordFsAdapter::open(&config.store_dir, &config.namespace)?),
        };

        info!(
            "Connected to {} record store (namespace '{}')",
            config.backend.as_code(),
            config.namespace
        );
        Ok(Self::new(store, config.retry_policy()))
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Release the handle, surfacing any release failure.
    pub fn close(mut self) -> Result<(), StoreError> {
        self.released = true;
        let result = self.store.release();
        debug!("Closed {} record store", self.store.backend());
        result
    }
}

impl RecordApiRepository for StoreHandle {
    fn store(&self) -> &dyn RecordStoreTrait {
        self.store.as_ref()
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

impl Drop for StoreHandle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.store.release() {
            warn!("Failed to release {} record store on drop: {}", self.store.backend(), e);
        } else {
            debug!("Released {} record store on drop", self.store.backend());
        }
    }
}
