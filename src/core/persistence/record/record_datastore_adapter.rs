use async_trait::async_trait;
use tracing::debug;

use crate::core::client::datastore::datastore_client::DatastoreClient;
use crate::core::client::datastore::datastore_dto::{DsEntity, DsKey, DsValue};
use crate::core::persistence::record::record_entity::{Record, RecordKey};
use crate::core::persistence::record::record_store_trait::RecordStoreTrait;
use crate::errors::StoreError;

/// Property name the record's `value` is stored under.
pub const VALUE_PROPERTY: &str = "Value";

/// Datastore-backed record store.
pub struct RecordDatastoreAdapter {
    client: DatastoreClient,
}

impl RecordDatastoreAdapter {
    pub fn new(client: DatastoreClient) -> Self {
        Self { client }
    }

    fn ds_key(&self, key: &RecordKey) -> DsKey {
        DsKey::named(self.client.project_id(), key.kind(), key.name())
    }
}

/// Entity -> Record. A missing or non-string `Value` reads as empty.
pub fn entity_to_record(entity: &DsEntity) -> Record {
    let value = entity
        .properties
        .get(VALUE_PROPERTY)
        .and_then(|v| v.string_value.clone())
        .unwrap_or_default();
    Record::new(value)
}

pub fn record_to_entity(key: DsKey, record: &Record) -> DsEntity {
    let mut entity = DsEntity {
        key: Some(key),
        ..Default::default()
    };
    entity
        .properties
        .insert(VALUE_PROPERTY.to_string(), DsValue::string(record.value.clone()));
    entity
}

#[async_trait]
impl RecordStoreTrait for RecordDatastoreAdapter {
    fn backend(&self) -> &'static str {
        "datastore"
    }

    async fn fetch(&self, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        let found = self.client.lookup(&self.ds_key(key)).await?;
        Ok(found.as_ref().map(entity_to_record))
    }

    async fn persist(&self, key: &RecordKey, record: &Record) -> Result<Record, StoreError> {
        let entity = record_to_entity(self.ds_key(key), record);
        let resp = self.client.upsert(entity).await?;

        debug!(
            "Committed {} ({} mutation result(s))",
            key,
            resp.mutation_results.len()
        );
        Ok(record.clone())
    }

    fn release(&self) -> Result<(), StoreError> {
        // reqwest's pool closes its connections when the client is dropped
        debug!("Released Datastore client for project '{}'", self.client.project_id());
        Ok(())
    }
}
