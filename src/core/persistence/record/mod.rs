pub mod record_api_repository_trait;
pub mod record_datastore_adapter;
pub mod record_entity;
pub mod record_fs_adapter;
pub mod record_store_trait;
pub mod store_handle;
