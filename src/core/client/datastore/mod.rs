pub mod datastore_client;
pub mod datastore_dto;

#[cfg(test)]
pub(crate) mod canned_server;
