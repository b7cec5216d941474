pub mod record_update_service;
