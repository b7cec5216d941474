pub mod record;
pub mod storage_path;
