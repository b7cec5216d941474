pub mod pod;
pub mod record;
