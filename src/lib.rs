pub mod core;
pub mod domain;
pub mod errors;
