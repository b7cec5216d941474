use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use validator::Validate;

use crate::core::util::retry_util::RetryPolicy;

pub const ENV_PROJECT_ID: &str = "DATASTORE_PROJECT_ID";
pub const ENV_BACKEND: &str = "RECORD_STORE_BACKEND";
pub const ENV_STORE_DIR: &str = "RECORD_STORE_DIR";
pub const ENV_EMULATOR_HOST: &str = "DATASTORE_EMULATOR_HOST";
pub const ENV_ACCESS_TOKEN: &str = "DATASTORE_ACCESS_TOKEN";
pub const ENV_RETRY_MAX: &str = "RECORD_STORE_RETRY_MAX";
pub const ENV_RETRY_BASE_MS: &str = "RECORD_STORE_RETRY_BASE_MS";
pub const ENV_TIMEOUT_MS: &str = "RECORD_STORE_TIMEOUT_MS";

/// Which keyed store backs the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Datastore,
    Fs,
}

impl StoreBackend {
    pub fn as_code(&self) -> &'static str {
        match self {
            StoreBackend::Datastore => "datastore",
            StoreBackend::Fs => "fs",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "datastore" | "gcd" => Ok(StoreBackend::Datastore),
            "fs" | "file" => Ok(StoreBackend::Fs),
            other => Err(anyhow!("Unknown record store backend '{}'", other)),
        }
    }
}

/// Settings for opening a record store, read from the environment.
#[derive(Debug, Clone, Validate)]
pub struct StoreConfig {
    /// Datastore project id, or the namespace directory for the fs backend.
    /// Emptiness is checked at connect time, where it becomes a connection error.
    pub namespace: String,
    pub backend: StoreBackend,
    pub store_dir: PathBuf,
    pub emulator_host: Option<String>,
    pub access_token: Option<String>,
    #[validate(range(min = 1, max = 20))]
    pub retry_max_attempts: u32,
    #[validate(range(min = 1, max = 60_000))]
    pub retry_base_ms: u64,
    #[validate(range(min = 1, max = 600_000))]
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: "test".into(),
            backend: StoreBackend::Datastore,
            store_dir: PathBuf::from("data/records"),
            emulator_host: None,
            access_token: None,
            retry_max_attempts: 3,
            retry_base_ms: 200,
            timeout_ms: 10_000,
        }
    }
}

impl StoreConfig {
    /// Build from process environment (call `dotenvy::dotenv()` first).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup(ENV_PROJECT_ID) {
            cfg.namespace = v.trim().to_string();
        }
        if let Some(v) = lookup(ENV_BACKEND) {
            cfg.backend = v.parse()?;
        }
        if let Some(v) = non_empty(lookup(ENV_STORE_DIR)) {
            cfg.store_dir = PathBuf::from(v);
        }
        cfg.emulator_host = non_empty(lookup(ENV_EMULATOR_HOST));
        cfg.access_token = non_empty(lookup(ENV_ACCESS_TOKEN));

        if let Some(v) = lookup(ENV_RETRY_MAX) {
            cfg.retry_max_attempts = parse_num(ENV_RETRY_MAX, &v)?;
        }
        if let Some(v) = lookup(ENV_RETRY_BASE_MS) {
            cfg.retry_base_ms = parse_num(ENV_RETRY_BASE_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_TIMEOUT_MS) {
            cfg.timeout_ms = parse_num(ENV_TIMEOUT_MS, &v)?;
        }

        cfg.validate().context("Invalid record store configuration")?;
        Ok(cfg)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            base_delay: Duration::from_millis(self.retry_base_ms),
            attempt_timeout: Duration::from_millis(self.timeout_ms),
            ..RetryPolicy::default()
        }
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_num<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow!("{} must be a number, got '{}'", name, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_sample_program() {
        let cfg = StoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.namespace, "test");
        assert_eq!(cfg.backend, StoreBackend::Datastore);
        assert_eq!(cfg.retry_policy().max_attempts, 3);
        assert!(cfg.emulator_host.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = StoreConfig::from_lookup(lookup_from(&[
            (ENV_PROJECT_ID, "my-project"),
            (ENV_BACKEND, "FS"),
            (ENV_STORE_DIR, "/tmp/records"),
            (ENV_EMULATOR_HOST, "localhost:8081"),
            (ENV_ACCESS_TOKEN, "  "),
            (ENV_RETRY_MAX, "5"),
            (ENV_TIMEOUT_MS, "2500"),
        ]))
        .unwrap();

        assert_eq!(cfg.namespace, "my-project");
        assert_eq!(cfg.backend, StoreBackend::Fs);
        assert_eq!(cfg.store_dir, PathBuf::from("/tmp/records"));
        assert_eq!(cfg.emulator_host.as_deref(), Some("localhost:8081"));
        assert!(cfg.access_token.is_none());
        assert_eq!(cfg.retry_policy().attempt_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn rejects_bad_numbers_and_ranges() {
        assert!(StoreConfig::from_lookup(lookup_from(&[(ENV_RETRY_MAX, "many")])).is_err());
        assert!(StoreConfig::from_lookup(lookup_from(&[(ENV_RETRY_MAX, "0")])).is_err());
        assert!(StoreConfig::from_lookup(lookup_from(&[(ENV_BACKEND, "redis")])).is_err());
    }

    #[test]
    fn empty_namespace_is_left_for_connect_to_reject() {
        let cfg = StoreConfig::from_lookup(lookup_from(&[(ENV_PROJECT_ID, "")])).unwrap();
        assert_eq!(cfg.namespace, "");
    }
}
