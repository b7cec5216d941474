use tracing::{debug, info};

use crate::core::config::store_config::StoreConfig;
use crate::core::persistence::record::record_api_repository_trait::RecordApiRepository;
use crate::core::persistence::record::record_entity::{Record, RecordKey};
use crate::core::persistence::record::store_handle::StoreHandle;
use crate::errors::{RecordUpdateError, StoreError, UpdateStep};

/// Phases of one read-modify-write cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Idle,
    Connected,
    Fetched,
    Mutated,
    Persisted,
    Reported,
    Closed,
}

/// Outcome of a completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTransition {
    pub key: RecordKey,
    pub old_value: String,
    pub new_value: String,
    /// False when the key had no record and the cycle started from an empty value.
    pub existed: bool,
}

impl RecordTransition {
    pub fn report(&self) -> String {
        report(&self.old_value, &self.new_value)
    }
}

/// Replace the record's value in memory, returning the previous one.
pub fn mutate(record: &mut Record, new_value: impl Into<String>) -> String {
    std::mem::replace(&mut record.value, new_value.into())
}

/// `Updated value from "<old>" to "<new>"`
pub fn report(old_value: &str, new_value: &str) -> String {
    format!("Updated value from {:?} to {:?}", old_value, new_value)
}

fn advance(key: &RecordKey, from: UpdatePhase, to: UpdatePhase) -> UpdatePhase {
    debug!("{}: {:?} -> {:?}", key, from, to);
    to
}

/// Fetch the record, falling back to an empty one when the key has none.
/// The returned flag says whether a record was actually stored.
pub async fn fetch_or_default<R>(repo: &R, key: &RecordKey) -> Result<(Record, bool), StoreError>
where
    R: RecordApiRepository + ?Sized,
{
    match repo.fetch(key).await {
        Ok(Some(record)) => Ok((record, true)),
        Ok(None) | Err(StoreError::NotFound(_)) => {
            info!("No record stored under {}; starting from an empty value", key);
            Ok((Record::default(), false))
        }
        Err(e) => Err(e),
    }
}

/// Fetch, mutate and persist one record on an already open repository.
pub async fn update_record_value<R>(
    repo: &R,
    key: &RecordKey,
    new_value: &str,
) -> Result<RecordTransition, RecordUpdateError>
where
    R: RecordApiRepository + ?Sized,
{
    let phase = UpdatePhase::Connected;

    let (mut record, existed) = fetch_or_default(repo, key)
        .await
        .map_err(|e| RecordUpdateError::new(UpdateStep::Fetch, key, e))?;
    let phase = advance(key, phase, UpdatePhase::Fetched);

    let old_value = mutate(&mut record, new_value);
    let phase = advance(key, phase, UpdatePhase::Mutated);

    let stored = repo
        .persist(key, &record)
        .await
        .map_err(|e| RecordUpdateError::new(UpdateStep::Persist, key, e))?;
    advance(key, phase, UpdatePhase::Persisted);

    Ok(RecordTransition {
        key: key.clone(),
        old_value,
        new_value: stored.value,
        existed,
    })
}

/// Full cycle: connect, update, report, close.
///
/// The handle is released on every path; an update error wins over a close error.
pub async fn run_record_update(
    config: &StoreConfig,
    key: &RecordKey,
    new_value: &str,
) -> Result<RecordTransition, RecordUpdateError> {
    let handle = StoreHandle::open(config)
        .map_err(|e| RecordUpdateError::new(UpdateStep::Connect, key, e))?;
    advance(key, UpdatePhase::Idle, UpdatePhase::Connected);

    let transition = update_record_value(&handle, key, new_value).await?;
    info!("{}", transition.report());
    advance(key, UpdatePhase::Persisted, UpdatePhase::Reported);

    handle
        .close()
        .map_err(|e| RecordUpdateError::new(UpdateStep::Close, key, e))?;
    advance(key, UpdatePhase::Reported, UpdatePhase::Closed);

    Ok(transition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::datastore::canned_server::CannedServer;
    use crate::core::config::store_config::StoreBackend;
    use crate::core::persistence::record::record_store_trait::RecordStoreTrait;
    use crate::core::util::retry_util::RetryPolicy;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MockRecordStore {
        state: Mutex<HashMap<RecordKey, Record>>,
        fail_fetches: AtomicU32,
        persist_error: Mutex<Option<StoreError>>,
        persists: AtomicU32,
    }

    #[async_trait]
    impl RecordStoreTrait for MockRecordStore {
        fn backend(&self) -> &'static str {
            "mock"
        }

        async fn fetch(&self, key: &RecordKey) -> Result<Option<Record>, StoreError> {
            if self.fail_fetches.load(Ordering::SeqCst) > 0 {
                self.fail_fetches.fetch_sub(1, Ordering::SeqCst);
                return Err(StoreError::Transport("connection reset".into()));
            }
            Ok(self.state.lock().unwrap().get(key).cloned())
        }

        async fn persist(&self, key: &RecordKey, record: &Record) -> Result<Record, StoreError> {
            self.persists.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.persist_error.lock().unwrap().clone() {
                return Err(e);
            }
            self.state.lock().unwrap().insert(key.clone(), record.clone());
            Ok(record.clone())
        }

        fn release(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct MockRecordRepository {
        store: MockRecordStore,
        retry: RetryPolicy,
    }

    impl MockRecordRepository {
        fn new() -> Self {
            Self {
                store: MockRecordStore::default(),
                retry: RetryPolicy {
                    max_attempts: 3,
                    base_delay: Duration::from_millis(1),
                    max_delay: Duration::from_millis(2),
                    attempt_timeout: Duration::from_secs(1),
                },
            }
        }
    }

    impl RecordApiRepository for MockRecordRepository {
        fn store(&self) -> &dyn RecordStoreTrait {
            &self.store
        }

        fn retry_policy(&self) -> &RetryPolicy {
            &self.retry
        }
    }

    fn sample_key() -> RecordKey {
        RecordKey::new("Entity", "stringID").unwrap()
    }

    #[test]
    fn report_is_deterministic_and_quotes_both_values() {
        assert_eq!(report("", "Hello World!"), r#"Updated value from "" to "Hello World!""#);
        assert_eq!(report("a", "b"), report("a", "b"));
        assert_eq!(report("old", "new"), r#"Updated value from "old" to "new""#);
    }

    #[test]
    fn report_escapes_quotes_and_newlines() {
        assert_eq!(
            report("say \"hi\"", "a\nb"),
            r#"Updated value from "say \"hi\"" to "a\nb""#
        );
    }

    #[test]
    fn mutate_returns_previous_value() {
        let mut rec = Record::new("before");
        assert_eq!(mutate(&mut rec, "after"), "before");
        assert_eq!(rec.value, "after");
    }

    #[tokio::test]
    async fn empty_store_scenario_writes_hello_world() {
        let repo = MockRecordRepository::new();
        let key = sample_key();

        let t = update_record_value(&repo, &key, "Hello World!").await.unwrap();

        assert!(!t.existed);
        assert_eq!(t.old_value, "");
        assert_eq!(t.report(), r#"Updated value from "" to "Hello World!""#);
        assert_eq!(repo.fetch(&key).await.unwrap(), Some(Record::new("Hello World!")));
    }

    #[tokio::test]
    async fn existing_record_reports_its_old_value() {
        let repo = MockRecordRepository::new();
        let key = sample_key();
        repo.store
            .state
            .lock()
            .unwrap()
            .insert(key.clone(), Record::new("v0"));

        let t = update_record_value(&repo, &key, "v1").await.unwrap();

        assert!(t.existed);
        assert_eq!((t.old_value.as_str(), t.new_value.as_str()), ("v0", "v1"));
        assert_eq!(fetch_or_default(&repo, &key).await.unwrap(), (Record::new("v1"), true));
    }

    #[tokio::test]
    async fn transient_fetch_failures_are_retried() {
        let repo = MockRecordRepository::new();
        repo.store.fail_fetches.store(2, Ordering::SeqCst);

        let t = update_record_value(&repo, &sample_key(), "x").await.unwrap();
        assert_eq!(t.new_value, "x");
    }

    #[tokio::test]
    async fn fetch_failure_names_step_and_key_and_skips_persist() {
        let repo = MockRecordRepository::new();
        repo.store.fail_fetches.store(10, Ordering::SeqCst);

        let err = update_record_value(&repo, &sample_key(), "x").await.unwrap_err();
        assert_eq!(err.step, UpdateStep::Fetch);
        assert_eq!(err.key, sample_key());
        assert_eq!(repo.store.persists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn conflict_on_persist_is_surfaced_without_retry() {
        let repo = MockRecordRepository::new();
        *repo.store.persist_error.lock().unwrap() = Some(StoreError::Conflict("409".into()));

        let err = update_record_value(&repo, &sample_key(), "x").await.unwrap_err();
        assert_eq!(err.step, UpdateStep::Persist);
        assert!(matches!(err.source, StoreError::Conflict(_)));
        assert_eq!(repo.store.persists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn full_cycle_against_fs_store_is_readable_afterwards() {
        let dir = TempDir::new().unwrap();
        let cfg = StoreConfig {
            backend: StoreBackend::Fs,
            store_dir: dir.path().to_path_buf(),
            ..StoreConfig::default()
        };
        let key = sample_key();

        let first = run_record_update(&cfg, &key, "Hello World!").await.unwrap();
        assert_eq!(first.report(), r#"Updated value from "" to "Hello World!""#);

        let second = run_record_update(&cfg, &key, "again").await.unwrap();
        assert!(second.existed);
        assert_eq!(second.old_value, "Hello World!");
    }

    #[tokio::test]
    async fn empty_namespace_fails_at_connect_without_touching_the_store() {
        let dir = TempDir::new().unwrap();
        let cfg = StoreConfig {
            backend: StoreBackend::Fs,
            store_dir: dir.path().to_path_buf(),
            ..StoreConfig::default()
        }
        .with_namespace("");

        let err = run_record_update(&cfg, &sample_key(), "x").await.unwrap_err();
        assert_eq!(err.step, UpdateStep::Connect);
        assert!(matches!(err.source, StoreError::Connection(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn datastore_lookup_404_starts_from_default_and_commits() {
        let server = CannedServer::start(vec![
            (404, r#"{"error":{"code":404,"status":"NOT_FOUND"}}"#),
            (200, r#"{"mutationResults":[{"version":"1"}]}"#),
        ])
        .await;
        let cfg = StoreConfig {
            emulator_host: Some(server.host().to_string()),
            ..StoreConfig::default()
        };

        let t = run_record_update(&cfg, &sample_key(), "Hello World!").await.unwrap();

        assert!(!t.existed);
        assert_eq!(t.report(), r#"Updated value from "" to "Hello World!""#);
        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].starts_with("POST /v1/projects/test:lookup "));
        assert!(requests[1].starts_with("POST /v1/projects/test:commit "));
        assert!(requests[1].contains(r#""stringValue":"Hello World!""#));
    }
}
