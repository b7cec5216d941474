use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use fs2::FileExt;
use tracing::debug;

use crate::core::persistence::record::record_entity::{Record, RecordKey};
use crate::core::persistence::record::record_store_trait::RecordStoreTrait;
use crate::core::persistence::storage_path::{
    record_file_path, record_lock_path, record_namespace_dir, MAX_FILE_NAME_LEN, RECORD_FILE_EXT,
};
use crate::errors::{connection_error, transport_error, StoreError};

/// FS adapter for keyed records.
///
/// One `<name>.rci` key-value file per record, written atomically via a temp file.
/// An exclusive OS lock on the namespace `.lock` file is held from `open` until
/// `release`, so only one handle per namespace is live at a time. The OS drops the
/// lock if the process dies, so a leftover `.lock` file never blocks a later open.
#[derive(Debug)]
pub struct RecordFsAdapter {
    root: PathBuf,
    namespace: String,
    lock: Mutex<Option<File>>,
}

/// Map an io error from the record files. Failures that cannot go away on their
/// own are `Rejected` so the retry policy leaves them alone.
pub fn fs_error(e: io::Error) -> StoreError {
    match e.kind() {
        io::ErrorKind::PermissionDenied
        | io::ErrorKind::InvalidInput
        | io::ErrorKind::InvalidData
        | io::ErrorKind::Unsupported => StoreError::Rejected(e.to_string()),
        _ => transport_error(e),
    }
}

impl RecordFsAdapter {
    pub fn open(root: &Path, namespace: &str) -> Result<Self, StoreError> {
        if namespace.trim().is_empty() {
            return Err(StoreError::Connection("namespace must not be empty".into()));
        }

        let dir = record_namespace_dir(root, namespace);
        fs::create_dir_all(&dir).map_err(connection_error)?;

        let lock_path = record_lock_path(root, namespace);
        let mut lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(connection_error)?;

        if let Err(e) = lock.try_lock_exclusive() {
            return Err(StoreError::Connection(format!(
                "namespace '{}' is locked by another handle ({:?}): {}",
                namespace, lock_path, e
            )));
        }

        lock.set_len(0).map_err(connection_error)?;
        writeln!(lock, "PID:{}", std::process::id()).map_err(connection_error)?;

        debug!("Opened fs record store at {:?}", dir);
        Ok(Self {
            root: root.to_path_buf(),
            namespace: namespace.to_string(),
            lock: Mutex::new(Some(lock)),
        })
    }

    fn path_for(&self, key: &RecordKey) -> Result<PathBuf, StoreError> {
        let path = record_file_path(&self.root, &self.namespace, key);
        let name_len = path.file_name().map(|n| n.len()).unwrap_or(0);
        // room for the ".tmp" suffix of the staging file
        if name_len + 4 > MAX_FILE_NAME_LEN {
            return Err(StoreError::Rejected(format!(
                "record name for {} is too long for the fs store",
                key
            )));
        }
        Ok(path)
    }

    fn read(&self, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        let path = self.path_for(key)?;
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(fs_error(e)),
        };

        let reader = BufReader::new(file);
        let mut value = None;

        for line in reader.lines() {
            let line = line.map_err(fs_error)?;
            // KIND and NAME lines are informational only
            if let Some((field, val)) = line.split_once(':') {
                if field.trim().eq_ignore_ascii_case("VALUE") {
                    let parsed: String = serde_json::from_str(val).map_err(|e| {
                        StoreError::Rejected(format!("Malformed VALUE in {:?}: {}", path, e))
                    })?;
                    value = Some(parsed);
                }
            }
        }

        match value {
            Some(v) => Ok(Some(Record::new(v))),
            None => Err(StoreError::Rejected(format!(
                "Record file {:?} has no VALUE line",
                path
            ))),
        }
    }

    fn write(&self, key: &RecordKey, record: &Record) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(fs_error)?;
        }

        let tmp_path = path.with_extension(format!("{}.tmp", RECORD_FILE_EXT));
        let mut f = File::create(&tmp_path).map_err(fs_error)?;

        let encoded = serde_json::to_string(&record.value)
            .map_err(|e| StoreError::Rejected(e.to_string()))?;
        writeln!(f, "KIND:{}", key.kind()).map_err(fs_error)?;
        writeln!(f, "NAME:{}", key.name().replace('\n', " ")).map_err(fs_error)?;
        writeln!(f, "VALUE:{}", encoded).map_err(fs_error)?;

        f.flush().map_err(fs_error)?;
        f.sync_all().map_err(fs_error)?;
        fs::rename(&tmp_path, &path).map_err(fs_error)?;

        #[cfg(unix)]
        if let Some(dir) = path.parent() {
            let dir_file = File::open(dir).map_err(fs_error)?;
            dir_file.sync_all().map_err(fs_error)?;
        }

        Ok(())
    }
}

#[async_trait]
impl RecordStoreTrait for RecordFsAdapter {
    fn backend(&self) -> &'static str {
        "fs"
    }

    async fn fetch(&self, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        self.read(key)
    }

    async fn persist(&self, key: &RecordKey, record: &Record) -> Result<Record, StoreError> {
        self.write(key, record)?;
        Ok(record.clone())
    }

    fn release(&self) -> Result<(), StoreError> {
        let taken = self
            .lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        // The .lock file itself stays; only the OS lock on it marks ownership.
        match taken {
            Some(file) => <File as FileExt>::unlock(&file).map_err(transport_error),
            None => Ok(()),
        }
    }
}
