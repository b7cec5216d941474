use std::path::{Path, PathBuf};

use crate::core::persistence::record::record_entity::RecordKey;

/// File extension shared by record files.
pub const RECORD_FILE_EXT: &str = "rci";

/// Longest single file name most local filesystems accept (ext4, xfs, apfs).
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Encode an arbitrary string into a single safe path segment.
/// Dots are escaped too so `.` and `..` cannot walk the tree.
pub fn path_segment(raw: &str) -> String {
    urlencoding::encode(raw).replace('.', "%2E")
}

/// `<root>/<namespace>`
pub fn record_namespace_dir(root: &Path, namespace: &str) -> PathBuf {
    root.join(path_segment(namespace))
}

/// `<root>/<namespace>/<kind>`
pub fn record_kind_dir(root: &Path, namespace: &str, kind: &str) -> PathBuf {
    record_namespace_dir(root, namespace).join(path_segment(kind))
}

/// `<root>/<namespace>/<kind>/<name>.rci`
pub fn record_file_path(root: &Path, namespace: &str, key: &RecordKey) -> PathBuf {
    record_kind_dir(root, namespace, key.kind())
        .join(format!("{}.{}", path_segment(key.name()), RECORD_FILE_EXT))
}

/// Lock file held while a handle on the namespace is open.
pub fn record_lock_path(root: &Path, namespace: &str) -> PathBuf {
    record_namespace_dir(root, namespace).join(".lock")
}
