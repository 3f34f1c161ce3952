use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::LifecycleStoreError;
use crate::schema::LifecycleRecord;

/// Reads and parses the record at `path`.
///
/// A file holding JSON `null` is rejected rather than silently defaulted;
/// callers that want the fail-soft behavior use [`load_or_default`].
pub fn load_record(path: &Path) -> Result<LifecycleRecord, LifecycleStoreError> {
    let text = fs::read_to_string(path)
        .map_err(|source| LifecycleStoreError::io("reading lifecycle file", path, source))?;

    serde_json::from_str::<Option<LifecycleRecord>>(&text)
        .map_err(|source| LifecycleStoreError::json_parse(path, source))?
        .ok_or_else(|| LifecycleStoreError::NullRecord {
            path: path.to_path_buf(),
        })
}

/// Reads the record at `path`, substituting a default record on any failure.
pub fn load_or_default(path: &Path) -> LifecycleRecord {
    match load_record(path) {
        Ok(record) => {
            debug!(
                path = %path.display(),
                restart_count = record.restart_count,
                "loaded lifecycle record"
            );
            record
        }
        Err(error) if error.is_not_found() => {
            debug!(path = %path.display(), "no lifecycle file yet; starting fresh");
            LifecycleRecord::default()
        }
        Err(error) => {
            warn!(%error, "discarding unreadable lifecycle file");
            LifecycleRecord::default()
        }
    }
}

/// Renders the record as indented JSON with all five fields.
pub fn encode_record(
    path: &Path,
    record: &LifecycleRecord,
) -> Result<String, LifecycleStoreError> {
    serde_json::to_string_pretty(record)
        .map_err(|source| LifecycleStoreError::json_serialize(path, source))
}

/// Overwrites `path` with the encoded record, creating parent directories.
pub fn save_record(path: &Path, record: &LifecycleRecord) -> Result<(), LifecycleStoreError> {
    let json = encode_record(path, record)?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| {
            LifecycleStoreError::io("creating lifecycle directory", parent, source)
        })?;
    }

    fs::write(path, json)
        .map_err(|source| LifecycleStoreError::io("writing lifecycle file", path, source))
}
