use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Reason label of a record that has never been through a tracked session.
pub const UNKNOWN_REASON: &str = "Unknown";

/// Latest lifecycle snapshot, as stored on disk.
///
/// Only the most recent session is kept. Missing fields fall back to the
/// values of [`LifecycleRecord::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LifecycleRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub last_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_exit: Option<OffsetDateTime>,
    pub was_clean_exit: bool,
    pub restart_count: u32,
    pub last_exit_reason: String,
}

impl Default for LifecycleRecord {
    fn default() -> Self {
        Self {
            last_start: OffsetDateTime::UNIX_EPOCH,
            last_exit: None,
            was_clean_exit: false,
            restart_count: 0,
            last_exit_reason: UNKNOWN_REASON.to_string(),
        }
    }
}

impl LifecycleRecord {
    /// True while a session has started and not yet written its exit.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.last_exit.is_none() && self.restart_count > 0
    }
}
