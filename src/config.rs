//! Tracker configuration.

use std::path::PathBuf;

use lifecycle_store::default_state_path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerConfig {
    /// State file location. `None` means `lifecycle.json` beside the executable.
    pub path: Option<PathBuf>,
}

impl TrackerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_state_path)
    }
}

impl From<Option<PathBuf>> for TrackerConfig {
    fn from(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}
