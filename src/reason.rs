//! Exit classification labels.

use std::fmt;

use lifecycle_store::UNKNOWN_REASON;

const RUNNING: &str = "Running";
const CLEAN_EXIT: &str = "CleanExit";
const DISPOSE: &str = "Dispose";
const CRASH_PREFIX: &str = "Crash: ";

/// Why a session ended, or that it has not ended yet.
///
/// Renders to the label stored in `LastExitReason`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    Unknown,
    Running,
    CleanExit,
    Dispose,
    /// First line of the fault text. Empty when the fault carried no text.
    Crash(String),
}

impl ExitReason {
    /// Builds a crash reason from optional fault text, keeping only its first line.
    #[must_use]
    pub fn crash(fault: Option<&str>) -> Self {
        let first_line = fault
            .and_then(|text| text.split('\n').next())
            .map(|line| line.trim_end_matches('\r'))
            .unwrap_or_default();
        Self::Crash(first_line.to_string())
    }

    /// Parses a stored label. Labels outside the known set map to `Unknown`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            RUNNING => Self::Running,
            CLEAN_EXIT => Self::CleanExit,
            DISPOSE => Self::Dispose,
            _ => match label.strip_prefix(CRASH_PREFIX) {
                Some(detail) => Self::Crash(detail.to_string()),
                None if label == CRASH_PREFIX.trim_end() => Self::Crash(String::new()),
                None => Self::Unknown,
            },
        }
    }

    /// Orderly terminations: the normal exit path and explicit disposal.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::CleanExit | Self::Dispose)
    }

    #[must_use]
    pub fn is_crash(&self) -> bool {
        matches!(self, Self::Crash(_))
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str(UNKNOWN_REASON),
            Self::Running => f.write_str(RUNNING),
            Self::CleanExit => f.write_str(CLEAN_EXIT),
            Self::Dispose => f.write_str(DISPOSE),
            Self::Crash(detail) => write!(f, "{CRASH_PREFIX}{detail}"),
        }
    }
}
