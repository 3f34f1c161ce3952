//! Session lifecycle tracking over a persisted [`LifecycleRecord`].
//!
//! Construction opens a session: the stored record is loaded (or defaulted),
//! the restart counter is bumped, and the record is marked `Running` on disk.
//! The session is closed by exactly one terminal write, from whichever of
//! [`LifecycleTracker::dispose`], the normal-exit hook or the fault hook fires
//! first. Later terminal requests are no-ops.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lifecycle_store::{load_or_default, save_record, LifecycleRecord};
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::config::TrackerConfig;
use crate::error::LifecycleError;
use crate::hooks::{ExitHooks, HookRegistration};
use crate::platform::ProcessHooks;
use crate::reason::ExitReason;

struct TrackerState {
    path: PathBuf,
    record: Mutex<LifecycleRecord>,
    finalized: AtomicBool,
}

impl TrackerState {
    fn record(&self) -> MutexGuard<'_, LifecycleRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_state(&self) -> LifecycleRecord {
        load_or_default(&self.path)
    }

    fn save_state(&self, record: &LifecycleRecord) -> Result<(), LifecycleError> {
        save_record(&self.path, record)?;
        Ok(())
    }

    /// Writes the terminal state unless another path already did.
    ///
    /// Returns whether this call performed the write.
    fn record_exit(&self, reason: ExitReason) -> Result<bool, LifecycleError> {
        if self
            .finalized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(false);
        }

        let mut record = self.record();
        let mut exited = record.clone();
        exited.last_exit = Some(OffsetDateTime::now_utc());
        exited.was_clean_exit = reason.is_clean();
        exited.last_exit_reason = reason.label();
        self.save_state(&exited)?;
        *record = exited;

        info!(
            path = %self.path.display(),
            reason = %record.last_exit_reason,
            clean = record.was_clean_exit,
            "lifecycle session finalized"
        );
        Ok(true)
    }
}

/// Tracks the current process session in a lifecycle file.
pub struct LifecycleTracker {
    state: Arc<TrackerState>,
    started: Instant,
    _registrations: [HookRegistration; 2],
}

impl LifecycleTracker {
    /// Opens a session at `path` (or `lifecycle.json` beside the executable)
    /// and binds termination to the real process hooks.
    pub fn new(path: Option<PathBuf>) -> Result<Self, LifecycleError> {
        Self::with_hooks(TrackerConfig::from(path), &ProcessHooks::new())
    }

    /// Opens a session and registers its termination callbacks with `hooks`.
    pub fn with_hooks(
        config: TrackerConfig,
        hooks: &dyn ExitHooks,
    ) -> Result<Self, LifecycleError> {
        let started = Instant::now();
        let state = Arc::new(TrackerState {
            path: config.resolved_path(),
            record: Mutex::new(LifecycleRecord::default()),
            finalized: AtomicBool::new(false),
        });

        let mut record = state.load_state();
        if record.is_open() {
            warn!(
                path = %state.path.display(),
                last_start = %record.last_start,
                "previous session ended without recording an exit"
            );
        }

        record.restart_count = record.restart_count.saturating_add(1);
        record.last_start = OffsetDateTime::now_utc();
        record.last_exit = None;
        record.was_clean_exit = false;
        record.last_exit_reason = ExitReason::Running.label();
        state.save_state(&record)?;

        info!(
            path = %state.path.display(),
            restart_count = record.restart_count,
            "lifecycle session started"
        );
        *state.record() = record;

        let on_exit = Arc::downgrade(&state);
        let exit_registration = hooks.on_normal_exit(Arc::new(move || match on_exit.upgrade() {
            Some(state) => state.record_exit(ExitReason::CleanExit).map(drop),
            None => Ok(()),
        }))?;

        let on_fault = Arc::downgrade(&state);
        let fault_registration = hooks.on_fault(Arc::new(move |fault: Option<&str>| {
            match on_fault.upgrade() {
                Some(state) => state.record_exit(ExitReason::crash(fault)).map(drop),
                None => Ok(()),
            }
        }))?;

        Ok(Self {
            state,
            started,
            _registrations: [exit_registration, fault_registration],
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.state.path
    }

    /// Snapshot of the in-memory record. It only changes once the file write
    /// for that change has succeeded.
    #[must_use]
    pub fn record(&self) -> LifecycleRecord {
        self.state.record().clone()
    }

    #[must_use]
    pub fn exit_reason(&self) -> ExitReason {
        ExitReason::from_label(&self.state.record().last_exit_reason)
    }

    /// Time since this tracker was constructed.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether the terminal write has happened (or been claimed) for this session.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.state.finalized.load(Ordering::SeqCst)
    }

    /// Closes the session with reason `Dispose`.
    ///
    /// Returns `Ok(false)` without touching the file when the session was
    /// already closed by an earlier dispose or by a process hook.
    pub fn dispose(&self) -> Result<bool, LifecycleError> {
        self.state.record_exit(ExitReason::Dispose)
    }
}

impl Drop for LifecycleTracker {
    fn drop(&mut self) {
        if self.is_finalized() {
            return;
        }
        if let Err(error) = self.dispose() {
            error!(%error, "failed to record lifecycle exit on drop");
        }
    }
}

impl std::fmt::Debug for LifecycleTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleTracker")
            .field("path", &self.state.path)
            .field("finalized", &self.is_finalized())
            .field("uptime", &self.uptime())
            .finish()
    }
}
