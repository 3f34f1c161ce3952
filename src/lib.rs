//! Process lifecycle tracking persisted in a small JSON state file.
//!
//! Invariant: one terminal write per session. `dispose`, the normal-exit hook
//! and the fault hook share a single guard; whichever fires first decides the
//! recorded exit.
//!
//! # Public API Overview
//! - Open a session with [`LifecycleTracker::new`] (real process hooks) or
//!   [`LifecycleTracker::with_hooks`] (any [`ExitHooks`] implementation).
//! - Read the persisted snapshot with [`LifecycleRecord`] and the
//!   `lifecycle_store` loaders re-exported here.
//! - Classify exits with [`ExitReason`].

pub mod config;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod platform;
pub mod reason;
pub mod tracker;

pub use crate::config::TrackerConfig;
pub use crate::error::LifecycleError;
pub use crate::hooks::{
    ExitCallback, ExitHooks, FaultCallback, HookRegistration, ManualHooks, NoopHooks,
};
pub use crate::logging::{init_logging, LogFormat};
pub use crate::platform::{FaultScope, ProcessHooks};
pub use crate::reason::ExitReason;
pub use crate::tracker::LifecycleTracker;

pub use lifecycle_store::{
    default_state_path, load_or_default, load_record, save_record, LifecycleRecord,
    LifecycleStoreError, DEFAULT_FILE_NAME,
};
