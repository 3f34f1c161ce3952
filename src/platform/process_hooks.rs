//! [`ExitHooks`] bound to the running process.
//!
//! Normal exit is observed two ways: SIGINT/SIGTERM/SIGHUP (after which the
//! signal's default action still terminates the process), and `atexit` for
//! `std::process::exit` or returning from `main`. Faults are panics, observed
//! through a chained panic hook that still delegates to the previous hook.
//!
//! Only panics that end the process count as faults. By default that means
//! panics on the main thread; a panic in a worker thread surfaces as a join
//! error and the process keeps running.
//!
//! Installation is process-wide and happens once, on the first registration.
//! Callbacks stay registered until their [`HookRegistration`] is dropped.

use std::panic::{self, PanicHookInfo};
use std::sync::Mutex;
use std::thread;

use once_cell::sync::OnceCell;
#[cfg(unix)]
use signal_hook::{
    consts::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
    low_level::emulate_default_handler,
};
use tracing::{debug, error};

use crate::error::LifecycleError;
use crate::hooks::{
    lock_list, run_all, CallbackList, ExitCallback, ExitHooks, FaultCallback, HookRegistration,
};

/// Which panics are reported to fault callbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FaultScope {
    /// Panics on the thread named `main`, which unwind out of `main` and end
    /// the process.
    #[default]
    MainThread,
    /// Every panic. For hosts built with `panic = "abort"`, where any panic
    /// ends the process.
    AnyThread,
}

impl FaultScope {
    #[must_use]
    pub fn covers(self, on_main_thread: bool) -> bool {
        match self {
            Self::MainThread => on_main_thread,
            Self::AnyThread => true,
        }
    }
}

static EXIT_CALLBACKS: Mutex<CallbackList<ExitCallback>> = Mutex::new(CallbackList::new());
static FAULT_CALLBACKS: Mutex<CallbackList<(FaultScope, FaultCallback)>> =
    Mutex::new(CallbackList::new());
static EXIT_INSTALLED: OnceCell<()> = OnceCell::new();
#[cfg(unix)]
static SIGNALS_INSTALLED: OnceCell<()> = OnceCell::new();
static PANIC_INSTALLED: OnceCell<()> = OnceCell::new();

fn run_exit_callbacks(source: &'static str) {
    let callbacks = lock_list(&EXIT_CALLBACKS).snapshot();
    debug!(source, count = callbacks.len(), "running normal-exit callbacks");
    if let Err(error) = run_all(callbacks.iter().map(|callback| callback())) {
        error!(%error, source, "normal-exit callback failed");
    }
}

fn run_fault_callbacks(fault: &str, on_main_thread: bool) {
    let callbacks = lock_list(&FAULT_CALLBACKS).snapshot();
    let results = callbacks
        .iter()
        .filter(|(scope, _)| scope.covers(on_main_thread))
        .map(|(_, callback)| callback(Some(fault)));
    if let Err(error) = run_all(results) {
        error!(%error, "fault callback failed");
    }
}

extern "C" fn exit_callbacks_at_exit() {
    // Unwinding out of an `extern "C"` fn aborts; report and stop here.
    if panic::catch_unwind(|| run_exit_callbacks("atexit")).is_err() {
        error!("normal-exit callback panicked during atexit");
    }
}

/// Renders a panic as `<message> at <file>:<line>:<col>`.
#[must_use]
pub fn describe_panic(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    };

    match info.location() {
        Some(location) => format!(
            "{message} at {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ),
        None => message,
    }
}

/// Binds tracker callbacks to the process' own termination paths.
#[derive(Debug, Clone, Copy)]
pub struct ProcessHooks {
    handle_signals: bool,
    fault_scope: FaultScope,
}

impl Default for ProcessHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessHooks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handle_signals: true,
            fault_scope: FaultScope::MainThread,
        }
    }

    /// Leaves termination signals to the host, which then finalizes the
    /// tracker itself (dispose or drop) before exiting.
    #[must_use]
    pub fn without_signals() -> Self {
        Self {
            handle_signals: false,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn with_fault_scope(mut self, fault_scope: FaultScope) -> Self {
        self.fault_scope = fault_scope;
        self
    }

    #[must_use]
    pub fn handles_signals(&self) -> bool {
        self.handle_signals
    }

    #[must_use]
    pub fn fault_scope(&self) -> FaultScope {
        self.fault_scope
    }

    fn install_exit(&self) -> Result<(), LifecycleError> {
        EXIT_INSTALLED.get_or_try_init(|| {
            // SAFETY: the handler is a plain `extern "C" fn` with no captured state.
            let status = unsafe { libc::atexit(exit_callbacks_at_exit) };
            if status != 0 {
                return Err(LifecycleError::hook_install(
                    "atexit",
                    std::io::Error::other(format!("atexit returned {status}")),
                ));
            }
            Ok(())
        })?;

        #[cfg(unix)]
        if self.handle_signals {
            SIGNALS_INSTALLED.get_or_try_init(install_signal_thread)?;
        }

        Ok(())
    }

    fn install_panic(&self) {
        PANIC_INSTALLED.get_or_init(|| {
            let previous = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                let on_main_thread = thread::current().name() == Some("main");
                run_fault_callbacks(&describe_panic(info), on_main_thread);
                previous(info);
            }));
        });
    }
}

#[cfg(unix)]
fn install_signal_thread() -> Result<(), LifecycleError> {
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])
        .map_err(|source| LifecycleError::hook_install("signal", source))?;

    thread::Builder::new()
        .name("lifecycle-signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                debug!(signal, "termination signal received");
                run_exit_callbacks("signal");
                if let Err(error) = emulate_default_handler(signal) {
                    error!(%error, signal, "failed to apply default signal action");
                }
            }
        })
        .map_err(|source| LifecycleError::hook_install("signal thread", source))?;

    Ok(())
}

impl ExitHooks for ProcessHooks {
    fn on_normal_exit(&self, callback: ExitCallback) -> Result<HookRegistration, LifecycleError> {
        self.install_exit()?;
        let id = lock_list(&EXIT_CALLBACKS).insert(callback);
        Ok(HookRegistration::new(move || {
            lock_list(&EXIT_CALLBACKS).remove(id);
        }))
    }

    fn on_fault(&self, callback: FaultCallback) -> Result<HookRegistration, LifecycleError> {
        self.install_panic();
        let id = lock_list(&FAULT_CALLBACKS).insert((self.fault_scope, callback));
        Ok(HookRegistration::new(move || {
            lock_list(&FAULT_CALLBACKS).remove(id);
        }))
    }
}
