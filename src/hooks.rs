//! Termination notification capability.
//!
//! The tracker never talks to the process directly. It registers callbacks
//! through [`ExitHooks`]; [`crate::platform::ProcessHooks`] binds them to the
//! real process, [`ManualHooks`] lets an owner (or a test) fire them.
//!
//! Every registration hands back a [`HookRegistration`]. Dropping it removes
//! the callback again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::error::LifecycleError;

/// Invoked once the host process is shutting down in an orderly way.
pub type ExitCallback = Arc<dyn Fn() -> Result<(), LifecycleError> + Send + Sync>;

/// Invoked with the fault's text, when the fault carried any.
pub type FaultCallback = Arc<dyn Fn(Option<&str>) -> Result<(), LifecycleError> + Send + Sync>;

pub trait ExitHooks {
    fn on_normal_exit(&self, callback: ExitCallback) -> Result<HookRegistration, LifecycleError>;

    fn on_fault(&self, callback: FaultCallback) -> Result<HookRegistration, LifecycleError>;
}

/// Keeps a callback registered until dropped.
#[must_use = "dropping the registration unregisters the callback"]
pub struct HookRegistration {
    unregister: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl HookRegistration {
    pub(crate) fn new(unregister: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unregister: Some(Box::new(unregister)),
        }
    }

    /// A registration with nothing to undo.
    pub fn detached() -> Self {
        Self { unregister: None }
    }
}

impl Drop for HookRegistration {
    fn drop(&mut self) {
        if let Some(unregister) = self.unregister.take() {
            unregister();
        }
    }
}

impl std::fmt::Debug for HookRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistration")
            .field("attached", &self.unregister.is_some())
            .finish()
    }
}

/// Registers nothing. The owner finalizes through `dispose` or drop.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl ExitHooks for NoopHooks {
    fn on_normal_exit(&self, _callback: ExitCallback) -> Result<HookRegistration, LifecycleError> {
        Ok(HookRegistration::detached())
    }

    fn on_fault(&self, _callback: FaultCallback) -> Result<HookRegistration, LifecycleError> {
        Ok(HookRegistration::detached())
    }
}

/// Callbacks keyed by registration id.
pub(crate) struct CallbackList<C> {
    next_id: u64,
    entries: Vec<(u64, C)>,
}

impl<C: Clone> CallbackList<C> {
    pub(crate) const fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, callback: C) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    pub(crate) fn remove(&mut self, id: u64) {
        self.entries.retain(|(entry_id, _)| *entry_id != id);
    }

    pub(crate) fn snapshot(&self) -> Vec<C> {
        self.entries.iter().map(|(_, callback)| callback.clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<C: Clone> Default for CallbackList<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct ManualHooksInner {
    exit: Mutex<CallbackList<ExitCallback>>,
    fault: Mutex<CallbackList<FaultCallback>>,
}

pub(crate) fn lock_list<C>(list: &Mutex<CallbackList<C>>) -> MutexGuard<'_, CallbackList<C>> {
    list.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Hooks fired explicitly by whoever holds them.
#[derive(Default)]
pub struct ManualHooks {
    inner: Arc<ManualHooksInner>,
}

impl ManualHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every normal-exit callback; returns the first error after all ran.
    pub fn fire_normal_exit(&self) -> Result<(), LifecycleError> {
        let callbacks = lock_list(&self.inner.exit).snapshot();
        run_all(callbacks.iter().map(|callback| callback()))
    }

    /// Runs every fault callback; returns the first error after all ran.
    pub fn fire_fault(&self, fault: Option<&str>) -> Result<(), LifecycleError> {
        let callbacks = lock_list(&self.inner.fault).snapshot();
        run_all(callbacks.iter().map(|callback| callback(fault)))
    }

    #[must_use]
    pub fn exit_callback_count(&self) -> usize {
        lock_list(&self.inner.exit).len()
    }

    #[must_use]
    pub fn fault_callback_count(&self) -> usize {
        lock_list(&self.inner.fault).len()
    }
}

impl ExitHooks for ManualHooks {
    fn on_normal_exit(&self, callback: ExitCallback) -> Result<HookRegistration, LifecycleError> {
        let id = lock_list(&self.inner.exit).insert(callback);
        let inner: Weak<ManualHooksInner> = Arc::downgrade(&self.inner);
        Ok(HookRegistration::new(move || {
            if let Some(inner) = inner.upgrade() {
                lock_list(&inner.exit).remove(id);
            }
        }))
    }

    fn on_fault(&self, callback: FaultCallback) -> Result<HookRegistration, LifecycleError> {
        let id = lock_list(&self.inner.fault).insert(callback);
        let inner: Weak<ManualHooksInner> = Arc::downgrade(&self.inner);
        Ok(HookRegistration::new(move || {
            if let Some(inner) = inner.upgrade() {
                lock_list(&inner.fault).remove(id);
            }
        }))
    }
}

pub(crate) fn run_all(
    results: impl Iterator<Item = Result<(), LifecycleError>>,
) -> Result<(), LifecycleError> {
    let mut first_error = None;
    for result in results {
        if let Err(error) = result {
            first_error.get_or_insert(error);
        }
    }
    first_error.map_or(Ok(()), Err)
}
