//! Process-level termination wiring.

pub mod process_hooks;

pub use process_hooks::{describe_panic, FaultScope, ProcessHooks};
