use lifecycle_store::LifecycleStoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Store(#[from] LifecycleStoreError),

    #[error("failed to install {hook} hook: {source}")]
    HookInstall {
        hook: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl LifecycleError {
    #[must_use]
    pub fn hook_install(hook: &'static str, source: std::io::Error) -> Self {
        Self::HookInstall { hook, source }
    }
}
