use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_FILE_NAME: &str = "lifecycle.json";

#[must_use]
pub fn state_path_beside(dir: &Path) -> PathBuf {
    dir.join(DEFAULT_FILE_NAME)
}

/// `lifecycle.json` in the running executable's directory.
///
/// Falls back to the current working directory (and then to a bare relative
/// file name) when the executable location cannot be determined.
#[must_use]
pub fn default_state_path() -> PathBuf {
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    match exe_dir.or_else(|| env::current_dir().ok()) {
        Some(dir) => state_path_beside(&dir),
        None => PathBuf::from(DEFAULT_FILE_NAME),
    }
}
