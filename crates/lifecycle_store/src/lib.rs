mod error;
mod paths;
mod schema;
mod store;

pub use error::LifecycleStoreError;
pub use paths::{default_state_path, state_path_beside, DEFAULT_FILE_NAME};
pub use schema::{LifecycleRecord, UNKNOWN_REASON};
pub use store::{encode_record, load_or_default, load_record, save_record};
