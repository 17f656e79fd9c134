//! Database models and schema initialization

pub mod init;
pub mod models;
pub mod retry;

pub use init::*;
pub use models::*;
pub use retry::{retry_on_lock, with_lock_retry, MAX_LOCK_WAIT_MS};
