//! Durable key-value storage for session data.
//!
//! Every backend speaks JSON values under string keys and reports failures
//! through the crate's single `Result` channel.
//!
//! ## Keys
//!
//! ```text
//! token             # opaque bearer token (string)
//! userInfo          # profile of the logged-in user (object)
//! savedCredentials  # optional "remember me" credentials (object)
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AppError, Result};

// Re-export for convenience
pub use local::LocalStore;
pub use memory::MemoryStore;

/// Trait for durable key-value backends.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never written or was removed.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Reject keys that cannot be mapped safely onto file names.
pub(crate) fn check_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(AppError::storage(key, "invalid key"))
    }
}
