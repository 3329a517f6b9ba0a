//! Key-value persistence.
//!
//! Storage is partitioned by ownership, never shared across
//! components: the cart engine owns the guest-cart key, and each
//! credential scope owns its token and identity snapshot keys. The
//! [`KeyValueStore`] trait is the injection seam; production code uses
//! [`JsonFileStore`], tests use [`MemoryStore`].

mod credentials;
mod file;
mod memory;

pub use credentials::{CredentialStore, IDENTITY_KEY, TOKEN_KEY};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted data could not be serialized.
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Key-value persistence abstraction.
///
/// Values are opaque strings; callers layer JSON on top where they
/// need structure. Implementations use interior mutability so stores
/// can be shared by handle.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Removing an absent key is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
