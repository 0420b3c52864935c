//! Store Module
//!
//! The key-value surface and its implementations.
//!
//! ## Implementations
//! - [`ObjectKvStore`]: one object per key in an [`ObjectBackend`]; range
//!   queries are answered by the backend's ordered listing.
//! - [`MemoryKvStore`]: an in-process sorted index with the same semantics,
//!   for tests and for callers without an object store.
//!
//! ## Concurrency
//! `get` may run concurrently with other `get`s. Everything else mutates or
//! enumerates the namespace without isolation; callers serialize those
//! themselves.
//!
//! [`ObjectBackend`]: crate::backend::ObjectBackend

mod memory;
mod object;

use bytes::Bytes;

use crate::error::Result;

pub use memory::MemoryKvStore;
pub use object::ObjectKvStore;

/// Flat key-value store over string keys and byte values
pub trait KvStore: Send + Sync {
    /// Value stored under `key`; `NotFound` if absent
    fn get(&self, key: &str) -> Result<Bytes>;

    /// Create or replace the value under `key`
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`
    ///
    /// Deleting an absent key is an error, which lets callers detect
    /// double deletes.
    fn del(&self, key: &str) -> Result<()>;

    /// Number of keys in the store
    fn size(&self) -> Result<usize>;

    /// Keys `k` with `prefix+start <= k < prefix+end`, ascending
    ///
    /// Returned keys include `prefix`. On failure the error carries the keys
    /// collected so far (see [`KvError::partial_keys`]).
    ///
    /// [`KvError::partial_keys`]: crate::KvError::partial_keys
    fn scan(&self, prefix: &str, start: &str, end: &str) -> Result<Vec<String>>;

    /// Every key beginning with `prefix`, ascending
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Remove every key
    fn clear(&self) -> Result<()>;
}
