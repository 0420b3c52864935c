//! # bucketkv
//!
//! A flat, persistent key-value store layered on object storage:
//! - One object per key, named `basepath + key`
//! - Object content is the raw value
//! - Range scans answered by the backend's ordered name listing
//! - Whole-namespace count/clear scoped to `basepath`
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  KvStore (get/set/del/...)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     ObjectKvStore                            │
//! │        Namespace: key ◄──► basepath + key                    │
//! │        Listing:   paginated range / prefix queries           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  ObjectBackend
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │MemoryBucket │          │ LocalBucket │
//!   │ (BTreeMap)  │          │ (directory) │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use bucketkv::{KvStore, ObjectKvStore};
//! use bucketkv::backend::MemoryBucket;
//!
//! let store = ObjectKvStore::new(MemoryBucket::new(), "kv/");
//! store.set("folder1/11", b"v").unwrap();
//! assert_eq!(store.scan("folder1/", "11", "20").unwrap(), vec!["folder1/11"]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod backend;
pub mod namespace;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{BackendKind, Config};
pub use namespace::Namespace;
pub use store::{KvStore, MemoryKvStore, ObjectKvStore};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of bucketkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
