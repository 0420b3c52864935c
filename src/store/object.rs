//! Object-backed store
//!
//! Maps each key to one object named `basepath + key` and answers range
//! queries with the backend's ordered listing.

use std::io::{self, Read, Write};
use std::sync::Arc;

use bytes::Bytes;

use crate::backend::{
    BackendError, ListQuery, Listing, LocalBucket, MemoryBucket, ObjectBackend,
};
use crate::config::{BackendKind, Config};
use crate::error::{KvError, Result};
use crate::namespace::Namespace;

use super::KvStore;

/// Upper bound on the buffer reserved up front for a `get`
const INITIAL_READ_CAPACITY: u64 = 1 << 20;

/// Key-value store over an object-storage backend
///
/// ## State
/// Only the backend handle, the namespace and the page size, all fixed at
/// construction. Every operation is a single backend call or a bounded
/// listing loop; there are no locks, retries or caches.
#[derive(Clone)]
pub struct ObjectKvStore {
    /// Object storage capability
    backend: Arc<dyn ObjectBackend>,

    /// Key ↔ object name mapping
    namespace: Namespace,

    /// Objects requested per listing page
    page_size: usize,
}

impl ObjectKvStore {
    /// Default objects per listing page
    pub const DEFAULT_PAGE_SIZE: usize = 1000;

    /// Wrap an already connected backend
    pub fn new(backend: impl ObjectBackend + 'static, basepath: impl Into<String>) -> Self {
        Self::from_shared(Arc::new(backend), basepath)
    }

    /// Wrap a shared backend handle
    pub fn from_shared(backend: Arc<dyn ObjectBackend>, basepath: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: Namespace::new(basepath),
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the listing page size (clamped to at least 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Connect the backend described by `config`
    ///
    /// Only the backend session is established here; no objects are read
    /// or listed.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;

        let backend: Arc<dyn ObjectBackend> = match &config.backend {
            BackendKind::Memory => Arc::new(MemoryBucket::new()),
            BackendKind::Local { root, create } => {
                let bucket = if *create {
                    LocalBucket::create(root)
                } else {
                    LocalBucket::connect(root)
                };
                Arc::new(bucket.map_err(|e| KvError::Connection(e.to_string()))?)
            }
        };

        tracing::debug!(
            basepath = %config.basepath,
            page_size = config.list_page_size,
            "opened object store"
        );

        Ok(Self::from_shared(backend, config.basepath.clone())
            .with_page_size(config.list_page_size))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Namespace root prepended to every key
    pub fn basepath(&self) -> &str {
        self.namespace.basepath()
    }

    /// Objects requested per listing page
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// The underlying backend
    pub fn backend(&self) -> &Arc<dyn ObjectBackend> {
        &self.backend
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn listing(&self, query: ListQuery) -> Listing<'_> {
        Listing::new(&*self.backend, query, self.page_size)
    }

    /// Collect keys from a names-only listing, keeping partial results on error
    fn collect_keys(&self, listing: Listing<'_>) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        for object in listing {
            match object {
                Ok(object) => match self.namespace.key_of(&object.name) {
                    Some(key) => keys.push(key.to_string()),
                    None => tracing::warn!(
                        name = %object.name,
                        "listing returned an object outside the namespace"
                    ),
                },
                Err(e) => {
                    tracing::warn!(collected = keys.len(), error = %e, "scan interrupted");
                    return Err(KvError::list(e, keys));
                }
            }
        }

        Ok(keys)
    }
}

impl KvStore for ObjectKvStore {
    fn get(&self, key: &str) -> Result<Bytes> {
        let name = self.namespace.object_name(key);

        let mut reader = self.backend.open_reader(&name).map_err(|e| match e {
            BackendError::NotFound(_) => KvError::NotFound {
                key: key.to_string(),
            },
            other => KvError::Read(format!("{}: {}", name, other)),
        })?;

        // The declared size only bounds the read; the buffer grows with the
        // bytes actually delivered.
        let declared = reader.declared_size();
        let mut buf = Vec::with_capacity(declared.min(INITIAL_READ_CAPACITY) as usize);
        reader
            .by_ref()
            .take(declared)
            .read_to_end(&mut buf)
            .map_err(|e| KvError::Read(format!("{}: {}", name, e)))?;

        if buf.len() as u64 != declared {
            return Err(KvError::Read(format!(
                "incomplete read of {}: got {} of {} bytes",
                name,
                buf.len(),
                declared
            )));
        }

        tracing::debug!(key, bytes = buf.len(), "get");
        Ok(Bytes::from(buf))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let name = self.namespace.object_name(key);

        let mut writer = self
            .backend
            .open_writer(&name)
            .map_err(|e| KvError::Write(format!("{}: {}", name, e)))?;

        let written = write_full(writer.as_mut(), value)
            .map_err(|e| KvError::Write(format!("{}: {}", name, e)))?;

        // Dropping the uncommitted writer abandons the object
        if written != value.len() {
            return Err(KvError::Write(format!(
                "incomplete write of {}: accepted {} of {} bytes",
                name,
                written,
                value.len()
            )));
        }

        writer
            .flush()
            .map_err(|e| KvError::Write(format!("{}: {}", name, e)))?;
        writer
            .commit()
            .map_err(|e| KvError::Write(format!("{}: {}", name, e)))?;

        tracing::debug!(key, bytes = value.len(), "set");
        Ok(())
    }

    fn del(&self, key: &str) -> Result<()> {
        let name = self.namespace.object_name(key);

        self.backend
            .delete_object(&name)
            .map_err(|e| KvError::Delete {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!(key, "del");
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        let mut listing = self.listing(self.namespace.all_query());
        let mut count = 0;

        for object in listing.by_ref() {
            object.map_err(|e| KvError::list(e, Vec::new()))?;
            count += 1;
        }

        tracing::debug!(count, pages = listing.pages_fetched(), "size");
        Ok(count)
    }

    fn scan(&self, prefix: &str, start: &str, end: &str) -> Result<Vec<String>> {
        let query = self.namespace.range_query(prefix, start, end);
        let keys = self.collect_keys(self.listing(query))?;

        tracing::debug!(prefix, start, end, found = keys.len(), "scan");
        Ok(keys)
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let query = self.namespace.prefix_query(prefix);
        let keys = self.collect_keys(self.listing(query))?;

        tracing::debug!(prefix, found = keys.len(), "scan_prefix");
        Ok(keys)
    }

    fn clear(&self) -> Result<()> {
        let mut deleted = 0usize;

        for object in self.listing(self.namespace.all_query()) {
            let object = object.map_err(|e| {
                tracing::warn!(deleted, error = %e, "clear interrupted while listing");
                KvError::list(e, Vec::new())
            })?;

            self.backend.delete_object(&object.name).map_err(|e| {
                tracing::warn!(deleted, name = %object.name, error = %e, "clear interrupted while deleting");
                KvError::Delete {
                    key: self
                        .namespace
                        .key_of(&object.name)
                        .unwrap_or(&object.name)
                        .to_string(),
                    message: e.to_string(),
                }
            })?;
            deleted += 1;
        }

        tracing::debug!(deleted, "clear");
        Ok(())
    }
}

/// Write until `data` is consumed or the stream stops accepting bytes
fn write_full<W: Write + ?Sized>(writer: &mut W, data: &[u8]) -> io::Result<usize> {
    let mut written = 0;
    while written < data.len() {
        match writer.write(&data[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}
