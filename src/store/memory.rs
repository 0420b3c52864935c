//! Sorted-index store
//!
//! BTreeMap-based `KvStore` with the same semantics as `ObjectKvStore`.
//! This is the shape a store takes when its backend cannot list by range:
//! the ordered index lives next to the values instead of in object names.

use std::collections::BTreeMap;
use std::ops::Bound;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::{KvError, Result};

use super::KvStore;

/// In-memory key-value store backed by an ordered map
#[derive(Default)]
pub struct MemoryKvStore {
    data: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryKvStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Bytes> {
        self.data
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| KvError::NotFound {
                key: key.to_string(),
            })
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.data
            .write()
            .insert(key.to_string(), Bytes::copy_from_slice(value));
        Ok(())
    }

    fn del(&self, key: &str) -> Result<()> {
        match self.data.write().remove(key) {
            Some(_) => Ok(()),
            None => Err(KvError::Delete {
                key: key.to_string(),
                message: "key not found".to_string(),
            }),
        }
    }

    fn size(&self) -> Result<usize> {
        Ok(self.data.read().len())
    }

    fn scan(&self, prefix: &str, start: &str, end: &str) -> Result<Vec<String>> {
        let lower = format!("{}{}", prefix, start);
        let upper = format!("{}{}", prefix, end);

        // BTreeMap::range panics on an inverted range
        if lower >= upper {
            return Ok(Vec::new());
        }

        let data = self.data.read();
        let keys = data
            .range::<str, _>((Bound::Included(lower.as_str()), Bound::Excluded(upper.as_str())))
            .map(|(key, _)| key.clone())
            .collect();
        Ok(keys)
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let data = self.data.read();
        let keys = data
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        Ok(keys)
    }

    fn clear(&self) -> Result<()> {
        self.data.write().clear();
        Ok(())
    }
}
