//! In-memory bucket
//!
//! BTreeMap-based object store. Used for tests, benchmarks and as the
//! default backend when no bucket directory is configured.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::ops::Bound;
use std::sync::Arc;

use bytes::buf::Reader;
use bytes::{Buf, Bytes, BytesMut};
use parking_lot::RwLock;

use super::{
    collect_page, BackendError, ListPage, ListQuery, ObjectBackend, ObjectReader, ObjectWriter,
};

type Objects = Arc<RwLock<BTreeMap<String, Bytes>>>;

/// Object store held entirely in process memory
///
/// Cloning yields another handle onto the same objects.
#[derive(Clone, Default)]
pub struct MemoryBucket {
    objects: Objects,
}

impl MemoryBucket {
    /// Create an empty bucket
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects in the whole bucket
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Whether an object named `name` exists
    pub fn contains(&self, name: &str) -> bool {
        self.objects.read().contains_key(name)
    }
}

impl ObjectBackend for MemoryBucket {
    fn open_reader(&self, name: &str) -> Result<Box<dyn ObjectReader>, BackendError> {
        let data = self
            .objects
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(name.to_string()))?;

        Ok(Box::new(MemoryReader {
            size: data.len() as u64,
            inner: data.reader(),
        }))
    }

    fn open_writer(&self, name: &str) -> Result<Box<dyn ObjectWriter>, BackendError> {
        Ok(Box::new(MemoryWriter {
            objects: Arc::clone(&self.objects),
            name: name.to_string(),
            buffer: BytesMut::new(),
        }))
    }

    fn delete_object(&self, name: &str) -> Result<(), BackendError> {
        match self.objects.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(BackendError::NotFound(name.to_string())),
        }
    }

    fn list_objects(
        &self,
        query: &ListQuery,
        page_token: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage, BackendError> {
        let lower = query.lower_bound();
        let start = match page_token {
            Some(token) if token >= lower => Bound::Excluded(token),
            _ => Bound::Included(lower),
        };

        let objects = self.objects.read();
        let candidates = objects
            .range::<str, _>((start, Bound::Unbounded))
            .map(|(name, data)| (name.as_str(), data.len() as u64));

        Ok(collect_page(query, candidates, page_size))
    }
}

/// Reader over a snapshot of one object
struct MemoryReader {
    size: u64,
    inner: Reader<Bytes>,
}

impl Read for MemoryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl ObjectReader for MemoryReader {
    fn declared_size(&self) -> u64 {
        self.size
    }
}

/// Buffers writes and publishes them on commit
struct MemoryWriter {
    objects: Objects,
    name: String,
    buffer: BytesMut,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ObjectWriter for MemoryWriter {
    fn commit(self: Box<Self>) -> Result<(), BackendError> {
        let MemoryWriter {
            objects,
            name,
            buffer,
        } = *self;
        objects.write().insert(name, buffer.freeze());
        Ok(())
    }
}
