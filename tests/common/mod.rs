//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use bucketkv::backend::{
    BackendError, ListPage, ListQuery, MemoryBucket, ObjectBackend, ObjectReader, ObjectWriter,
};

// =============================================================================
// Key/Value Fixtures
// =============================================================================

/// Keys "folder1/11" ..= "folder1/25"
pub fn folder_keys() -> Vec<String> {
    (11..=25).map(|i| format!("folder1/{}", i)).collect()
}

/// Deterministic value for a key
pub fn value_for(key: &str) -> Vec<u8> {
    format!("value-of-{}", key).into_bytes()
}

/// Numbered keys "000" .. "{n-1}", zero padded so they sort numerically
pub fn numbered_keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{:03}", i)).collect()
}

// =============================================================================
// Fault Injection
// =============================================================================

/// Memory bucket that can be told to misbehave
#[derive(Default)]
pub struct FlakyBucket {
    pub inner: MemoryBucket,

    /// Fail the Nth `list_objects` call (1-based)
    pub fail_list_on_call: Option<u64>,

    /// Readers stop after this many bytes while still declaring the full size
    pub read_limit: Option<u64>,

    /// Readers declare this size instead of the real one
    pub declared_size: Option<u64>,

    /// Writers accept at most this many bytes, then report 0
    pub write_limit: Option<usize>,

    /// Deletes of this object name fail
    pub fail_delete_of: Option<String>,

    /// Number of `list_objects` calls so far
    pub list_calls: AtomicU64,
}

impl FlakyBucket {
    pub fn new(inner: MemoryBucket) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }
}

impl ObjectBackend for FlakyBucket {
    fn open_reader(&self, name: &str) -> Result<Box<dyn ObjectReader>, BackendError> {
        let reader = self.inner.open_reader(name)?;
        if self.read_limit.is_none() && self.declared_size.is_none() {
            return Ok(reader);
        }
        Ok(Box::new(TruncatedReader {
            declared: self.declared_size.unwrap_or(reader.declared_size()),
            inner: reader,
            remaining: self.read_limit.unwrap_or(u64::MAX),
        }))
    }

    fn open_writer(&self, name: &str) -> Result<Box<dyn ObjectWriter>, BackendError> {
        let writer = self.inner.open_writer(name)?;
        match self.write_limit {
            Some(limit) => Ok(Box::new(StingyWriter {
                inner: writer,
                remaining: limit,
            })),
            None => Ok(writer),
        }
    }

    fn delete_object(&self, name: &str) -> Result<(), BackendError> {
        if self.fail_delete_of.as_deref() == Some(name) {
            return Err(BackendError::Unavailable("injected delete failure".to_string()));
        }
        self.inner.delete_object(name)
    }

    fn list_objects(
        &self,
        query: &ListQuery,
        page_token: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage, BackendError> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_list_on_call == Some(call) {
            return Err(BackendError::Unavailable(format!(
                "injected listing failure on call {}",
                call
            )));
        }
        self.inner.list_objects(query, page_token, page_size)
    }
}

struct TruncatedReader {
    inner: Box<dyn ObjectReader>,
    declared: u64,
    remaining: u64,
}

impl Read for TruncatedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let max = buf.len().min(self.remaining as usize);
        let n = self.inner.read(&mut buf[..max])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

impl ObjectReader for TruncatedReader {
    fn declared_size(&self) -> u64 {
        self.declared
    }
}

struct StingyWriter {
    inner: Box<dyn ObjectWriter>,
    remaining: usize,
}

impl Write for StingyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining);
        if n == 0 {
            return Ok(0);
        }
        let n = self.inner.write(&buf[..n])?;
        self.remaining -= n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl ObjectWriter for StingyWriter {
    fn commit(self: Box<Self>) -> Result<(), BackendError> {
        self.inner.commit()
    }
}
