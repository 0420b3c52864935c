//! Backend Module
//!
//! The object-storage capability interface the store is built on.
//!
//! ## Capabilities
//! - Open an object for sequential read (with its declared size)
//! - Open a write stream; `commit` makes the object visible atomically
//! - Delete an object
//! - List object names by prefix and half-open range, one page at a time
//!
//! ## Ordering
//! ```text
//! list_objects(query, token) ──► [name_0 < name_1 < ... < name_n] + next_token
//!                                      byte-lexicographic, ascending
//! ```
//!
//! Implementations: [`MemoryBucket`] (in-process map) and [`LocalBucket`]
//! (one file per object in a directory).

mod listing;
pub mod local;
mod memory;

use std::io::{Read, Write};

use thiserror::Error;

pub use listing::Listing;
pub use local::LocalBucket;
pub use memory::MemoryBucket;

/// Errors reported by a backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("backend IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt object: {0}")]
    Corrupt(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Name and size of one listed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub name: String,
    /// Content size in bytes; 0 when the query asked for names only
    pub size: u64,
}

/// A listing request
///
/// All bounds compare object names byte-lexicographically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Only names starting with this prefix
    pub prefix: Option<String>,

    /// Inclusive lower bound
    pub start_offset: Option<String>,

    /// Exclusive upper bound
    pub end_offset: Option<String>,

    /// Skip per-object metadata
    pub names_only: bool,
}

impl ListQuery {
    /// Query for every object whose name starts with `prefix`
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// Whether `name` satisfies every bound of this query
    pub fn matches(&self, name: &str) -> bool {
        if let Some(prefix) = &self.prefix {
            if !name.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(start) = &self.start_offset {
            if name < start.as_str() {
                return false;
            }
        }
        if let Some(end) = &self.end_offset {
            if name >= end.as_str() {
                return false;
            }
        }
        true
    }

    /// Smallest name this query can match
    pub(crate) fn lower_bound(&self) -> &str {
        let prefix = self.prefix.as_deref().unwrap_or("");
        match self.start_offset.as_deref() {
            Some(start) if start > prefix => start,
            _ => prefix,
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Objects in ascending name order
    pub objects: Vec<ObjectInfo>,

    /// Token for the following page, `None` once the listing is exhausted
    pub next_page_token: Option<String>,
}

/// Sequential reader over one object's content
pub trait ObjectReader: Read + Send {
    /// Size the backend reports for the object
    fn declared_size(&self) -> u64;
}

/// Sequential writer for one object
///
/// Nothing is visible until `commit`. Dropping an uncommitted writer
/// discards the data.
pub trait ObjectWriter: Write + Send {
    fn commit(self: Box<Self>) -> Result<(), BackendError>;
}

/// Object-storage capability interface
pub trait ObjectBackend: Send + Sync {
    /// Open `name` for reading; `NotFound` if it does not exist
    fn open_reader(&self, name: &str) -> Result<Box<dyn ObjectReader>, BackendError>;

    /// Open a write stream that replaces `name` on commit
    fn open_writer(&self, name: &str) -> Result<Box<dyn ObjectWriter>, BackendError>;

    /// Delete `name`; `NotFound` if it does not exist
    fn delete_object(&self, name: &str) -> Result<(), BackendError>;

    /// Fetch one page of objects matching `query`
    ///
    /// `page_token` is `None` for the first page and afterwards the
    /// `next_page_token` of the previous page.
    fn list_objects(
        &self,
        query: &ListQuery,
        page_token: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage, BackendError>;
}

/// Build a page from an ordered iterator of candidate objects
///
/// Shared by the bundled backends: candidates must already be in ascending
/// order and at or after the query's lower bound. The page token is the last
/// name returned; the next page resumes strictly after it.
pub(crate) fn collect_page<'a, I>(query: &ListQuery, candidates: I, page_size: usize) -> ListPage
where
    I: Iterator<Item = (&'a str, u64)>,
{
    let page_size = page_size.max(1);
    let mut objects = Vec::new();
    let mut more = false;

    for (name, size) in candidates {
        if let Some(end) = &query.end_offset {
            if name >= end.as_str() {
                break;
            }
        }
        if let Some(prefix) = &query.prefix {
            // Names sharing a prefix are contiguous, so the first miss past
            // the lower bound ends the listing.
            if !name.starts_with(prefix.as_str()) {
                break;
            }
        }
        if objects.len() == page_size {
            more = true;
            break;
        }
        objects.push(ObjectInfo {
            name: name.to_string(),
            size: if query.names_only { 0 } else { size },
        });
    }

    let next_page_token = if more {
        objects.last().map(|o| o.name.clone())
    } else {
        None
    };

    ListPage {
        objects,
        next_page_token,
    }
}
