//! Key namespace mapping
//!
//! Translates store keys into object names under a fixed base path and
//! builds the listing queries used by scans and whole-namespace operations.
//!
//! ```text
//!   key "folder1/11"  ──►  object "bucketkv/folder1/11"
//!                              └─basepath─┘
//!
//!   scan("folder1/", "11", "20")
//!     ──► [bucketkv/folder1/11, bucketkv/folder1/20)
//! ```

use crate::backend::ListQuery;

/// Base path prepended to every key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    basepath: String,
}

impl Namespace {
    pub fn new(basepath: impl Into<String>) -> Self {
        Self {
            basepath: basepath.into(),
        }
    }

    pub fn basepath(&self) -> &str {
        &self.basepath
    }

    /// Full object name for `key`
    pub fn object_name(&self, key: &str) -> String {
        let mut name = String::with_capacity(self.basepath.len() + key.len());
        name.push_str(&self.basepath);
        name.push_str(key);
        name
    }

    /// Key for an object name, or `None` if the name lies outside the namespace
    ///
    /// Only a leading base path is removed; occurrences later in the name
    /// are part of the key.
    pub fn key_of<'n>(&self, name: &'n str) -> Option<&'n str> {
        name.strip_prefix(self.basepath.as_str())
    }

    /// Names of every object in the namespace
    pub fn all_query(&self) -> ListQuery {
        ListQuery {
            names_only: true,
            ..ListQuery::with_prefix(self.basepath.clone())
        }
    }

    /// Names of objects whose key starts with `prefix`
    pub fn prefix_query(&self, prefix: &str) -> ListQuery {
        ListQuery {
            names_only: true,
            ..ListQuery::with_prefix(self.object_name(prefix))
        }
    }

    /// Names of objects with keys in `[prefix+start, prefix+end)`
    pub fn range_query(&self, prefix: &str, start: &str, end: &str) -> ListQuery {
        let scoped = self.object_name(prefix);
        ListQuery {
            start_offset: Some(format!("{}{}", scoped, start)),
            end_offset: Some(format!("{}{}", scoped, end)),
            prefix: Some(scoped),
            names_only: true,
        }
    }
}

