//! Configuration for bucketkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{KvError, Result};

/// Main configuration for a bucketkv store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Backend Configuration
    // -------------------------------------------------------------------------
    /// Which object store to connect to
    pub backend: BackendKind,

    // -------------------------------------------------------------------------
    // Namespace Configuration
    // -------------------------------------------------------------------------
    /// Prepended to every key to form the object name.
    /// Conventionally ends with a separator, e.g. "bucketkv/"
    pub basepath: String,

    // -------------------------------------------------------------------------
    // Listing Configuration
    // -------------------------------------------------------------------------
    /// Max objects requested per listing page
    pub list_page_size: usize,
}

/// Backend selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// Fresh in-memory bucket (contents lost on drop)
    Memory,

    /// Directory on the local filesystem, one file per object
    Local {
        root: PathBuf,
        /// Create the directory if it does not exist
        create: bool,
    },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            basepath: "bucketkv/".to_string(),
            list_page_size: 1000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check values that would make the store unusable
    pub fn validate(&self) -> Result<()> {
        if self.list_page_size == 0 {
            return Err(KvError::Config(
                "list_page_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Use an in-memory bucket
    pub fn memory(mut self) -> Self {
        self.config.backend = BackendKind::Memory;
        self
    }

    /// Use a local directory bucket that must already exist
    pub fn local_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.backend = BackendKind::Local {
            root: root.into(),
            create: false,
        };
        self
    }

    /// Use a local directory bucket, creating the directory if needed
    pub fn local_root_create(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.backend = BackendKind::Local {
            root: root.into(),
            create: true,
        };
        self
    }

    /// Set the namespace base path
    pub fn basepath(mut self, basepath: impl Into<String>) -> Self {
        self.config.basepath = basepath.into();
        self
    }

    /// Set the listing page size
    pub fn list_page_size(mut self, size: usize) -> Self {
        self.config.list_page_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
