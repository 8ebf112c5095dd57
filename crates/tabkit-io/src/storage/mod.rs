//! Storage adapters and location resolution.
//!
//! - `fs`: local filesystem (bare paths, `file://`, and `dbfs:/` under a root).
//! - `MemoryStorage`: `memory://` keys.
//!
//! `Resolver` picks the backend for a location string, mirroring how the
//! session's configured DBFS root maps onto the local filesystem.

mod fs;
pub use fs::FsStorage;

use std::io::Read;
use std::path::PathBuf;

use tabkit_core::config::SessionConfig;
use tracing::debug;

use crate::error::{Error, Result};
use crate::location::Location;
use crate::memory_storage::MemoryStorage;

/// Readable byte source addressed by a backend-specific key.
///
/// `open` hands ownership of the handle to the caller; dropping the reader
/// releases it.
pub trait Storage: Send + Sync {
    fn open(&self, key: &str) -> Result<Box<dyn Read + Send>>;

    fn exists(&self, key: &str) -> bool;
}

/// Maps location strings onto storage backends.
#[derive(Debug, Clone)]
pub struct Resolver {
    fs: FsStorage,
    memory: MemoryStorage,
    dbfs_root: PathBuf,
}

impl Resolver {
    pub fn new(cfg: &SessionConfig) -> Self {
        Self {
            fs: FsStorage::new(),
            memory: MemoryStorage::new(),
            dbfs_root: cfg.dbfs_root.clone(),
        }
    }

    /// Share an existing in-memory store instead of a fresh one.
    pub fn with_memory(mut self, memory: MemoryStorage) -> Self {
        self.memory = memory;
        self
    }

    pub fn memory(&self) -> &MemoryStorage {
        &self.memory
    }

    /// Open the resource behind `location`.
    ///
    /// Missing resources always surface as `ResourceNotFound` carrying the
    /// caller's original location string.
    pub fn open(&self, location: &str) -> Result<Box<dyn Read + Send>> {
        let parsed = Location::parse(location)?;
        debug!(location, resolved = ?parsed, "resolving location");

        let opened = match &parsed {
            Location::Memory(key) => self.memory.open(key),
            other => {
                let path = other
                    .local_path(&self.dbfs_root)
                    .ok_or_else(|| Error::Config(format!("no local path for '{location}'")))?;
                let path = path
                    .to_str()
                    .ok_or_else(|| Error::Config(format!("non UTF-8 path for '{location}'")))?
                    .to_string();
                self.fs.open(&path)
            }
        };

        opened.map_err(|e| match e {
            Error::ResourceNotFound { .. } => Error::ResourceNotFound {
                location: location.to_string(),
            },
            other => other,
        })
    }

    pub fn exists(&self, location: &str) -> bool {
        match Location::parse(location) {
            Ok(Location::Memory(key)) => self.memory.exists(&key),
            Ok(other) => other
                .local_path(&self.dbfs_root)
                .and_then(|p| p.to_str().map(|s| self.fs.exists(s)))
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}
