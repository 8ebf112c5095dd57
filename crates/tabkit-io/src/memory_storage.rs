//! In-memory storage backend.
//!
//! Serves `memory://` locations so tests and demos can load tables without
//! touching the filesystem.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::storage::Storage;

/// Thread-safe in-memory storage using a HashMap. Clones share contents.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    data: Arc<Mutex<HashMap<String, Arc<[u8]>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> MutexGuard<'_, HashMap<String, Arc<[u8]>>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store (or replace) the contents under `key`.
    pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let bytes: Vec<u8> = bytes.into();
        self.data().insert(key.into(), Arc::from(bytes));
    }

    pub fn remove(&self, key: &str) -> bool {
        self.data().remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    /// Keys starting with `prefix`, sorted.
    pub fn list(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .data()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("objects", &self.len())
            .finish()
    }
}

impl Storage for MemoryStorage {
    fn open(&self, key: &str) -> Result<Box<dyn Read + Send>> {
        let bytes = self
            .data()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::ResourceNotFound {
                location: format!("memory://{key}"),
            })?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn exists(&self, key: &str) -> bool {
        self.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_open_remove() {
        let storage = MemoryStorage::new();
        storage.insert("t/adult.csv", "a,b\n");
        assert!(storage.exists("t/adult.csv"));

        let mut out = String::new();
        storage
            .open("t/adult.csv")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "a,b\n");

        assert!(storage.remove("t/adult.csv"));
        assert!(matches!(
            storage.open("t/adult.csv").err().unwrap(),
            Error::ResourceNotFound { .. }
        ));
    }

    #[test]
    fn clones_share_contents() {
        let a = MemoryStorage::new();
        let b = a.clone();
        a.insert("x", "1");
        a.insert("y", "2");
        assert_eq!(b.list(""), vec!["x".to_string(), "y".to_string()]);
    }
}
