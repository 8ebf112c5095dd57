use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use super::Storage;
use crate::error::{Error, Result};

/// Local filesystem storage (rooted at the host filesystem).
#[derive(Debug, Clone, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for FsStorage {
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let p = Path::new(path);
        if p.is_dir() {
            return Err(Error::Config(format!("{path} is a directory, not a file")));
        }
        match File::open(p) {
            Ok(f) => Ok(Box::new(BufReader::new(f))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::ResourceNotFound {
                location: path.to_string(),
            }),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn exists(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn open_reads_contents() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "a,b\n1,2\n").unwrap();
        let path = f.path().to_str().unwrap();

        let storage = FsStorage::new();
        assert!(storage.exists(path));
        let mut out = String::new();
        storage.open(path).unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "a,b\n1,2\n");
    }

    #[test]
    fn missing_file_is_resource_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        let err = FsStorage::new().open(path.to_str().unwrap()).err().unwrap();
        assert!(matches!(err, Error::ResourceNotFound { .. }));
    }

    #[test]
    fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsStorage::new()
            .open(dir.path().to_str().unwrap())
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
