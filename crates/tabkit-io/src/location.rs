//! Parsing of caller-supplied resource locations.
//!
//! Accepted forms:
//! - bare paths (`data/adult.csv`, `/tmp/adult.csv`) and `file://` URIs
//! - `dbfs:/FileStore/...`, resolved beneath the configured DBFS root
//! - `memory://key`, served from in-memory storage

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    Dbfs(String),
    Memory(String),
}

impl Location {
    pub fn parse(location: &str) -> Result<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(Error::Config("empty location".into()));
        }

        if let Some(key) = location.strip_prefix("memory://") {
            return Ok(Location::Memory(key.to_string()));
        }

        // DBFS paths are taken verbatim, not as URL components.
        if let Some(path) = location.strip_prefix("dbfs:") {
            return Ok(Location::Dbfs(path.to_string()));
        }

        match Url::parse(location) {
            // Single-letter schemes are Windows drive letters, not URIs.
            Ok(url) if url.scheme().len() == 1 => Ok(Location::Local(PathBuf::from(location))),
            Ok(url) => match url.scheme() {
                "file" => url
                    .to_file_path()
                    .map(Location::Local)
                    .map_err(|_| Error::Config(format!("invalid file URI '{location}'"))),
                other => Err(Error::UnsupportedScheme(other.to_string())),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(Location::Local(PathBuf::from(location)))
            }
            Err(e) => Err(Error::Config(format!("invalid location '{location}': {e}"))),
        }
    }

    /// Local path this location maps to; `None` for in-memory keys.
    pub fn local_path(&self, dbfs_root: &Path) -> Option<PathBuf> {
        match self {
            Location::Local(p) => Some(p.clone()),
            Location::Dbfs(p) => Some(dbfs_root.join(p.trim_start_matches('/'))),
            Location::Memory(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_forms() {
        assert_eq!(
            Location::parse("/tmp/adult.csv").unwrap(),
            Location::Local(PathBuf::from("/tmp/adult.csv"))
        );
        assert_eq!(
            Location::parse("data/adult.csv").unwrap(),
            Location::Local(PathBuf::from("data/adult.csv"))
        );
        assert_eq!(
            Location::parse("file:///tmp/adult.csv").unwrap(),
            Location::Local(PathBuf::from("/tmp/adult.csv"))
        );
        assert_eq!(
            Location::parse("dbfs:/FileStore/tables/adult.csv").unwrap(),
            Location::Dbfs("/FileStore/tables/adult.csv".into())
        );
        assert_eq!(
            Location::parse("memory://adult.csv").unwrap(),
            Location::Memory("adult.csv".into())
        );
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(matches!(
            Location::parse("s3://bucket/adult.csv"),
            Err(Error::UnsupportedScheme(s)) if s == "s3"
        ));
        assert!(matches!(Location::parse("  "), Err(Error::Config(_))));
    }

    #[test]
    fn dbfs_resolves_under_root() {
        let loc = Location::parse("dbfs:/FileStore/tables/adult.csv").unwrap();
        assert_eq!(
            loc.local_path(Path::new("/mnt/dbfs")).unwrap(),
            PathBuf::from("/mnt/dbfs/FileStore/tables/adult.csv")
        );
    }

    #[test]
    fn dbfs_paths_are_not_url_decoded() {
        for name in ["adult data.csv", "adult#1.csv", "adult?v=2.csv", "adult%20x.csv"] {
            let loc = Location::parse(&format!("dbfs:/FileStore/tables/{name}")).unwrap();
            assert_eq!(loc, Location::Dbfs(format!("/FileStore/tables/{name}")));
            assert_eq!(
                loc.local_path(Path::new("/dbfs")).unwrap(),
                Path::new("/dbfs/FileStore/tables").join(name)
            );
        }
    }
}
