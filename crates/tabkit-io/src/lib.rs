#![forbid(unsafe_code)]
//! tabkit-io: location resolution, storage adapters, and the CSV loader.

pub mod error;
pub mod infer;
pub mod location;
pub mod memory_storage;
pub mod readers;
pub mod storage;

pub use error::{Error, Result};
pub use location::Location;
pub use memory_storage::MemoryStorage;
pub use readers::CsvLoader;
pub use storage::{FsStorage, Resolver, Storage};

use tabkit_core::config::{FileType, LoadOptions};
use tabkit_core::table::Table;

/// Open `location` and load it under `options`.
///
/// The resource handle lives only for the duration of this call and is
/// closed on every return path.
pub fn load(resolver: &Resolver, location: &str, options: &LoadOptions) -> Result<Table> {
    match options.file_type {
        FileType::Csv => {
            let reader = resolver.open(location)?;
            CsvLoader::new(options.clone()).load(reader, location)
        }
    }
}
