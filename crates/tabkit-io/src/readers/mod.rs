//! Readers that turn a byte source into a `Table`.

pub mod csv;

pub use self::csv::CsvLoader;
