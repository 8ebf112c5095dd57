#![forbid(unsafe_code)]
//! tabkit-core: data model shared by every tabkit crate.
//!
//! Scalars, rows, schemas and tables; the predicate expression AST; logical
//! plans; load/session configuration. No I/O and no threading here.

pub mod config;
pub mod dag;
pub mod error;
pub mod expr;
pub mod prelude;
pub mod schema;
pub mod table;
pub mod types;

pub use error::{Error, Result};

/// Grouped row counts keyed by the group value.
pub type GroupCounts<K = types::Scalar> = std::collections::BTreeMap<K, u64>;
