#![forbid(unsafe_code)]
//! tabkit-operators: relational operators over materialized tables.
//!
//! - `kernels` holds the partition-parallel filter/count primitives that the
//!   DataFrame, Dataset and SQL paths all share.
//! - Each operator implements `Operator`: `plan` derives the output schema,
//!   `eval` produces a new table.

pub mod kernels;
pub mod traits;

pub mod aggregate;
pub mod filter;
pub mod limit;
pub mod project;
pub mod sort;

pub use aggregate::Aggregate;
pub use filter::Filter;
pub use limit::Limit;
pub use project::Project;
pub use sort::Sort;
pub use traits::{OpError, Operator};
