#![forbid(unsafe_code)]
//! tabkit-planner: query text → optimized `LogicalPlan`.
//!
//! - `sql`: the SQL subset parser (also parses standalone predicates)
//! - `rules`: plan rewrites applied before execution
//! - `dsl::yaml`: notebook files describing a load and a list of cells
//!
//! Nothing here touches data; plans are executed by `tabkit-exec`.

pub mod dsl;
pub mod error;
pub mod rules;
pub mod sql;

pub use dsl::yaml::{parse_notebook, Cell, Notebook, ParsedNotebook, Step};
pub use error::{Error, Result};
pub use rules::optimize;
pub use sql::{parse_expr, parse_sql};

/// Parse and optimize a query.
pub fn plan_sql(query: &str) -> Result<tabkit_core::dag::LogicalPlan> {
    Ok(optimize(parse_sql(query)?))
}
