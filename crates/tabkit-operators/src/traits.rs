//! Operator trait + common interfaces.
//!
//! The exec runtime calls `plan(...)` to validate the input schema and learn
//! the output schema, then `eval(...)` on the materialized input table.

use tabkit_core::schema::Schema;
use tabkit_core::table::Table;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("planning error: {0}")]
    Plan(String),

    #[error("execution error: {0}")]
    Exec(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error(transparent)]
    Core(#[from] tabkit_core::Error),
}

/// Trait that all operators implement.
///
/// Invariants:
/// - `eval` never mutates its input; it returns a new table.
/// - `eval` is deterministic given the same input.
/// - `plan(input.schema())` equals `eval(input)?.schema()`.
pub trait Operator: Send + Sync {
    /// Human-readable operator name (stable).
    fn name(&self) -> &'static str;

    /// Output schema for the given input schema.
    fn plan(&self, input: &Schema) -> Result<Schema, OpError>;

    fn eval(&self, input: &Table) -> Result<Table, OpError>;
}
