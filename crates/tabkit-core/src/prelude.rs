//! Convenient re-exports for downstream crates.

pub use crate::config::{FileType, LoadOptions, SessionConfig};
pub use crate::dag::{AggExpr, Aggregation, LogicalPlan, ProjectItem, SortKey};
pub use crate::error::{Error, Result};
pub use crate::expr::{col, col_at, lit, BoundExpr, ColumnRef, CompareOp, Expr};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::table::Table;
pub use crate::types::{Row, RowView, Scalar};
