#![forbid(unsafe_code)]
//! tabkit: load a CSV resource into an in-memory table, register it as a
//! view, and query it with SQL, the `DataFrame` API, or typed `Dataset`s.
//!
//! ```no_run
//! use tabkit::prelude::*;
//!
//! # fn main() -> Result<(), tabkit::ExecError> {
//! let session = Session::default();
//! let df = session
//!     .read()
//!     .option("header", "true")
//!     .load("dbfs:/FileStore/tables/adult.csv")?;
//! session.create_or_replace_temp_view("adult_csv", &df);
//!
//! let rich = df.filter(col("income").eq(lit(">50K")))?;
//! println!("{}", rich.count());
//! print!("{}", session.sql("select * from `adult_csv`")?.show_string(20));
//! # Ok(())
//! # }
//! ```

pub use tabkit_core;
pub use tabkit_exec;
pub use tabkit_io;
pub use tabkit_operators;
pub use tabkit_planner;

pub use tabkit_exec::{
    format_groups, run_notebook, CellOutput, DataFrame, Dataset, ExecError, GroupedData, Record,
    Session,
};

/// Everything needed to load, filter and query, without the per-crate
/// `Error`/`Result` aliases.
pub mod prelude {
    pub use tabkit_core::config::{LoadOptions, SessionConfig};
    pub use tabkit_core::dag::{AggExpr, Aggregation, SortKey};
    pub use tabkit_core::expr::{col, lit, Expr};
    pub use tabkit_core::schema::{DataType, Field, Schema};
    pub use tabkit_core::types::{Row, RowView, Scalar};
    pub use tabkit_core::GroupCounts;
    pub use tabkit_exec::{DataFrame, Dataset, ExecError, Record, Session};
}
