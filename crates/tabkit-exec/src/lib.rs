#![forbid(unsafe_code)]
//! tabkit-exec: sessions, the view catalog, and the query front-ends.
//!
//! - `Session` loads resources, owns the view catalog and runs SQL.
//! - `DataFrame` is the programmatic front-end, `Dataset<T>` the typed one.
//! - All three bottom out in the same operators and kernels.

pub mod dataframe;
pub mod dataset;
pub mod display;
pub mod error;
pub mod notebook;
pub mod runtime;
pub mod session;

pub use dataframe::{DataFrame, GroupedData};
pub use dataset::{Dataset, Record};
pub use display::format_groups;
pub use error::{ExecError, Result};
pub use notebook::{run_notebook, CellOutput};
pub use session::{DataFrameReader, Session};
