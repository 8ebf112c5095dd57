//! YAML notebooks: one load, one view, a list of cells.
//!
//! Example:
//! ```yaml
//! load:
//!   file_location: "dbfs:/FileStore/tables/adult.csv"
//!   file_type: csv
//!   infer_schema: false
//!   header: true
//!   delimiter: ","
//! view: adult_csv
//! cells:
//!   - op: print_schema
//!   - op: show
//!     rows: 5
//!   - op: sql
//!     query: "select * from `adult_csv`"
//!   - op: count
//!     where: "income = '>50K' AND education = 'Bachelors'"
//!   - op: group_count
//!     column: education
//! ```

use serde::{Deserialize, Serialize};

use tabkit_core::config::LoadOptions;
use tabkit_core::dag::LogicalPlan;
use tabkit_core::expr::Expr;

use crate::error::Result;
use crate::rules::optimize;
use crate::sql::{parse_expr, parse_sql};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notebook {
    pub load: LoadStep,
    pub view: String,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadStep {
    #[serde(alias = "location")]
    pub file_location: String,
    #[serde(flatten)]
    pub options: LoadOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Cell {
    PrintSchema,
    Show {
        #[serde(default)]
        rows: Option<usize>,
    },
    Sql {
        query: String,
        #[serde(default)]
        rows: Option<usize>,
    },
    Count {
        #[serde(default, rename = "where")]
        filter: Option<String>,
    },
    GroupCount {
        column: String,
        #[serde(default, rename = "where")]
        filter: Option<String>,
    },
}

/// A cell with its query text already parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    PrintSchema,
    Show {
        rows: Option<usize>,
    },
    Sql {
        query: String,
        plan: LogicalPlan,
        rows: Option<usize>,
    },
    Count {
        predicate: Option<Expr>,
    },
    GroupCount {
        column: String,
        predicate: Option<Expr>,
    },
}

#[derive(Debug, Clone)]
pub struct ParsedNotebook {
    pub location: String,
    pub options: LoadOptions,
    pub view: String,
    pub steps: Vec<Step>,
}

fn parse_filter(filter: Option<String>) -> Result<Option<Expr>> {
    filter.as_deref().map(parse_expr).transpose()
}

/// Parse a notebook and every query/predicate in it, so a bad cell fails
/// before anything is loaded.
pub fn parse_notebook(yaml_src: &str) -> Result<ParsedNotebook> {
    let doc: Notebook = serde_yaml::from_str(yaml_src)?;

    let steps = doc
        .cells
        .into_iter()
        .map(|cell| {
            Ok(match cell {
                Cell::PrintSchema => Step::PrintSchema,
                Cell::Show { rows } => Step::Show { rows },
                Cell::Sql { query, rows } => Step::Sql {
                    plan: optimize(parse_sql(&query)?),
                    query,
                    rows,
                },
                Cell::Count { filter } => Step::Count {
                    predicate: parse_filter(filter)?,
                },
                Cell::GroupCount { column, filter } => Step::GroupCount {
                    column,
                    predicate: parse_filter(filter)?,
                },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ParsedNotebook {
        location: doc.load.file_location,
        options: doc.load.options,
        view: doc.view,
        steps,
    })
}
