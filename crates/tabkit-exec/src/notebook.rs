//! Run a parsed notebook against a session.

use std::fmt;

use tabkit_core::GroupCounts;
use tabkit_planner::{ParsedNotebook, Step};
use tracing::info_span;

use crate::dataframe::DataFrame;
use crate::display;
use crate::error::Result;
use crate::session::Session;

/// What one cell produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CellOutput {
    Schema(String),
    Table(String),
    Count(usize),
    Groups(GroupCounts),
}

impl fmt::Display for CellOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellOutput::Schema(s) | CellOutput::Table(s) => f.write_str(s),
            CellOutput::Count(n) => writeln!(f, "{n}"),
            CellOutput::Groups(g) => f.write_str(&display::format_groups(g)),
        }
    }
}

/// Load the notebook's resource, register it under its view name, then run
/// every cell in order. The first failing cell stops the run.
pub fn run_notebook(session: &Session, notebook: &ParsedNotebook) -> Result<Vec<CellOutput>> {
    let df = session.load(&notebook.location, &notebook.options)?;
    session.create_or_replace_temp_view(&notebook.view, &df);

    notebook
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let _span = info_span!("cell", index = i).entered();
            run_step(session, &df, step)
        })
        .collect()
}

fn filtered(df: &DataFrame, predicate: &Option<tabkit_core::expr::Expr>) -> Result<DataFrame> {
    match predicate {
        Some(p) => df.filter(p.clone()),
        None => Ok(df.clone()),
    }
}

fn run_step(session: &Session, df: &DataFrame, step: &Step) -> Result<CellOutput> {
    let preview = session.config().preview_rows;
    Ok(match step {
        Step::PrintSchema => CellOutput::Schema(df.schema_string()),
        Step::Show { rows } => CellOutput::Table(df.show_string(rows.unwrap_or(preview))),
        Step::Sql { plan, rows, .. } => {
            CellOutput::Table(session.execute(plan)?.show_string(rows.unwrap_or(preview)))
        }
        Step::Count { predicate } => CellOutput::Count(filtered(df, predicate)?.count()),
        Step::GroupCount { column, predicate } => {
            CellOutput::Groups(filtered(df, predicate)?.group_by_count(column)?)
        }
    })
}
