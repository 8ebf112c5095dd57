//! Logical query plans.
//!
//! Plans are linear chains rooted at a `Scan` of a registered view. The
//! planner crate builds them from SQL; the exec runtime lowers each node to an
//! operator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expr::Expr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    /// `COUNT(*)`: every row.
    Count,
    /// `COUNT(col)`: rows where `col` is not null.
    CountColumn(String),
    Sum(String),
    Avg(String),
    Min(String),
    Max(String),
}

impl Aggregation {
    /// Output column name used when no alias is given.
    pub fn default_name(&self) -> String {
        match self {
            Aggregation::Count => "count".to_string(),
            Aggregation::CountColumn(c) => format!("count({c})"),
            Aggregation::Sum(c) => format!("sum({c})"),
            Aggregation::Avg(c) => format!("avg({c})"),
            Aggregation::Min(c) => format!("min({c})"),
            Aggregation::Max(c) => format!("max({c})"),
        }
    }

    /// Input column read by the aggregation, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            Aggregation::Count => None,
            Aggregation::CountColumn(c)
            | Aggregation::Sum(c)
            | Aggregation::Avg(c)
            | Aggregation::Min(c)
            | Aggregation::Max(c) => Some(c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggExpr {
    pub func: Aggregation,
    pub alias: Option<String>,
}

impl AggExpr {
    pub fn new(func: Aggregation) -> Self {
        Self { func, alias: None }
    }

    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    pub fn output_name(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| self.func.default_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectItem {
    pub column: String,
    pub alias: Option<String>,
}

impl ProjectItem {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            alias: None,
        }
    }

    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalPlan {
    Scan {
        view: String,
    },
    Filter {
        input: Box<LogicalPlan>,
        predicate: Expr,
    },
    Project {
        input: Box<LogicalPlan>,
        items: Vec<ProjectItem>,
    },
    Aggregate {
        input: Box<LogicalPlan>,
        group_by: Vec<String>,
        aggs: Vec<AggExpr>,
    },
    Sort {
        input: Box<LogicalPlan>,
        keys: Vec<SortKey>,
    },
    Limit {
        input: Box<LogicalPlan>,
        n: usize,
    },
}

impl LogicalPlan {
    /// Input of a unary node; `None` for `Scan`.
    pub fn input(&self) -> Option<&LogicalPlan> {
        use LogicalPlan::*;
        match self {
            Scan { .. } => None,
            Filter { input, .. }
            | Project { input, .. }
            | Aggregate { input, .. }
            | Sort { input, .. }
            | Limit { input, .. } => Some(input),
        }
    }

    /// View scanned at the root of the chain.
    pub fn source_view(&self) -> &str {
        match self {
            LogicalPlan::Scan { view } => view,
            other => other
                .input()
                .map(LogicalPlan::source_view)
                .unwrap_or_default(),
        }
    }

    fn describe(&self) -> String {
        use LogicalPlan::*;
        match self {
            Scan { view } => format!("Scan: {view}"),
            Filter { predicate, .. } => format!("Filter: {predicate}"),
            Project { items, .. } => {
                let cols: Vec<String> = items
                    .iter()
                    .map(|i| match &i.alias {
                        Some(a) => format!("{} AS {a}", i.column),
                        None => i.column.clone(),
                    })
                    .collect();
                format!("Project: {}", cols.join(", "))
            }
            Aggregate { group_by, aggs, .. } => {
                let aggs: Vec<String> = aggs.iter().map(AggExpr::output_name).collect();
                format!(
                    "Aggregate: group_by=[{}], aggs=[{}]",
                    group_by.join(", "),
                    aggs.join(", ")
                )
            }
            Sort { keys, .. } => {
                let keys: Vec<String> = keys
                    .iter()
                    .map(|k| {
                        format!("{} {}", k.column, if k.descending { "DESC" } else { "ASC" })
                    })
                    .collect();
                format!("Sort: {}", keys.join(", "))
            }
            Limit { n, .. } => format!("Limit: {n}"),
        }
    }
}

impl fmt::Display for LogicalPlan {
    /// Indented tree, root first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut node = Some(self);
        let mut depth = 0;
        while let Some(n) = node {
            writeln!(f, "{:indent$}{}", "", n.describe(), indent = depth * 2)?;
            node = n.input();
            depth += 1;
        }
        Ok(())
    }
}
