//! `DataFrame`: the programmatic front-end over an immutable table.
//!
//! Every transformation returns a new `DataFrame`; the underlying table is
//! shared behind an `Arc` and never modified. Filtering and group counting go
//! through the partition-parallel kernels in `tabkit-operators`.

use std::sync::Arc;

use tabkit_core::config::SessionConfig;
use tabkit_core::dag::{AggExpr, Aggregation, SortKey};
use tabkit_core::expr::Expr;
use tabkit_core::schema::Schema;
use tabkit_core::table::Table;
use tabkit_core::types::{Row, RowView};
use tabkit_core::GroupCounts;
use tabkit_operators::{kernels, Aggregate, Filter, Operator, Project, Sort};

use crate::dataset::{Dataset, Record};
use crate::display;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct DataFrame {
    table: Arc<Table>,
    config: Arc<SessionConfig>,
}

impl DataFrame {
    /// Wrap a table with the default session configuration.
    pub fn new(table: Table) -> Self {
        Self::from_parts(Arc::new(table), Arc::new(SessionConfig::default()))
    }

    pub(crate) fn from_parts(table: Arc<Table>, config: Arc<SessionConfig>) -> Self {
        Self { table, config }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    fn derive(&self, table: Table) -> Self {
        Self::from_parts(Arc::new(table), Arc::clone(&self.config))
    }

    fn apply(&self, op: &dyn Operator) -> Result<Self> {
        op.plan(self.table.schema())?;
        Ok(self.derive(op.eval(&self.table)?))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub(crate) fn shared_table(&self) -> Arc<Table> {
        Arc::clone(&self.table)
    }

    pub fn schema(&self) -> &Schema {
        self.table.schema()
    }

    pub fn columns(&self) -> Vec<String> {
        self.schema().fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn count(&self) -> usize {
        kernels::count(&self.table)
    }

    pub fn collect(&self) -> Vec<Row> {
        self.table.rows().to_vec()
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Vec<Row> {
        self.table.rows().iter().take(n).cloned().collect()
    }

    pub fn take(&self, n: usize) -> Vec<Row> {
        self.head(n)
    }

    /// Keep rows matching `predicate`. Fails if it names an unknown column.
    pub fn filter(&self, predicate: Expr) -> Result<Self> {
        self.apply(&Filter::new(predicate, self.config.partition_rows))
    }

    /// Keep rows for which `pred` returns true, preserving order.
    pub fn filter_rows<F>(&self, pred: F) -> Self
    where
        F: Fn(RowView<'_>) -> bool + Sync,
    {
        self.derive(kernels::filter(&self.table, self.config.partition_rows, pred))
    }

    /// Row count per distinct value of `column`.
    pub fn group_by_count(&self, column: &str) -> Result<GroupCounts> {
        Ok(kernels::group_by_column_count(
            &self.table,
            self.config.partition_rows,
            column,
        )?)
    }

    /// Row count per `key(row)`.
    pub fn group_by_count_with<K, F>(&self, key: F) -> GroupCounts<K>
    where
        K: Ord + Send,
        F: Fn(RowView<'_>) -> K + Sync,
    {
        kernels::group_by_count(&self.table, self.config.partition_rows, key)
    }

    pub fn group_by<S: AsRef<str>>(&self, columns: &[S]) -> GroupedData {
        GroupedData {
            df: self.clone(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    /// Global aggregate (no grouping); always one row.
    pub fn agg(&self, aggs: Vec<AggExpr>) -> Result<Self> {
        self.group_by::<&str>(&[]).agg(aggs)
    }

    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Self> {
        self.apply(&Project::columns(columns))
    }

    pub fn order_by(&self, keys: Vec<SortKey>) -> Result<Self> {
        self.apply(&Sort::new(keys))
    }

    pub fn limit(&self, n: usize) -> Self {
        self.derive(self.table.head(n))
    }

    /// Map every row onto `T`, checking the table schema against
    /// `T::schema()` first.
    pub fn as_records<T: Record>(&self) -> Result<Dataset<T>> {
        Dataset::from_table(&self.table, Arc::clone(&self.config))
    }

    /// Grid of the first `n` rows.
    pub fn show_string(&self, n: usize) -> String {
        display::show_table(&self.table, n)
    }

    /// Print the first `n` rows to stdout.
    pub fn show(&self, n: usize) {
        print!("{}", self.show_string(n));
    }

    /// Print the default preview (`SessionConfig::preview_rows`).
    pub fn show_default(&self) {
        self.show(self.config.preview_rows);
    }

    pub fn schema_string(&self) -> String {
        display::schema_tree(self.schema())
    }

    pub fn print_schema(&self) {
        print!("{}", self.schema_string());
    }

    pub fn to_json_lines(&self) -> String {
        display::json_lines(&self.table)
    }
}

impl From<Table> for DataFrame {
    fn from(table: Table) -> Self {
        DataFrame::new(table)
    }
}

/// Result of `DataFrame::group_by`; finish with `count` or `agg`.
#[derive(Debug, Clone)]
pub struct GroupedData {
    df: DataFrame,
    columns: Vec<String>,
}

impl GroupedData {
    /// Group columns plus a `count` column.
    pub fn count(&self) -> Result<DataFrame> {
        self.agg(vec![AggExpr::new(Aggregation::Count)])
    }

    pub fn agg(&self, aggs: Vec<AggExpr>) -> Result<DataFrame> {
        let op = Aggregate::new(
            self.columns.clone(),
            aggs,
            self.df.config.partition_rows,
        );
        self.df.apply(&op)
    }
}
