//! Row-major in-memory table.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::{Row, RowView, Scalar};

/// Ordered rows under one schema.
///
/// Invariant: every row has exactly `schema.len()` fields. Tables are never
/// mutated once built; operators produce new tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    schema: Schema,
    rows: Vec<Row>,
}

/// Deserialized form, checked through `Table::try_new`.
#[derive(Deserialize)]
struct RawTable {
    schema: Schema,
    rows: Vec<Row>,
}

impl TryFrom<RawTable> for Table {
    type Error = Error;

    fn try_from(raw: RawTable) -> Result<Self> {
        Table::try_new(raw.schema, raw.rows)
    }
}

impl Table {
    pub fn try_new(schema: Schema, rows: Vec<Row>) -> Result<Self> {
        let width = schema.len();
        if let Some((i, bad)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(Error::Schema(format!(
                "row {i} has {} fields, schema has {width}",
                bad.len()
            )));
        }
        Ok(Self { schema, rows })
    }

    /// Build from rows already known to match the schema width (operator output).
    fn from_trusted(schema: Schema, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == schema.len()));
        Self { schema, rows }
    }

    pub fn empty(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, idx: usize) -> Option<RowView<'_>> {
        self.rows.get(idx).map(|r| RowView::new(&self.schema, r))
    }

    pub fn views(&self) -> impl Iterator<Item = RowView<'_>> + '_ {
        self.rows.iter().map(move |r| RowView::new(&self.schema, r))
    }

    /// Index of a named column, or `UnknownColumn`.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.schema
            .index_of(name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&Scalar>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Same schema, a different row set. Rows must come from a table of the
    /// same width (filter, sort and limit output).
    pub fn with_rows(&self, rows: Vec<Row>) -> Self {
        Self::from_trusted(self.schema.clone(), rows)
    }

    /// First `n` rows as a new table.
    pub fn head(&self, n: usize) -> Self {
        self.with_rows(self.rows.iter().take(n).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_rows() {
        let schema = Schema::utf8(&["a", "b"]);
        let rows = vec![
            Row::new(vec!["1".into(), "2".into()]),
            Row::new(vec!["3".into()]),
        ];
        let err = Table::try_new(schema, rows).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn deserialize_checks_row_width() {
        let schema = Schema::utf8(&["a", "b"]);
        let rows = vec![Row::new(vec!["1".into(), "2".into()])];
        let table = Table::try_new(schema, rows).unwrap();

        let json = serde_json::to_value(&table).unwrap();
        let back: Table = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, table);

        let mut ragged = json;
        ragged["rows"][0] = serde_json::to_value(Row::new(vec!["1".into()])).unwrap();
        assert!(serde_json::from_value::<Table>(ragged).is_err());
    }

    #[test]
    fn head_keeps_schema() {
        let schema = Schema::utf8(&["a"]);
        let rows = (0..5).map(|i| Row::new(vec![Scalar::Int(i)])).collect();
        let table = Table::try_new(schema.clone(), rows).unwrap();
        let head = table.head(2);
        assert_eq!(head.num_rows(), 2);
        assert_eq!(head.schema(), &schema);
        assert_eq!(head.rows()[1][0], Scalar::Int(1));
    }
}
