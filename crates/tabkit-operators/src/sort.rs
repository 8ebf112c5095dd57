//! In-memory stable sort by one or more columns.
//!
//! Keys compare with the total `Scalar` order (nulls first ascending, last
//! descending). Rows with equal keys keep their input order.

use std::cmp::Ordering;

use tabkit_core::dag::SortKey;
use tabkit_core::schema::Schema;
use tabkit_core::table::Table;

use crate::traits::{OpError, Operator};

#[derive(Default)]
pub struct Sort {
    pub keys: Vec<SortKey>,
}

impl Sort {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }

    fn resolve(&self, schema: &Schema) -> Result<Vec<(usize, bool)>, OpError> {
        if self.keys.is_empty() {
            return Err(OpError::Plan("sort expects at least one key".into()));
        }
        self.keys
            .iter()
            .map(|k| {
                schema
                    .index_of(&k.column)
                    .map(|i| (i, k.descending))
                    .ok_or_else(|| OpError::from(tabkit_core::Error::UnknownColumn(k.column.clone())))
            })
            .collect()
    }
}

impl Operator for Sort {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn plan(&self, input: &Schema) -> Result<Schema, OpError> {
        self.resolve(input)?;
        Ok(input.clone())
    }

    fn eval(&self, input: &Table) -> Result<Table, OpError> {
        let keys = self.resolve(input.schema())?;
        let mut rows = input.rows().to_vec();
        rows.sort_by(|a, b| {
            keys.iter()
                .map(|&(i, desc)| {
                    let ord = a[i].cmp(&b[i]);
                    if desc {
                        ord.reverse()
                    } else {
                        ord
                    }
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        Ok(input.with_rows(rows))
    }
}
