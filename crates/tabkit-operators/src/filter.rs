//! Filter operator over a bound predicate expression.

use tabkit_core::expr::Expr;
use tabkit_core::schema::Schema;
use tabkit_core::table::Table;

use crate::kernels;
use crate::traits::{OpError, Operator};

pub struct Filter {
    pub predicate: Expr,
    pub partition_rows: usize,
}

impl Filter {
    pub fn new(predicate: Expr, partition_rows: usize) -> Self {
        Self {
            predicate,
            partition_rows,
        }
    }
}

impl Operator for Filter {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn plan(&self, input: &Schema) -> Result<Schema, OpError> {
        self.predicate.bind(input)?;
        Ok(input.clone())
    }

    fn eval(&self, input: &Table) -> Result<Table, OpError> {
        let bound = self.predicate.bind(input.schema())?;
        Ok(kernels::filter(input, self.partition_rows, |row| {
            bound.matches(row.row())
        }))
    }
}
