//! Keep the first `n` rows.

use tabkit_core::schema::Schema;
use tabkit_core::table::Table;

use crate::traits::{OpError, Operator};

pub struct Limit {
    pub n: usize,
}

impl Operator for Limit {
    fn name(&self) -> &'static str {
        "limit"
    }

    fn plan(&self, input: &Schema) -> Result<Schema, OpError> {
        Ok(input.clone())
    }

    fn eval(&self, input: &Table) -> Result<Table, OpError> {
        Ok(input.head(self.n))
    }
}
