//! Column selection/reordering with optional renames.

use std::collections::HashSet;

use tabkit_core::dag::ProjectItem;
use tabkit_core::schema::{Field, Schema};
use tabkit_core::table::Table;
use tabkit_core::types::Row;

use crate::traits::{OpError, Operator};

#[derive(Default)]
pub struct Project {
    pub items: Vec<ProjectItem>,
}

impl Project {
    pub fn new(items: Vec<ProjectItem>) -> Self {
        Self { items }
    }

    pub fn columns<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(names.iter().map(|n| ProjectItem::new(n.as_ref())).collect())
    }

    fn resolve(&self, input: &Schema) -> Result<(Vec<usize>, Schema), OpError> {
        let mut seen = HashSet::new();
        let mut indices = Vec::with_capacity(self.items.len());
        let mut fields = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let idx = input
                .index_of(&item.column)
                .ok_or_else(|| tabkit_core::Error::UnknownColumn(item.column.clone()))?;
            let name = item.output_name();
            if !seen.insert(name.to_string()) {
                return Err(OpError::Plan(format!("duplicate output column '{name}'")));
            }
            let src = &input.fields[idx];
            fields.push(Field::new(name, src.data_type, src.nullable));
            indices.push(idx);
        }
        Ok((indices, Schema::new(fields)))
    }
}

impl Operator for Project {
    fn name(&self) -> &'static str {
        "project"
    }

    fn plan(&self, input: &Schema) -> Result<Schema, OpError> {
        Ok(self.resolve(input)?.1)
    }

    fn eval(&self, input: &Table) -> Result<Table, OpError> {
        let (indices, schema) = self.resolve(input.schema())?;
        let rows = input
            .rows()
            .iter()
            .map(|r| Row::new(indices.iter().map(|&i| r[i].clone()).collect()))
            .collect();
        Ok(Table::try_new(schema, rows)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabkit_core::types::Scalar;

    fn table() -> Table {
        let rows = vec![Row::new(vec!["39".into(), "Bachelors".into(), ">50K".into()])];
        Table::try_new(Schema::utf8(&["age", "education", "income"]), rows).unwrap()
    }

    #[test]
    fn reorders_and_renames() {
        let op = Project::new(vec![
            ProjectItem::new("income"),
            ProjectItem {
                column: "age".into(),
                alias: Some("years".into()),
            },
        ]);
        let out = op.eval(&table()).unwrap();
        assert_eq!(out.schema().names(), vec!["income", "years"]);
        assert_eq!(out.rows()[0][1], Scalar::from("39"));
    }

    #[test]
    fn duplicate_output_rejected() {
        let op = Project::columns(&["age", "age"]);
        assert!(matches!(op.plan(table().schema()), Err(OpError::Plan(_))));
    }
}
