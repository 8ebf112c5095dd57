//! Typed-record front-end.
//!
//! A `Record` declares its schema; `Dataset::from_table` matches each
//! declared field to a table column by name, checks the types, and
//! deserializes every row through `serde_json`. Only Int64 → Float64
//! widening is accepted, and nulls only land in nullable fields.

use std::any::type_name;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use tabkit_core::config::SessionConfig;
use tabkit_core::schema::{DataType, Field, Schema};
use tabkit_core::table::Table;
use tabkit_core::types::{Row, Scalar};
use tabkit_core::GroupCounts;
use tabkit_operators::kernels;
use tracing::debug;

use crate::dataframe::DataFrame;
use crate::error::{ExecError, Result};

/// A row type with a declared schema.
///
/// ```ignore
/// #[derive(Deserialize, Serialize)]
/// struct Adult { age: i64, education: String, income: String }
///
/// impl Record for Adult {
///     fn schema() -> Schema {
///         Schema::new(vec![
///             Field::new("age", DataType::Int64, false),
///             Field::new("education", DataType::Utf8, false),
///             Field::new("income", DataType::Utf8, false),
///         ])
///     }
/// }
/// ```
pub trait Record: DeserializeOwned + Send + Sync {
    fn schema() -> Schema;
}

#[derive(Debug, Clone)]
pub struct Dataset<T> {
    records: Vec<T>,
    config: Arc<SessionConfig>,
}

/// Resolved column for one declared field.
struct Binding<'a> {
    field: &'a Field,
    column: usize,
}

fn bind<'a>(table: &Schema, declared: &'a Schema) -> Result<Vec<Binding<'a>>> {
    declared
        .fields
        .iter()
        .map(|field| {
            let column = table
                .index_of(&field.name)
                .ok_or_else(|| ExecError::mismatch(&field.name, "no such column"))?;
            let actual = table.fields[column].data_type;
            let compatible = actual == field.data_type
                || (actual == DataType::Int64 && field.data_type == DataType::Float64);
            if !compatible {
                return Err(ExecError::mismatch(
                    &field.name,
                    format!(
                        "column has type {actual}, record expects {}",
                        field.data_type
                    ),
                ));
            }
            Ok(Binding { field, column })
        })
        .collect()
}

fn to_json(value: &Scalar, field: &Field) -> Result<Value> {
    Ok(match (value, field.data_type) {
        (Scalar::Null, _) if field.nullable => Value::Null,
        (Scalar::Null, _) => {
            return Err(ExecError::mismatch(
                &field.name,
                "null value in a non-nullable field",
            ))
        }
        (Scalar::Int(i), DataType::Float64) => Value::from(*i as f64),
        (v, _) => v.to_json(),
    })
}

fn map_row<T: Record>(row: &Row, bindings: &[Binding<'_>]) -> Result<T> {
    let mut obj = Map::with_capacity(bindings.len());
    for b in bindings {
        obj.insert(b.field.name.clone(), to_json(&row[b.column], b.field)?);
    }
    serde_json::from_value(Value::Object(obj))
        .map_err(|e| ExecError::mismatch(type_name::<T>(), e.to_string()))
}

fn from_json(value: &Value, field: &Field) -> Result<Scalar> {
    let bad = || {
        ExecError::mismatch(
            &field.name,
            format!("cannot store {value} as {}", field.data_type),
        )
    };
    Ok(match (value, field.data_type) {
        (Value::Null, _) => Scalar::Null,
        (Value::Bool(b), DataType::Boolean) => Scalar::Bool(*b),
        (Value::Number(n), DataType::Int64) => Scalar::Int(n.as_i64().ok_or_else(bad)?),
        (Value::Number(n), DataType::Float64) => Scalar::Float(n.as_f64().ok_or_else(bad)?),
        (Value::String(s), DataType::Utf8) => Scalar::Str(s.clone()),
        _ => return Err(bad()),
    })
}

impl<T: Record> Dataset<T> {
    pub(crate) fn from_table(table: &Table, config: Arc<SessionConfig>) -> Result<Self> {
        let declared = T::schema();
        let bindings = bind(table.schema(), &declared)?;
        let parts = kernels::try_map_partitions(table.rows(), config.partition_rows, |rows| {
            rows.iter()
                .map(|r| map_row::<T>(r, &bindings))
                .collect::<Result<Vec<T>>>()
        })?;
        let records: Vec<T> = parts.into_iter().flatten().collect();
        debug!(record = type_name::<T>(), rows = records.len(), "mapped records");
        Ok(Self { records, config })
    }

    /// Build a dataset directly from values.
    pub fn from_records(records: Vec<T>) -> Self {
        Self {
            records,
            config: Arc::new(SessionConfig::default()),
        }
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    /// First `n` records.
    pub fn take(&self, n: usize) -> &[T] {
        &self.records[..n.min(self.records.len())]
    }

    pub fn group_by_count<K, F>(&self, key: F) -> GroupCounts<K>
    where
        K: Ord + Send,
        F: Fn(&T) -> K + Sync,
    {
        kernels::count_by_key(&self.records, self.config.partition_rows, key)
    }
}

impl<T: Record + Clone> Dataset<T> {
    /// Keep records for which `pred` holds, preserving order.
    pub fn filter<F>(&self, pred: F) -> Self
    where
        F: Fn(&T) -> bool + Sync,
    {
        Self {
            records: kernels::filter_slice(&self.records, self.config.partition_rows, pred),
            config: Arc::clone(&self.config),
        }
    }
}

impl<T: Record + Serialize> Dataset<T> {
    /// Back to a `DataFrame` with `T::schema()` as the schema.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let schema = T::schema();
        let mut rows = Vec::with_capacity(self.records.len());
        for rec in &self.records {
            let value = serde_json::to_value(rec)
                .map_err(|e| ExecError::mismatch(type_name::<T>(), e.to_string()))?;
            let Value::Object(obj) = value else {
                return Err(ExecError::mismatch(
                    type_name::<T>(),
                    "record does not serialize to an object",
                ));
            };
            let row = schema
                .fields
                .iter()
                .map(|f| from_json(obj.get(&f.name).unwrap_or(&Value::Null), f))
                .collect::<Result<Vec<_>>>()?;
            rows.push(Row::new(row));
        }
        let table = Table::try_new(schema, rows)?;
        Ok(DataFrame::from_parts(Arc::new(table), Arc::clone(&self.config)))
    }
}

impl<'a, T> IntoIterator for &'a Dataset<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
