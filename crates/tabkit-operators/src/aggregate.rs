//! Grouped aggregation: COUNT/SUM/AVG/MIN/MAX.
//!
//! Each partition folds its rows into per-group accumulators; partials are
//! then merged. Every accumulator merge is commutative and associative, so
//! the result does not depend on how rows were partitioned. Groups come out
//! in ascending key order.
//!
//! Output types:
//! - `COUNT` -> Int64, never null
//! - `SUM` -> Int64 over an Int64 column, Float64 otherwise
//! - `AVG` -> Float64
//! - `MIN`/`MAX` -> the input column's type
//!
//! Null inputs are skipped by everything except `COUNT(*)`. Strings in
//! untyped columns are parsed as numbers for SUM/AVG.

use std::collections::{BTreeMap, HashSet};

use tabkit_core::dag::{AggExpr, Aggregation};
use tabkit_core::schema::{DataType, Field, Schema};
use tabkit_core::table::Table;
use tabkit_core::types::{Row, Scalar};
use tracing::debug;

use crate::kernels;
use crate::traits::{OpError, Operator};

pub struct Aggregate {
    pub group_by: Vec<String>,
    pub aggs: Vec<AggExpr>,
    pub partition_rows: usize,
}

impl Aggregate {
    pub fn new(group_by: Vec<String>, aggs: Vec<AggExpr>, partition_rows: usize) -> Self {
        Self {
            group_by,
            aggs,
            partition_rows,
        }
    }

    fn bind(&self, input: &Schema) -> Result<Bound, OpError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.group_by.len() + self.aggs.len());

        let mut keys = Vec::with_capacity(self.group_by.len());
        for name in &self.group_by {
            let idx = input
                .index_of(name)
                .ok_or_else(|| tabkit_core::Error::UnknownColumn(name.clone()))?;
            if !seen.insert(name.clone()) {
                return Err(OpError::Plan(format!("duplicate grouping column '{name}'")));
            }
            fields.push(input.fields[idx].clone());
            keys.push(idx);
        }

        let mut slots = Vec::with_capacity(self.aggs.len());
        for agg in &self.aggs {
            let out = agg.output_name();
            if !seen.insert(out.clone()) {
                return Err(OpError::Plan(format!("duplicate output column '{out}'")));
            }
            let input_idx = agg
                .func
                .column()
                .map(|c| {
                    input
                        .index_of(c)
                        .ok_or_else(|| tabkit_core::Error::UnknownColumn(c.to_string()))
                })
                .transpose()?;
            let input_type = input_idx.map(|i| input.fields[i].data_type);

            let (kind, data_type, nullable) = match (&agg.func, input_type) {
                (Aggregation::Count, _) | (Aggregation::CountColumn(_), _) => {
                    (Kind::Count, DataType::Int64, false)
                }
                (Aggregation::Sum(c), Some(DataType::Boolean))
                | (Aggregation::Avg(c), Some(DataType::Boolean)) => {
                    return Err(OpError::Schema(format!(
                        "{} needs a numeric column, '{c}' is boolean",
                        agg.func.default_name()
                    )));
                }
                (Aggregation::Sum(_), Some(DataType::Int64)) => {
                    (Kind::SumInt, DataType::Int64, true)
                }
                (Aggregation::Sum(_), _) => (Kind::SumFloat, DataType::Float64, true),
                (Aggregation::Avg(_), _) => (Kind::Avg, DataType::Float64, true),
                (Aggregation::Min(_), t) => (Kind::Min, t.unwrap_or(DataType::Utf8), true),
                (Aggregation::Max(_), t) => (Kind::Max, t.unwrap_or(DataType::Utf8), true),
            };
            fields.push(Field::new(out.clone(), data_type, nullable));
            slots.push(Slot {
                name: out,
                input: input_idx,
                kind,
            });
        }

        Ok(Bound {
            keys,
            slots,
            schema: Schema::new(fields),
        })
    }
}

struct Bound {
    keys: Vec<usize>,
    slots: Vec<Slot>,
    schema: Schema,
}

impl Bound {
    fn init(&self) -> Vec<Acc> {
        self.slots.iter().map(|s| s.kind.init()).collect()
    }

    fn fold(&self, rows: &[Row]) -> Result<Groups, OpError> {
        let mut groups = Groups::new();
        for row in rows {
            let key: Vec<Scalar> = self.keys.iter().map(|&i| row[i].clone()).collect();
            let accs = groups.entry(key).or_insert_with(|| self.init());
            for (acc, slot) in accs.iter_mut().zip(&self.slots) {
                acc.update(slot.input.map(|i| &row[i]))
                    .map_err(|msg| OpError::Exec(format!("{}: {msg}", slot.name)))?;
            }
        }
        Ok(groups)
    }

    fn merge(&self, mut into: Groups, from: Groups) -> Result<Groups, OpError> {
        for (key, accs) in from {
            match into.get_mut(&key) {
                Some(existing) => {
                    for ((a, b), slot) in existing.iter_mut().zip(accs).zip(&self.slots) {
                        a.merge(b)
                            .map_err(|msg| OpError::Exec(format!("{}: {msg}", slot.name)))?;
                    }
                }
                None => {
                    into.insert(key, accs);
                }
            }
        }
        Ok(into)
    }
}

type Groups = BTreeMap<Vec<Scalar>, Vec<Acc>>;

struct Slot {
    name: String,
    input: Option<usize>,
    kind: Kind,
}

#[derive(Clone, Copy)]
enum Kind {
    Count,
    SumInt,
    SumFloat,
    Avg,
    Min,
    Max,
}

impl Kind {
    fn init(self) -> Acc {
        match self {
            Kind::Count => Acc::Count(0),
            Kind::SumInt => Acc::SumInt(None),
            Kind::SumFloat => Acc::SumFloat(None),
            Kind::Avg => Acc::Avg { sum: 0.0, n: 0 },
            Kind::Min => Acc::Min(None),
            Kind::Max => Acc::Max(None),
        }
    }
}

#[derive(Debug, Clone)]
enum Acc {
    Count(u64),
    SumInt(Option<i64>),
    SumFloat(Option<f64>),
    Avg { sum: f64, n: u64 },
    Min(Option<Scalar>),
    Max(Option<Scalar>),
}

fn numeric(v: &Scalar) -> Result<f64, String> {
    v.as_f64()
        .ok_or_else(|| format!("'{v}' is not a number"))
}

fn add_int(a: Option<i64>, b: i64) -> Result<Option<i64>, String> {
    match a {
        None => Ok(Some(b)),
        Some(a) => a
            .checked_add(b)
            .map(Some)
            .ok_or_else(|| "integer overflow".to_string()),
    }
}

impl Acc {
    /// `None` is `COUNT(*)`'s "no input column"; it counts the row.
    fn update(&mut self, value: Option<&Scalar>) -> Result<(), String> {
        let Some(v) = value else {
            if let Acc::Count(n) = self {
                *n += 1;
            }
            return Ok(());
        };
        if v.is_null() {
            return Ok(());
        }
        // An empty string casts to null for the numeric accumulators.
        let blank = v.as_str().is_some_and(|s| s.trim().is_empty());
        if blank && matches!(self, Acc::SumFloat(_) | Acc::Avg { .. }) {
            return Ok(());
        }
        match self {
            Acc::Count(n) => *n += 1,
            Acc::SumInt(s) => {
                let x = v
                    .as_i64()
                    .ok_or_else(|| format!("'{v}' is not an integer"))?;
                *s = add_int(*s, x)?;
            }
            Acc::SumFloat(s) => *s = Some(s.unwrap_or(0.0) + numeric(v)?),
            Acc::Avg { sum, n } => {
                *sum += numeric(v)?;
                *n += 1;
            }
            Acc::Min(m) => {
                if m.as_ref().map_or(true, |cur| v < cur) {
                    *m = Some(v.clone());
                }
            }
            Acc::Max(m) => {
                if m.as_ref().map_or(true, |cur| v > cur) {
                    *m = Some(v.clone());
                }
            }
        }
        Ok(())
    }

    fn merge(&mut self, other: Acc) -> Result<(), String> {
        match (self, other) {
            (Acc::Count(a), Acc::Count(b)) => *a += b,
            (Acc::SumInt(a), Acc::SumInt(b)) => {
                if let Some(b) = b {
                    *a = add_int(*a, b)?;
                }
            }
            (Acc::SumFloat(a), Acc::SumFloat(b)) => {
                if let Some(b) = b {
                    *a = Some(a.unwrap_or(0.0) + b);
                }
            }
            (Acc::Avg { sum, n }, Acc::Avg { sum: s2, n: n2 }) => {
                *sum += s2;
                *n += n2;
            }
            (Acc::Min(a), Acc::Min(b)) => {
                if let Some(b) = b {
                    if a.as_ref().map_or(true, |cur| &b < cur) {
                        *a = Some(b);
                    }
                }
            }
            (Acc::Max(a), Acc::Max(b)) => {
                if let Some(b) = b {
                    if a.as_ref().map_or(true, |cur| &b > cur) {
                        *a = Some(b);
                    }
                }
            }
            _ => return Err("mismatched accumulators".to_string()),
        }
        Ok(())
    }

    fn finish(self) -> Scalar {
        match self {
            Acc::Count(n) => Scalar::Int(n as i64),
            Acc::SumInt(s) => s.map(Scalar::Int).unwrap_or(Scalar::Null),
            Acc::SumFloat(s) => s.map(Scalar::Float).unwrap_or(Scalar::Null),
            Acc::Avg { n: 0, .. } => Scalar::Null,
            Acc::Avg { sum, n } => Scalar::Float(sum / n as f64),
            Acc::Min(m) | Acc::Max(m) => m.unwrap_or(Scalar::Null),
        }
    }
}

impl Operator for Aggregate {
    fn name(&self) -> &'static str {
        "aggregate"
    }

    fn plan(&self, input: &Schema) -> Result<Schema, OpError> {
        Ok(self.bind(input)?.schema)
    }

    fn eval(&self, input: &Table) -> Result<Table, OpError> {
        let bound = self.bind(input.schema())?;
        let partials =
            kernels::try_map_partitions(input.rows(), self.partition_rows, |c| bound.fold(c))?;
        debug!(partitions = partials.len(), "aggregate partials");

        let mut groups = Groups::new();
        for part in partials {
            groups = bound.merge(groups, part)?;
        }
        // A global aggregate over no rows still yields one row.
        if bound.keys.is_empty() && groups.is_empty() {
            groups.insert(Vec::new(), bound.init());
        }

        let rows = groups
            .into_iter()
            .map(|(mut key, accs)| {
                key.extend(accs.into_iter().map(Acc::finish));
                Row::new(key)
            })
            .collect();
        Ok(Table::try_new(bound.schema, rows)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Table {
        let schema = Schema::new(vec![
            Field::new("education", DataType::Utf8, true),
            Field::new("age", DataType::Int64, true),
            Field::new("hours", DataType::Float64, true),
        ]);
        let rows = vec![
            Row::new(vec!["Bachelors".into(), Scalar::Int(39), Scalar::Float(40.0)]),
            Row::new(vec!["Masters".into(), Scalar::Int(50), Scalar::Float(13.0)]),
            Row::new(vec!["Bachelors".into(), Scalar::Int(38), Scalar::Null]),
            Row::new(vec!["HS-grad".into(), Scalar::Null, Scalar::Float(40.0)]),
        ];
        Table::try_new(schema, rows).unwrap()
    }

    fn agg(group: &[&str], aggs: Vec<AggExpr>, partition_rows: usize) -> Aggregate {
        Aggregate::new(
            group.iter().map(|s| s.to_string()).collect(),
            aggs,
            partition_rows,
        )
    }

    #[test]
    fn grouped_counts_sorted_by_key() {
        let op = agg(&["education"], vec![AggExpr::new(Aggregation::Count)], 1);
        let out = op.eval(&people()).unwrap();
        assert_eq!(out.schema().names(), vec!["education", "count"]);
        let got: Vec<(String, i64)> = out
            .rows()
            .iter()
            .map(|r| (r[0].to_string(), r[1].as_i64().unwrap()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Bachelors".into(), 2),
                ("HS-grad".into(), 1),
                ("Masters".into(), 1)
            ]
        );
    }

    #[test]
    fn sum_avg_min_max_skip_nulls() {
        let op = agg(
            &[],
            vec![
                AggExpr::new(Aggregation::Sum("age".into())),
                AggExpr::new(Aggregation::Avg("hours".into())),
                AggExpr::new(Aggregation::Min("age".into())),
                AggExpr::new(Aggregation::Max("education".into())),
                AggExpr::new(Aggregation::CountColumn("age".into())).alias("n"),
            ],
            2,
        );
        let out = op.eval(&people()).unwrap();
        assert_eq!(out.num_rows(), 1);
        let r = &out.rows()[0];
        assert_eq!(r[0], Scalar::Int(127));
        assert_eq!(r[1], Scalar::Float(31.0));
        assert_eq!(r[2], Scalar::Int(38));
        assert_eq!(r[3], Scalar::from("Masters"));
        assert_eq!(r[4], Scalar::Int(3));
        assert_eq!(out.schema().fields[0].data_type, DataType::Int64);
        assert_eq!(out.schema().fields[1].data_type, DataType::Float64);
        assert_eq!(out.schema().names()[4], "n");
    }

    #[test]
    fn partitioning_does_not_change_result() {
        let aggs = || {
            vec![
                AggExpr::new(Aggregation::Count),
                AggExpr::new(Aggregation::Sum("hours".into())),
            ]
        };
        let a = agg(&["education"], aggs(), 1).eval(&people()).unwrap();
        let b = agg(&["education"], aggs(), 100).eval(&people()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_input_global_vs_grouped() {
        let empty = Table::empty(people().schema().clone());
        let global = agg(&[], vec![AggExpr::new(Aggregation::Count)], 4)
            .eval(&empty)
            .unwrap();
        assert_eq!(global.num_rows(), 1);
        assert_eq!(global.rows()[0][0], Scalar::Int(0));

        let grouped = agg(&["education"], vec![AggExpr::new(Aggregation::Count)], 4)
            .eval(&empty)
            .unwrap();
        assert_eq!(grouped.num_rows(), 0);
    }

    #[test]
    fn untyped_strings_are_summed() {
        let t = Table::try_new(
            Schema::utf8(&["x"]),
            vec![Row::new(vec!["1.5".into()]), Row::new(vec!["2".into()])],
        )
        .unwrap();
        let out = agg(&[], vec![AggExpr::new(Aggregation::Sum("x".into()))], 1)
            .eval(&t)
            .unwrap();
        assert_eq!(out.rows()[0][0], Scalar::Float(3.5));

        let bad = Table::try_new(Schema::utf8(&["x"]), vec![Row::new(vec!["abc".into()])]).unwrap();
        let err = agg(&[], vec![AggExpr::new(Aggregation::Sum("x".into()))], 1)
            .eval(&bad)
            .unwrap_err();
        assert!(matches!(err, OpError::Exec(msg) if msg.starts_with("sum(x)")));
    }

    #[test]
    fn empty_strings_are_null_for_sum_and_avg() {
        let t = Table::try_new(
            Schema::utf8(&["x"]),
            vec![
                Row::new(vec!["4".into()]),
                Row::new(vec!["".into()]),
                Row::new(vec!["2".into()]),
            ],
        )
        .unwrap();
        let out = agg(
            &[],
            vec![
                AggExpr::new(Aggregation::Sum("x".into())),
                AggExpr::new(Aggregation::Avg("x".into())),
                AggExpr::new(Aggregation::CountColumn("x".into())),
            ],
            1,
        )
        .eval(&t)
        .unwrap();
        let r = &out.rows()[0];
        assert_eq!(r[0], Scalar::Float(6.0));
        assert_eq!(r[1], Scalar::Float(3.0));
        assert_eq!(r[2], Scalar::Int(3));

        let blank = Table::try_new(Schema::utf8(&["x"]), vec![Row::new(vec!["".into()])]).unwrap();
        let out = agg(&[], vec![AggExpr::new(Aggregation::Avg("x".into()))], 1)
            .eval(&blank)
            .unwrap();
        assert_eq!(out.rows()[0][0], Scalar::Null);
    }

    #[test]
    fn plan_errors() {
        let schema = people().schema().clone();
        let dup = agg(&["education", "education"], vec![], 1);
        assert!(matches!(dup.plan(&schema), Err(OpError::Plan(_))));

        let unknown = agg(&[], vec![AggExpr::new(Aggregation::Max("zip".into()))], 1);
        assert!(matches!(unknown.plan(&schema), Err(OpError::Core(_))));
    }
}
