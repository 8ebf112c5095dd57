//! Column type inference for untyped text fields.
//!
//! A column's type is the most specific one that every non-empty value
//! parses as, tried in the order integer, float, boolean; anything else is a
//! string column. Empty values do not constrain the type and load as `Null`
//! in typed columns.

use tabkit_core::schema::DataType;
use tabkit_core::types::{parse_bool, Scalar};

#[derive(Debug, Clone, Copy)]
struct Candidates {
    seen: bool,
    int: bool,
    float: bool,
    boolean: bool,
}

impl Candidates {
    fn new() -> Self {
        Self {
            seen: false,
            int: true,
            float: true,
            boolean: true,
        }
    }

    fn observe(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        self.seen = true;
        if self.int && raw.parse::<i64>().is_err() {
            self.int = false;
        }
        if self.float && raw.parse::<f64>().is_err() {
            self.float = false;
        }
        if self.boolean && parse_bool(raw).is_none() {
            self.boolean = false;
        }
    }

    fn resolve(self) -> DataType {
        if !self.seen {
            DataType::Utf8
        } else if self.int {
            DataType::Int64
        } else if self.float {
            DataType::Float64
        } else if self.boolean {
            DataType::Boolean
        } else {
            DataType::Utf8
        }
    }
}

/// Infer one type per column over the raw (already trimmed) records.
pub fn infer_types(width: usize, records: &[Vec<String>]) -> Vec<DataType> {
    let mut cands = vec![Candidates::new(); width];
    for rec in records {
        for (c, raw) in cands.iter_mut().zip(rec) {
            c.observe(raw);
        }
    }
    cands.into_iter().map(Candidates::resolve).collect()
}

/// Parse a raw field under a column type chosen by `infer_types`.
pub fn parse_value(raw: String, data_type: DataType) -> Scalar {
    if data_type == DataType::Utf8 {
        return Scalar::Str(raw);
    }
    if raw.is_empty() {
        return Scalar::Null;
    }
    match data_type {
        DataType::Int64 => raw.parse().map(Scalar::Int).unwrap_or(Scalar::Str(raw)),
        DataType::Float64 => raw.parse().map(Scalar::Float).unwrap_or(Scalar::Str(raw)),
        DataType::Boolean => parse_bool(&raw).map(Scalar::Bool).unwrap_or(Scalar::Str(raw)),
        DataType::Utf8 => Scalar::Str(raw),
    }
}
