//! Predicate/value expression AST.
//!
//! Expressions are written against column names (or positions) and bound to
//! a concrete schema before evaluation. Binding resolves names to indices so
//! per-row evaluation never fails.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::{parse_bool, Row, Scalar};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRef {
    Named(String),
    Index(usize),
}

impl ColumnRef {
    pub fn resolve(&self, schema: &Schema) -> Result<usize> {
        match self {
            ColumnRef::Named(name) => schema
                .index_of(name)
                .ok_or_else(|| Error::UnknownColumn(name.clone())),
            ColumnRef::Index(i) if *i < schema.len() => Ok(*i),
            ColumnRef::Index(i) => Err(Error::ColumnIndex {
                index: *i,
                width: schema.len(),
            }),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Named(n) => f.write_str(n),
            ColumnRef::Index(i) => write!(f, "#{i}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::NotEq => ord != Ordering::Equal,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::LtEq => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::GtEq => ord != Ordering::Less,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Column(ColumnRef),
    Literal(Scalar),
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

/// Reference a column by name.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(ColumnRef::Named(name.into()))
}

/// Reference a column by position.
pub fn col_at(idx: usize) -> Expr {
    Expr::Column(ColumnRef::Index(idx))
}

pub fn lit(value: impl Into<Scalar>) -> Expr {
    Expr::Literal(value.into())
}

impl Expr {
    fn compare(self, op: CompareOp, other: Expr) -> Expr {
        Expr::Compare {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn eq(self, other: Expr) -> Expr {
        self.compare(CompareOp::Eq, other)
    }

    pub fn not_eq(self, other: Expr) -> Expr {
        self.compare(CompareOp::NotEq, other)
    }

    pub fn lt(self, other: Expr) -> Expr {
        self.compare(CompareOp::Lt, other)
    }

    pub fn lt_eq(self, other: Expr) -> Expr {
        self.compare(CompareOp::LtEq, other)
    }

    pub fn gt(self, other: Expr) -> Expr {
        self.compare(CompareOp::Gt, other)
    }

    pub fn gt_eq(self, other: Expr) -> Expr {
        self.compare(CompareOp::GtEq, other)
    }

    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }

    /// Names of every column the expression reads.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Expr::Column(c) => out.push(c),
            Expr::Literal(_) => {}
            Expr::Compare { left, right, .. } | Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expr::Not(inner) => inner.collect_columns(out),
        }
    }

    pub fn bind(&self, schema: &Schema) -> Result<BoundExpr> {
        Ok(match self {
            Expr::Column(c) => BoundExpr::Column(c.resolve(schema)?),
            Expr::Literal(v) => BoundExpr::Literal(v.clone()),
            Expr::Compare { left, op, right } => BoundExpr::Compare {
                left: Box::new(left.bind(schema)?),
                op: *op,
                right: Box::new(right.bind(schema)?),
            },
            Expr::And(l, r) => BoundExpr::And(Box::new(l.bind(schema)?), Box::new(r.bind(schema)?)),
            Expr::Or(l, r) => BoundExpr::Or(Box::new(l.bind(schema)?), Box::new(r.bind(schema)?)),
            Expr::Not(inner) => BoundExpr::Not(Box::new(inner.bind(schema)?)),
        })
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(c) => write!(f, "{c}"),
            Expr::Literal(Scalar::Str(s)) => write!(f, "'{}'", s.replace('\'', "''")),
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Compare { left, op, right } => write!(f, "{left} {} {right}", op.symbol()),
            Expr::And(l, r) => write!(f, "({l} AND {r})"),
            Expr::Or(l, r) => write!(f, "({l} OR {r})"),
            Expr::Not(inner) => write!(f, "NOT {inner}"),
        }
    }
}

/// Expression with column references resolved to row positions.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpr {
    Column(usize),
    Literal(Scalar),
    Compare {
        left: Box<BoundExpr>,
        op: CompareOp,
        right: Box<BoundExpr>,
    },
    And(Box<BoundExpr>, Box<BoundExpr>),
    Or(Box<BoundExpr>, Box<BoundExpr>),
    Not(Box<BoundExpr>),
}

impl BoundExpr {
    /// Evaluate to a value. Boolean nodes yield `Scalar::Bool`.
    pub fn eval(&self, row: &Row) -> Scalar {
        match self {
            BoundExpr::Column(i) => row[*i].clone(),
            BoundExpr::Literal(v) => v.clone(),
            _ => Scalar::Bool(self.matches(row)),
        }
    }

    /// Evaluate as a predicate. `And`/`Or` short-circuit.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            BoundExpr::Column(i) => row[*i].as_bool().unwrap_or(false),
            BoundExpr::Literal(v) => v.as_bool().unwrap_or(false),
            BoundExpr::Compare { left, op, right } => {
                let l = left.operand(row);
                let r = right.operand(row);
                compare_values(&l, &r).is_some_and(|ord| op.holds(ord))
            }
            BoundExpr::And(l, r) => l.matches(row) && r.matches(row),
            BoundExpr::Or(l, r) => l.matches(row) || r.matches(row),
            BoundExpr::Not(inner) => !inner.matches(row),
        }
    }

    fn operand<'a>(&'a self, row: &'a Row) -> std::borrow::Cow<'a, Scalar> {
        use std::borrow::Cow;
        match self {
            BoundExpr::Column(i) => Cow::Borrowed(&row[*i]),
            BoundExpr::Literal(v) => Cow::Borrowed(v),
            other => Cow::Owned(other.eval(row)),
        }
    }
}

/// SQL-flavoured comparison between two values.
///
/// `None` means "unknown" (null involved, or the values cannot be compared);
/// every comparison operator treats unknown as false. Integers and floats
/// compare numerically; a string compared with a number or boolean is parsed
/// first.
pub fn compare_values(a: &Scalar, b: &Scalar) -> Option<Ordering> {
    use Scalar::*;
    match (a, b) {
        (Null, _) | (_, Null) => None,
        (Bool(x), Bool(y)) => Some(x.cmp(y)),
        (Int(x), Int(y)) => Some(x.cmp(y)),
        (Str(x), Str(y)) => Some(x.cmp(y)),
        (Int(x), Float(y)) => (*x as f64).partial_cmp(y),
        (Float(x), Int(y)) => x.partial_cmp(&(*y as f64)),
        (Float(x), Float(y)) => x.partial_cmp(y),
        (Str(s), Int(y)) => match s.parse::<i64>() {
            Ok(x) => Some(x.cmp(y)),
            Err(_) => s.parse::<f64>().ok()?.partial_cmp(&(*y as f64)),
        },
        (Int(_), Str(_)) => compare_values(b, a).map(Ordering::reverse),
        (Str(s), Float(y)) => s.parse::<f64>().ok()?.partial_cmp(y),
        (Float(_), Str(_)) => compare_values(b, a).map(Ordering::reverse),
        (Str(s), Bool(y)) => parse_bool(s).map(|x| x.cmp(y)),
        (Bool(_), Str(_)) => compare_values(b, a).map(Ordering::reverse),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataType, Field};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("age", DataType::Int64, false),
            Field::new("income", DataType::Utf8, false),
        ])
    }

    fn row(age: i64, income: &str) -> Row {
        Row::new(vec![Scalar::Int(age), income.into()])
    }

    #[test]
    fn compound_predicate() {
        let e = col("income")
            .eq(lit(">50K"))
            .and(col("age").gt(lit(40)))
            .bind(&schema())
            .unwrap();
        assert!(e.matches(&row(50, ">50K")));
        assert!(!e.matches(&row(39, ">50K")));
        assert!(!e.matches(&row(50, "<=50K")));
    }

    #[test]
    fn unknown_column_fails_at_bind() {
        let err = col("nope").eq(lit(1)).bind(&schema()).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn(c) if c == "nope"));
        let err = col_at(7).eq(lit(1)).bind(&schema()).unwrap_err();
        assert!(matches!(err, Error::ColumnIndex { index: 7, width: 2 }));
    }

    #[test]
    fn strings_coerce_against_numbers() {
        assert_eq!(
            compare_values(&"39".into(), &Scalar::Int(30)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare_values(&Scalar::Float(2.5), &"3".into()),
            Some(Ordering::Less)
        );
        assert_eq!(compare_values(&"abc".into(), &Scalar::Int(1)), None);
        assert_eq!(compare_values(&Scalar::Null, &Scalar::Null), None);
    }

    #[test]
    fn null_never_matches() {
        let s = Schema::new(vec![Field::new("x", DataType::Int64, true)]);
        let r = Row::new(vec![Scalar::Null]);
        assert!(!col("x").eq(lit(1)).bind(&s).unwrap().matches(&r));
        assert!(!col("x").not_eq(lit(1)).bind(&s).unwrap().matches(&r));
    }

    #[test]
    fn display_round_trips_quotes() {
        let e = col("name").eq(lit("O'Brien"));
        assert_eq!(e.to_string(), "name = 'O''Brien'");
    }
}
