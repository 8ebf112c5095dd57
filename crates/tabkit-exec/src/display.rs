//! Text renderings of results: grid preview, schema tree, group counts and
//! JSON lines.

use std::fmt::{Display, Write};

use tabkit_core::schema::Schema;
use tabkit_core::table::Table;
use tabkit_core::types::Scalar;
use tabkit_core::GroupCounts;

/// Cells wider than this are cut to `TRUNCATE_AT - 3` characters plus `...`.
pub const TRUNCATE_AT: usize = 20;

fn cell(value: &Scalar) -> String {
    let s = value.to_string();
    if s.chars().count() > TRUNCATE_AT {
        let mut cut: String = s.chars().take(TRUNCATE_AT - 3).collect();
        cut.push_str("...");
        cut
    } else {
        s
    }
}

/// Render the first `n` rows as a bordered grid with right-aligned cells.
///
/// ```text
/// +---+---------+
/// |age|education|
/// +---+---------+
/// | 39|Bachelors|
/// +---+---------+
/// only showing top 1 rows
/// ```
pub fn show_table(table: &Table, n: usize) -> String {
    let names: Vec<String> = table
        .schema()
        .fields
        .iter()
        .map(|f| cell(&Scalar::Str(f.name.clone())))
        .collect();
    let body: Vec<Vec<String>> = table
        .rows()
        .iter()
        .take(n)
        .map(|r| r.values().iter().map(cell).collect())
        .collect();

    let mut widths: Vec<usize> = names.iter().map(|n| n.chars().count().max(3)).collect();
    for row in &body {
        for (w, c) in widths.iter_mut().zip(row) {
            *w = (*w).max(c.chars().count());
        }
    }

    let border: String = {
        let mut b = String::from("+");
        for w in &widths {
            b.push_str(&"-".repeat(*w));
            b.push('+');
        }
        b
    };

    let mut out = String::new();
    let line = |out: &mut String, cells: &[String]| {
        out.push('|');
        for (c, w) in cells.iter().zip(&widths) {
            let pad = w - c.chars().count();
            out.push_str(&" ".repeat(pad));
            out.push_str(c);
            out.push('|');
        }
        out.push('\n');
    };

    out.push_str(&border);
    out.push('\n');
    line(&mut out, &names);
    out.push_str(&border);
    out.push('\n');
    for row in &body {
        line(&mut out, row);
    }
    out.push_str(&border);
    out.push('\n');
    if table.num_rows() > n {
        let _ = writeln!(out, "only showing top {n} rows");
    }
    out
}

/// `root` followed by one ` |-- name: type (nullable = b)` line per field.
pub fn schema_tree(schema: &Schema) -> String {
    let mut out = String::from("root\n");
    for f in &schema.fields {
        let _ = writeln!(
            out,
            " |-- {}: {} (nullable = {})",
            f.name,
            f.data_type.name(),
            f.nullable
        );
    }
    out
}

/// One `key: count` line per group, in key order.
pub fn format_groups<K: Display>(groups: &GroupCounts<K>) -> String {
    let mut out = String::new();
    for (k, n) in groups {
        let _ = writeln!(out, "{k}: {n}");
    }
    out
}

/// One JSON object per row; keys follow column order.
pub fn json_lines(table: &Table) -> String {
    let names: Vec<String> = table
        .schema()
        .fields
        .iter()
        .map(|f| serde_json::Value::String(f.name.clone()).to_string())
        .collect();
    let mut out = String::new();
    for row in table.rows() {
        out.push('{');
        for (i, (name, value)) in names.iter().zip(row.values()).enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{name}:{}", value.to_json());
        }
        out.push_str("}\n");
    }
    out
}
