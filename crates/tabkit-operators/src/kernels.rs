//! Partition-parallel primitives every front-end bottoms out in.
//!
//! Inputs are cut into contiguous partitions of `partition_rows` items and
//! processed on the rayon pool. Filter output is concatenated in partition
//! order, so row order is preserved. Per-partition counts are merged by
//! summation, which makes the result independent of the partitioning.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tabkit_core::table::Table;
use tabkit_core::types::RowView;
use tabkit_core::{GroupCounts, Result};
use tracing::trace;

/// Keep the items for which `pred` holds, in input order.
pub fn filter_slice<T, F>(items: &[T], partition_rows: usize, pred: F) -> Vec<T>
where
    T: Clone + Send + Sync,
    F: Fn(&T) -> bool + Sync,
{
    let parts: Vec<Vec<T>> = items
        .par_chunks(partition_rows.max(1))
        .map(|chunk| chunk.iter().filter(|t| pred(t)).cloned().collect())
        .collect();
    trace!(partitions = parts.len(), "filter");
    parts.concat()
}

/// Count items per key.
pub fn count_by_key<T, K, F>(items: &[T], partition_rows: usize, key: F) -> GroupCounts<K>
where
    T: Sync,
    K: Ord + Send,
    F: Fn(&T) -> K + Sync,
{
    items
        .par_chunks(partition_rows.max(1))
        .map(|chunk| {
            let mut counts = BTreeMap::new();
            for item in chunk {
                *counts.entry(key(item)).or_insert(0u64) += 1;
            }
            counts
        })
        .reduce(BTreeMap::new, merge_counts)
}

/// Combine two partial count maps.
pub fn merge_counts<K: Ord>(mut a: GroupCounts<K>, b: GroupCounts<K>) -> GroupCounts<K> {
    if a.len() < b.len() {
        return merge_counts(b, a);
    }
    for (k, n) in b {
        *a.entry(k).or_insert(0) += n;
    }
    a
}

/// Run a fallible map over partitions, keeping partition order.
pub fn try_map_partitions<T, R, E, F>(
    items: &[T],
    partition_rows: usize,
    f: F,
) -> std::result::Result<Vec<R>, E>
where
    T: Sync,
    R: Send,
    E: Send,
    F: Fn(&[T]) -> std::result::Result<R, E> + Sync,
{
    items
        .par_chunks(partition_rows.max(1))
        .map(&f)
        .collect()
}

/// Rows of `table` for which `pred` holds.
pub fn filter<F>(table: &Table, partition_rows: usize, pred: F) -> Table
where
    F: Fn(RowView<'_>) -> bool + Sync,
{
    let schema = table.schema();
    let rows = filter_slice(table.rows(), partition_rows, |row| {
        pred(RowView::new(schema, row))
    });
    table.with_rows(rows)
}

pub fn count(table: &Table) -> usize {
    table.num_rows()
}

/// Count rows per `key(row)`. The counts always sum to `count(table)`.
pub fn group_by_count<K, F>(table: &Table, partition_rows: usize, key: F) -> GroupCounts<K>
where
    K: Ord + Send,
    F: Fn(RowView<'_>) -> K + Sync,
{
    let schema = table.schema();
    count_by_key(table.rows(), partition_rows, |row| {
        key(RowView::new(schema, row))
    })
}

/// Count rows per value of a named column.
pub fn group_by_column_count(
    table: &Table,
    partition_rows: usize,
    column: &str,
) -> Result<GroupCounts> {
    let idx = table.column_index(column)?;
    Ok(group_by_count(table, partition_rows, |row| row[idx].clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabkit_core::schema::Schema;
    use tabkit_core::types::{Row, Scalar};

    fn numbers(n: i64) -> Table {
        let rows = (0..n).map(|i| Row::new(vec![Scalar::Int(i)])).collect();
        Table::try_new(Schema::utf8(&["n"]), rows).unwrap()
    }

    #[test]
    fn filter_preserves_order_across_partitions() {
        let t = numbers(100);
        let out = filter(&t, 7, |r| matches!(r[0], Scalar::Int(i) if i % 3 == 0));
        let got: Vec<i64> = out
            .rows()
            .iter()
            .map(|r| r[0].as_i64().unwrap())
            .collect();
        let want: Vec<i64> = (0..100).filter(|i| i % 3 == 0).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn counts_independent_of_partitioning() {
        let t = numbers(1000);
        let key = |r: RowView<'_>| r[0].as_i64().unwrap() % 4;
        let a = group_by_count(&t, 1, key);
        let b = group_by_count(&t, 13, key);
        let c = group_by_count(&t, 10_000, key);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.values().sum::<u64>(), 1000);
        assert_eq!(a[&0], 250);
    }

    #[test]
    fn empty_input() {
        let t = numbers(0);
        assert_eq!(count(&filter(&t, 4, |_| true)), 0);
        assert!(group_by_count(&t, 4, |r| r[0].clone()).is_empty());
    }

    #[test]
    fn unknown_group_column() {
        let t = numbers(3);
        assert!(group_by_column_count(&t, 4, "missing").is_err());
        let counts = group_by_column_count(&t, 4, "n").unwrap();
        assert_eq!(counts.len(), 3);
    }
}
