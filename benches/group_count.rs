use criterion::{criterion_group, criterion_main, Criterion};
use tabkit_core::expr::{col, lit};
use tabkit_core::schema::{DataType, Field, Schema};
use tabkit_core::table::Table;
use tabkit_core::types::{Row, Scalar};
use tabkit_operators::{kernels, Filter, Operator};

const EDUCATION: [&str; 4] = ["Bachelors", "Masters", "HS-grad", "Doctorate"];

fn make_table(rows: usize) -> Table {
    let schema = Schema::new(vec![
        Field::new("age", DataType::Int64, true),
        Field::new("education", DataType::Utf8, true),
        Field::new("income", DataType::Utf8, true),
    ]);
    let rows = (0..rows)
        .map(|i| {
            Row::new(vec![
                Scalar::Int(20 + (i % 50) as i64),
                Scalar::from(EDUCATION[i % EDUCATION.len()]),
                Scalar::from(if i % 3 == 0 { ">50K" } else { "<=50K" }),
            ])
        })
        .collect();
    Table::try_new(schema, rows).unwrap()
}

fn bench_group_count(c: &mut Criterion) {
    let table = make_table(100_000);
    c.bench_function("group_by_column_count", |b| {
        b.iter(|| kernels::group_by_column_count(&table, 8192, "education").unwrap())
    });
}

fn bench_filter(c: &mut Criterion) {
    let table = make_table(100_000);
    let filter = Filter::new(
        col("income")
            .eq(lit(">50K"))
            .and(col("education").eq(lit("Bachelors"))),
        8192,
    );
    filter.plan(table.schema()).unwrap();
    c.bench_function("filter_conjunction", |b| {
        b.iter(|| filter.eval(&table).unwrap())
    });
}

criterion_group!(kernels_bench, bench_group_count, bench_filter);
criterion_main!(kernels_bench);
