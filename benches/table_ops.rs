use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_column_table::grid::ColumnSet;
use rust_column_table::join::JoinType;
use rust_column_table::table::{GroupableView, Table};

fn sample_table(rows: usize, keys: i64) -> Table {
    let key: Vec<i64> = (0..rows as i64).map(|i| i % keys).collect();
    let amount: Vec<f64> = (0..rows).map(|i| (i % 100) as f64).collect();
    Table::new(ColumnSet::new().with("key", key).with("amount", amount)).unwrap()
}

fn bench_group_by(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_by");
    for &rows in &[10_000usize, 100_000] {
        let t = sample_table(rows, 1_000);
        group.throughput(Throughput::Elements(rows as u64));

        group.bench_with_input(BenchmarkId::new("apply_sum", rows), &t, |b, t| {
            b.iter(|| {
                let out = t
                    .group_by(&["key"])
                    .apply(|g| g.get_column("amount")?.sum())
                    .unwrap();
                black_box(out.row_count())
            })
        });

        group.bench_with_input(BenchmarkId::new("reduce_sum", rows), &t, |b, t| {
            b.iter(|| {
                let out = t
                    .group_by(&["key"])
                    .reduce(ColumnSet::new().with("total", 0.0), |row| {
                        let v = row.value("amount")?.clone();
                        row.add("total", v)
                    })
                    .unwrap();
                black_box(out.row_count())
            })
        });
    }
    group.finish();
}

fn bench_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("join");
    for &rows in &[10_000usize, 100_000] {
        let left = sample_table(rows, 5_000);
        let right = sample_table(2_500, 2_500);
        group.throughput(Throughput::Elements(rows as u64));

        for how in [JoinType::Inner, JoinType::Outer] {
            group.bench_with_input(BenchmarkId::new(how.to_string(), rows), &left, |b, left| {
                b.iter(|| black_box(left.join(&right, &["key"], how).unwrap().row_count()))
            });
        }
    }
    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let t = sample_table(100_000, 1_000);
    c.bench_function("filter_view_write_through", |b| {
        b.iter(|| {
            let v = t.filter(|t| t.column("amount")?.greater(50.0));
            let amount = v.get_column("amount").unwrap();
            amount.op_assign(rust_column_table::column::BinaryOp::Add, 0.0).unwrap();
            black_box(amount.len())
        })
    });
}

criterion_group!(benches, bench_group_by, bench_join, bench_filter);
criterion_main!(benches);
