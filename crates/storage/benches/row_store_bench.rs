//! Benchmarks for RowStore writes and reads with virtual columns.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vellum_core::schema::TableBuilder;
use vellum_core::{DataType, Row, Value};
use vellum_jsonb::{JsonPath, JsonbBinary};
use vellum_storage::{JsonAccess, RowStore, VirtualColumnDescriptor};

fn create_events_schema() -> vellum_core::schema::Table {
    TableBuilder::new("events")
        .unwrap()
        .add_column("id", DataType::Int64)
        .unwrap()
        .add_column("payload", DataType::Jsonb)
        .unwrap()
        .build()
        .unwrap()
}

fn event_row(i: u64) -> Row {
    let kinds = ["PushEvent", "WatchEvent", "ForkEvent", "IssuesEvent", "CreateEvent"];
    let doc = JsonbBinary::parse(&format!(
        r#"{{"type":"{}","actor":{{"id":{},"login":"user{}"}},"repo":{{"id":{},"name":"org/repo{}"}},"public":true}}"#,
        kinds[(i as usize) % kinds.len()],
        i % 997,
        i % 997,
        i,
        i % 101
    ))
    .unwrap();
    Row::new(i, vec![Value::Int64(i as i64), doc.into()])
}

fn register_columns(store: &mut RowStore, count: usize) {
    let paths = [
        (":type", DataType::String),
        (":repo.name", DataType::String),
        (":actor.id", DataType::Int64),
        (":actor.login", DataType::String),
        (":public", DataType::Boolean),
        (":repo.id", DataType::Int64),
    ];
    for (path, dt) in paths.iter().take(count) {
        let desc = VirtualColumnDescriptor::new("payload", JsonPath::parse(path).unwrap(), *dt);
        store.register_virtual_column(desc).unwrap();
    }
}

fn populate_store(store: &mut RowStore, count: u64) {
    for i in 1..=count {
        store.insert(event_row(i)).unwrap();
    }
}

/// Benchmark: insert cost as the number of virtual columns grows
fn row_store_insert_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_store_insert");
    let total_rows = 10000u64;

    for columns in [0usize, 2, 6].iter() {
        group.bench_with_input(
            BenchmarkId::new("virtual_columns", columns),
            columns,
            |b, &columns| {
                b.iter_batched(
                    || {
                        let mut store = RowStore::new(create_events_schema());
                        register_columns(&mut store, columns);
                        let rows: Vec<Row> = (1..=total_rows).map(event_row).collect();
                        (store, rows)
                    },
                    |(mut store, rows)| {
                        for row in rows {
                            store.insert(row).unwrap();
                        }
                        black_box(store)
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark: registering a column over existing rows
fn row_store_backfill_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_store_backfill");

    for total_rows in [1000u64, 10000, 50000].iter() {
        group.bench_with_input(
            BenchmarkId::new("register", total_rows),
            total_rows,
            |b, &total_rows| {
                b.iter_batched(
                    || {
                        let mut store = RowStore::new(create_events_schema());
                        populate_store(&mut store, total_rows);
                        store
                    },
                    |mut store| {
                        register_columns(&mut store, 1);
                        black_box(store)
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark: reading a path through a virtual column vs evaluating it
fn row_store_read_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_store_read");
    let total_rows = 10000u64;

    let mut plain = RowStore::new(create_events_schema());
    populate_store(&mut plain, total_rows);
    let mut materialized = plain.clone();
    register_columns(&mut materialized, 2);

    let access = JsonAccess::parse("payload", ":repo.name", DataType::String).unwrap();

    group.bench_function("direct", |b| {
        b.iter(|| {
            for id in 1..=total_rows {
                black_box(plain.evaluate(id, &access).unwrap());
            }
        })
    });

    group.bench_function("rewritten", |b| {
        b.iter(|| {
            for id in 1..=total_rows {
                black_box(materialized.evaluate(id, &access).unwrap());
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    row_store_insert_benchmark,
    row_store_backfill_benchmark,
    row_store_read_benchmark,
);

criterion_main!(benches);
