use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use tx_parser::blockchain::TransactionFilter;
use tx_parser::models::Transaction;
use tx_parser::storage::{MemoryStorage, SqliteStorage, Storage};

const WATCHED: &str = "0xf977814e90da44bfa03b6295a0616a897441acec";

fn create_test_transaction(id: u64) -> Transaction {
    Transaction {
        hash: format!("0x{:064x}", id),
        from_address: format!("0x{:040x}", id),
        to_address: Some(WATCHED.to_string()),
        value: (id + 1) as f64,
        value_wei: format!("{}", (id as u128 + 1) * 1_000_000_000_000_000_000),
        block_number: 1000 + id,
        timestamp: 1640995200 + id,
    }
}

fn raw_transaction(id: u64) -> Value {
    json!({
        "hash": format!("0x{:064x}", id),
        "from": format!("0x{:040X}", id),
        "to": if id % 10 == 0 { WATCHED.to_string() } else { format!("0x{:040x}", id + 1) },
        "value": format!("0x{:x}", (id as u128 + 1) * 1_000_000_000_000_000),
        "blockNumber": format!("0x{:x}", 1000 + id / 100),
    })
}

fn backends(temp_dir: &TempDir) -> Vec<(&'static str, Arc<dyn Storage>)> {
    let db_path = temp_dir.path().join("bench.db");
    vec![
        ("memory", Arc::new(MemoryStorage::new()) as Arc<dyn Storage>),
        (
            "sqlite",
            Arc::new(SqliteStorage::new(db_path.to_str().unwrap()).expect("Failed to create database")),
        ),
    ]
}

fn bench_store_transaction(c: &mut Criterion) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut group = c.benchmark_group("store_transaction");

    for (name, storage) in backends(&temp_dir) {
        for size in [1u64, 10, 100] {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, &size| {
                b.iter(|| {
                    for i in 0..size {
                        let _ = storage.store_transaction(black_box(&create_test_transaction(i)), &[WATCHED]);
                    }
                });
            });
        }
    }

    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut group = c.benchmark_group("queries");

    for (name, storage) in backends(&temp_dir) {
        for i in 0..1000 {
            storage
                .store_transaction(&create_test_transaction(i), &[WATCHED])
                .expect("Failed to store transaction");
            storage
                .add_subscriber(&format!("0x{:040x}", i))
                .expect("Failed to add subscriber");
        }

        group.bench_function(BenchmarkId::new("get_transactions", name), |b| {
            b.iter(|| storage.get_transactions(black_box(WATCHED)))
        });

        group.bench_function(BenchmarkId::new("is_subscribed", name), |b| {
            b.iter(|| storage.is_subscribed(black_box("0x00000000000000000000000000000000000001f4")))
        });

        group.bench_function(BenchmarkId::new("cursor_round_trip", name), |b| {
            b.iter(|| {
                let _ = storage.update_block_cursor(black_box(42));
                storage.get_block_cursor()
            })
        });
    }

    group.finish();
}

fn bench_filter_block(c: &mut Criterion) {
    let block: Vec<Value> = (0..200).map(raw_transaction).collect();
    let mut group = c.benchmark_group("filter_block");

    for subscriber_count in [1u64, 100, 1000] {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.add_subscriber(WATCHED).expect("Failed to add subscriber");
        for i in 0..subscriber_count {
            let _ = storage.add_subscriber(&format!("0x{:040x}", i + 10_000));
        }
        let filter = TransactionFilter::new(storage);

        group.bench_with_input(
            BenchmarkId::new("200_transactions", subscriber_count),
            &block,
            |b, block| {
                b.iter(|| {
                    block
                        .iter()
                        .filter_map(|raw| filter.process(black_box(raw), 1640995200).ok().flatten())
                        .count()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_store_transaction, bench_queries, bench_filter_block);
criterion_main!(benches);
