// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Benchmarks for cache key derivation and the cached read path.

#![allow(missing_docs, reason = "Benchmark code")]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use futures::executor::block_on;
use querycache::{Binding, CachingQuery, InMemoryStore, ModelConfig, QueryEngine, StoreManager, fingerprint};
use tick::Clock;

const SQL: &str = "SELECT * FROM orders WHERE customer_id = ? AND status = ? AND created_at > ?";

#[derive(Clone)]
struct StaticEngine {
    bindings: Vec<Binding>,
}

impl QueryEngine for StaticEngine {
    type Row = i64;
    type Error = std::io::Error;

    fn connection_name(&self) -> &str {
        "main"
    }

    fn to_sql(&self, _columns: &[&str]) -> String {
        SQL.to_owned()
    }

    fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    async fn execute(&self, _columns: &[&str]) -> Result<Vec<i64>, std::io::Error> {
        Ok((0..32).collect())
    }
}

fn bindings(count: usize) -> Vec<Binding> {
    (0..count)
        .map(|i| match i % 3 {
            0 => Binding::Int(i64::try_from(i).unwrap_or_default()),
            1 => Binding::Text(format!("value-{i}")),
            _ => Binding::Null,
        })
        .collect()
}

fn bench_derive_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_key");

    for count in [0, 3, 32] {
        let bindings = bindings(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &bindings, |b, bindings| {
            b.iter(|| fingerprint::derive_key(black_box("main"), black_box("Order"), black_box(SQL), black_box(bindings)));
        });
    }

    group.finish();
}

fn bench_cached_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_get");
    let clock = Clock::new_frozen();
    let stores = StoreManager::new(clock.clone(), InMemoryStore::new(clock));
    let engine = StaticEngine { bindings: bindings(3) };

    let uncached = CachingQuery::new(engine.clone(), stores.clone(), ModelConfig::new("Order"));
    group.bench_function("pass_through", |b| {
        b.iter(|| block_on(uncached.get()));
    });

    let cached = CachingQuery::new(engine.clone(), stores.clone(), ModelConfig::new("Order")).cache(5);
    group.bench_function("hit", |b| {
        b.iter(|| block_on(cached.get()));
    });

    let tagged = CachingQuery::new(engine, stores, ModelConfig::new("Order"))
        .cache(5)
        .with_tags(["orders", "reports"]);
    group.bench_function("tagged_hit", |b| {
        b.iter(|| block_on(tagged.get()));
    });

    group.finish();
}

criterion_group!(benches, bench_derive_key, bench_cached_get);
criterion_main!(benches);
