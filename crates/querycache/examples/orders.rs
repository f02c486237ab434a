// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Orders Example
//!
//! Caches an order lookup in memory, invalidates it by tag, then routes the
//! same query to a shared slot store and clears it with a prefix delete.

use querycache::{
    Binding, Cacheable, CachingQuery, InMemoryStore, ModelConfig, QueryEngine, SharedSlots, SlotStore, StoreManager,
};
use serde::{Deserialize, Serialize};
use tick::runtime::InactiveClock;

#[derive(Debug, Serialize, Deserialize)]
struct Order {
    id: i64,
    total_cents: i64,
}

impl Cacheable for Order {
    fn cache_config() -> ModelConfig {
        ModelConfig::new("Order").cache_for(10).tags(["orders"])
    }
}

struct OrdersTable {
    bindings: Vec<Binding>,
}

impl QueryEngine for OrdersTable {
    type Row = Order;
    type Error = std::io::Error;

    fn connection_name(&self) -> &str {
        "main"
    }

    fn to_sql(&self, columns: &[&str]) -> String {
        format!("SELECT {} FROM orders WHERE id = ?", columns.join(", "))
    }

    fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    async fn execute(&self, _columns: &[&str]) -> Result<Vec<Order>, std::io::Error> {
        println!("  (running the query)");
        Ok(vec![Order { id: 42, total_cents: 1999 }])
    }
}

fn main() -> querycache::Result<()> {
    let (clock, _driver) = InactiveClock::default().activate();

    let slots = SlotStore::new(SharedSlots::builder(clock.clone()).build());
    let stores = StoreManager::builder(clock.clone())
        .store("memory", InMemoryStore::new(clock))
        .store("slots", slots.clone())
        .default_driver("memory")
        .build()?;

    futures::executor::block_on(async {
        let query = CachingQuery::for_model::<Order>(OrdersTable { bindings: vec![42.into()] }, stores.clone());
        println!("key: {}", query.cache_key(&["*"]));

        println!("first read");
        println!("  {:?}", query.get().await?);
        println!("second read");
        println!("  {:?}", query.get().await?);

        println!("invalidated: {}", query.invalidate(None).await?);
        println!("read after invalidation");
        println!("  {:?}", query.get().await?);

        let slotted = query.disable_cache().cache(1).with_driver("slots");
        println!("read through the slot store");
        println!("  {:?}", slotted.get().await?);
        println!("deleted {} slot entries", slots.delete_by_prefix("cacheable:")?);
        println!("  {:?}", slotted.get().await?);

        Ok(())
    })
}
