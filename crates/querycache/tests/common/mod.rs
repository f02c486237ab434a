// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use querycache::{Binding, Cacheable, ModelConfig, QueryEngine};
use serde::{Deserialize, Serialize};

pub const ORDERS_SQL: &str = "SELECT * FROM orders WHERE id = ?";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub status: String,
}

/// An engine that returns one order per bound id and counts its executions.
#[derive(Clone, Debug)]
pub struct OrdersEngine {
    id: i64,
    connection: String,
    bindings: Vec<Binding>,
    status: String,
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl OrdersEngine {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            connection: "main".to_owned(),
            bindings: vec![Binding::Int(id)],
            status: "open".to_owned(),
            calls: Arc::new(AtomicUsize::new(0)),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_owned();
        self
    }

    pub fn on_connection(mut self, connection: &str) -> Self {
        self.connection = connection.to_owned();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl QueryEngine for OrdersEngine {
    type Row = Order;
    type Error = std::io::Error;

    fn connection_name(&self) -> &str {
        &self.connection
    }

    fn to_sql(&self, columns: &[&str]) -> String {
        format!("SELECT {} FROM orders WHERE id = ?", columns.join(", "))
    }

    fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    async fn execute(&self, _columns: &[&str]) -> Result<Vec<Order>, std::io::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"));
        }

        Ok(vec![Order {
            id: self.id,
            status: self.status.clone(),
        }])
    }
}

pub struct CachedOrder;

impl Cacheable for CachedOrder {
    fn cache_config() -> ModelConfig {
        ModelConfig::new("Order").cache_for(10).tags(["orders"])
    }
}

pub struct PlainOrder;

impl Cacheable for PlainOrder {
    fn cache_config() -> ModelConfig {
        ModelConfig::new("Order")
    }
}

pub fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}
