// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Transparent query-result caching for database query builders.
//!
//! [`CachingQuery`] decorates a [`QueryEngine`]. When caching is enabled for a
//! call it derives a deterministic key from the query, serves a stored result on
//! a hit, and runs the query exactly once on a miss, storing its rows. With
//! caching disabled it is a pure pass-through.
//!
//! # Keys
//!
//! Derived keys have the form
//! `{prefix}:{Connection}_{Model}_{sha256(sql + bindings)}`, see
//! [`fingerprint`]. Callers may supply an explicit key instead; the prefix
//! (`cacheable` unless overridden) is applied either way.
//!
//! # Stores
//!
//! Stores implement [`Store`] and are registered by name in a
//! [`StoreManager`]. The `memory` feature (on by default) re-exports
//! [`InMemoryStore`]; the `slots` feature re-exports [`SlotStore`] and
//! [`SharedSlots`] for fixed-size slot caches.
//!
//! # Tags
//!
//! Results cached with [`CachingQuery::with_tags`] can be dropped together with
//! [`CachingQuery::invalidate`] on stores that support tags.
//!
//! # Quick Start
//!
//! ```
//! use querycache::{Binding, CachingQuery, InMemoryStore, ModelConfig, QueryEngine, StoreManager};
//! use tick::Clock;
//!
//! struct ActiveUsers {
//!     bindings: Vec<Binding>,
//! }
//!
//! impl QueryEngine for ActiveUsers {
//!     type Row = String;
//!     type Error = std::io::Error;
//!
//!     fn connection_name(&self) -> &str {
//!         "main"
//!     }
//!
//!     fn to_sql(&self, columns: &[&str]) -> String {
//!         format!("SELECT {} FROM users WHERE active = ?", columns.join(", "))
//!     }
//!
//!     fn bindings(&self) -> &[Binding] {
//!         &self.bindings
//!     }
//!
//!     async fn execute(&self, _columns: &[&str]) -> Result<Vec<String>, std::io::Error> {
//!         Ok(vec!["ada".to_owned()])
//!     }
//! }
//!
//! # futures::executor::block_on(async {
//! let clock = Clock::new_frozen();
//! let stores = StoreManager::new(clock.clone(), InMemoryStore::new(clock));
//!
//! let query = CachingQuery::new(
//!     ActiveUsers { bindings: vec![true.into()] },
//!     stores,
//!     ModelConfig::new("User").cache_for(10).tags(["users"]),
//! );
//!
//! assert_eq!(query.get().await?, vec!["ada".to_owned()]);
//! assert!(query.invalidate(None).await?);
//! # querycache::Result::Ok(())
//! # }).unwrap();
//! ```
//!
//! # Features
//!
//! - `memory` (default): re-exports [`InMemoryStore`].
//! - `slots`: re-exports the slot store adapter.
//! - `metrics`: records OpenTelemetry metrics, see
//!   [`StoreManagerBuilder::with_metrics`](manager::StoreManagerBuilder).
//! - `test-util`: enables [`MockStore`] and simulated clocks.

mod binding;
mod engine;
pub mod fingerprint;
pub mod manager;
mod model;
mod query;
mod telemetry;

#[doc(inline)]
pub use binding::Binding;
#[doc(inline)]
pub use engine::QueryEngine;
#[doc(inline)]
pub use manager::{StoreManager, StoreManagerBuilder};
#[doc(inline)]
pub use model::{Cacheable, ModelConfig};
#[cfg(feature = "memory")]
#[doc(inline)]
pub use querycache_memory::InMemoryStore;
#[cfg(feature = "slots")]
#[doc(inline)]
pub use querycache_slots::{SharedSlots, SlotBackend, SlotStore};
#[doc(inline)]
pub use querycache_store::{DynamicStore, Error, ErrorKind, Expiry, Result, Store, TaggedStore};
#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use querycache_store::testing::{MockStore, StoreOp};
#[doc(inline)]
pub use query::{CachingQuery, DEFAULT_PREFIX};
