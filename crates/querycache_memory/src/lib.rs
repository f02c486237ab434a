// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-memory query-result store backed by moka.
//!
//! [`InMemoryStore`] implements [`Store`](querycache_store::Store) on top of a
//! concurrent moka cache. Every entry carries its own expiry, evaluated against
//! a [`tick::Clock`] so tests can drive time explicitly. The store supports tag
//! scoping.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use querycache_memory::InMemoryStore;
//! use querycache_store::Store;
//! use tick::Clock;
//!
//! # futures::executor::block_on(async {
//! let store = InMemoryStore::builder(Clock::new_frozen())
//!     .max_capacity(10_000)
//!     .name("orders")
//!     .build();
//!
//! store.put("key", b"[1,2]".to_vec(), Duration::from_secs(300)).await?;
//! assert_eq!(store.get("key").await?, Some(b"[1,2]".to_vec()));
//! # querycache_store::Result::Ok(())
//! # }).unwrap();
//! ```

pub mod builder;
pub mod store;

#[doc(inline)]
pub use builder::InMemoryStoreBuilder;
#[doc(inline)]
pub use store::InMemoryStore;
