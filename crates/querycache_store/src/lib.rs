// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Store abstractions for the `querycache` query-result cache.
//!
//! This crate defines the [`Store`] trait that cache backends implement, plus the
//! layers the query cache builds on it:
//!
//! - [`DynamicStore`] erases the concrete backend so stores can be registered by name.
//! - [`TaggedStore`] scopes entries by tag and invalidates them by flushing a tag.
//! - [`Repository`] provides typed compute-if-absent with JSON payloads.
//!
//! # Implementing a Store
//!
//! ```
//! use querycache_store::{Payload, Result, Store};
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//! use std::time::Duration;
//!
//! struct SimpleStore(RwLock<HashMap<String, Payload>>);
//!
//! impl Store for SimpleStore {
//!     async fn get(&self, key: &str) -> Result<Option<Payload>> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     async fn put(&self, key: &str, payload: Payload, _ttl: Duration) -> Result<()> {
//!         self.0.write().unwrap().insert(key.to_owned(), payload);
//!         Ok(())
//!     }
//!
//!     async fn forever(&self, key: &str, payload: Payload) -> Result<()> {
//!         self.0.write().unwrap().insert(key.to_owned(), payload);
//!         Ok(())
//!     }
//!
//!     async fn forget(&self, key: &str) -> Result<bool> {
//!         Ok(self.0.write().unwrap().remove(key).is_some())
//!     }
//!
//!     async fn flush(&self) -> Result<()> {
//!         self.0.write().unwrap().clear();
//!         Ok(())
//!     }
//! }
//! ```

mod dynamic;
pub mod error;
mod expiry;
mod repository;
mod store;
mod tagged;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use dynamic::{DynamicStore, StoreExt};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use expiry::Expiry;
#[doc(inline)]
pub use repository::{Remembered, Repository};
#[doc(inline)]
pub use store::Store;
#[doc(inline)]
pub use tagged::TaggedStore;

/// Opaque, already-encoded value bytes held by a store.
pub type Payload = Vec<u8>;
