// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Store adapter over fixed-size slot caches.
//!
//! Slot caches are shared key/value memories split into a fixed number of slots,
//! with a per-key TTL in seconds (zero meaning "never expire") and an
//! administrative listing API. They have no notion of namespaces and no way to
//! delete by prefix or pattern.
//!
//! - [`SlotBackend`] is the contract such a cache exposes.
//! - [`SharedSlots`] is an in-process implementation of it.
//! - [`SlotStore`] adapts any backend to [`Store`](querycache_store::Store) and
//!   rebuilds bulk deletion on top of the listing API.
//!
//! # Cost of bulk deletion
//!
//! [`SlotStore::delete_by_prefix`], [`SlotStore::delete_by_regex`] and wildcard
//! [`SlotStore::delete`] list every live key in every slot and filter them. They
//! are O(total entries in the backend), including entries owned by other
//! consumers of the same backend.
//!
//! # Examples
//!
//! ```
//! use querycache_slots::{SharedSlots, SlotStore};
//! use querycache_store::Store;
//! use tick::Clock;
//!
//! # futures::executor::block_on(async {
//! let store = SlotStore::new(SharedSlots::builder(Clock::new_frozen()).build());
//!
//! store.forever("cacheable:1", b"1".to_vec()).await?;
//! store.forever("cacheable:2", b"2".to_vec()).await?;
//! store.forever("other:1", b"3".to_vec()).await?;
//!
//! assert_eq!(store.delete_by_prefix("cacheable:")?, 2);
//! assert_eq!(store.get("other:1").await?, Some(b"3".to_vec()));
//! # querycache_store::Result::Ok(())
//! # }).unwrap();
//! ```

mod adapter;
mod backend;
mod pattern;
mod shared;

pub use adapter::SlotStore;
pub use backend::{SlotBackend, SlotListing, SlotValue};
pub use shared::{SharedSlots, SharedSlotsBuilder};
