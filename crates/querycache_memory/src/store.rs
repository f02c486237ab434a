// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory store implementation using moka.

use std::{
    fmt::Debug,
    time::{Duration, SystemTime},
};

use moka::future::Cache;
use querycache_store::{Payload, Result, Store};
use tick::Clock;

use crate::builder::InMemoryStoreBuilder;

#[derive(Clone)]
struct Entry {
    payload: Payload,
    expires_at: Option<SystemTime>,
}

impl Entry {
    fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// A [`Store`] that keeps payloads in process memory.
///
/// Expired entries are dropped lazily when read. Clones share the same
/// underlying cache.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use querycache_memory::InMemoryStore;
/// use querycache_store::Store;
/// use tick::ClockControl;
///
/// # futures::executor::block_on(async {
/// let control = ClockControl::new();
/// let store = InMemoryStore::new(control.to_clock());
///
/// store.put("key", b"1".to_vec(), Duration::from_secs(60)).await?;
/// control.advance(Duration::from_secs(61));
/// assert_eq!(store.get("key").await?, None);
/// # querycache_store::Result::Ok(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Cache<String, Entry>,
    clock: Clock,
}

impl Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("name", &self.inner.name())
            .field("entry_count", &self.inner.entry_count())
            .finish_non_exhaustive()
    }
}

impl InMemoryStore {
    /// Creates an unbounded store.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self::builder(clock).build()
    }

    /// Creates a builder for configuring a store.
    #[must_use]
    pub fn builder(clock: Clock) -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::new(clock)
    }

    pub(crate) fn from_builder(builder: InMemoryStoreBuilder) -> Self {
        let mut moka_builder = Cache::builder();

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: moka_builder.build(),
            clock: builder.clock,
        }
    }

    /// Returns the number of entries held, including expired entries not yet
    /// read back.
    pub async fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }

    async fn insert(&self, key: &str, payload: Payload, expires_at: Option<SystemTime>) {
        self.inner.insert(key.to_owned(), Entry { payload, expires_at }).await;
    }
}

impl Store for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Payload>> {
        let Some(entry) = self.inner.get(key).await else {
            return Ok(None);
        };

        if entry.is_expired(self.clock.system_time()) {
            self.inner.invalidate(key).await;
            tracing::debug!(query_cache.key = key, "query_cache.entry_expired");
            return Ok(None);
        }

        Ok(Some(entry.payload))
    }

    async fn put(&self, key: &str, payload: Payload, ttl: Duration) -> Result<()> {
        // An unrepresentable deadline is far enough away to be treated as no deadline.
        let expires_at = self.clock.system_time().checked_add(ttl);
        self.insert(key, payload, expires_at).await;
        Ok(())
    }

    async fn forever(&self, key: &str, payload: Payload) -> Result<()> {
        self.insert(key, payload, None).await;
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        let now = self.clock.system_time();
        Ok(self.inner.remove(key).await.is_some_and(|entry| !entry.is_expired(now)))
    }

    async fn flush(&self) -> Result<()> {
        self.inner.invalidate_all();
        Ok(())
    }

    fn supports_tags(&self) -> bool {
        true
    }
}
