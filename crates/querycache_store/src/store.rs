// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The contract every cache backend implements.
//!
//! [`Store`] is deliberately small: key/value reads and writes with a TTL, a
//! "never expire" write, single-key removal and a full flush. Tag scoping and
//! compute-if-absent are layered on top by [`TaggedStore`](crate::TaggedStore)
//! and [`Repository`](crate::Repository).

use std::time::Duration;

use crate::{Payload, Result};

/// Trait for cache store implementations.
///
/// Keys are plain strings and values are opaque payload bytes; encoding is the
/// job of the [`Repository`](crate::Repository). All methods are required except
/// [`supports_tags`](Store::supports_tags), which defaults to `false`.
#[dynosaur::dynosaur(pub(crate) DynStore = dyn(box) Store, bridge(none))]
pub trait Store: Send + Sync {
    /// Retrieves the payload stored under `key`, or `None` if it is missing or expired.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Payload>>> + Send;

    /// Stores `payload` under `key` for the given time-to-live.
    fn put(&self, key: &str, payload: Payload, ttl: Duration) -> impl Future<Output = Result<()>> + Send;

    /// Stores `payload` under `key` without expiration.
    fn forever(&self, key: &str, payload: Payload) -> impl Future<Output = Result<()>> + Send;

    /// Removes `key`, returning `true` if an entry was removed.
    fn forget(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Removes every entry held by the store.
    ///
    /// For stores backed by shared memory this clears the whole backend, including
    /// entries written by other consumers.
    fn flush(&self) -> impl Future<Output = Result<()>> + Send;

    /// Returns `true` if entries of this store can be scoped and flushed by tag.
    fn supports_tags(&self) -> bool {
        false
    }
}

impl<S> Store for &S
where
    S: Store,
{
    async fn get(&self, key: &str) -> Result<Option<Payload>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, payload: Payload, ttl: Duration) -> Result<()> {
        (**self).put(key, payload, ttl).await
    }

    async fn forever(&self, key: &str, payload: Payload) -> Result<()> {
        (**self).forever(key, payload).await
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        (**self).forget(key).await
    }

    async fn flush(&self) -> Result<()> {
        (**self).flush().await
    }

    fn supports_tags(&self) -> bool {
        (**self).supports_tags()
    }
}
