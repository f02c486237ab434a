// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Type-erased store handle.

use std::{fmt::Debug, sync::Arc, time::Duration};

use crate::{Payload, Result, Store, store::DynStore};

/// Extension trait for converting any [`Store`] into a [`DynamicStore`].
///
/// Implemented automatically for every `Store`.
pub trait StoreExt: Sized {
    /// Converts this store into a clonable, type-erased [`DynamicStore`].
    fn into_dynamic(self) -> DynamicStore;
}

impl<S> StoreExt for S
where
    S: Store + 'static,
{
    fn into_dynamic(self) -> DynamicStore {
        DynamicStore::new(self)
    }
}

/// A clonable store with type erasure.
///
/// Registries such as the store manager in `querycache` hold heterogeneous
/// backends behind this type. Clones share the same underlying store.
pub struct DynamicStore(Arc<DynStore<'static>>);

impl DynamicStore {
    /// Wraps any [`Store`] implementation.
    pub fn new<S>(store: S) -> Self
    where
        S: Store + 'static,
    {
        Self(DynStore::new_arc(store))
    }
}

impl Debug for DynamicStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicStore")
            .field("supports_tags", &self.0.supports_tags())
            .finish()
    }
}

impl Clone for DynamicStore {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl Store for DynamicStore {
    async fn get(&self, key: &str) -> Result<Option<Payload>> {
        self.0.get(key).await
    }

    async fn put(&self, key: &str, payload: Payload, ttl: Duration) -> Result<()> {
        self.0.put(key, payload, ttl).await
    }

    async fn forever(&self, key: &str, payload: Payload) -> Result<()> {
        self.0.forever(key, payload).await
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        self.0.forget(key).await
    }

    async fn flush(&self) -> Result<()> {
        self.0.flush().await
    }

    fn supports_tags(&self) -> bool {
        self.0.supports_tags()
    }
}
