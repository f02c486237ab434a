// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tag scoping over any [`Store`].
//!
//! Every tag owns a version id stored (forever) under `tag:{name}:key`. Entries
//! written through a [`TaggedStore`] live under a key prefixed with the digest of
//! the ids of all its tags, so resetting any one id makes every entry written
//! under that tag unreachable. Orphaned entries are left for the backend to
//! expire or evict.

use std::time::Duration;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{Payload, Result, Store};

/// A view of a store whose entries are scoped by an ordered set of tags.
///
/// Reads must use the same tags, in the same order, as the write. Flushing the
/// view invalidates every entry written under any of its tags, including entries
/// written by views with a different but overlapping tag set.
///
/// # Examples
///
/// ```
/// use querycache_store::{Store, TaggedStore};
///
/// # async fn example(store: impl Store) -> querycache_store::Result<()> {
/// let orders = TaggedStore::new(&store, ["orders", "reports"]);
/// orders.forever("totals", b"[1,2,3]".to_vec()).await?;
///
/// TaggedStore::new(&store, ["orders"]).flush().await?;
/// assert!(orders.get("totals").await?.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct TaggedStore<S> {
    store: S,
    names: Vec<String>,
}

impl<S> TaggedStore<S> {
    /// Creates a tag-scoped view over `store`.
    pub fn new<I, T>(store: S, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            store,
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the tag names of this view, in order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.store
    }
}

impl<S> TaggedStore<S>
where
    S: Store,
{
    /// Returns the key under which `key` is stored for the current tag versions.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or initializing a tag version fails.
    pub async fn tagged_key(&self, key: &str) -> Result<String> {
        let namespace = self.namespace().await?;
        Ok(format!("{}:{key}", hex::encode(Sha256::digest(namespace.as_bytes()))))
    }

    /// Assigns a fresh version id to every tag of this view.
    ///
    /// # Errors
    ///
    /// Returns an error if writing a tag version fails. Tags reset before the
    /// failure stay reset.
    pub async fn reset(&self) -> Result<()> {
        for name in &self.names {
            self.reset_tag(name).await?;
        }
        Ok(())
    }

    async fn namespace(&self) -> Result<String> {
        let mut ids = Vec::with_capacity(self.names.len());
        for name in &self.names {
            ids.push(self.tag_id(name).await?);
        }
        Ok(ids.join("|"))
    }

    async fn tag_id(&self, name: &str) -> Result<String> {
        match self.store.get(&tag_key(name)).await? {
            Some(payload) => match String::from_utf8(payload) {
                Ok(id) => Ok(id),
                Err(_) => self.reset_tag(name).await,
            },
            None => self.reset_tag(name).await,
        }
    }

    async fn reset_tag(&self, name: &str) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.store.forever(&tag_key(name), id.clone().into_bytes()).await?;
        tracing::debug!(query_cache.tag = name, query_cache.tag_id = %id, "query_cache.tag_reset");
        Ok(id)
    }
}

fn tag_key(name: &str) -> String {
    format!("tag:{name}:key")
}

impl<S> Store for TaggedStore<S>
where
    S: Store,
{
    async fn get(&self, key: &str) -> Result<Option<Payload>> {
        let key = self.tagged_key(key).await?;
        self.store.get(&key).await
    }

    async fn put(&self, key: &str, payload: Payload, ttl: Duration) -> Result<()> {
        let key = self.tagged_key(key).await?;
        self.store.put(&key, payload, ttl).await
    }

    async fn forever(&self, key: &str, payload: Payload) -> Result<()> {
        let key = self.tagged_key(key).await?;
        self.store.forever(&key, payload).await
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        let key = self.tagged_key(key).await?;
        self.store.forget(&key).await
    }

    /// Invalidates every entry written under any tag of this view.
    async fn flush(&self) -> Result<()> {
        self.reset().await
    }

    fn supports_tags(&self) -> bool {
        self.store.supports_tags()
    }
}
