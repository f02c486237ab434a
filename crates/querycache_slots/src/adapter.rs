// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{collections::HashMap, fmt::Debug, sync::Arc, time::Duration};

use querycache_store::{Error, Payload, Result, Store};
use regex::Regex;

use crate::{
    backend::{SlotBackend, SlotValue},
    pattern,
};

/// A [`Store`] over a [`SlotBackend`].
///
/// Every key is prefixed with the store prefix before it reaches the backend.
/// Bulk deletion enumerates the whole backend through its listing API, so it
/// sees (and may delete) keys written by other consumers of the same backend.
///
/// [`flush`](Store::flush) clears the entire backend, not just this store's
/// prefix.
///
/// # Examples
///
/// ```
/// use querycache_slots::{SharedSlots, SlotStore};
/// use querycache_store::Store;
/// use tick::Clock;
///
/// # futures::executor::block_on(async {
/// let store = SlotStore::new(SharedSlots::builder(Clock::new_frozen()).build()).with_prefix("app:");
///
/// store.forever("cacheable:1", b"1".to_vec()).await?;
/// assert_eq!(store.keys()?, vec!["app:cacheable:1".to_owned()]);
///
/// assert_eq!(store.delete("cacheable:*")?, 1);
/// # querycache_store::Result::Ok(())
/// # }).unwrap();
/// ```
pub struct SlotStore<B> {
    backend: Arc<B>,
    prefix: String,
}

impl<B> Clone for SlotStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            prefix: self.prefix.clone(),
        }
    }
}

impl<B> Debug for SlotStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotStore").field("prefix", &self.prefix).finish_non_exhaustive()
    }
}

impl<B> SlotStore<B>
where
    B: SlotBackend,
{
    /// Creates an adapter with an empty prefix.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    /// Creates an adapter over a backend that is shared with other consumers.
    #[must_use]
    pub fn from_shared(backend: Arc<B>) -> Self {
        Self {
            backend,
            prefix: String::new(),
        }
    }

    /// Sets the prefix prepended to every key.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns the prefix prepended to every key.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Adds `delta` to the counter under `key` and returns the new value.
    ///
    /// A missing counter starts at zero.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotNumeric`](querycache_store::ErrorKind::NotNumeric)
    /// if the stored value is not a counter.
    pub fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        self.backend.increment(&self.prefixed(key), delta)
    }

    /// Subtracts `delta` from the counter under `key` and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotNumeric`](querycache_store::ErrorKind::NotNumeric)
    /// if the stored value is not a counter.
    pub fn decrement(&self, key: &str, delta: i64) -> Result<i64> {
        let negated = delta
            .checked_neg()
            .ok_or_else(|| Error::not_numeric(format!("cannot decrement by {delta}")))?;
        self.increment(key, negated)
    }

    /// Deletes `pattern` and returns how many entries were removed.
    ///
    /// The store prefix is prepended unless `pattern` already starts with it. A
    /// pattern containing `*` deletes every key that contains a match, with `*`
    /// standing for any sequence of characters. The match is not anchored, so
    /// `Main_*` also removes `cacheable:Main_Order_1`. Otherwise exactly one key
    /// is deleted.
    ///
    /// # Errors
    ///
    /// Wildcard patterns enumerate the backend and fail with
    /// [`ErrorKind::Configuration`](querycache_store::ErrorKind::Configuration)
    /// if the backend's listing API is locked.
    pub fn delete(&self, pattern: &str) -> Result<u64> {
        let key = self.resolve(pattern);

        if key.contains('*') {
            return self.delete_matching(&pattern::wildcard(&key)?);
        }

        Ok(u64::from(self.backend.unset(&key)))
    }

    /// Deletes every key, as stored, that starts with `prefix`.
    ///
    /// The store prefix is not prepended. This enumerates the entire backend.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Configuration`](querycache_store::ErrorKind::Configuration)
    /// if the backend's listing API is locked.
    pub fn delete_by_prefix(&self, prefix: &str) -> Result<u64> {
        let keys = self.keys()?;
        let count = self.unset_all(keys.iter().filter(|key| key.starts_with(prefix)));
        tracing::info!(
            query_cache.prefix = prefix,
            query_cache.deleted = count,
            "query_cache.bulk_delete"
        );
        Ok(count)
    }

    /// Deletes every key, as stored, that matches `pattern`.
    ///
    /// `pattern` is either a bare regex (`^cacheable:\d`) or a delimited one
    /// with optional flags (`/cacheable:\d/i`). This enumerates the entire
    /// backend.
    ///
    /// A pattern whose first character is not alphanumeric, whitespace or `\`
    /// is tried as a delimited pattern first. It is used bare only when no
    /// closing delimiter follows or the trailing characters are not flags. A
    /// leading bracket pairs with its closing bracket, so `[12]` is the literal
    /// `12`, not a character class. Wrap such patterns in delimiters
    /// (`/[12]/`) to use them as written.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidPattern`](querycache_store::ErrorKind::InvalidPattern)
    /// if `pattern` does not compile and
    /// [`ErrorKind::Configuration`](querycache_store::ErrorKind::Configuration)
    /// if the backend's listing API is locked.
    pub fn delete_by_regex(&self, pattern: &str) -> Result<u64> {
        self.delete_matching(&pattern::regex(pattern)?)
    }

    /// Lists every live key in the backend, as stored.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Configuration`](querycache_store::ErrorKind::Configuration)
    /// if the backend's listing API is locked.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.check_auth()?;
        Ok((0..self.backend.slot_count())
            .flat_map(|slot| self.backend.list(slot))
            .map(|listing| listing.name)
            .collect())
    }

    /// Reads several keys. The result is keyed by the keys as given, without
    /// the store prefix.
    ///
    /// # Errors
    ///
    /// Returns the first store error encountered.
    pub async fn many<'a, I>(&self, keys: I) -> Result<HashMap<String, Option<Payload>>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut found = HashMap::new();
        for key in keys {
            found.insert(key.to_owned(), self.get(key).await?);
        }
        Ok(found)
    }

    /// Writes several entries with the same TTL.
    ///
    /// The batch is not atomic: a failure partway through leaves the earlier
    /// entries written.
    ///
    /// # Errors
    ///
    /// Returns the first store error encountered.
    pub async fn put_many<K, I>(&self, entries: I, ttl: Duration) -> Result<()>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Payload)>,
    {
        for (key, payload) in entries {
            self.put(key.as_ref(), payload, ttl).await?;
        }
        Ok(())
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    fn resolve(&self, key: &str) -> String {
        if self.prefix.is_empty() || key.starts_with(&self.prefix) {
            key.to_owned()
        } else {
            self.prefixed(key)
        }
    }

    fn check_auth(&self) -> Result<()> {
        if !self.backend.admin_auth_enabled() {
            return Ok(());
        }

        tracing::error!("query_cache.enumeration_locked");
        Err(Error::configuration(
            "enumerating the slot store requires its administrative authentication to be disabled; \
             reconfigure the backend with admin auth off to use prefix, pattern and wildcard deletion",
        ))
    }

    fn delete_matching(&self, regex: &Regex) -> Result<u64> {
        let keys = self.keys()?;
        let count = self.unset_all(keys.iter().filter(|key| regex.is_match(key)));
        tracing::info!(
            query_cache.pattern = regex.as_str(),
            query_cache.deleted = count,
            "query_cache.bulk_delete"
        );
        Ok(count)
    }

    fn unset_all<'a>(&self, keys: impl Iterator<Item = &'a String>) -> u64 {
        keys.map(|key| u64::from(self.backend.unset(key))).sum()
    }

    fn write(&self, key: &str, payload: Payload, ttl_secs: u64) {
        let key = self.prefixed(key);
        if !self.backend.set(&key, SlotValue::Bytes(payload), ttl_secs) {
            tracing::warn!(query_cache.key = key.as_str(), "query_cache.write_refused");
        }
    }
}

/// Whole seconds for a backend TTL, rounded up and never zero since zero means
/// "never expire" to the backend.
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs().saturating_add(u64::from(ttl.subsec_nanos() > 0));
    secs.max(1)
}

impl<B> Store for SlotStore<B>
where
    B: SlotBackend,
{
    async fn get(&self, key: &str) -> Result<Option<Payload>> {
        Ok(self.backend.get(&self.prefixed(key)).map(SlotValue::into_payload))
    }

    async fn put(&self, key: &str, payload: Payload, ttl: Duration) -> Result<()> {
        self.write(key, payload, ttl_secs(ttl));
        Ok(())
    }

    async fn forever(&self, key: &str, payload: Payload) -> Result<()> {
        self.write(key, payload, 0);
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        Ok(self.backend.unset(&self.prefixed(key)))
    }

    async fn flush(&self) -> Result<()> {
        self.backend.clear();
        tracing::info!(query_cache.prefix = self.prefix.as_str(), "query_cache.backend_cleared");
        Ok(())
    }

    fn supports_tags(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_rounds_up_to_whole_seconds() {
        assert_eq!(ttl_secs(Duration::from_secs(300)), 300);
        assert_eq!(ttl_secs(Duration::from_millis(1500)), 2);
    }

    #[test]
    fn ttl_is_never_the_forever_sentinel() {
        assert_eq!(ttl_secs(Duration::ZERO), 1);
        assert_eq!(ttl_secs(Duration::from_nanos(1)), 1);
    }
}
