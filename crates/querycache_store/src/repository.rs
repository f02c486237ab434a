// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Compute-if-absent over a [`Store`].

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Expiry, Result, Store};

/// The outcome of [`Repository::remember`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Remembered<T> {
    /// The value was read from the store; the computation did not run.
    Cached(T),
    /// The value was computed (and stored unless the expiry was immediate).
    Fresh(T),
}

impl<T> Remembered<T> {
    /// Returns `true` if the value came from the store.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }

    /// Consumes the outcome and returns the value.
    #[must_use]
    pub fn into_value(self) -> T {
        match self {
            Self::Cached(value) | Self::Fresh(value) => value,
        }
    }
}

/// Typed, compute-if-absent access to a [`Store`].
///
/// Values are encoded as JSON payloads. A stored payload that cannot be decoded
/// into the requested type is treated as a miss: it is logged, recomputed and
/// overwritten rather than surfaced as an error.
///
/// There is no coordination between concurrent callers. Two callers missing the
/// same key at once both run their computation and both write; the last write
/// wins.
///
/// # Examples
///
/// ```
/// use querycache_store::{Expiry, Repository, Store};
///
/// # async fn example(store: impl Store) -> querycache_store::Result<()> {
/// let repository = Repository::new(store);
/// let rows = repository
///     .remember("orders:open", Expiry::from_minutes(5), || async { Ok(vec![1, 2, 3]) })
///     .await?
///     .into_value();
/// assert_eq!(rows, vec![1, 2, 3]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Repository<S> {
    store: S,
}

impl<S> Repository<S>
where
    S: Store,
{
    /// Creates a repository over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the decoded value under `key`, computing and storing it on a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails, if `compute` fails (nothing is stored
    /// in that case), or if the computed value cannot be encoded.
    pub async fn remember<T, F, Fut>(&self, key: &str, expiry: Expiry, compute: F) -> Result<Remembered<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.lookup(key).await? {
            return Ok(Remembered::Cached(value));
        }

        let value = compute().await?;
        self.store_value(key, &value, expiry).await?;
        Ok(Remembered::Fresh(value))
    }

    /// Like [`remember`](Self::remember) with an entry that never expires.
    ///
    /// # Errors
    ///
    /// Same as [`remember`](Self::remember).
    pub async fn remember_forever<T, F, Fut>(&self, key: &str, compute: F) -> Result<Remembered<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.remember(key, Expiry::Forever, compute).await
    }

    /// Reads and decodes the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails. Undecodable payloads yield `Ok(None)`.
    pub async fn lookup<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(payload) = self.store.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_slice(&payload) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(
                    query_cache.key = key,
                    query_cache.payload_len = payload.len(),
                    error = %e,
                    "query_cache.undecodable_payload"
                );
                Ok(None)
            }
        }
    }

    /// Encodes and stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the store write fails.
    pub async fn store_value<T>(&self, key: &str, value: &T, expiry: Expiry) -> Result<()>
    where
        T: Serialize,
    {
        let payload = serde_json::to_vec(value).map_err(Error::serialization)?;
        match expiry {
            Expiry::Forever => self.store.forever(key, payload).await,
            Expiry::Ttl(_) if expiry.is_immediate() => {
                tracing::debug!(query_cache.key = key, "query_cache.zero_ttl_skipped");
                Ok(())
            }
            Expiry::Ttl(ttl) => self.store.put(key, payload, ttl).await,
        }
    }
}
