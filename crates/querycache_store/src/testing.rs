// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock store for testing.
//!
//! [`MockStore`] keeps entries in memory, records every operation and supports
//! failure injection, so code layered on a [`Store`] can be tested against both
//! happy and failing backends.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{Error, Payload, Result, Store};

/// Recorded store operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// A get was performed for the key.
    Get(String),
    /// A put was performed.
    Put {
        /// The key written.
        key: String,
        /// The payload written.
        payload: Payload,
        /// The requested time-to-live.
        ttl: Duration,
    },
    /// A forever write was performed.
    Forever {
        /// The key written.
        key: String,
        /// The payload written.
        payload: Payload,
    },
    /// A forget was performed for the key.
    Forget(String),
    /// A flush was performed.
    Flush,
}

impl StoreOp {
    /// Returns the key this operation targeted, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Get(key) | Self::Forget(key) | Self::Put { key, .. } | Self::Forever { key, .. } => Some(key),
            Self::Flush => None,
        }
    }
}

type FailPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;

/// A configurable mock store for testing.
///
/// TTLs are recorded but not enforced. Clones share state.
///
/// # Examples
///
/// ```
/// use querycache_store::{Store, testing::{MockStore, StoreOp}};
///
/// # futures::executor::block_on(async {
/// let store = MockStore::new();
/// store.forever("key", b"42".to_vec()).await.unwrap();
/// assert_eq!(store.get("key").await.unwrap(), Some(b"42".to_vec()));
///
/// store.fail_when(|op| matches!(op, StoreOp::Get(_)));
/// assert!(store.get("key").await.is_err());
/// # });
/// ```
pub struct MockStore {
    data: Arc<Mutex<HashMap<String, Payload>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
    tags_supported: bool,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .field("tags_supported", &self.tags_supported)
            .finish()
    }
}

impl Clone for MockStore {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
            tags_supported: self.tags_supported,
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Creates an empty mock store that supports tags.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
            tags_supported: true,
        }
    }

    /// Creates an empty mock store that reports no tag support.
    #[must_use]
    pub fn without_tags() -> Self {
        Self {
            tags_supported: false,
            ..Self::new()
        }
    }

    /// Writes a raw payload directly, bypassing operation recording.
    pub fn set_raw(&self, key: impl Into<String>, payload: impl Into<Payload>) {
        self.data.lock().insert(key.into(), payload.into());
    }

    /// Returns the raw payload under `key` without recording an operation.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Payload> {
        self.data.lock().get(key).cloned()
    }

    /// Returns the stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.data.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Sets a predicate selecting the operations that fail with an unavailable error.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a copy of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: StoreOp) -> Result<()> {
        let failed = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);
        if failed {
            Err(Error::unavailable("mock: operation failed"))
        } else {
            Ok(())
        }
    }
}

impl Store for MockStore {
    async fn get(&self, key: &str) -> Result<Option<Payload>> {
        self.record(StoreOp::Get(key.to_owned()))?;
        Ok(self.data.lock().get(key).cloned())
    }

    async fn put(&self, key: &str, payload: Payload, ttl: Duration) -> Result<()> {
        self.record(StoreOp::Put {
            key: key.to_owned(),
            payload: payload.clone(),
            ttl,
        })?;
        self.data.lock().insert(key.to_owned(), payload);
        Ok(())
    }

    async fn forever(&self, key: &str, payload: Payload) -> Result<()> {
        self.record(StoreOp::Forever {
            key: key.to_owned(),
            payload: payload.clone(),
        })?;
        self.data.lock().insert(key.to_owned(), payload);
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        self.record(StoreOp::Forget(key.to_owned()))?;
        Ok(self.data.lock().remove(key).is_some())
    }

    async fn flush(&self) -> Result<()> {
        self.record(StoreOp::Flush)?;
        self.data.lock().clear();
        Ok(())
    }

    fn supports_tags(&self) -> bool {
        self.tags_supported
    }
}
