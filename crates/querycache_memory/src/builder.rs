// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring in-memory stores.
//!
//! The builder keeps moka's types out of the public API.

use tick::Clock;

use crate::store::InMemoryStore;

/// Builder for configuring an [`InMemoryStore`].
///
/// # Examples
///
/// ```
/// use querycache_memory::InMemoryStore;
/// use tick::Clock;
///
/// let store = InMemoryStore::builder(Clock::new_frozen())
///     .max_capacity(1000)
///     .initial_capacity(100)
///     .name("query-results")
///     .build();
/// ```
#[derive(Debug)]
pub struct InMemoryStoreBuilder {
    pub(crate) clock: Clock,
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) name: Option<String>,
}

impl InMemoryStoreBuilder {
    /// Creates a builder whose store evaluates expiry against `clock`.
    ///
    /// The default configuration is unbounded.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            max_capacity: None,
            initial_capacity: None,
            name: None,
        }
    }

    /// Sets the maximum number of entries.
    ///
    /// Once reached, entries are evicted using moka's `TinyLFU` policy. Tag
    /// version entries count towards the capacity like any other entry.
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets a pre-allocation hint.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets a name that appears in moka's debugging output and in logs.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured store.
    #[must_use]
    pub fn build(self) -> InMemoryStore {
        InMemoryStore::from_builder(self)
    }
}
