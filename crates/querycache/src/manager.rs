// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Named store registry.

use std::{collections::HashMap, fmt::Debug, sync::Arc};

#[cfg(feature = "metrics")]
use opentelemetry::metrics::{Meter, MeterProvider};
use querycache_store::{DynamicStore, Error, Result, Store, StoreExt};
use tick::Clock;

use crate::telemetry::QueryCacheTelemetry;

/// The name a store gets when registered through [`StoreManager::new`].
pub const DEFAULT_DRIVER: &str = "default";

struct Inner {
    stores: HashMap<String, DynamicStore>,
    default_driver: String,
    telemetry: QueryCacheTelemetry,
}

/// A registry of named stores ("drivers") shared by caching queries.
///
/// Queries pick a store by name with
/// [`CachingQuery::with_driver`](crate::CachingQuery::with_driver) or fall back
/// to the default driver. Clones share the same registry.
///
/// # Examples
///
/// ```
/// use querycache::StoreManager;
/// use querycache_store::testing::MockStore;
/// use tick::Clock;
///
/// let stores = StoreManager::builder(Clock::new_frozen())
///     .store("memory", MockStore::new())
///     .store("slots", MockStore::without_tags())
///     .default_driver("memory")
///     .build()?;
///
/// assert_eq!(stores.default_driver(), "memory");
/// assert!(stores.driver(Some("slots")).is_ok());
/// assert!(stores.driver(Some("redis")).is_err());
/// # querycache_store::Result::Ok(())
/// ```
#[derive(Clone)]
pub struct StoreManager {
    inner: Arc<Inner>,
}

impl Debug for StoreManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut drivers: Vec<&str> = self.drivers().collect();
        drivers.sort_unstable();
        f.debug_struct("StoreManager")
            .field("drivers", &drivers)
            .field("default_driver", &self.inner.default_driver)
            .finish_non_exhaustive()
    }
}

impl StoreManager {
    /// Creates a registry holding `store` as its only, default, driver.
    #[must_use]
    pub fn new(clock: Clock, store: impl Store + 'static) -> Self {
        Self::from_parts(
            HashMap::from([(DEFAULT_DRIVER.to_owned(), store.into_dynamic())]),
            DEFAULT_DRIVER.to_owned(),
            QueryCacheTelemetry::new(clock, false),
        )
    }

    /// Creates a builder for registering several stores.
    #[must_use]
    pub fn builder(clock: Clock) -> StoreManagerBuilder {
        StoreManagerBuilder {
            clock,
            stores: HashMap::new(),
            default_driver: None,
            logs: false,
            #[cfg(feature = "metrics")]
            meter: None,
        }
    }

    fn from_parts(stores: HashMap<String, DynamicStore>, default_driver: String, telemetry: QueryCacheTelemetry) -> Self {
        Self {
            inner: Arc::new(Inner {
                stores,
                default_driver,
                telemetry,
            }),
        }
    }

    /// Returns the store registered as `name`, or the default store for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownStore`](crate::ErrorKind::UnknownStore) if no store is registered under the
    /// name.
    pub fn driver(&self, name: Option<&str>) -> Result<DynamicStore> {
        let name = name.unwrap_or(&self.inner.default_driver);
        self.inner
            .stores
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_store(format!("no cache store is registered as '{name}'")))
    }

    /// The name of the default driver.
    #[must_use]
    pub fn default_driver(&self) -> &str {
        &self.inner.default_driver
    }

    /// The names of all registered drivers, in no particular order.
    pub fn drivers(&self) -> impl Iterator<Item = &str> {
        self.inner.stores.keys().map(String::as_str)
    }

    pub(crate) fn telemetry(&self) -> &QueryCacheTelemetry {
        &self.inner.telemetry
    }
}

/// Builder for [`StoreManager`].
pub struct StoreManagerBuilder {
    clock: Clock,
    stores: HashMap<String, DynamicStore>,
    default_driver: Option<String>,
    logs: bool,
    #[cfg(feature = "metrics")]
    meter: Option<Meter>,
}

impl Debug for StoreManagerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreManagerBuilder")
            .field("drivers", &self.stores.keys().collect::<Vec<_>>())
            .field("default_driver", &self.default_driver)
            .field("logs", &self.logs)
            .finish_non_exhaustive()
    }
}

impl StoreManagerBuilder {
    /// Registers `store` as `name`, replacing any store already registered
    /// under that name.
    #[must_use]
    pub fn store(mut self, name: impl Into<String>, store: impl Store + 'static) -> Self {
        self.stores.insert(name.into(), store.into_dynamic());
        self
    }

    /// Selects the driver used when a query does not name one.
    ///
    /// Optional when exactly one store is registered.
    #[must_use]
    pub fn default_driver(mut self, name: impl Into<String>) -> Self {
        self.default_driver = Some(name.into());
        self
    }

    /// Emits a `tracing` event for every cached execution and invalidation.
    #[must_use]
    pub fn with_logs(mut self) -> Self {
        self.logs = true;
        self
    }

    /// Records OpenTelemetry metrics using `provider`.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn with_metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.meter = Some(crate::telemetry::metrics::create_meter(provider));
        self
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Configuration`](crate::ErrorKind::Configuration) if no store is registered, or if no
    /// default driver was chosen among several stores, and
    /// [`ErrorKind::UnknownStore`](crate::ErrorKind::UnknownStore) if the chosen default is not registered.
    pub fn build(self) -> Result<StoreManager> {
        let default_driver = match self.default_driver {
            Some(name) => name,
            None => match self.stores.keys().next() {
                Some(only) if self.stores.len() == 1 => only.clone(),
                Some(_) => return Err(Error::configuration("several cache stores are registered but no default driver was chosen")),
                None => return Err(Error::configuration("no cache store is registered")),
            },
        };

        if !self.stores.contains_key(&default_driver) {
            return Err(Error::unknown_store(format!("default driver '{default_driver}' is not registered")));
        }

        #[cfg(feature = "metrics")]
        let telemetry = match &self.meter {
            Some(meter) => QueryCacheTelemetry::with_meter(self.clock, self.logs, meter),
            None => QueryCacheTelemetry::new(self.clock, self.logs),
        };
        #[cfg(not(feature = "metrics"))]
        let telemetry = QueryCacheTelemetry::new(self.clock, self.logs);

        Ok(StoreManager::from_parts(self.stores, default_driver, telemetry))
    }
}

#[cfg(test)]
mod tests {
    use querycache_store::testing::MockStore;

    use super::*;
    use crate::ErrorKind;

    fn clock() -> Clock {
        Clock::new_frozen()
    }

    #[test]
    fn single_store_becomes_the_default() {
        let stores = StoreManager::builder(clock()).store("memory", MockStore::new()).build().expect("valid registry");

        assert_eq!(stores.default_driver(), "memory");
        assert!(stores.driver(None).is_ok());
    }

    #[test]
    fn new_registers_the_default_driver() {
        let stores = StoreManager::new(clock(), MockStore::new());

        assert_eq!(stores.default_driver(), DEFAULT_DRIVER);
        assert_eq!(stores.drivers().collect::<Vec<_>>(), vec![DEFAULT_DRIVER]);
    }

    #[test]
    fn unknown_driver_fails() {
        let stores = StoreManager::new(clock(), MockStore::new());

        let error = stores.driver(Some("redis")).expect_err("redis is not registered");
        assert_eq!(error.kind(), ErrorKind::UnknownStore);
    }

    #[test]
    fn ambiguous_default_fails() {
        let error = StoreManager::builder(clock())
            .store("a", MockStore::new())
            .store("b", MockStore::new())
            .build()
            .expect_err("no default among two stores");

        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn empty_registry_fails() {
        let error = StoreManager::builder(clock()).build().expect_err("no stores");
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn unregistered_default_fails() {
        let error = StoreManager::builder(clock())
            .store("a", MockStore::new())
            .default_driver("b")
            .build()
            .expect_err("default is not registered");

        assert_eq!(error.kind(), ErrorKind::UnknownStore);
    }

    #[test]
    fn drivers_share_the_registered_store() {
        futures::executor::block_on(async {
            let mock = MockStore::new();
            let stores = StoreManager::new(clock(), mock.clone());

            stores.driver(None).expect("default").forever("k", b"1".to_vec()).await.expect("write");

            assert_eq!(mock.raw("k"), Some(b"1".to_vec()));
        });
    }

    #[test]
    fn debug_lists_drivers() {
        let stores = StoreManager::builder(clock())
            .store("b", MockStore::new())
            .store("a", MockStore::new())
            .default_driver("a")
            .build()
            .expect("valid registry");

        let debug = format!("{stores:?}");
        assert!(debug.contains(r#"["a", "b"]"#), "got: {debug}");
    }
}
