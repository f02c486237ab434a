// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The caching query decorator.

use querycache_store::{DynamicStore, Error, Expiry, Remembered, Repository, Result, Store, TaggedStore};

use crate::{
    Cacheable, ModelConfig, QueryEngine, StoreManager, fingerprint,
    telemetry::{
        QueryActivity, QueryOperation,
        ext::{ClockExt, TimedResult},
    },
};

/// The key prefix used unless a model or query overrides it.
pub const DEFAULT_PREFIX: &str = "cacheable";

const ALL_COLUMNS: &[&str] = &["*"];

#[derive(Clone, Debug, PartialEq, Eq)]
struct CacheDirective {
    minutes: Option<i64>,
    key: Option<String>,
    tags: Option<Vec<String>>,
    driver: Option<String>,
    prefix: String,
}

impl CacheDirective {
    fn from_config(config: &ModelConfig) -> Self {
        Self {
            minutes: config.minutes(),
            key: None,
            tags: config.tag_names().map(<[String]>::to_vec),
            driver: None,
            prefix: config.key_prefix().unwrap_or(DEFAULT_PREFIX).to_owned(),
        }
    }
}

/// A query whose results can be served from a cache.
///
/// Caching is off unless the model's [`ModelConfig`] declares a duration or
/// [`cache`](Self::cache) (or one of its variants) is called. With caching off,
/// [`execute`](Self::execute) runs the engine directly and behaves exactly as if
/// there were no cache.
///
/// With caching on, `execute` derives a key from the connection name, model
/// name, SQL text and bindings (unless an explicit key was given), looks it up
/// in the selected store and either returns the cached rows or runs the engine
/// once and stores its rows. Rows are cached all together or not at all.
///
/// Concurrent misses on the same key are not coordinated: each runs the engine
/// and the last write wins.
///
/// # Examples
///
/// ```
/// # use querycache::{Binding, QueryEngine};
/// # struct Orders(Vec<Binding>);
/// # impl QueryEngine for Orders {
/// #     type Row = i64;
/// #     type Error = std::io::Error;
/// #     fn connection_name(&self) -> &str { "main" }
/// #     fn to_sql(&self, columns: &[&str]) -> String { format!("SELECT {} FROM orders WHERE id = ?", columns.join(", ")) }
/// #     fn bindings(&self) -> &[Binding] { &self.0 }
/// #     async fn execute(&self, _columns: &[&str]) -> Result<Vec<i64>, std::io::Error> { Ok(vec![42]) }
/// # }
/// use querycache::{CachingQuery, ModelConfig, StoreManager};
/// use querycache_store::testing::MockStore;
/// use tick::Clock;
///
/// # futures::executor::block_on(async {
/// let stores = StoreManager::new(Clock::new_frozen(), MockStore::new());
/// let query = CachingQuery::new(Orders(vec![Binding::Int(42)]), stores, ModelConfig::new("Order"))
///     .cache(10)
///     .with_tags(["orders"]);
///
/// let rows = query.get().await?;
/// assert_eq!(rows, vec![42]);
/// assert!(query.cache_key(&["*"]).starts_with("cacheable:Main_Order_"));
/// # querycache::Result::Ok(())
/// # }).unwrap();
/// ```
#[derive(Debug)]
pub struct CachingQuery<E> {
    engine: E,
    stores: StoreManager,
    model: String,
    directive: CacheDirective,
}

impl<E> CachingQuery<E>
where
    E: QueryEngine,
{
    /// Creates a query for the model described by `config`, starting from the
    /// model's cache defaults.
    #[must_use]
    pub fn new(engine: E, stores: StoreManager, config: ModelConfig) -> Self {
        Self {
            engine,
            stores,
            directive: CacheDirective::from_config(&config),
            model: config.name().to_owned(),
        }
    }

    /// Creates a query for the model `M`.
    #[must_use]
    pub fn for_model<M>(engine: E, stores: StoreManager) -> Self
    where
        M: Cacheable,
    {
        Self::new(engine, stores, M::cache_config())
    }

    /// Caches results for `minutes`. Negative values cache forever; zero runs
    /// the query without storing its results.
    #[must_use]
    pub fn cache(mut self, minutes: i64) -> Self {
        self.directive.minutes = Some(minutes);
        self.directive.key = None;
        self
    }

    /// Caches results for `minutes` under an explicit key. The key prefix is
    /// still applied.
    #[must_use]
    pub fn cache_as(mut self, minutes: i64, key: impl Into<String>) -> Self {
        self.directive.minutes = Some(minutes);
        self.directive.key = Some(key.into());
        self
    }

    /// Caches results forever.
    #[must_use]
    pub fn cache_forever(self) -> Self {
        self.cache(-1)
    }

    /// Caches results forever under an explicit key.
    #[must_use]
    pub fn cache_forever_as(self, key: impl Into<String>) -> Self {
        self.cache_as(-1, key)
    }

    /// Turns caching off and forgets the explicit key and tags.
    #[must_use]
    pub fn disable_cache(mut self) -> Self {
        self.directive.minutes = None;
        self.directive.key = None;
        self.directive.tags = None;
        self
    }

    /// Tags the cached results. Tags are ignored by stores without tag support.
    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.directive.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Uses the store registered as `name` instead of the default store.
    #[must_use]
    pub fn with_driver(mut self, name: impl Into<String>) -> Self {
        self.directive.driver = Some(name.into());
        self
    }

    /// Replaces the key prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.directive.prefix = prefix.into();
        self
    }

    /// Returns `true` if [`execute`](Self::execute) would consult the cache.
    #[must_use]
    pub fn is_caching(&self) -> bool {
        self.directive.minutes.is_some()
    }

    /// The configured duration in minutes, if caching is on.
    #[must_use]
    pub fn minutes(&self) -> Option<i64> {
        self.directive.minutes
    }

    /// The configured tags.
    #[must_use]
    pub fn tags(&self) -> Option<&[String]> {
        self.directive.tags.as_deref()
    }

    /// The model name used in derived keys.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The wrapped engine.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns the key [`execute`](Self::execute) would use for `columns`.
    #[must_use]
    pub fn cache_key(&self, columns: &[&str]) -> String {
        let body = match &self.directive.key {
            Some(key) => key.clone(),
            None => fingerprint::derive_key(
                self.engine.connection_name(),
                &self.model,
                &self.engine.to_sql(columns),
                self.engine.bindings(),
            ),
        };
        fingerprint::cache_key(&self.directive.prefix, &body)
    }

    /// Runs the query for all columns.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    pub async fn get(&self) -> Result<Vec<E::Row>> {
        self.execute(ALL_COLUMNS).await
    }

    /// Runs the query, serving it from the cache when caching is on.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Query`](crate::ErrorKind::Query) wrapping the engine
    /// error if the engine fails (nothing is cached in that case), and the store
    /// error if the selected store is unknown or fails.
    pub async fn execute(&self, columns: &[&str]) -> Result<Vec<E::Row>> {
        let telemetry = self.stores.telemetry();
        let TimedResult { result, duration } = telemetry.clock().timed_async(self.execute_inner(columns)).await;

        let activity = match &result {
            Ok((_, activity)) => *activity,
            Err(_) => QueryActivity::Error,
        };
        telemetry.record(&self.model, QueryOperation::Execute, activity, Some(duration));

        result.map(|(rows, _)| rows)
    }

    async fn execute_inner(&self, columns: &[&str]) -> Result<(Vec<E::Row>, QueryActivity)> {
        let Some(minutes) = self.directive.minutes else {
            return Ok((self.run(columns).await?, QueryActivity::Bypass));
        };

        let key = self.cache_key(columns);
        let store = self.stores.driver(self.directive.driver.as_deref())?;
        let expiry = Expiry::from_minutes(minutes);

        // Population runs the engine directly, never back through the cache.
        let populate = || self.run(columns);

        let outcome = match self.tag_scope(&store) {
            Some(tags) => Repository::new(TaggedStore::new(store, tags)).remember(&key, expiry, populate).await?,
            None => Repository::new(store).remember(&key, expiry, populate).await?,
        };

        tracing::debug!(
            query_cache.key = key.as_str(),
            query_cache.cached = outcome.is_cached(),
            "query_cache.lookup"
        );

        Ok(match outcome {
            Remembered::Cached(rows) => (rows, QueryActivity::Hit),
            Remembered::Fresh(rows) => (rows, QueryActivity::Miss),
        })
    }

    fn tag_scope(&self, store: &DynamicStore) -> Option<Vec<String>> {
        let tags = self.directive.tags.as_ref().filter(|tags| !tags.is_empty())?;
        if store.supports_tags() {
            Some(tags.clone())
        } else {
            tracing::debug!(query_cache.model = self.model.as_str(), "query_cache.tags_ignored");
            None
        }
    }

    async fn run(&self, columns: &[&str]) -> Result<Vec<E::Row>> {
        self.engine.execute(columns).await.map_err(Error::query)
    }

    /// Flushes every entry cached under `tags`, or under the configured tags
    /// when `tags` is `None` or empty.
    ///
    /// Returns `false` without touching the store if the selected store does not
    /// support tags. Entries written concurrently with the flush may survive it.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected store is unknown or fails.
    pub async fn invalidate(&self, tags: Option<&[&str]>) -> Result<bool> {
        let telemetry = self.stores.telemetry();
        let TimedResult { result, duration } = telemetry.clock().timed_async(self.invalidate_inner(tags)).await;

        let activity = match &result {
            Ok(true) => QueryActivity::Invalidated,
            Ok(false) => QueryActivity::TagsUnsupported,
            Err(_) => QueryActivity::Error,
        };
        telemetry.record(&self.model, QueryOperation::Invalidate, activity, Some(duration));

        result
    }

    async fn invalidate_inner(&self, tags: Option<&[&str]>) -> Result<bool> {
        let store = self.stores.driver(self.directive.driver.as_deref())?;
        if !store.supports_tags() {
            return Ok(false);
        }

        let names: Vec<String> = match tags {
            Some(tags) if !tags.is_empty() => tags.iter().map(ToString::to_string).collect(),
            _ => self.directive.tags.clone().unwrap_or_default(),
        };

        TaggedStore::new(store, names).flush().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use querycache_store::testing::MockStore;
    use tick::Clock;

    use super::*;
    use crate::Binding;

    struct Fixed {
        bindings: Vec<Binding>,
    }

    impl QueryEngine for Fixed {
        type Row = u32;
        type Error = std::io::Error;

        fn connection_name(&self) -> &str {
            "main"
        }

        fn to_sql(&self, columns: &[&str]) -> String {
            format!("SELECT {} FROM orders WHERE id = ?", columns.join(", "))
        }

        fn bindings(&self) -> &[Binding] {
            &self.bindings
        }

        async fn execute(&self, _columns: &[&str]) -> std::result::Result<Vec<u32>, std::io::Error> {
            Ok(vec![1])
        }
    }

    fn query(config: ModelConfig) -> CachingQuery<Fixed> {
        let engine = Fixed {
            bindings: vec![Binding::Int(42)],
        };
        CachingQuery::new(engine, StoreManager::new(Clock::new_frozen(), MockStore::new()), config)
    }

    #[test]
    fn caching_is_off_without_model_duration() {
        let query = query(ModelConfig::new("Order"));

        assert!(!query.is_caching());
        assert_eq!(query.tags(), None);
    }

    #[test]
    fn model_defaults_are_copied() {
        let query = query(ModelConfig::new("Order").cache_for(5).tags(["orders"]).prefix("shop"));

        assert_eq!(query.minutes(), Some(5));
        assert_eq!(query.tags(), Some(&["orders".to_owned()][..]));
        assert!(query.cache_key(ALL_COLUMNS).starts_with("shop:Main_Order_"));
    }

    #[test]
    fn directive_state_machine() {
        let query = query(ModelConfig::new("Order")).cache_as(10, "open-orders").with_tags(["orders"]);
        assert_eq!(query.minutes(), Some(10));
        assert_eq!(query.cache_key(ALL_COLUMNS), "cacheable:open-orders");

        let query = query.disable_cache();
        assert!(!query.is_caching());
        assert_eq!(query.tags(), None);
        assert!(query.cache_key(ALL_COLUMNS).starts_with("cacheable:Main_Order_"));

        let query = query.cache_forever();
        assert_eq!(query.minutes(), Some(-1));
    }

    #[test]
    fn cache_without_key_clears_an_explicit_key() {
        let query = query(ModelConfig::new("Order")).cache_forever_as("k").cache(5);

        assert!(query.cache_key(ALL_COLUMNS).starts_with("cacheable:Main_Order_"));
    }

    #[test]
    fn explicit_key_is_prefixed() {
        let query = query(ModelConfig::new("Order")).cache_forever_as("k").with_prefix("p");

        assert_eq!(query.cache_key(ALL_COLUMNS), "p:k");
    }

    #[test]
    fn columns_take_part_in_the_derived_key() {
        let query = query(ModelConfig::new("Order")).cache(5);

        assert_ne!(query.cache_key(&["*"]), query.cache_key(&["id"]));
    }

    #[test]
    fn directive_from_config_defaults_prefix() {
        let directive = CacheDirective::from_config(&ModelConfig::new("Order"));

        assert_eq!(
            directive,
            CacheDirective {
                minutes: None,
                key: None,
                tags: None,
                driver: None,
                prefix: DEFAULT_PREFIX.to_owned(),
            }
        );
    }

    #[test]
    fn execute_records_miss_then_hit() {
        let capture = crate::telemetry::testing::CapturedLogs::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        let stores = StoreManager::builder(Clock::new_frozen())
            .store("mock", MockStore::new())
            .with_logs()
            .build()
            .expect("single store registry is valid");
        let engine = Fixed {
            bindings: vec![Binding::Int(42)],
        };
        let query = CachingQuery::new(engine, stores, ModelConfig::new("Order")).cache(5);

        futures::executor::block_on(async {
            query.get().await.expect("first read");
            query.get().await.expect("second read");
            query.invalidate(None).await.expect("invalidate");
        });

        capture.assert_logged(QueryActivity::Miss.as_str());
        capture.assert_logged(QueryActivity::Hit.as_str());
        capture.assert_logged(QueryActivity::Invalidated.as_str());
    }
}
