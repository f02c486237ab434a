// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Model-level cache defaults.

/// Cache defaults declared by a model.
///
/// The defaults are copied into a [`CachingQuery`](crate::CachingQuery) when it
/// is created and can still be overridden per call.
///
/// # Examples
///
/// ```
/// use querycache::ModelConfig;
///
/// let config = ModelConfig::new("Order")
///     .cache_for(10)
///     .tags(["orders"])
///     .prefix("shop");
///
/// assert_eq!(config.name(), "Order");
/// assert_eq!(config.minutes(), Some(10));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelConfig {
    name: String,
    minutes: Option<i64>,
    tags: Option<Vec<String>>,
    prefix: Option<String>,
}

impl ModelConfig {
    /// Creates a configuration for the model `name` with caching disabled.
    ///
    /// `name` becomes part of derived cache keys.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            minutes: None,
            tags: None,
            prefix: None,
        }
    }

    /// Caches the model's queries for `minutes` by default. Negative values
    /// cache forever.
    #[must_use]
    pub fn cache_for(mut self, minutes: i64) -> Self {
        self.minutes = Some(minutes);
        self
    }

    /// Caches the model's queries forever by default.
    #[must_use]
    pub fn cache_forever(self) -> Self {
        self.cache_for(-1)
    }

    /// Tags the model's cached queries.
    #[must_use]
    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Overrides the key prefix for the model's queries.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// The model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The default cache duration in minutes, if caching is on by default.
    #[must_use]
    pub fn minutes(&self) -> Option<i64> {
        self.minutes
    }

    /// The default tags.
    #[must_use]
    pub fn tag_names(&self) -> Option<&[String]> {
        self.tags.as_deref()
    }

    /// The key prefix override.
    #[must_use]
    pub fn key_prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

/// A model whose queries can be cached.
///
/// # Examples
///
/// ```
/// use querycache::{Cacheable, ModelConfig};
///
/// struct Order;
///
/// impl Cacheable for Order {
///     fn cache_config() -> ModelConfig {
///         ModelConfig::new("Order").cache_for(5).tags(["orders"])
///     }
/// }
/// ```
pub trait Cacheable {
    /// Returns the model's cache defaults.
    fn cache_config() -> ModelConfig;
}
