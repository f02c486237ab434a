// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(any(feature = "metrics", test))]
pub(crate) const MODEL: &str = "query_cache.model";

#[cfg(any(feature = "metrics", test))]
pub(crate) const OPERATION: &str = "query_cache.operation";

#[cfg(any(feature = "metrics", test))]
pub(crate) const ACTIVITY: &str = "query_cache.activity";

#[cfg(test)]
pub(crate) const DURATION: &str = "query_cache.duration_ns";

#[cfg(test)]
pub(crate) const EVENT: &str = "query_cache.event";
