// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Query cache telemetry.
//!
//! Every cached execution and invalidation is reported as one event: a
//! `tracing` event when logs are enabled and, with the `metrics` feature, an
//! OpenTelemetry counter increment plus a duration sample.

use std::{sync::Arc, time::Duration};

#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Histogram, Meter},
};
use tick::Clock;

pub(crate) mod attributes;
pub(crate) mod ext;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryOperation {
    Execute,
    Invalidate,
}

impl QueryOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Execute => "query_cache.execute",
            Self::Invalidate => "query_cache.invalidate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryActivity {
    Hit,
    Miss,
    Bypass,
    Invalidated,
    TagsUnsupported,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Level {
    Debug,
    Info,
    Error,
}

impl QueryActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "query_cache.hit",
            Self::Miss => "query_cache.miss",
            Self::Bypass => "query_cache.bypass",
            Self::Invalidated => "query_cache.invalidated",
            Self::TagsUnsupported => "query_cache.tags_unsupported",
            Self::Error => "query_cache.error",
        }
    }

    pub fn level(self) -> Level {
        match self {
            Self::Hit | Self::Bypass | Self::TagsUnsupported => Level::Debug,
            Self::Miss | Self::Invalidated => Level::Info,
            Self::Error => Level::Error,
        }
    }
}

#[derive(Debug)]
struct TelemetryInner {
    clock: Clock,
    logging_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    event_counter: Option<Counter<u64>>,
    #[cfg(any(feature = "metrics", test))]
    operation_duration: Option<Histogram<f64>>,
}

/// Records query cache events.
#[derive(Clone, Debug)]
pub(crate) struct QueryCacheTelemetry {
    inner: Arc<TelemetryInner>,
}

impl QueryCacheTelemetry {
    pub fn new(clock: Clock, logging_enabled: bool) -> Self {
        Self {
            inner: Arc::new(TelemetryInner {
                clock,
                logging_enabled,
                #[cfg(any(feature = "metrics", test))]
                event_counter: None,
                #[cfg(any(feature = "metrics", test))]
                operation_duration: None,
            }),
        }
    }

    #[cfg(any(feature = "metrics", test))]
    pub fn with_meter(clock: Clock, logging_enabled: bool, meter: &Meter) -> Self {
        Self {
            inner: Arc::new(TelemetryInner {
                clock,
                logging_enabled,
                event_counter: Some(metrics::create_event_counter(meter)),
                operation_duration: Some(metrics::create_operation_duration_histogram(meter)),
            }),
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.inner.clock
    }

    pub fn record(&self, model: &str, operation: QueryOperation, activity: QueryActivity, duration: Option<Duration>) {
        #[cfg(any(feature = "metrics", test))]
        {
            let attrs = [
                KeyValue::new(attributes::MODEL, model.to_owned()),
                KeyValue::new(attributes::OPERATION, operation.as_str()),
                KeyValue::new(attributes::ACTIVITY, activity.as_str()),
            ];

            if let Some(c) = &self.inner.event_counter {
                c.add(1, &attrs);
            }

            if let (Some(d), Some(h)) = (duration, &self.inner.operation_duration) {
                h.record(d.as_secs_f64(), &attrs);
            }
        }

        if self.inner.logging_enabled {
            Self::emit(model, operation, activity, duration);
        }
    }

    fn emit(model: &str, operation: QueryOperation, activity: QueryActivity, duration: Option<Duration>) {
        let op = operation.as_str();
        let act = activity.as_str();
        let duration_ns = duration.map(|d| d.as_nanos());

        // Tracing levels must be constant; field names match attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    query_cache.model = model,
                    query_cache.operation = op,
                    query_cache.activity = act,
                    query_cache.duration_ns = ?duration_ns,
                    "query_cache.event"
                )
            };
        }

        match activity.level() {
            Level::Debug => emit_event!(debug),
            Level::Info => emit_event!(info),
            Level::Error => emit_event!(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use opentelemetry::metrics::MeterProvider;

    use super::*;
    use crate::telemetry::testing::{CapturedLogs, RecordedMetrics};

    #[test]
    fn operation_as_str() {
        assert_eq!(QueryOperation::Execute.as_str(), "query_cache.execute");
        assert_eq!(QueryOperation::Invalidate.as_str(), "query_cache.invalidate");
    }

    #[test]
    fn activity_levels() {
        assert_eq!(QueryActivity::Hit.level(), Level::Debug);
        assert_eq!(QueryActivity::Bypass.level(), Level::Debug);
        assert_eq!(QueryActivity::TagsUnsupported.level(), Level::Debug);
        assert_eq!(QueryActivity::Miss.level(), Level::Info);
        assert_eq!(QueryActivity::Invalidated.level(), Level::Info);
        assert_eq!(QueryActivity::Error.level(), Level::Error);
    }

    #[test]
    fn metrics_carry_model_operation_and_activity() {
        let tester = RecordedMetrics::new();
        let meter = tester.provider().meter("query_cache");
        let telemetry = QueryCacheTelemetry::with_meter(Clock::new_frozen(), false, &meter);

        telemetry.record("Order", QueryOperation::Execute, QueryActivity::Hit, Some(Duration::from_millis(5)));

        tester.assert_recorded(&[
            KeyValue::new(attributes::MODEL, "Order"),
            KeyValue::new(attributes::OPERATION, QueryOperation::Execute.as_str()),
            KeyValue::new(attributes::ACTIVITY, QueryActivity::Hit.as_str()),
        ]);
        let names = tester.names();
        assert!(names.iter().any(|name| name == "query_cache.event.count"), "{names:?}");
        assert!(names.iter().any(|name| name == "query_cache.operation.duration"), "{names:?}");
    }

    #[test]
    fn logs_contain_all_fields() {
        let capture = CapturedLogs::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        QueryCacheTelemetry::emit("Order", QueryOperation::Invalidate, QueryActivity::Error, Some(Duration::from_nanos(12345)));

        capture.assert_logged(attributes::MODEL);
        capture.assert_logged(attributes::OPERATION);
        capture.assert_logged(attributes::ACTIVITY);
        capture.assert_logged(attributes::DURATION);
        capture.assert_logged(attributes::EVENT);
        capture.assert_logged("Order");
        capture.assert_logged(QueryActivity::Error.as_str());
        capture.assert_logged("12345");
    }

    #[test]
    fn logs_use_activity_level() {
        let capture = CapturedLogs::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        QueryCacheTelemetry::emit("Order", QueryOperation::Execute, QueryActivity::Miss, None);
        capture.assert_logged("INFO");

        let capture = CapturedLogs::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        QueryCacheTelemetry::emit("Order", QueryOperation::Execute, QueryActivity::Hit, None);
        capture.assert_logged("DEBUG");
    }

    #[test]
    fn disabled_telemetry_emits_nothing() {
        let telemetry = QueryCacheTelemetry::new(Clock::new_frozen(), false);

        let capture = CapturedLogs::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        telemetry.record("Order", QueryOperation::Execute, QueryActivity::Hit, Some(Duration::from_secs(1)));

        assert!(capture.text().is_empty());
    }
}
