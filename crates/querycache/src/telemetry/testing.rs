// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory sinks for asserting on query cache logs and metrics.

use std::{
    io,
    sync::{Arc, Mutex, PoisonError},
};

use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::{
    InMemoryMetricExporter, SdkMeterProvider,
    data::{AggregatedMetrics, Metric, MetricData, ResourceMetrics, ScopeMetrics},
};
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt};

/// A meter provider whose exports stay in memory.
#[derive(Debug)]
pub(crate) struct RecordedMetrics {
    exporter: InMemoryMetricExporter,
    provider: SdkMeterProvider,
}

impl RecordedMetrics {
    pub fn new() -> Self {
        let exporter = InMemoryMetricExporter::default();
        let provider = SdkMeterProvider::builder().with_periodic_exporter(exporter.clone()).build();
        Self { exporter, provider }
    }

    pub fn provider(&self) -> &SdkMeterProvider {
        &self.provider
    }

    fn collect<T>(&self, mut visit: impl FnMut(&Metric) -> Vec<T>) -> Vec<T> {
        self.provider.force_flush().expect("metrics flush");
        self.exporter
            .get_finished_metrics()
            .expect("exported metrics")
            .iter()
            .flat_map(ResourceMetrics::scope_metrics)
            .flat_map(ScopeMetrics::metrics)
            .flat_map(&mut visit)
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.collect(|metric| vec![metric.name().to_owned()])
    }

    pub fn assert_recorded(&self, expected: &[KeyValue]) {
        let recorded = self.collect(point_attributes);
        for pair in expected {
            assert!(recorded.contains(pair), "{pair:?} was not recorded, got {recorded:?}");
        }
    }
}

macro_rules! attributes_of_points {
    ($data:expr) => {
        match $data {
            MetricData::Gauge(d) => d.data_points().flat_map(|p| p.attributes().cloned()).collect(),
            MetricData::Sum(d) => d.data_points().flat_map(|p| p.attributes().cloned()).collect(),
            MetricData::Histogram(d) => d.data_points().flat_map(|p| p.attributes().cloned()).collect(),
            MetricData::ExponentialHistogram(d) => d.data_points().flat_map(|p| p.attributes().cloned()).collect(),
        }
    };
}

fn point_attributes(metric: &Metric) -> Vec<KeyValue> {
    match metric.data() {
        AggregatedMetrics::F64(data) => attributes_of_points!(data),
        AggregatedMetrics::U64(data) => attributes_of_points!(data),
        AggregatedMetrics::I64(data) => attributes_of_points!(data),
    }
}

/// Formatted `tracing` output kept in a shared buffer.
#[derive(Debug, Clone, Default)]
pub(crate) struct CapturedLogs {
    lines: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install with `tracing::subscriber::set_default`.
    pub fn subscriber(&self) -> impl tracing::Subscriber {
        let layer = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(self.clone());
        tracing_subscriber::registry().with(layer)
    }

    pub fn text(&self) -> String {
        let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&lines).into_owned()
    }

    pub fn assert_logged(&self, needle: &str) {
        let text = self.text();
        assert!(text.contains(needle), "expected `{needle}` in captured logs:\n{text}");
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
