//! Probe telemetry used to check an export pipeline end to end.
//!
//! Key signals:
//! - `otel-probe`: one span per run
//! - otel_probe_runs_total: Counter of probe runs
//! - otel_probe_duration_seconds: Histogram of probe run duration

use std::time::Instant;

use opentelemetry::metrics::{Counter, Histogram, Meter, MeterProvider as _};
use opentelemetry::trace::{Span as _, Tracer as _, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::SdkTracer;

use crate::provider::OtelProvider;

/// Instrumentation scope and span name of the probe.
pub const PROBE_NAME: &str = "otel-probe";

/// Probe instruments.
#[derive(Debug)]
pub struct ProbeMetrics {
    /// Total number of probe runs.
    pub runs_total: Counter<u64>,
    /// Histogram of probe run duration in seconds.
    pub duration: Histogram<f64>,
}

impl ProbeMetrics {
    fn new(meter: &Meter) -> Self {
        Self {
            runs_total: meter
                .u64_counter("otel_probe_runs_total")
                .with_description("Total number of probe runs")
                .with_unit("1")
                .build(),
            duration: meter
                .f64_histogram("otel_probe_duration_seconds")
                .with_description("Duration of a probe run")
                .with_unit("s")
                .build(),
        }
    }
}

/// Emits probe telemetry through whichever providers are present.
#[derive(Debug)]
pub struct Probe {
    tracer: Option<SdkTracer>,
    metrics: Option<ProbeMetrics>,
}

impl Probe {
    pub fn new(provider: &OtelProvider) -> Self {
        Self {
            tracer: provider
                .tracer_provider()
                .map(|tracer_provider| tracer_provider.tracer(PROBE_NAME)),
            metrics: provider
                .meter_provider()
                .map(|meter_provider| ProbeMetrics::new(&meter_provider.meter(PROBE_NAME))),
        }
    }

    /// Record one probe span and one probe counter increment.
    pub fn run(&self, attributes: &[KeyValue]) {
        let start = Instant::now();

        if let Some(tracer) = &self.tracer {
            let mut span = tracer.start(PROBE_NAME);
            span.set_attributes(attributes.iter().cloned());
            span.end();
        }

        if let Some(m) = &self.metrics {
            m.runs_total.add(1, attributes);
            m.duration.record(start.elapsed().as_secs_f64(), attributes);
        }

        tracing::debug!(
            traced = self.tracer.is_some(),
            metered = self.metrics.is_some(),
            "Probe recorded"
        );
    }
}
