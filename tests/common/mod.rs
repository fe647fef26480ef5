//! Test utilities for provider tests.
//!
//! Provides:
//! - Providers backed by in-memory exporters
//! - An error handler recording every reported failure

#![allow(dead_code)]

use std::sync::Mutex;

use opentelemetry_sdk::metrics::{InMemoryMetricExporter, SdkMeterProvider};
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};
use otel_provider::{ErrorHandler, ShutdownError};

/// Tracer and meter providers exporting into memory.
pub struct InMemoryProviders {
    pub span_exporter: InMemorySpanExporter,
    pub metric_exporter: InMemoryMetricExporter,
    pub tracer_provider: SdkTracerProvider,
    pub meter_provider: SdkMeterProvider,
}

impl InMemoryProviders {
    pub fn new() -> Self {
        let span_exporter = InMemorySpanExporter::default();
        let metric_exporter = InMemoryMetricExporter::default();
        let tracer_provider = SdkTracerProvider::builder()
            .with_simple_exporter(span_exporter.clone())
            .build();
        let meter_provider = SdkMeterProvider::builder()
            .with_periodic_exporter(metric_exporter.clone())
            .build();
        Self {
            span_exporter,
            metric_exporter,
            tracer_provider,
            meter_provider,
        }
    }
}

impl Default for InMemoryProviders {
    fn default() -> Self {
        Self::new()
    }
}

/// Error handler keeping the message of every failure it receives.
#[derive(Debug, Default)]
pub struct RecordingErrorHandler {
    errors: Mutex<Vec<String>>,
}

impl RecordingErrorHandler {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().expect("handler lock poisoned").clone()
    }
}

impl ErrorHandler for RecordingErrorHandler {
    fn handle(&self, err: &ShutdownError) {
        self.errors
            .lock()
            .expect("handler lock poisoned")
            .push(err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_handler_starts_empty() {
        assert!(RecordingErrorHandler::default().errors().is_empty());
    }
}
