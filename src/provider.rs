//! Tracer and meter provider initialization.
//!
//! [`initialize`] turns a [`Config`] into an [`OtelProvider`] holding at most
//! one tracer provider and one meter provider:
//! - Tracing: OTLP/gRPC span exporter behind a batch span processor
//! - Metrics: OTLP/gRPC metric exporter behind a periodic reader
//!
//! A provider supplied through the config is used verbatim and no exporter is
//! built for it.

use std::sync::Arc;
use std::time::Duration;

use opentelemetry::global;
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{BatchSpanProcessor, SdkTracerProvider};
use opentelemetry_sdk::Resource;

use crate::config::Config;
use crate::error::{ExporterError, ProviderError, ShutdownError};
use crate::error_handler::ErrorHandler;
use crate::exporter::{self, ExportSettings};
use crate::resource::build_resource;

/// Handle pair returned by [`initialize`].
#[derive(Debug, Clone)]
pub struct OtelProvider {
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
    error_handler: Arc<dyn ErrorHandler>,
}

/// Build the providers described by `config`.
///
/// Returns `Ok(None)` when both tracing and metrics are disabled. Exporters
/// are created lazily-connected, so this must run inside a Tokio runtime
/// whenever an exporter is actually built.
///
/// # Errors
///
/// Fails when an exporter cannot be constructed. The error names the
/// exporter kind, and nothing built up to that point is returned.
pub fn initialize(config: Config) -> Result<Option<OtelProvider>, ProviderError> {
    if !config.enabled() {
        tracing::debug!("Tracing and metrics disabled, no provider built");
        return Ok(None);
    }

    let resource = build_resource(&config);

    let mut built_tracer = false;
    let tracer_provider = if config.enable_tracing {
        match config.sdk_tracer_provider.clone() {
            Some(provider) => Some(provider),
            None => {
                let provider = build_tracer_provider(&config, resource.clone())
                    .map_err(ProviderError::TraceExporter)?;
                built_tracer = true;
                Some(provider)
            }
        }
    } else {
        None
    };

    let meter_provider = if config.enable_metrics {
        match config.meter_provider.clone() {
            Some(provider) => Some(provider),
            None => match build_meter_provider(&config, resource) {
                Ok(provider) => Some(provider),
                Err(err) => {
                    if let Some(provider) = tracer_provider.filter(|_| built_tracer) {
                        discard_tracer_provider(&provider, config.error_handler.as_ref());
                    }
                    return Err(ProviderError::MetricExporter(err));
                }
            },
        }
    } else {
        None
    };

    tracing::debug!(
        tracing = tracer_provider.is_some(),
        metrics = meter_provider.is_some(),
        endpoint = config.export_endpoint().unwrap_or("default"),
        "OpenTelemetry providers initialized"
    );

    Ok(Some(OtelProvider {
        tracer_provider,
        meter_provider,
        error_handler: config.error_handler,
    }))
}

/// Shut down a tracer provider that is never handed out. A failure goes to
/// `handler` like any other shutdown failure.
fn discard_tracer_provider(provider: &SdkTracerProvider, handler: &dyn ErrorHandler) {
    if let Err(err) = provider.shutdown() {
        handler.handle(&ShutdownError::Tracer(err));
    }
}

fn build_tracer_provider(
    config: &Config,
    resource: Resource,
) -> Result<SdkTracerProvider, ExporterError> {
    let settings = ExportSettings::from_config(config)?;
    let exporter = exporter::span_exporter(&settings)?;
    let batch_processor = BatchSpanProcessor::builder(exporter).build();

    Ok(SdkTracerProvider::builder()
        .with_sampler(config.sampler.clone())
        .with_resource(resource)
        .with_span_processor(batch_processor)
        .build())
}

fn build_meter_provider(
    config: &Config,
    resource: Resource,
) -> Result<SdkMeterProvider, ExporterError> {
    let settings = ExportSettings::from_config(config)?;
    let exporter = exporter::metric_exporter(&settings)?;
    let periodic_reader = PeriodicReader::builder(exporter)
        .with_interval(config.metrics_interval)
        .build();

    Ok(SdkMeterProvider::builder()
        .with_reader(periodic_reader)
        .with_resource(resource)
        .build())
}

impl OtelProvider {
    pub fn tracer_provider(&self) -> Option<&SdkTracerProvider> {
        self.tracer_provider.as_ref()
    }

    pub fn meter_provider(&self) -> Option<&SdkMeterProvider> {
        self.meter_provider.as_ref()
    }

    /// Install the present providers as the [`opentelemetry::global`] ones,
    /// together with the W3C trace context propagator.
    pub fn set_global(&self) {
        if let Some(provider) = &self.tracer_provider {
            global::set_tracer_provider(provider.clone());
            global::set_text_map_propagator(TraceContextPropagator::new());
        }
        if let Some(provider) = &self.meter_provider {
            global::set_meter_provider(provider.clone());
        }
    }

    /// Shut down the tracer provider, then the meter provider.
    ///
    /// Both are always attempted. Every failure goes to the error handler and
    /// the last one is returned.
    pub fn shutdown(&self) -> Result<(), ShutdownError> {
        self.shutdown_each(SdkTracerProvider::shutdown, SdkMeterProvider::shutdown)
    }

    /// Like [`Self::shutdown`], bounding each provider's flush by `timeout`.
    pub fn shutdown_with_timeout(&self, timeout: Duration) -> Result<(), ShutdownError> {
        self.shutdown_each(
            |provider| provider.shutdown_with_timeout(timeout),
            |provider| provider.shutdown_with_timeout(timeout),
        )
    }

    fn shutdown_each<T, M>(&self, shutdown_tracer: T, shutdown_meter: M) -> Result<(), ShutdownError>
    where
        T: FnOnce(&SdkTracerProvider) -> OTelSdkResult,
        M: FnOnce(&SdkMeterProvider) -> OTelSdkResult,
    {
        let mut last_error = None;

        if let Some(provider) = &self.tracer_provider {
            if let Err(err) = shutdown_tracer(provider) {
                last_error = Some(self.report(ShutdownError::Tracer(err)));
            }
        }
        if let Some(provider) = &self.meter_provider {
            if let Err(err) = shutdown_meter(provider) {
                last_error = Some(self.report(ShutdownError::Meter(err)));
            }
        }

        match last_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn report(&self, err: ShutdownError) -> ShutdownError {
        self.error_handler.handle(&err);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use opentelemetry_sdk::error::OTelSdkError;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct CollectingHandler(Mutex<Vec<String>>);

    impl ErrorHandler for CollectingHandler {
        fn handle(&self, err: &ShutdownError) {
            self.0.lock().unwrap().push(err.to_string());
        }
    }

    #[test]
    fn test_disabled_config_returns_none() {
        let config = Config::builder()
            .with_tracing(false)
            .with_metrics(false)
            .with_export_endpoint("not a valid endpoint")
            .with_sdk_tracer_provider(SdkTracerProvider::builder().build())
            .build();

        assert!(initialize(config).unwrap().is_none());
    }

    #[test]
    fn test_tracer_override_skips_exporter() {
        // An exporter built from this endpoint would fail, so success proves none was built.
        let config = Config::builder()
            .with_metrics(false)
            .with_export_endpoint("not a valid endpoint")
            .with_sdk_tracer_provider(SdkTracerProvider::builder().build())
            .build();

        let provider = initialize(config).unwrap().unwrap();
        assert!(provider.tracer_provider().is_some());
        assert!(provider.meter_provider().is_none());
    }

    #[tokio::test]
    async fn test_trace_exporter_failure_is_reported_as_trace() {
        let config = Config::builder()
            .with_metrics(false)
            .with_export_endpoint("not a valid endpoint")
            .build();

        let err = initialize(config).unwrap_err();
        assert_matches!(err, ProviderError::TraceExporter(_));
        assert!(err
            .to_string()
            .starts_with("failed to create otlp trace exporter"));
    }

    #[tokio::test]
    async fn test_metric_exporter_failure_is_reported_as_metric() {
        let config = Config::builder()
            .with_tracing(false)
            .with_export_header("bad header", "value")
            .build();

        let err = initialize(config).unwrap_err();
        assert_matches!(err, ProviderError::MetricExporter(ExporterError::InvalidHeader { .. }));
        assert!(err
            .to_string()
            .starts_with("failed to create otlp metric exporter"));
    }

    #[test]
    fn test_metric_failure_leaves_tracer_override_running() {
        let tracer = SdkTracerProvider::builder().build();
        let config = Config::builder()
            .with_export_header("bad header", "value")
            .with_sdk_tracer_provider(tracer.clone())
            .build();

        assert_matches!(initialize(config), Err(ProviderError::MetricExporter(_)));
        assert!(tracer.shutdown().is_ok());
    }

    #[test]
    fn test_shutdown_without_providers_is_ok() {
        let provider = OtelProvider {
            tracer_provider: None,
            meter_provider: None,
            error_handler: Arc::new(crate::error_handler::LogErrorHandler),
        };
        assert!(provider.shutdown().is_ok());
    }

    #[test]
    fn test_second_shutdown_returns_last_error() {
        let config = Config::builder()
            .with_sdk_tracer_provider(SdkTracerProvider::builder().build())
            .with_meter_provider(SdkMeterProvider::builder().build())
            .build();
        let provider = initialize(config).unwrap().unwrap();

        assert!(provider.shutdown().is_ok());
        assert_matches!(
            provider.shutdown(),
            Err(ShutdownError::Meter(OTelSdkError::AlreadyShutdown))
        );
    }

    #[test]
    fn test_discarded_tracer_failure_reaches_handler() {
        let tracer = SdkTracerProvider::builder().build();
        tracer.shutdown().unwrap();
        let handler = CollectingHandler::default();

        discard_tracer_provider(&tracer, &handler);

        let errors = handler.0.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("tracer provider shutdown failed"));
    }

    #[test]
    fn test_discarded_tracer_is_shut_down_quietly() {
        let tracer = SdkTracerProvider::builder().build();
        let handler = CollectingHandler::default();

        discard_tracer_provider(&tracer, &handler);

        assert!(handler.0.lock().unwrap().is_empty());
        assert_matches!(tracer.shutdown(), Err(OTelSdkError::AlreadyShutdown));
    }
}
