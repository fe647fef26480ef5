//! Provider configuration.
//!
//! A [`Config`] is an immutable snapshot assembled by [`ConfigBuilder`]. Each
//! `with_*` option overwrites the previous value for its field; the
//! resource-attribute conveniences append.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::KeyValue;
use opentelemetry_otlp::Compression;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{
    DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_NAME, SERVICE_NAMESPACE,
};

use crate::error_handler::{ErrorHandler, LogErrorHandler};
use crate::resource::ResourceDetector;
use crate::security::TransportSecurity;

/// Interval between two periodic metric exports.
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(15);

/// Resolved provider configuration.
#[derive(Clone)]
pub struct Config {
    pub(crate) enable_tracing: bool,
    pub(crate) enable_metrics: bool,
    pub(crate) export_endpoint: Option<String>,
    pub(crate) export_headers: HashMap<String, String>,
    pub(crate) export_insecure: bool,
    pub(crate) export_tls_insecure: bool,
    pub(crate) export_timeout: Option<Duration>,
    pub(crate) export_compression: Option<Compression>,
    pub(crate) sampler: Sampler,
    pub(crate) resource: Option<Resource>,
    pub(crate) resource_detectors: Vec<Arc<dyn ResourceDetector>>,
    pub(crate) resource_attributes: Vec<KeyValue>,
    pub(crate) sdk_tracer_provider: Option<SdkTracerProvider>,
    pub(crate) meter_provider: Option<SdkMeterProvider>,
    pub(crate) metrics_interval: Duration,
    pub(crate) error_handler: Arc<dyn ErrorHandler>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_tracing: true,
            enable_metrics: true,
            export_endpoint: None,
            export_headers: HashMap::new(),
            export_insecure: false,
            export_tls_insecure: false,
            export_timeout: None,
            export_compression: None,
            sampler: Sampler::AlwaysOn,
            resource: None,
            resource_detectors: Vec::new(),
            resource_attributes: Vec::new(),
            sdk_tracer_provider: None,
            meter_provider: None,
            metrics_interval: DEFAULT_METRICS_INTERVAL,
            error_handler: Arc::new(LogErrorHandler),
        }
    }
}

impl fmt::Debug for Config {
    // Header values usually carry credentials, only their names are printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("enable_tracing", &self.enable_tracing)
            .field("enable_metrics", &self.enable_metrics)
            .field("export_endpoint", &self.export_endpoint)
            .field("export_headers", &self.export_headers.keys().collect::<Vec<_>>())
            .field("transport_security", &self.transport_security())
            .field("export_timeout", &self.export_timeout)
            .field("export_compression", &self.export_compression)
            .field("sampler", &self.sampler)
            .field("resource", &self.resource.is_some())
            .field("resource_detectors", &self.resource_detectors)
            .field("resource_attributes", &self.resource_attributes)
            .field("sdk_tracer_provider", &self.sdk_tracer_provider.is_some())
            .field("meter_provider", &self.meter_provider.is_some())
            .field("metrics_interval", &self.metrics_interval)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn tracing_enabled(&self) -> bool {
        self.enable_tracing
    }

    pub fn metrics_enabled(&self) -> bool {
        self.enable_metrics
    }

    /// True when at least one of the signals is enabled.
    pub fn enabled(&self) -> bool {
        self.enable_tracing || self.enable_metrics
    }

    pub fn export_endpoint(&self) -> Option<&str> {
        self.export_endpoint.as_deref()
    }

    pub fn export_headers(&self) -> &HashMap<String, String> {
        &self.export_headers
    }

    pub fn transport_security(&self) -> TransportSecurity {
        TransportSecurity::from_flags(self.export_insecure, self.export_tls_insecure)
    }

    pub fn metrics_interval(&self) -> Duration {
        self.metrics_interval
    }

    pub fn resource_attributes(&self) -> &[KeyValue] {
        &self.resource_attributes
    }
}

/// Builder applying options over [`Config::default`].
#[derive(Debug, Default, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.config.enable_tracing = enabled;
        self
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.config.enable_metrics = enabled;
        self
    }

    /// Collector endpoint, `host:port` or a URI such as `https://collector:4317`.
    /// The scheme is pinned by the transport security.
    pub fn with_export_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.export_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_export_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.export_headers.insert(name.into(), value.into());
        self
    }

    /// Replaces every previously configured header.
    pub fn with_export_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.config.export_headers = headers;
        self
    }

    /// Export over plaintext. Takes precedence over [`Self::with_tls_insecure`].
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.config.export_insecure = insecure;
        self
    }

    pub fn with_tls_insecure(mut self, tls_insecure: bool) -> Self {
        self.config.export_tls_insecure = tls_insecure;
        self
    }

    pub fn with_export_timeout(mut self, timeout: Duration) -> Self {
        self.config.export_timeout = Some(timeout);
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.config.export_compression = Some(compression);
        self
    }

    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.config.sampler = sampler;
        self
    }

    /// Use this resource as is; detectors and attributes are ignored.
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.config.resource = Some(resource);
        self
    }

    pub fn with_resource_detector(mut self, detector: Arc<dyn ResourceDetector>) -> Self {
        self.config.resource_detectors.push(detector);
        self
    }

    pub fn with_resource_attributes<I>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = KeyValue>,
    {
        self.config.resource_attributes.extend(attributes);
        self
    }

    pub fn with_service_name(self, name: impl Into<String>) -> Self {
        self.with_resource_attributes([KeyValue::new(SERVICE_NAME, name.into())])
    }

    pub fn with_service_namespace(self, namespace: impl Into<String>) -> Self {
        self.with_resource_attributes([KeyValue::new(SERVICE_NAMESPACE, namespace.into())])
    }

    pub fn with_deployment_environment(self, environment: impl Into<String>) -> Self {
        self.with_resource_attributes([KeyValue::new(
            DEPLOYMENT_ENVIRONMENT_NAME,
            environment.into(),
        )])
    }

    /// Use this tracer provider instead of building one.
    pub fn with_sdk_tracer_provider(mut self, provider: SdkTracerProvider) -> Self {
        self.config.sdk_tracer_provider = Some(provider);
        self
    }

    /// Use this meter provider instead of building one.
    pub fn with_meter_provider(mut self, provider: SdkMeterProvider) -> Self {
        self.config.meter_provider = Some(provider);
        self
    }

    pub fn with_metrics_interval(mut self, interval: Duration) -> Self {
        self.config.metrics_interval = interval;
        self
    }

    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.config.error_handler = handler;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
