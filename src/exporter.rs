//! OTLP/gRPC exporter construction.
//!
//! Span and metric exporters are configured from the same settings: endpoint,
//! headers (sent as gRPC metadata), transport security, timeout and
//! compression. The endpoint is always resolved here so its scheme matches
//! the transport security; other options left unset fall back to the exporter
//! defaults, including the `OTEL_EXPORTER_OTLP_*` environment variables.

use std::collections::HashMap;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry_otlp::{
    Compression, MetricExporter, SpanExporter, WithExportConfig, WithTonicConfig,
};
use tonic::metadata::MetadataMap;
use tonic::transport::ClientTlsConfig;

use crate::config::Config;
use crate::error::ExporterError;
use crate::security::DEFAULT_ENDPOINT;

const ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Exporter options resolved from a [`Config`].
#[derive(Debug, Clone)]
pub(crate) struct ExportSettings {
    endpoint: String,
    metadata: Option<MetadataMap>,
    tls: Option<ClientTlsConfig>,
    timeout: Option<Duration>,
    compression: Option<Compression>,
}

impl ExportSettings {
    pub(crate) fn from_config(config: &Config) -> Result<Self, ExporterError> {
        let security = config.transport_security();
        let endpoint = resolve_endpoint(
            config.export_endpoint.as_deref(),
            std::env::var(ENDPOINT_ENV).ok(),
        );
        let endpoint = security.apply_to_endpoint(&endpoint);
        let metadata = if config.export_headers.is_empty() {
            None
        } else {
            Some(metadata_from_headers(&config.export_headers)?)
        };

        Ok(Self {
            endpoint,
            metadata,
            tls: security.tls_config(),
            timeout: config.export_timeout,
            compression: config.export_compression,
        })
    }

    fn configure<B>(&self, mut builder: B) -> B
    where
        B: WithExportConfig + WithTonicConfig,
    {
        builder = builder.with_endpoint(self.endpoint.clone());
        if let Some(timeout) = self.timeout {
            builder = builder.with_timeout(timeout);
        }
        if let Some(metadata) = &self.metadata {
            builder = builder.with_metadata(metadata.clone());
        }
        if let Some(tls) = &self.tls {
            builder = builder.with_tls_config(tls.clone());
        }
        if let Some(compression) = self.compression {
            builder = builder.with_compression(compression);
        }
        builder
    }
}

/// Build the span exporter. Must be called within a Tokio runtime.
pub(crate) fn span_exporter(settings: &ExportSettings) -> Result<SpanExporter, ExporterError> {
    let builder = settings.configure(SpanExporter::builder().with_tonic());
    Ok(builder.build()?)
}

/// Build the metric exporter. Must be called within a Tokio runtime.
pub(crate) fn metric_exporter(
    settings: &ExportSettings,
) -> Result<MetricExporter, ExporterError> {
    let builder = settings.configure(MetricExporter::builder().with_tonic());
    Ok(builder.build()?)
}

/// Configured endpoint, else the environment's, else [`DEFAULT_ENDPOINT`].
/// Empty values count as unset.
fn resolve_endpoint(configured: Option<&str>, from_env: Option<String>) -> String {
    configured
        .filter(|endpoint| !endpoint.is_empty())
        .map(str::to_string)
        .or_else(|| from_env.filter(|endpoint| !endpoint.is_empty()))
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

fn metadata_from_headers(headers: &HashMap<String, String>) -> Result<MetadataMap, ExporterError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = |reason: String| ExporterError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let key = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        map.insert(key, value);
    }
    Ok(MetadataMap::from_headers(map))
}
