//! Error types for provider construction, shutdown and resource detection.

use opentelemetry_otlp::ExporterBuildError;
use opentelemetry_sdk::error::OTelSdkError;
use thiserror::Error;

/// Failure building a single OTLP exporter.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error(transparent)]
    Build(#[from] ExporterBuildError),
    #[error("invalid export header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// Failure returned by [`crate::initialize`].
///
/// The variant identifies which exporter could not be constructed.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to create otlp trace exporter: {0}")]
    TraceExporter(#[source] ExporterError),
    #[error("failed to create otlp metric exporter: {0}")]
    MetricExporter(#[source] ExporterError),
}

/// Failure shutting down one of the providers.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("tracer provider shutdown failed: {0}")]
    Tracer(#[source] OTelSdkError),
    #[error("meter provider shutdown failed: {0}")]
    Meter(#[source] OTelSdkError),
}

/// Failure raised by a [`crate::resource::ResourceDetector`].
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("could not read hostname: {0}")]
    Hostname(#[source] std::io::Error),
    #[error("hostname is not valid UTF-8")]
    HostnameEncoding,
    #[error("could not resolve current executable: {0}")]
    Executable(#[source] std::io::Error),
    #[error("{0}")]
    Other(String),
}
