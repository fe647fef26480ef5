//! otel-provider: OpenTelemetry tracer and meter provider initialization.
//!
//! Turns a handful of feature toggles and connection options into ready to use
//! OpenTelemetry providers exporting over OTLP/gRPC.
//!
//! # Architecture
//!
//! - **Config-driven**: an immutable [`Config`] built through [`ConfigBuilder`]
//! - **Independent signals**: tracing and metrics are each optional
//! - **Overridable**: pre-built providers and resources are used verbatim
//! - **Single shutdown**: [`OtelProvider::shutdown`] drains both providers
//!
//! # Modules
//!
//! - [`cli`]: CLI and environment configuration of the `otel-probe` binary
//! - [`config`]: Provider configuration and its builder
//! - [`error`]: Error types
//! - [`error_handler`]: Sink for shutdown failures
//! - [`observability`]: Logging setup and probe telemetry
//! - [`provider`]: Provider initialization and shutdown
//! - [`resource`]: Resource descriptor detection
//! - [`security`]: Transport security policy
//!
//! # Example
//!
//! Exporters are built on the ambient Tokio runtime, so [`initialize`] must
//! run inside one.
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = otel_provider::Config::builder()
//!     .with_export_endpoint("http://localhost:4317")
//!     .with_insecure(true)
//!     .with_service_name("checkout")
//!     .build();
//!
//! if let Some(provider) = otel_provider::initialize(config)? {
//!     provider.set_global();
//!     // ...
//!     provider.shutdown()?;
//! }
//! # Ok(())
//! # }
//! ```

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // config::ConfigBuilder is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod error_handler;
mod exporter;
pub mod observability;
pub mod provider;
pub mod resource;
pub mod security;

pub use config::{Config, ConfigBuilder};
pub use error::{DetectError, ExporterError, ProviderError, ShutdownError};
pub use error_handler::{ErrorHandler, LogErrorHandler};
pub use provider::{initialize, OtelProvider};
pub use resource::{build_resource, ResourceDetector};
pub use security::TransportSecurity;
