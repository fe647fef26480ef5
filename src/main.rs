//! otel-probe: checks an OTLP/gRPC export pipeline end to end.
//!
//! # Usage
//!
//! ```bash
//! otel-probe --endpoint http://localhost:4317 --insecure --service-name checkout
//! ```
//!
//! Environment variables can also be used:
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector endpoint
//! - `OTEL_EXPORTER_OTLP_HEADERS`: Comma separated key=value headers
//! - `OTEL_EXPORTER_OTLP_INSECURE`: Export over plaintext
//! - `OTEL_SERVICE_NAME`: Service name
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use std::time::Duration;

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use otel_provider::cli::Cli;
use otel_provider::observability::metrics::Probe;
use otel_provider::observability::tracing::{bootstrap_subscriber, init_tracing};

/// Upper bound on the final flush of each provider.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from CLI arguments and environment
    let cli = Cli::parse_args();
    let config = cli.to_config();

    // Construction logs go to the console until the global subscriber exists
    let bootstrap = bootstrap_subscriber(&cli.log_level);
    let initialized =
        tracing::dispatcher::with_default(&bootstrap, || otel_provider::initialize(config));
    let Some(provider) = initialized.context("failed to initialize OpenTelemetry")? else {
        init_tracing(&cli.log_level, None);
        tracing::warn!("Tracing and metrics are both disabled, nothing to probe");
        return Ok(());
    };

    provider.set_global();
    init_tracing(&cli.log_level, Some(&provider));

    tracing::info!(
        endpoint = cli.endpoint.as_deref().unwrap_or("default"),
        service = %cli.service_name,
        "Sending probe"
    );

    Probe::new(&provider).run(&[KeyValue::new("probe.service", cli.service_name.clone())]);

    // Providers flush on blocking threads, keep the runtime free for the gRPC channel
    let shutdown = tokio::task::spawn_blocking(move || {
        provider.shutdown_with_timeout(SHUTDOWN_TIMEOUT)
    })
    .await
    .context("shutdown task panicked")?;
    shutdown.context("failed to flush telemetry")?;

    tracing::info!("Probe exported");
    Ok(())
}
