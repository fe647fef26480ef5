//! Process logging setup.
//!
//! Configures structured logging with:
//! - `RUST_LOG`-style level filtering
//! - Span export through the tracer provider, when one is present
//! - Metric events forwarded to the meter provider, when one is present

use opentelemetry::trace::TracerProvider as _;
use tracing::Dispatch;
use tracing_opentelemetry::MetricsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::provider::OtelProvider;

/// Instrumentation scope of spans bridged from `tracing`.
const TRACER_NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given filter directive.
///
/// This sets up:
/// - Console logging with structured format
/// - A `tracing-opentelemetry` layer for the tracer provider of `provider`
/// - A `MetricsLayer` for the meter provider of `provider`
///
/// # Panics
///
/// Panics if a global subscriber has already been installed.
pub fn init_tracing(log_level: &str, provider: Option<&OtelProvider>) {
    let filter = env_filter(log_level);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let trace_layer = provider
        .and_then(OtelProvider::tracer_provider)
        .map(|tracer_provider| {
            tracing_opentelemetry::layer().with_tracer(tracer_provider.tracer(TRACER_NAME))
        });

    let metrics_layer = provider
        .and_then(OtelProvider::meter_provider)
        .map(|meter_provider| MetricsLayer::new(meter_provider.clone()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(trace_layer)
        .with(metrics_layer)
        .init();

    tracing::info!(
        otel_traces = provider.and_then(OtelProvider::tracer_provider).is_some(),
        otel_metrics = provider.and_then(OtelProvider::meter_provider).is_some(),
        "Logging initialized"
    );
}

/// Console-only subscriber for the window before the providers exist.
///
/// Meant for [`tracing::dispatcher::with_default`] around
/// [`crate::initialize`], so its construction logs are not lost before
/// [`init_tracing`] installs the global subscriber.
pub fn bootstrap_subscriber(log_level: &str) -> Dispatch {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level))
        .with_target(true)
        .finish();
    Dispatch::new(subscriber)
}

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_subscriber_honours_level() {
        let dispatch = bootstrap_subscriber("warn");
        tracing::dispatcher::with_default(&dispatch, || {
            assert!(tracing::enabled!(tracing::Level::WARN));
            assert!(!tracing::enabled!(tracing::Level::DEBUG));
        });
    }

    #[test]
    fn test_invalid_level_falls_back_to_info() {
        let dispatch = bootstrap_subscriber("probe=loud");
        tracing::dispatcher::with_default(&dispatch, || {
            assert!(tracing::enabled!(tracing::Level::INFO));
            assert!(!tracing::enabled!(tracing::Level::DEBUG));
        });
    }
}
