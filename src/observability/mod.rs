//! Observability for the crate itself and its binary.
//!
//! Provides:
//! - Structured logging bridged into the OpenTelemetry providers
//! - Probe span and counter used to check an export pipeline end to end

pub mod metrics;
pub mod tracing;
