//! Sink for errors that are reported rather than propagated.

use std::fmt::Debug;

use crate::error::ShutdownError;

/// Receives provider shutdown failures.
///
/// Shutdown keeps going after a failure, so every failure is handed to this
/// sink as it happens.
pub trait ErrorHandler: Send + Sync + Debug {
    fn handle(&self, err: &ShutdownError);
}

/// Default handler: logs the failure through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorHandler;

impl ErrorHandler for LogErrorHandler {
    fn handle(&self, err: &ShutdownError) {
        tracing::error!(error = %err, "OpenTelemetry provider shutdown failed");
    }
}
