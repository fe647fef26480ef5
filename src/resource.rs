//! Resource descriptor construction.
//!
//! The resource is built once per [`crate::initialize`] call and shared by
//! the tracer and meter providers.

use std::fmt::Debug;

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{
    HOST_NAME, PROCESS_EXECUTABLE_NAME, PROCESS_PID,
};

use crate::config::Config;
use crate::error::DetectError;

/// Source of resource attributes describing the emitting process.
pub trait ResourceDetector: Send + Sync + Debug {
    fn detect(&self) -> Result<Vec<KeyValue>, DetectError>;
}

/// Detects `host.name`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostDetector;

impl ResourceDetector for HostDetector {
    fn detect(&self) -> Result<Vec<KeyValue>, DetectError> {
        let name = hostname::get()
            .map_err(DetectError::Hostname)?
            .into_string()
            .map_err(|_| DetectError::HostnameEncoding)?;
        Ok(vec![KeyValue::new(HOST_NAME, name)])
    }
}

/// Detects `process.pid` and `process.executable.name`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessDetector;

impl ResourceDetector for ProcessDetector {
    fn detect(&self) -> Result<Vec<KeyValue>, DetectError> {
        let mut attributes = vec![KeyValue::new(PROCESS_PID, i64::from(std::process::id()))];

        let executable = std::env::current_exe().map_err(DetectError::Executable)?;
        if let Some(name) = executable.file_name().and_then(|name| name.to_str()) {
            attributes.push(KeyValue::new(PROCESS_EXECUTABLE_NAME, name.to_string()));
        }
        Ok(attributes)
    }
}

/// Build the resource shared by both providers.
///
/// A resource set on the config is returned unchanged. Otherwise the SDK
/// defaults (telemetry SDK identity, `OTEL_RESOURCE_ATTRIBUTES`,
/// `OTEL_SERVICE_NAME`) are merged with the host and process detectors, the
/// configured detectors in order and finally the configured attributes. Any
/// detector failure yields the SDK default resource.
pub fn build_resource(config: &Config) -> Resource {
    if let Some(resource) = &config.resource {
        return resource.clone();
    }

    match detect_attributes(config) {
        Ok(attributes) => Resource::builder().with_attributes(attributes).build(),
        Err(err) => {
            tracing::debug!(error = %err, "Resource detection failed, using default resource");
            Resource::builder().build()
        }
    }
}

fn detect_attributes(config: &Config) -> Result<Vec<KeyValue>, DetectError> {
    let builtin: [&dyn ResourceDetector; 2] = [&HostDetector, &ProcessDetector];
    let configured = config.resource_detectors.iter().map(|d| d.as_ref());

    let mut attributes = Vec::new();
    for detector in builtin.into_iter().chain(configured) {
        attributes.extend(detector.detect()?);
    }
    attributes.extend(config.resource_attributes.iter().cloned());
    Ok(attributes)
}
