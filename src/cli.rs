//! Configuration parsing for the otel-probe binary.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides using the standard `OTEL_*` names
//! - Conversion into a library [`Config`]

use std::time::Duration;

use clap::Parser;
use opentelemetry::KeyValue;
use opentelemetry_otlp::Compression;
use opentelemetry_sdk::trace::Sampler;

use crate::config::Config;

/// otel-probe: initialize OpenTelemetry providers and send a probe span and metric.
#[derive(Parser, Debug, Clone)]
#[command(name = "otel-probe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// OTLP/gRPC collector endpoint (e.g., http://localhost:4317)
    #[arg(short, long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Header sent with every export request, as key=value (repeatable)
    #[arg(
        long = "header",
        env = "OTEL_EXPORTER_OTLP_HEADERS",
        value_delimiter = ',',
        value_parser = parse_key_value
    )]
    pub headers: Vec<(String, String)>,

    /// Export over plaintext, overriding --tls-insecure
    #[arg(long, env = "OTEL_EXPORTER_OTLP_INSECURE")]
    pub insecure: bool,

    /// Export over TLS using the platform root certificates
    #[arg(long)]
    pub tls_insecure: bool,

    /// Do not build a tracer provider
    #[arg(long)]
    pub no_tracing: bool,

    /// Do not build a meter provider
    #[arg(long)]
    pub no_metrics: bool,

    /// Service name reported in the resource
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "otel-probe")]
    pub service_name: String,

    /// Deployment environment reported in the resource
    #[arg(long)]
    pub environment: Option<String>,

    /// Extra resource attribute, as key=value (repeatable)
    #[arg(long = "attribute", value_parser = parse_key_value)]
    pub attributes: Vec<(String, String)>,

    /// Fraction of traces to sample, between 0.0 and 1.0
    #[arg(long)]
    pub sample_ratio: Option<f64>,

    /// Export timeout in seconds
    #[arg(long, env = "OTEL_EXPORTER_OTLP_TIMEOUT_SECS")]
    pub timeout: Option<u64>,

    /// Compress export requests with gzip
    #[arg(long)]
    pub gzip: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build the provider configuration described by the arguments.
    pub fn to_config(&self) -> Config {
        let mut builder = Config::builder()
            .with_tracing(!self.no_tracing)
            .with_metrics(!self.no_metrics)
            .with_insecure(self.insecure)
            .with_tls_insecure(self.tls_insecure)
            .with_service_name(self.service_name.clone())
            .with_resource_attributes(
                self.attributes
                    .iter()
                    .map(|(key, value)| KeyValue::new(key.clone(), value.clone())),
            );

        if let Some(endpoint) = &self.endpoint {
            builder = builder.with_export_endpoint(endpoint.clone());
        }
        for (name, value) in &self.headers {
            builder = builder.with_export_header(name.clone(), value.clone());
        }
        if let Some(environment) = &self.environment {
            builder = builder.with_deployment_environment(environment.clone());
        }
        if let Some(ratio) = self.sample_ratio {
            builder = builder.with_sampler(sampler_for_ratio(ratio));
        }
        if let Some(timeout) = self.timeout {
            builder = builder.with_export_timeout(Duration::from_secs(timeout));
        }
        if self.gzip {
            builder = builder.with_compression(Compression::Gzip);
        }

        builder.build()
    }
}

fn sampler_for_ratio(ratio: f64) -> Sampler {
    let ratio = ratio.clamp(0.0, 1.0);
    if ratio <= 0.0 {
        Sampler::AlwaysOff
    } else if ratio >= 1.0 {
        Sampler::AlwaysOn
    } else {
        Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(ratio)))
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::TransportSecurity;
    use opentelemetry_semantic_conventions::resource::{DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_NAME};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("otel-probe").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("api-key = secret"),
            Ok(("api-key".to_string(), "secret".to_string()))
        );
        assert_eq!(
            parse_key_value("token=a=b"),
            Ok(("token".to_string(), "a=b".to_string()))
        );
        assert!(parse_key_value("no-separator").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn test_flags_map_to_config() {
        let cli = parse(&[
            "--endpoint",
            "https://collector:4317",
            "--header",
            "api-key=secret",
            "--insecure",
            "--tls-insecure",
            "--no-metrics",
            "--environment",
            "staging",
        ]);
        let config = cli.to_config();

        assert!(config.tracing_enabled());
        assert!(!config.metrics_enabled());
        assert_eq!(config.export_endpoint(), Some("https://collector:4317"));
        assert_eq!(config.export_headers()["api-key"], "secret");
        assert_eq!(config.transport_security(), TransportSecurity::Plaintext);
        assert!(config
            .resource_attributes()
            .contains(&KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, "staging")));
    }

    #[test]
    fn test_service_name_is_a_resource_attribute() {
        let cli = parse(&["--service-name", "checkout"]);
        assert!(cli
            .to_config()
            .resource_attributes()
            .contains(&KeyValue::new(SERVICE_NAME, "checkout")));
    }

    #[test]
    fn test_comma_separated_headers() {
        let cli = parse(&["--header", "a=1,b=2"]);
        assert_eq!(cli.headers.len(), 2);
    }

    #[test]
    fn test_sampler_for_ratio() {
        assert!(matches!(sampler_for_ratio(0.0), Sampler::AlwaysOff));
        assert!(matches!(sampler_for_ratio(1.5), Sampler::AlwaysOn));
        assert!(matches!(sampler_for_ratio(0.25), Sampler::ParentBased(_)));
    }
}
