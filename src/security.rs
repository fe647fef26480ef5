//! Transport security policy for the OTLP/gRPC channel.
//!
//! tonic negotiates TLS from the endpoint scheme alone, so every policy pins
//! the scheme as well as the TLS client configuration.

use tonic::transport::ClientTlsConfig;

/// Collector address used when neither the config nor the environment names one.
pub const DEFAULT_ENDPOINT: &str = "localhost:4317";

/// How the exporter channel is secured.
///
/// Derived once from the two insecurity flags of [`crate::Config`]; the
/// plaintext flag always takes precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportSecurity {
    /// No TLS at all, endpoints are forced to `http://`.
    Plaintext,
    /// Explicit TLS client configuration trusting the platform root store,
    /// without any server name override.
    Tls,
    /// The transport's default secure credentials: TLS against the platform
    /// root store.
    #[default]
    Default,
}

impl TransportSecurity {
    pub fn from_flags(insecure: bool, tls_insecure: bool) -> Self {
        if insecure {
            Self::Plaintext
        } else if tls_insecure {
            Self::Tls
        } else {
            Self::Default
        }
    }

    /// TLS configuration to hand to the exporter, if any.
    pub fn tls_config(self) -> Option<ClientTlsConfig> {
        match self {
            Self::Tls | Self::Default => Some(ClientTlsConfig::new().with_native_roots()),
            Self::Plaintext => None,
        }
    }

    /// Rewrite the endpoint scheme so it agrees with the policy.
    ///
    /// Accepts `host:port` as well as `http://` and `https://` URIs. Any other
    /// scheme is passed through for the exporter to judge.
    pub fn apply_to_endpoint(self, endpoint: &str) -> String {
        let authority = match endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"))
        {
            Some(rest) => rest,
            None if endpoint.contains("://") => return endpoint.to_string(),
            None => endpoint,
        };
        match self {
            Self::Plaintext => format!("http://{authority}"),
            Self::Tls | Self::Default => format!("https://{authority}"),
        }
    }
}
