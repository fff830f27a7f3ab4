use std::time::Duration;

use thiserror::Error;

use super::DialError;

/// Failures detected while turning a configuration into a client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("URL '{url}' has no host.")]
    UrlMissingHost { url: String },
    #[error("Unsupported URL scheme '{scheme}'. Use http or https.")]
    UnsupportedScheme { scheme: String },
    #[error("Invalid header name '{name}': {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },
    #[error("Invalid header value for '{name}': {source}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("Invalid request target '{target}': {source}")]
    InvalidRequestTarget {
        target: String,
        #[source]
        source: http::uri::InvalidUri,
    },
    #[error("Invalid proxy URL '{url}': {source}")]
    InvalidProxyUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Proxy URL '{url}' has no host.")]
    ProxyMissingHost { url: String },
    #[error("Invalid proxy '{url}': {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("tls-min must be <= tls-max.")]
    TlsVersionRange,
    #[error("TLS {version} is not supported as a minimum by the pooled transport.")]
    UnsupportedTlsMinimum { version: &'static str },
    #[error("Invalid CA certificate: {source}")]
    InvalidCaCert {
        #[source]
        source: native_tls::Error,
    },
    #[error("Invalid client identity: {source}")]
    InvalidIdentity {
        #[source]
        source: native_tls::Error,
    },
    #[error("Failed to build TLS connector: {source}")]
    TlsConnector {
        #[source]
        source: native_tls::Error,
    },
    #[error("Invalid TLS material for the standard transport: {source}")]
    StandardTls {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
}

/// Failures surfaced by a single `execute` call.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Body producer failed: {source}")]
    BodyProducer {
        #[source]
        source: std::io::Error,
    },
    #[error("Connection pool is closed: {source}")]
    PoolClosed {
        #[source]
        source: tokio::sync::AcquireError,
    },
    #[error("Connection failed: {source}")]
    Dial {
        #[from]
        source: DialError,
    },
    #[error("HTTP exchange failed: {source}")]
    Protocol {
        #[source]
        source: hyper::Error,
    },
    #[error("Request timed out after {after:?}.")]
    Timeout { after: Duration },
    #[error("Request failed: {source}")]
    Standard {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to drain response body: {source}")]
    Drain {
        #[source]
        source: reqwest::Error,
    },
}

impl RequestError {
    /// Whether the request ran out of time, on either transport.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            RequestError::Timeout { .. } => true,
            RequestError::Standard { source } | RequestError::Drain { source } => {
                source.is_timeout()
            }
            RequestError::Protocol { source } => source.is_timeout(),
            RequestError::BodyProducer { .. }
            | RequestError::PoolClosed { .. }
            | RequestError::Dial { .. } => false,
        }
    }
}
