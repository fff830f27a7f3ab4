use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, RequestError};

use super::dial::DialTarget;
use super::options::{ClientConfig, TransportKind};
use super::pooled::PooledClient;
use super::standard::StandardClient;

/// Status code reported when no HTTP response was obtained.
pub const TRANSPORT_FAILURE: i32 = -1;

/// Result of one `execute` call.
///
/// `code` is the HTTP status of a completed exchange (any status, 2xx or
/// not), [`TRANSPORT_FAILURE`] when the transport failed, or `0` when the
/// request was never sent because its body could not be produced.
/// `elapsed_micros` is measured even on failure. A completed exchange may
/// still carry an error when draining the response body failed.
#[derive(Debug)]
pub struct Outcome {
    pub code: i32,
    pub elapsed_micros: u64,
    pub error: Option<RequestError>,
}

impl Outcome {
    pub(crate) fn completed(status: u16, elapsed: Duration) -> Self {
        Self {
            code: i32::from(status),
            elapsed_micros: to_micros(elapsed),
            error: None,
        }
    }

    pub(crate) fn completed_with_error(status: u16, elapsed: Duration, error: RequestError) -> Self {
        Self {
            code: i32::from(status),
            elapsed_micros: to_micros(elapsed),
            error: Some(error),
        }
    }

    pub(crate) fn failed(error: RequestError, elapsed: Duration) -> Self {
        Self {
            code: TRANSPORT_FAILURE,
            elapsed_micros: to_micros(elapsed),
            error: Some(error),
        }
    }

    pub(crate) const fn not_sent(error: RequestError) -> Self {
        Self {
            code: 0,
            elapsed_micros: 0,
            error: Some(error),
        }
    }

    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        self.code == TRANSPORT_FAILURE
    }

    /// `(code, elapsed_micros, error)`.
    #[must_use]
    pub fn into_parts(self) -> (i32, u64, Option<RequestError>) {
        (self.code, self.elapsed_micros, self.error)
    }
}

fn to_micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

/// Issues one request per call against the configured target.
///
/// Implementations are shared across many concurrent callers.
#[async_trait]
pub trait Client: Send + Sync {
    async fn execute(&self) -> Outcome;

    fn transport(&self) -> TransportKind;
}

pub type SharedClient = Arc<dyn Client>;

/// Builds the transport selected by `config.transport`.
///
/// # Errors
///
/// Returns an error when the URL, headers, proxy or TLS settings are invalid
/// or the underlying client cannot be constructed. Nothing is sent.
pub fn build_client(config: &ClientConfig) -> Result<SharedClient, ClientError> {
    debug!(
        "Building {} client for {} (max_conns={}, proxy={})",
        config.transport,
        config.url,
        config.effective_max_conns(),
        if config.proxy_url.is_empty() {
            "none"
        } else {
            config.proxy_url.as_str()
        }
    );
    match config.transport {
        TransportKind::Pooled => Ok(Arc::new(PooledClient::new(config)?)),
        TransportKind::Standard => Ok(Arc::new(StandardClient::new(config)?)),
    }
}

/// The parts of the target URL both transports need.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub(crate) url: Url,
    pub(crate) is_tls: bool,
    /// `host[:port]` exactly as written in the URL; the default `Host` value.
    pub(crate) host_header: String,
    /// Path plus query, always starting with `/`.
    pub(crate) request_target: String,
    pub(crate) dial: DialTarget,
}

impl Target {
    pub(crate) fn parse(raw: &str) -> Result<Self, ClientError> {
        let url = Url::parse(raw).map_err(|source| ClientError::InvalidUrl {
            url: raw.to_owned(),
            source,
        })?;
        let is_tls = match url.scheme() {
            "http" => false,
            "https" => true,
            other => {
                return Err(ClientError::UnsupportedScheme {
                    scheme: other.to_owned(),
                });
            }
        };
        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ClientError::UrlMissingHost {
                url: raw.to_owned(),
            })?
            .to_owned();
        let port = url
            .port_or_known_default()
            .unwrap_or(if is_tls { 443 } else { 80 });
        let host_header = url
            .port()
            .map_or_else(|| host.clone(), |port| format!("{}:{}", host, port));

        let mut request_target = url.path().to_owned();
        if request_target.is_empty() {
            request_target.push('/');
        }
        if let Some(query) = url.query() {
            request_target.push('?');
            request_target.push_str(query);
        }

        let bare_host = host.trim_start_matches('[').trim_end_matches(']').to_owned();
        Ok(Self {
            is_tls,
            host_header,
            request_target,
            dial: DialTarget {
                authority: format!("{}:{}", host, port),
                host: bare_host,
                port,
            },
            url,
        })
    }
}
