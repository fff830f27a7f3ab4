use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::Method;
use serde::Deserialize;
use tokio::io::AsyncRead;

use crate::error::ConfigError;

use super::counters::ByteCounters;
use super::tls::TlsSettings;

/// Connection cap used when `max_conns` is zero.
pub const DEFAULT_MAX_CONNS: usize = 512;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// A request body stream. Owned by the single request that produced it.
pub type BodyStream = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// Produces a fresh [`BodyStream`] for every request.
pub type BodyProducer = Arc<dyn Fn() -> std::io::Result<BodyStream> + Send + Sync>;

#[derive(Clone)]
pub enum BodySource {
    /// Sent verbatim with an explicit `Content-Length` on every request.
    Fixed(Bytes),
    /// Sent chunked; the producer runs once per request.
    Stream(BodyProducer),
}

impl BodySource {
    pub fn fixed<B>(body: B) -> Self
    where
        B: Into<Bytes>,
    {
        BodySource::Fixed(body.into())
    }

    pub fn stream<F>(producer: F) -> Self
    where
        F: Fn() -> std::io::Result<BodyStream> + Send + Sync + 'static,
    {
        BodySource::Stream(Arc::new(producer))
    }
}

impl Default for BodySource {
    fn default() -> Self {
        BodySource::Fixed(Bytes::new())
    }
}

impl fmt::Debug for BodySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodySource::Fixed(bytes) => f.debug_tuple("Fixed").field(&bytes.len()).finish(),
            BodySource::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Per-host pool of HTTP/1.1 connections over the instrumented dialer.
    #[default]
    Pooled,
    /// reqwest, with HTTP/2 negotiation and its own proxy support.
    Standard,
}

impl std::str::FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pooled" | "pool" | "fast" => Ok(TransportKind::Pooled),
            "standard" | "std" | "reqwest" => Ok(TransportKind::Standard),
            _ => Err(ConfigError::InvalidTransport {
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Pooled => f.write_str("pooled"),
            TransportKind::Standard => f.write_str("standard"),
        }
    }
}

/// Everything a client needs, fixed at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Absolute `http` or `https` URL. Callers validate it up front.
    pub url: String,
    pub method: Method,
    /// Applied to every request in order; a later duplicate key wins.
    pub headers: Vec<(String, String)>,
    pub body: BodySource,
    /// Upper bound on connections per host. Zero selects [`DEFAULT_MAX_CONNS`].
    pub max_conns: usize,
    /// Deadline for a whole request. Zero disables it.
    pub timeout: Duration,
    pub tls: TlsSettings,
    /// Empty for direct connections; otherwise an HTTP(S) or SOCKS5 proxy.
    pub proxy_url: String,
    /// Lets the standard transport negotiate HTTP/2. The pooled transport
    /// always speaks HTTP/1.1.
    pub http2: bool,
    pub disable_keep_alives: bool,
    pub transport: TransportKind,
    pub counters: ByteCounters,
}

impl ClientConfig {
    /// A `GET` configuration for `url` with every other field at its default.
    pub fn new<U>(url: U) -> Self
    where
        U: Into<String>,
    {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: Vec::new(),
            body: BodySource::default(),
            max_conns: 0,
            timeout: DEFAULT_TIMEOUT,
            tls: TlsSettings::default(),
            proxy_url: String::new(),
            http2: false,
            disable_keep_alives: false,
            transport: TransportKind::default(),
            counters: ByteCounters::new(),
        }
    }

    pub(crate) const fn effective_max_conns(&self) -> usize {
        if self.max_conns == 0 {
            DEFAULT_MAX_CONNS
        } else {
            self.max_conns
        }
    }

    pub(crate) const fn effective_timeout(&self) -> Option<Duration> {
        if self.timeout.is_zero() {
            None
        } else {
            Some(self.timeout)
        }
    }
}
