//! Connection establishment for the pooled transport.
//!
//! Direct connections go through [`CountingStream`] so the shared byte
//! counters see every socket read and write. Proxied connections are handed
//! over as-is and are not counted.
mod connect_tunnel;
mod counting;
mod socks5;


use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use url::Url;

use crate::error::{ClientError, DialError};

use super::counters::ByteCounters;

pub(crate) use counting::CountingStream;

const DEFAULT_HTTP_PROXY_PORT: u16 = 80;
const DEFAULT_HTTPS_PROXY_PORT: u16 = 443;
const DEFAULT_SOCKS5_PORT: u16 = 1080;

pub(crate) trait Io: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> Io for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

pub(crate) type BoxedIo = Box<dyn Io>;

#[derive(Clone, PartialEq, Eq)]
pub struct Socks5Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Socks5Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socks5Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How the pooled transport reaches the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialStrategy {
    /// TCP straight to the target, byte-counted.
    Direct,
    /// `CONNECT` tunnel through an HTTP proxy. `authorization` is the full
    /// `Proxy-Authorization` value when the proxy URL carries credentials.
    HttpConnect {
        proxy_addr: String,
        authorization: Option<String>,
    },
    Socks5 {
        proxy_addr: String,
        credentials: Option<Socks5Credentials>,
    },
}

impl DialStrategy {
    /// Picks the strategy for a proxy URL: empty is direct, anything
    /// mentioning `socks5` is SOCKS5, everything else is an HTTP proxy.
    /// Bare `host:port` values are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error when a non-empty proxy URL cannot be parsed or has no
    /// host.
    pub fn select(proxy_url: &str) -> Result<Self, ClientError> {
        let trimmed = proxy_url.trim();
        if trimmed.is_empty() {
            return Ok(DialStrategy::Direct);
        }

        if trimmed.contains("socks5") {
            let endpoint = ProxyEndpoint::parse(trimmed)?;
            let proxy_addr = endpoint.addr(DEFAULT_SOCKS5_PORT);
            return Ok(DialStrategy::Socks5 {
                proxy_addr,
                credentials: endpoint
                    .credentials()
                    .map(|(username, password)| Socks5Credentials { username, password }),
            });
        }

        let endpoint = ProxyEndpoint::parse(trimmed)?;
        let default_port = if endpoint.url.scheme() == "https" {
            DEFAULT_HTTPS_PROXY_PORT
        } else {
            DEFAULT_HTTP_PROXY_PORT
        };
        Ok(DialStrategy::HttpConnect {
            proxy_addr: endpoint.addr(default_port),
            authorization: endpoint.credentials().map(|(username, password)| {
                format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
            }),
        })
    }

    /// Whether connections made with this strategy feed the byte counters.
    #[must_use]
    pub const fn is_instrumented(&self) -> bool {
        matches!(self, DialStrategy::Direct)
    }
}

struct ProxyEndpoint {
    url: Url,
    host: String,
}

impl ProxyEndpoint {
    fn parse(raw: &str) -> Result<Self, ClientError> {
        let with_scheme = if raw.contains("://") {
            raw.to_owned()
        } else {
            format!("http://{}", raw)
        };
        let url = Url::parse(&with_scheme).map_err(|source| ClientError::InvalidProxyUrl {
            url: raw.to_owned(),
            source,
        })?;
        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ClientError::ProxyMissingHost {
                url: raw.to_owned(),
            })?
            .to_owned();
        Ok(Self { url, host })
    }

    fn addr(&self, default_port: u16) -> String {
        format!("{}:{}", self.host, self.url.port().unwrap_or(default_port))
    }

    fn credentials(&self) -> Option<(String, String)> {
        let username = self.url.username();
        if username.is_empty() {
            return None;
        }
        Some((
            username.to_owned(),
            self.url.password().unwrap_or_default().to_owned(),
        ))
    }
}

/// Where a dial goes: `authority` is `host:port` (IPv6 hosts bracketed),
/// `host` is the bare host used for SOCKS5 addressing.
#[derive(Debug, Clone)]
pub(crate) struct DialTarget {
    pub(crate) authority: String,
    pub(crate) host: String,
    pub(crate) port: u16,
}

#[derive(Debug, Clone)]
pub(crate) struct Dialer {
    strategy: DialStrategy,
    counters: ByteCounters,
}

impl Dialer {
    pub(crate) const fn new(strategy: DialStrategy, counters: ByteCounters) -> Self {
        Self { strategy, counters }
    }

    pub(crate) async fn dial(&self, target: &DialTarget) -> Result<BoxedIo, DialError> {
        match &self.strategy {
            DialStrategy::Direct => {
                let stream = connect(&target.authority).await?;
                Ok(Box::new(CountingStream::new(stream, self.counters.clone())))
            }
            DialStrategy::HttpConnect {
                proxy_addr,
                authorization,
            } => {
                let stream = connect(proxy_addr).await?;
                let tunnel = connect_tunnel::establish(
                    stream,
                    proxy_addr,
                    &target.authority,
                    authorization.as_deref(),
                )
                .await?;
                Ok(Box::new(tunnel))
            }
            DialStrategy::Socks5 {
                proxy_addr,
                credentials,
            } => {
                let stream = connect(proxy_addr).await?;
                let tunnel = socks5::handshake(
                    stream,
                    proxy_addr,
                    &target.host,
                    target.port,
                    credentials.as_ref(),
                )
                .await?;
                Ok(Box::new(tunnel))
            }
        }
    }
}

async fn connect(addr: &str) -> Result<TcpStream, DialError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| DialError::Connect {
            addr: addr.to_owned(),
            source,
        })?;
    stream
        .set_nodelay(true)
        .map_err(|source| DialError::Connect {
            addr: addr.to_owned(),
            source,
        })?;
    Ok(stream)
}
