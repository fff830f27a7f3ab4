//! High-throughput transport: a per-host pool of HTTP/1.1 connections.
mod pool;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use http::header::{CONNECTION, HOST, HeaderMap, HeaderValue};
use http::{Method, Request, Uri};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use tracing::debug;

use crate::error::{ClientError, RequestError};

use super::body::{PooledBody, PreparedBody};
use super::client::{Client, Outcome, Target};
use super::dial::{DialStrategy, Dialer};
use super::headers::to_pooled_headers;
use super::options::{BodySource, ClientConfig, TransportKind};
use super::tls::pooled_connector;

use pool::HostPool;

/// Variant A. Connections are dialed lazily, kept idle between requests, and
/// capped at `max_conns`; callers past the cap wait for a free slot.
pub struct PooledClient {
    pool: HostPool,
    headers: Option<HeaderMap>,
    host_header: HeaderValue,
    method: Method,
    request_target: Uri,
    body: BodySource,
    timeout: Option<Duration>,
    close_connections: bool,
}

impl PooledClient {
    /// # Errors
    ///
    /// Returns an error when the URL, headers, proxy URL or TLS settings are
    /// invalid.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let target = Target::parse(&config.url)?;
        let strategy = DialStrategy::select(&config.proxy_url)?;
        if !strategy.is_instrumented() {
            debug!("Proxied pooled connections are not byte-counted.");
        }
        if config.http2 {
            debug!("The pooled transport speaks HTTP/1.1 only; http2 is ignored.");
        }

        let tls = if target.is_tls {
            Some(pooled_connector(&config.tls)?)
        } else {
            None
        };

        let host_header = HeaderValue::from_str(&target.host_header).map_err(|source| {
            ClientError::InvalidHeaderValue {
                name: HOST.as_str().to_owned(),
                source,
            }
        })?;
        let request_target = target.request_target.parse::<Uri>().map_err(|source| {
            ClientError::InvalidRequestTarget {
                target: target.request_target.clone(),
                source,
            }
        })?;

        let pool = HostPool::new(
            Dialer::new(strategy, config.counters.clone()),
            tls,
            target.dial,
            config.effective_max_conns(),
            !config.disable_keep_alives,
        );

        Ok(Self {
            pool,
            headers: to_pooled_headers(&config.headers)?,
            host_header,
            method: config.method.clone(),
            request_target,
            body: config.body.clone(),
            timeout: config.effective_timeout(),
            close_connections: config.disable_keep_alives,
        })
    }

    fn build_request(&self, body: PooledBody) -> Request<PooledBody> {
        let mut request = Request::new(body);
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.request_target.clone();
        if let Some(template) = self.headers.as_ref() {
            *request.headers_mut() = template.clone();
        }
        let headers = request.headers_mut();
        if !headers.contains_key(HOST) {
            headers.insert(HOST, self.host_header.clone());
        }
        if self.close_connections {
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
        }
        request
    }

    async fn round_trip(&self, request: Request<PooledBody>) -> Result<u16, RequestError> {
        let mut conn = self.pool.acquire().await?;
        let response = conn
            .send(request)
            .await
            .map_err(|source| RequestError::Protocol { source })?;
        let status = response.status().as_u16();
        drain(response.into_body())
            .await
            .map_err(|source| RequestError::Protocol { source })?;
        conn.release();
        Ok(status)
    }
}

#[async_trait]
impl Client for PooledClient {
    async fn execute(&self) -> Outcome {
        let body = match PreparedBody::resolve(&self.body) {
            Ok(body) => body.into_pooled(),
            Err(err) => return Outcome::not_sent(err),
        };
        let request = self.build_request(body);

        let start = Instant::now();
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.round_trip(request)).await {
                Ok(result) => result,
                Err(_elapsed) => Err(RequestError::Timeout { after: limit }),
            },
            None => self.round_trip(request).await,
        };
        let elapsed = start.elapsed();

        match result {
            Ok(status) => Outcome::completed(status, elapsed),
            Err(err) => Outcome::failed(err, elapsed),
        }
    }

    fn transport(&self) -> TransportKind {
        TransportKind::Pooled
    }
}

async fn drain(mut body: Incoming) -> Result<(), hyper::Error> {
    while let Some(frame) = body.frame().await {
        frame?;
    }
    Ok(())
}
