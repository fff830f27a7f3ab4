//! General-purpose transport on reqwest.
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use http::Method;
use hyper::ext::ReasonPhrase;
use reqwest::header::{ACCEPT, CONNECTION, HeaderMap, HeaderValue};
use reqwest::{Proxy, redirect};
use tracing::debug;
use url::Url;

use crate::error::{ClientError, RequestError};

use super::body::PreparedBody;
use super::client::{Client, Outcome, Target};
use super::counters::ByteCounters;
use super::headers::to_standard_headers;
use super::options::{BodySource, ClientConfig, TransportKind};
use super::tls::apply_standard_tls;
use super::wire_size::{BodyFraming, request_head_len, response_head_len};

/// Variant B. Redirects are never followed; the first response is final.
///
/// reqwest owns its sockets, so byte counters are fed with HTTP/1.1 message
/// sizes rather than raw socket traffic. Proxied requests are counted the
/// same way. The sizes are those of HTTP/1.1 text framing even when `http2`
/// is set and the server negotiates h2, so h2 exchanges are approximated
/// (HPACK compression and binary frames are not reflected).
pub struct StandardClient {
    client: reqwest::Client,
    headers: HeaderMap,
    method: Method,
    url: Url,
    body: BodySource,
    counters: ByteCounters,
    request_head_bytes: u64,
}

impl StandardClient {
    /// # Errors
    ///
    /// Returns an error when the URL, headers, proxy URL or TLS settings are
    /// invalid, or reqwest refuses the configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let target = Target::parse(&config.url)?;
        let mut headers = to_standard_headers(&config.headers)?;

        let mut builder = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .http1_title_case_headers()
            .pool_max_idle_per_host(config.effective_max_conns());

        if let Some(timeout) = config.effective_timeout() {
            builder = builder.timeout(timeout);
        }

        if config.disable_keep_alives {
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
            builder = builder
                .pool_max_idle_per_host(0)
                .pool_idle_timeout(Some(Duration::from_secs(0)));
        }

        builder = apply_standard_tls(builder, &config.tls)?;

        if !config.http2 {
            builder = builder.http1_only();
        }

        if config.proxy_url.trim().is_empty() {
            builder = builder.no_proxy();
        } else {
            let proxy = Proxy::all(config.proxy_url.trim()).map_err(|source| {
                ClientError::InvalidProxy {
                    url: config.proxy_url.clone(),
                    source,
                }
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|source| ClientError::BuildClientFailed { source })?;
        debug!(
            "Standard client ready for {} (http2={})",
            target.host_header, config.http2
        );

        let framing = match &config.body {
            BodySource::Fixed(bytes) => {
                BodyFraming::Length(u64::try_from(bytes.len()).unwrap_or(u64::MAX))
            }
            BodySource::Stream(_) => BodyFraming::Chunked,
        };
        // reqwest adds `Accept: */*` when the template has none.
        let mut sent_headers = headers.clone();
        sent_headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static("*/*"));
        let request_head_bytes = request_head_len(
            &config.method,
            &target.request_target,
            &sent_headers,
            &target.host_header,
            &framing,
        );

        Ok(Self {
            client,
            headers,
            method: config.method.clone(),
            url: target.url,
            body: config.body.clone(),
            counters: config.counters.clone(),
            request_head_bytes,
        })
    }

    fn fixed_body_len(&self) -> u64 {
        match &self.body {
            BodySource::Fixed(bytes) => u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            BodySource::Stream(_) => 0,
        }
    }
}

#[async_trait]
impl Client for StandardClient {
    async fn execute(&self) -> Outcome {
        let body = match PreparedBody::resolve(&self.body) {
            Ok(body) => body.into_standard(&self.counters),
            Err(err) => return Outcome::not_sent(err),
        };

        let mut request = reqwest::Request::new(self.method.clone(), self.url.clone());
        *request.headers_mut() = self.headers.clone();
        *request.body_mut() = Some(body);

        let start = Instant::now();
        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(source) => {
                return Outcome::failed(RequestError::Standard { source }, start.elapsed());
            }
        };
        self.counters.add_written_u64(
            self.request_head_bytes
                .saturating_add(self.fixed_body_len()),
        );

        let status = response.status();
        let reason = response
            .extensions()
            .get::<ReasonPhrase>()
            .map(ReasonPhrase::as_bytes);
        self.counters
            .add_read_u64(response_head_len(status, reason, response.headers()));

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => self.counters.add_read(bytes.len()),
                Err(source) => {
                    return Outcome::completed_with_error(
                        status.as_u16(),
                        start.elapsed(),
                        RequestError::Drain { source },
                    );
                }
            }
        }

        Outcome::completed(status.as_u16(), start.elapsed())
    }

    fn transport(&self) -> TransportKind {
        TransportKind::Standard
    }
}
