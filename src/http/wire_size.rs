//! HTTP/1.1 message-size accounting for transports that do not expose their
//! sockets. Sizes follow the textual HTTP/1.1 framing; TLS records and chunk
//! framing are not included.
use http::header::{CONTENT_LENGTH, HOST, HeaderMap, TRANSFER_ENCODING};
use http::{Method, StatusCode};

const CRLF: u64 = 2;
const HEADER_SEPARATOR: u64 = 2;
const HTTP_VERSION: u64 = 8;

pub(crate) enum BodyFraming {
    Length(u64),
    Chunked,
}

/// Request line, headers and terminating blank line as they would be written
/// for this request, including the `Host` and framing headers the transport
/// adds.
pub(crate) fn request_head_len(
    method: &Method,
    request_target: &str,
    headers: &HeaderMap,
    default_host: &str,
    framing: &BodyFraming,
) -> u64 {
    // "METHOD SP target SP HTTP/1.1 CRLF"
    let mut total = len(method.as_str())
        .saturating_add(1)
        .saturating_add(len(request_target))
        .saturating_add(1)
        .saturating_add(HTTP_VERSION)
        .saturating_add(CRLF);

    total = total.saturating_add(headers_len(headers));
    if !headers.contains_key(HOST) {
        total = total.saturating_add(header_line_len(HOST.as_str(), default_host));
    }
    match framing {
        BodyFraming::Length(0) => {}
        BodyFraming::Length(body_len) if !headers.contains_key(CONTENT_LENGTH) => {
            total = total.saturating_add(header_line_len(
                CONTENT_LENGTH.as_str(),
                &body_len.to_string(),
            ));
        }
        BodyFraming::Length(_) => {}
        BodyFraming::Chunked if !headers.contains_key(TRANSFER_ENCODING) => {
            total = total.saturating_add(header_line_len(TRANSFER_ENCODING.as_str(), "chunked"));
        }
        BodyFraming::Chunked => {}
    }
    total.saturating_add(CRLF)
}

/// Status line, headers and terminating blank line of a response.
///
/// `reason` is the phrase the server sent when it differs from the canonical
/// one; `None` means the canonical phrase was used.
pub(crate) fn response_head_len(
    status: StatusCode,
    reason: Option<&[u8]>,
    headers: &HeaderMap,
) -> u64 {
    // "HTTP/1.1 SP 200 SP reason CRLF"
    let reason_len = reason.map_or_else(
        || len(status.canonical_reason().unwrap_or_default()),
        |phrase| to_u64(phrase.len()),
    );
    HTTP_VERSION
        .saturating_add(1)
        .saturating_add(3)
        .saturating_add(1)
        .saturating_add(reason_len)
        .saturating_add(CRLF)
        .saturating_add(headers_len(headers))
        .saturating_add(CRLF)
}

fn headers_len(headers: &HeaderMap) -> u64 {
    headers.iter().fold(0u64, |total, (name, value)| {
        total.saturating_add(
            len(name.as_str())
                .saturating_add(HEADER_SEPARATOR)
                .saturating_add(to_u64(value.as_bytes().len()))
                .saturating_add(CRLF),
        )
    })
}

fn header_line_len(name: &str, value: &str) -> u64 {
    len(name)
        .saturating_add(HEADER_SEPARATOR)
        .saturating_add(len(value))
        .saturating_add(CRLF)
}

fn len(text: &str) -> u64 {
    to_u64(text.len())
}

fn to_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
