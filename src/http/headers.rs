use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::ClientError;

/// Header template for the pooled transport. `None` means "send only the
/// transport defaults".
///
/// # Errors
///
/// Returns an error when a header name or value is not valid HTTP.
pub fn to_pooled_headers(headers: &[(String, String)]) -> Result<Option<HeaderMap>, ClientError> {
    if headers.is_empty() {
        return Ok(None);
    }
    to_header_map(headers).map(Some)
}

/// Header template for the standard transport. Always a map, possibly empty.
///
/// # Errors
///
/// Returns an error when a header name or value is not valid HTTP.
pub fn to_standard_headers(headers: &[(String, String)]) -> Result<HeaderMap, ClientError> {
    if headers.is_empty() {
        return Ok(HeaderMap::new());
    }
    to_header_map(headers)
}

fn to_header_map(headers: &[(String, String)]) -> Result<HeaderMap, ClientError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        let name =
            HeaderName::from_bytes(key.as_bytes()).map_err(|source| ClientError::InvalidHeaderName {
                name: key.clone(),
                source,
            })?;
        let value = HeaderValue::from_str(value).map_err(|source| {
            ClientError::InvalidHeaderValue {
                name: key.clone(),
                source,
            }
        })?;
        map.insert(name, value);
    }
    Ok(map)
}
