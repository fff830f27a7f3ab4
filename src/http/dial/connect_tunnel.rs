use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::DialError;

const MAX_RESPONSE_HEAD: usize = 8 * 1024;

/// Opens a `CONNECT` tunnel to `target` over an established proxy stream.
///
/// The response head is read one byte at a time so nothing past the blank
/// line is consumed; those bytes belong to the tunnelled connection.
pub(super) async fn establish<S>(
    mut stream: S,
    proxy: &str,
    target: &str,
    authorization: Option<&str>,
) -> Result<S, DialError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = connect_request(target, authorization);
    let io_error = |source| DialError::ProxyIo {
        proxy: proxy.to_owned(),
        source,
    };
    stream.write_all(request.as_bytes()).await.map_err(io_error)?;
    stream.flush().await.map_err(io_error)?;

    let mut head = Vec::with_capacity(128);
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= MAX_RESPONSE_HEAD {
            return Err(DialError::MalformedConnectResponse {
                proxy: proxy.to_owned(),
            });
        }
        let read = stream.read(&mut byte).await.map_err(io_error)?;
        if read == 0 {
            return Err(DialError::MalformedConnectResponse {
                proxy: proxy.to_owned(),
            });
        }
        head.extend_from_slice(&byte);
    }

    let text = String::from_utf8_lossy(&head);
    let status_line = text.lines().next().unwrap_or_default().trim();
    let mut parts = status_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(version), Some("200")) if version.starts_with("HTTP/") => Ok(stream),
        (Some(version), Some(_)) if version.starts_with("HTTP/") => {
            Err(DialError::ConnectRejected {
                proxy: proxy.to_owned(),
                status_line: status_line.to_owned(),
            })
        }
        _ => Err(DialError::MalformedConnectResponse {
            proxy: proxy.to_owned(),
        }),
    }
}

fn connect_request(target: &str, authorization: Option<&str>) -> String {
    let mut request = String::with_capacity(96);
    request.push_str("CONNECT ");
    request.push_str(target);
    request.push_str(" HTTP/1.1\r\nHost: ");
    request.push_str(target);
    request.push_str("\r\n");
    if let Some(value) = authorization {
        request.push_str("Proxy-Authorization: ");
        request.push_str(value);
        request.push_str("\r\n");
    }
    request.push_str("\r\n");
    request
}
