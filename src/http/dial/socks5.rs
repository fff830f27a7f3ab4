use std::net::IpAddr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::DialError;

use super::Socks5Credentials;

const VERSION: u8 = 0x05;
const AUTH_NONE: u8 = 0x00;
const AUTH_PASSWORD: u8 = 0x02;
const PASSWORD_AUTH_VERSION: u8 = 0x01;
const CMD_CONNECT: u8 = 0x01;
const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// Negotiates a SOCKS5 `CONNECT` to `host:port` on an established proxy
/// stream, with optional username/password authentication.
pub(super) async fn handshake<S>(
    mut stream: S,
    proxy: &str,
    host: &str,
    port: u16,
    credentials: Option<&Socks5Credentials>,
) -> Result<S, DialError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let io_error = |source| DialError::ProxyIo {
        proxy: proxy.to_owned(),
        source,
    };
    let invalid_reply = || DialError::Socks5InvalidReply {
        proxy: proxy.to_owned(),
    };

    let greeting: &[u8] = if credentials.is_some() {
        &[VERSION, 2, AUTH_NONE, AUTH_PASSWORD]
    } else {
        &[VERSION, 1, AUTH_NONE]
    };
    stream.write_all(greeting).await.map_err(io_error)?;

    let mut choice = [0u8; 2];
    stream.read_exact(&mut choice).await.map_err(io_error)?;
    let [version, method] = choice;
    if version != VERSION {
        return Err(invalid_reply());
    }
    match (method, credentials) {
        (AUTH_NONE, _) => {}
        (AUTH_PASSWORD, Some(credentials)) => {
            authenticate(&mut stream, proxy, credentials).await?;
        }
        _ => {
            return Err(DialError::Socks5NoAcceptableAuth {
                proxy: proxy.to_owned(),
            });
        }
    }

    let request = connect_request(host, port)?;
    stream.write_all(&request).await.map_err(io_error)?;

    let mut reply = [0u8; 4];
    stream.read_exact(&mut reply).await.map_err(io_error)?;
    let [version, status, _reserved, address_type] = reply;
    if version != VERSION {
        return Err(invalid_reply());
    }
    if status != 0x00 {
        return Err(DialError::Socks5Rejected {
            proxy: proxy.to_owned(),
            reply: status,
        });
    }

    // Bound address plus port; read and discarded.
    let remaining = match address_type {
        ATYP_IPV4 => 6,
        ATYP_IPV6 => 18,
        ATYP_DOMAIN => {
            let mut len = [0u8; 1];
            stream.read_exact(&mut len).await.map_err(io_error)?;
            let [len] = len;
            usize::from(len).saturating_add(2)
        }
        _ => return Err(invalid_reply()),
    };
    let mut bound = vec![0u8; remaining];
    stream.read_exact(&mut bound).await.map_err(io_error)?;

    Ok(stream)
}

async fn authenticate<S>(
    stream: &mut S,
    proxy: &str,
    credentials: &Socks5Credentials,
) -> Result<(), DialError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let io_error = |source| DialError::ProxyIo {
        proxy: proxy.to_owned(),
        source,
    };
    let username = credentials.username.as_bytes();
    let password = credentials.password.as_bytes();
    let username_len = u8::try_from(username.len())
        .map_err(|_overflow| DialError::Socks5FieldTooLong { field: "username" })?;
    let password_len = u8::try_from(password.len())
        .map_err(|_overflow| DialError::Socks5FieldTooLong { field: "password" })?;

    let mut request =
        Vec::with_capacity(username.len().saturating_add(password.len()).saturating_add(3));
    request.push(PASSWORD_AUTH_VERSION);
    request.push(username_len);
    request.extend_from_slice(username);
    request.push(password_len);
    request.extend_from_slice(password);
    stream.write_all(&request).await.map_err(io_error)?;

    let mut reply = [0u8; 2];
    stream.read_exact(&mut reply).await.map_err(io_error)?;
    let [_version, status] = reply;
    if status != 0x00 {
        return Err(DialError::Socks5AuthRejected {
            proxy: proxy.to_owned(),
        });
    }
    Ok(())
}

fn connect_request(host: &str, port: u16) -> Result<Vec<u8>, DialError> {
    let mut request = vec![VERSION, CMD_CONNECT, 0x00];
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => {
            request.push(ATYP_IPV4);
            request.extend_from_slice(&ip.octets());
        }
        Ok(IpAddr::V6(ip)) => {
            request.push(ATYP_IPV6);
            request.extend_from_slice(&ip.octets());
        }
        Err(_not_an_ip) => {
            let len = u8::try_from(host.len())
                .map_err(|_overflow| DialError::Socks5FieldTooLong { field: "host" })?;
            request.push(ATYP_DOMAIN);
            request.push(len);
            request.extend_from_slice(host.as_bytes());
        }
    }
    request.extend_from_slice(&port.to_be_bytes());
    Ok(request)
}
