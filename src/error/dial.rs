use thiserror::Error;

#[derive(Debug, Error)]
pub enum DialError {
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Proxy handshake with {proxy} failed: {source}")]
    ProxyIo {
        proxy: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Proxy {proxy} refused CONNECT: {status_line}")]
    ConnectRejected { proxy: String, status_line: String },
    #[error("Proxy {proxy} sent a malformed CONNECT response.")]
    MalformedConnectResponse { proxy: String },
    #[error("SOCKS5 proxy {proxy} offered no acceptable auth method.")]
    Socks5NoAcceptableAuth { proxy: String },
    #[error("SOCKS5 proxy {proxy} rejected the credentials.")]
    Socks5AuthRejected { proxy: String },
    #[error("SOCKS5 proxy {proxy} refused the connection (reply {reply}).")]
    Socks5Rejected { proxy: String, reply: u8 },
    #[error("SOCKS5 proxy {proxy} sent an invalid reply.")]
    Socks5InvalidReply { proxy: String },
    #[error("SOCKS5 field '{field}' exceeds 255 bytes.")]
    Socks5FieldTooLong { field: &'static str },
    #[error("TLS handshake with {host} failed: {source}")]
    Tls {
        host: String,
        #[source]
        source: native_tls::Error,
    },
    #[error("HTTP/1.1 handshake failed: {source}")]
    Handshake {
        #[source]
        source: hyper::Error,
    },
}
