//! Request execution behind a single `execute` contract.
//!
//! [`build_client`] turns a [`ClientConfig`] into a shared [`Client`] backed
//! either by the pooled transport or by the standard (reqwest) transport.
mod body;
mod client;
mod counters;
mod dial;
mod headers;
mod options;
mod pooled;
mod standard;
mod tls;
mod wire_size;


pub use client::{Client, Outcome, SharedClient, TRANSPORT_FAILURE, build_client};
pub use counters::ByteCounters;
pub use dial::{DialStrategy, Socks5Credentials};
pub use headers::{to_pooled_headers, to_standard_headers};
pub use options::{
    BodyProducer, BodySource, BodyStream, ClientConfig, DEFAULT_MAX_CONNS, DEFAULT_TIMEOUT,
    TransportKind,
};
pub use pooled::PooledClient;
pub use standard::StandardClient;
pub use tls::{ClientIdentity, TlsSettings, TlsVersion};
