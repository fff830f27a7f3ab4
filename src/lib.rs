//! Request execution core for load generators.
//!
//! A load generator builds one [`http::SharedClient`] from an
//! [`http::ClientConfig`] and calls [`http::Client::execute`] from as many
//! workers as it likes. Each call sends one request and reports an
//! [`http::Outcome`]: the status code, the elapsed time and any error. Two
//! transports sit behind the same contract: a pooled HTTP/1.1 transport with
//! socket-level byte counting, and a standard transport on top of reqwest.
//!
//! The `loadwire` binary is a small probe over the same API.
pub mod config;
pub mod error;
pub mod http;
