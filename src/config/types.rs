use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::http::{TlsVersion, TransportKind};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub method: Option<String>,
    pub headers: Option<Vec<String>>,
    pub body: Option<String>,
    pub body_file: Option<String>,
    #[serde(alias = "max_conns")]
    pub connections: Option<usize>,
    pub timeout: Option<DurationValue>,
    pub transport: Option<TransportKind>,
    #[serde(alias = "proxy_url")]
    pub proxy: Option<String>,
    pub http2: Option<bool>,
    pub disable_keepalive: Option<bool>,
    pub insecure: Option<bool>,
    pub tls_min: Option<TlsVersion>,
    pub tls_max: Option<TlsVersion>,
    pub cacert: Option<String>,
    pub cert: Option<String>,
    pub key: Option<String>,
}

/// Either whole seconds or a string with a unit (`500ms`, `2s`, `1m`, `1h`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    /// # Errors
    ///
    /// Returns an error for zero, malformed or overflowing durations.
    pub fn to_duration(&self) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(0) => Err(ConfigError::DurationZero),
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }
}
