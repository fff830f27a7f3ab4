use std::fmt;

use reqwest::ClientBuilder;
use serde::Deserialize;

use crate::error::{ClientError, ConfigError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVersion {
    V1_0,
    V1_1,
    V1_2,
    V1_3,
}

impl TlsVersion {
    const fn label(self) -> &'static str {
        match self {
            TlsVersion::V1_0 => "1.0",
            TlsVersion::V1_1 => "1.1",
            TlsVersion::V1_2 => "1.2",
            TlsVersion::V1_3 => "1.3",
        }
    }
}

impl std::str::FromStr for TlsVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "1.0" | "tls1.0" | "tls1" | "v1.0" => Ok(TlsVersion::V1_0),
            "1.1" | "tls1.1" | "v1.1" => Ok(TlsVersion::V1_1),
            "1.2" | "tls1.2" | "v1.2" => Ok(TlsVersion::V1_2),
            "1.3" | "tls1.3" | "v1.3" => Ok(TlsVersion::V1_3),
            _ => Err(ConfigError::InvalidTlsVersion {
                value: s.to_owned(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for TlsVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// PEM-encoded client certificate and PKCS#8 private key.
#[derive(Clone)]
pub struct ClientIdentity {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("cert_pem", &self.cert_pem.len())
            .field("key_pem", &"<redacted>")
            .finish()
    }
}

/// TLS parameters shared by both transports.
#[derive(Debug, Clone, Default)]
pub struct TlsSettings {
    /// Skip certificate and hostname verification.
    pub insecure: bool,
    pub min_version: Option<TlsVersion>,
    pub max_version: Option<TlsVersion>,
    /// Extra PEM root certificate.
    pub ca_cert_pem: Option<Vec<u8>>,
    pub identity: Option<ClientIdentity>,
}

impl TlsSettings {
    pub(super) fn validate(&self) -> Result<(), ClientError> {
        if let (Some(min), Some(max)) = (self.min_version, self.max_version)
            && tls_version_rank(min) > tls_version_rank(max)
        {
            return Err(ClientError::TlsVersionRange);
        }
        Ok(())
    }
}

pub(super) fn apply_standard_tls(
    mut builder: ClientBuilder,
    settings: &TlsSettings,
) -> Result<ClientBuilder, ClientError> {
    settings.validate()?;

    if let Some(min) = settings.min_version {
        builder = builder.min_tls_version(to_reqwest_tls_version(min));
    }
    if let Some(max) = settings.max_version {
        builder = builder.max_tls_version(to_reqwest_tls_version(max));
    }

    if let Some(pem) = settings.ca_cert_pem.as_ref() {
        let cert = reqwest::Certificate::from_pem(pem)
            .map_err(|source| ClientError::StandardTls { source })?;
        builder = builder.add_root_certificate(cert);
    }

    if let Some(identity) = settings.identity.as_ref() {
        let identity = reqwest::Identity::from_pkcs8_pem(&identity.cert_pem, &identity.key_pem)
            .map_err(|source| ClientError::StandardTls { source })?;
        builder = builder.identity(identity);
    }

    if settings.insecure {
        builder = builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    Ok(builder)
}

/// Builds the connector the pooled transport wraps its sockets with.
pub(super) fn pooled_connector(
    settings: &TlsSettings,
) -> Result<tokio_native_tls::TlsConnector, ClientError> {
    settings.validate()?;

    let mut builder = native_tls::TlsConnector::builder();
    if let Some(min) = settings.min_version {
        let protocol = to_native_protocol(min).ok_or(ClientError::UnsupportedTlsMinimum {
            version: min.label(),
        })?;
        builder.min_protocol_version(Some(protocol));
    }
    // native-tls has no 1.3 variant; a 1.3 maximum leaves the upper bound open.
    builder.max_protocol_version(settings.max_version.and_then(to_native_protocol));

    if let Some(pem) = settings.ca_cert_pem.as_ref() {
        let cert = native_tls::Certificate::from_pem(pem)
            .map_err(|source| ClientError::InvalidCaCert { source })?;
        builder.add_root_certificate(cert);
    }

    if let Some(identity) = settings.identity.as_ref() {
        let identity = native_tls::Identity::from_pkcs8(&identity.cert_pem, &identity.key_pem)
            .map_err(|source| ClientError::InvalidIdentity { source })?;
        builder.identity(identity);
    }

    if settings.insecure {
        builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    let connector = builder
        .build()
        .map_err(|source| ClientError::TlsConnector { source })?;
    Ok(tokio_native_tls::TlsConnector::from(connector))
}

const fn to_reqwest_tls_version(version: TlsVersion) -> reqwest::tls::Version {
    match version {
        TlsVersion::V1_0 => reqwest::tls::Version::TLS_1_0,
        TlsVersion::V1_1 => reqwest::tls::Version::TLS_1_1,
        TlsVersion::V1_2 => reqwest::tls::Version::TLS_1_2,
        TlsVersion::V1_3 => reqwest::tls::Version::TLS_1_3,
    }
}

const fn to_native_protocol(version: TlsVersion) -> Option<native_tls::Protocol> {
    match version {
        TlsVersion::V1_0 => Some(native_tls::Protocol::Tlsv10),
        TlsVersion::V1_1 => Some(native_tls::Protocol::Tlsv11),
        TlsVersion::V1_2 => Some(native_tls::Protocol::Tlsv12),
        TlsVersion::V1_3 => None,
    }
}

const fn tls_version_rank(version: TlsVersion) -> u8 {
    match version {
        TlsVersion::V1_0 => 0,
        TlsVersion::V1_1 => 1,
        TlsVersion::V1_2 => 2,
        TlsVersion::V1_3 => 3,
    }
}
