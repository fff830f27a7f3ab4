use std::fs::File;
use std::path::{Path, PathBuf};

use http::Method;

use crate::error::ConfigError;
use crate::http::{
    BodySource, BodyStream, ClientConfig, ClientIdentity, DEFAULT_TIMEOUT, TlsSettings,
};

use super::parse::parse_header;
use super::types::ConfigFile;

/// Turns a parsed config file into a [`ClientConfig`].
///
/// TLS material is read here, once; a `body_file` is checked here and then
/// reopened by every request.
///
/// # Errors
///
/// Returns an error when required fields are missing, fields conflict, or a
/// referenced file cannot be read.
pub fn to_client_config(config: &ConfigFile) -> Result<ClientConfig, ConfigError> {
    let url = config
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(ConfigError::MissingUrl)?;
    let mut client = ClientConfig::new(url);

    if let Some(method) = config.method.as_deref() {
        client.method = parse_method(method)?;
    }

    if let Some(headers) = config.headers.as_ref() {
        client.headers = headers
            .iter()
            .map(|header| parse_header(header))
            .collect::<Result<Vec<_>, _>>()?;
    }

    client.body = match (config.body.as_ref(), config.body_file.as_deref()) {
        (Some(_), Some(_)) => {
            return Err(ConfigError::Conflict {
                left: "body",
                right: "body_file",
            });
        }
        (Some(body), None) => BodySource::fixed(body.clone()),
        (None, Some(path)) => file_body(Path::new(path))?,
        (None, None) => BodySource::default(),
    };

    if let Some(connections) = config.connections {
        client.max_conns = connections;
    }
    client.timeout = match config.timeout.as_ref() {
        Some(timeout) => timeout.to_duration()?,
        None => DEFAULT_TIMEOUT,
    };
    if let Some(transport) = config.transport {
        client.transport = transport;
    }
    if let Some(proxy) = config.proxy.as_deref() {
        client.proxy_url = proxy.trim().to_owned();
    }
    client.http2 = config.http2.unwrap_or(false);
    client.disable_keep_alives = config.disable_keepalive.unwrap_or(false);
    client.tls = tls_settings(config)?;

    Ok(client)
}

fn parse_method(value: &str) -> Result<Method, ConfigError> {
    let upper = value.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return Err(ConfigError::InvalidMethod {
            value: value.to_owned(),
        });
    }
    Method::from_bytes(upper.as_bytes()).map_err(|_invalid| ConfigError::InvalidMethod {
        value: value.to_owned(),
    })
}

fn file_body(path: &Path) -> Result<BodySource, ConfigError> {
    std::fs::metadata(path).map_err(|source| ConfigError::ReadFile {
        what: "body file",
        path: path.to_path_buf(),
        source,
    })?;
    let path: PathBuf = path.to_path_buf();
    Ok(BodySource::stream(move || {
        let file = File::open(&path)?;
        let stream: BodyStream = Box::new(tokio::fs::File::from_std(file));
        Ok(stream)
    }))
}

fn tls_settings(config: &ConfigFile) -> Result<TlsSettings, ConfigError> {
    let ca_cert_pem = config
        .cacert
        .as_deref()
        .map(|path| read_file("CA certificate", path))
        .transpose()?;

    let identity = match (config.cert.as_deref(), config.key.as_deref()) {
        (Some(cert), Some(key)) => Some(ClientIdentity {
            cert_pem: read_file("client certificate", cert)?,
            key_pem: read_file("client key", key)?,
        }),
        (Some(_), None) => return Err(ConfigError::CertWithoutKey),
        (None, Some(_)) => return Err(ConfigError::KeyWithoutCert),
        (None, None) => None,
    };

    Ok(TlsSettings {
        insecure: config.insecure.unwrap_or(false),
        min_version: config.tls_min,
        max_version: config.tls_max,
        ca_cert_pem,
        identity,
    })
}

fn read_file(what: &'static str, path: &str) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|source| ConfigError::ReadFile {
        what,
        path: PathBuf::from(path),
        source,
    })
}
