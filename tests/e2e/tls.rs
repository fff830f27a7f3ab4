use std::time::Duration;

use loadwire::http::TRANSPORT_FAILURE;

use crate::support::{Reply, TEST_CA_PEM, spawn_tls_origin};
use crate::{TRANSPORTS, build, client_config};

#[tokio::test]
async fn insecure_mode_accepts_an_untrusted_certificate() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_tls_origin(Reply::status(200))?;
        let mut config = client_config(kind, &origin.url("/secure"));
        config.tls.insecure = true;
        let counters = config.counters.clone();
        let client = build(&config)?;

        let (code, elapsed, error) = client.execute().await.into_parts();
        if code != 200 || elapsed == 0 || error.is_some() {
            return Err(format!("{}: unexpected outcome ({}, {}, {:?})", kind, code, elapsed, error));
        }
        let requests = origin.requests();
        let request = requests.first().ok_or(format!("{}: no request recorded", kind))?;
        if request.target != "/secure" {
            return Err(format!("{}: unexpected request {:?}", kind, request));
        }
        if counters.read() == 0 || counters.written() == 0 {
            return Err(format!("{}: counters stayed at zero", kind));
        }
    }
    Ok(())
}

#[tokio::test]
async fn custom_root_certificate_is_trusted() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_tls_origin(Reply::status(200))?;
        let mut config = client_config(kind, &origin.url("/"));
        config.tls.ca_cert_pem = Some(TEST_CA_PEM.to_vec());
        let client = build(&config)?;

        for _ in 0..2 {
            let (code, elapsed, error) = client.execute().await.into_parts();
            if code != 200 || elapsed == 0 || error.is_some() {
                return Err(format!(
                    "{}: unexpected outcome ({}, {}, {:?})",
                    kind, code, elapsed, error
                ));
            }
        }
        if origin.requests().len() != 2 {
            return Err(format!("{}: expected 2 requests, got {}", kind, origin.requests().len()));
        }
    }
    Ok(())
}

#[tokio::test]
async fn untrusted_certificate_is_a_transport_failure() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_tls_origin(Reply::status(200))?;
        let client = build(&client_config(kind, &origin.url("/")))?;

        let outcome = client.execute().await;
        if outcome.code != TRANSPORT_FAILURE || outcome.error.is_none() {
            return Err(format!("{}: expected a verification failure, got {:?}", kind, outcome));
        }
        if !origin.requests().is_empty() {
            return Err(format!("{}: request leaked past a failed handshake", kind));
        }
    }
    Ok(())
}

#[tokio::test]
async fn https_url_against_plain_http_origin_fails() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = crate::support::spawn_origin(Reply::status(200))?;
        let url = format!("https://{}/", origin.authority());
        let mut config = client_config(kind, &url);
        config.tls.insecure = true;
        config.timeout = Duration::from_secs(2);
        let client = build(&config)?;

        let outcome = client.execute().await;
        if outcome.code != TRANSPORT_FAILURE || outcome.error.is_none() {
            return Err(format!("{}: expected a TLS failure, got {:?}", kind, outcome));
        }
    }
    Ok(())
}
