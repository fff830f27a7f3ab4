use std::io::Cursor;
use std::time::Duration;

use loadwire::error::RequestError;
use loadwire::http::{BodySource, BodyStream, TRANSPORT_FAILURE};

use crate::support::{Reply, spawn_origin};
use crate::{TRANSPORTS, build, client_config};

#[tokio::test]
async fn post_json_gets_created() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_origin(Reply::status(201).with_body(b"{\"id\":1}"))?;
        let mut config = client_config(kind, &origin.url("/items"));
        config.method = http::Method::POST;
        config.headers = vec![("Content-Type".to_owned(), "application/json".to_owned())];
        config.body = BodySource::fixed("{}");
        let client = build(&config)?;

        let (code, elapsed, error) = client.execute().await.into_parts();
        if code != 201 || elapsed == 0 || error.is_some() {
            return Err(format!("{}: unexpected outcome ({}, {}, {:?})", kind, code, elapsed, error));
        }

        let requests = origin.requests();
        let request = requests.first().ok_or(format!("{}: no request recorded", kind))?;
        if request.method != "POST" || request.target != "/items" {
            return Err(format!("{}: unexpected request line {:?}", kind, request));
        }
        if request.header("content-type") != Some("application/json") {
            return Err(format!("{}: missing content type {:?}", kind, request.headers));
        }
        if request.header("content-length") != Some("2") || request.body != b"{}" {
            return Err(format!("{}: unexpected body framing {:?}", kind, request));
        }
    }
    Ok(())
}

#[tokio::test]
async fn repeated_requests_complete() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_origin(Reply::status(200))?;
        let client = build(&client_config(kind, &origin.url("/search?q=load&page=2")))?;
        for attempt in 0..5 {
            let outcome = client.execute().await;
            if outcome.code < 100 || outcome.error.is_some() {
                return Err(format!("{}: attempt {} gave {:?}", kind, attempt, outcome));
            }
        }
        let requests = origin.requests();
        if requests.len() != 5 {
            return Err(format!("{}: expected 5 requests, got {}", kind, requests.len()));
        }
        if requests.iter().any(|request| request.target != "/search?q=load&page=2") {
            return Err(format!("{}: query lost: {:?}", kind, requests));
        }
    }
    Ok(())
}

#[tokio::test]
async fn non_success_status_is_not_an_error() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_origin(Reply::status(503).with_body(b"busy"))?;
        let client = build(&client_config(kind, &origin.url("/")))?;
        let outcome = client.execute().await;
        if outcome.code != 503 || outcome.error.is_some() {
            return Err(format!("{}: unexpected outcome {:?}", kind, outcome));
        }
    }
    Ok(())
}

#[tokio::test]
async fn host_header_defaults_to_authority_and_can_be_overridden() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_origin(Reply::status(200))?;
        let default_client = build(&client_config(kind, &origin.url("/")))?;
        let outcome = default_client.execute().await;
        if outcome.error.is_some() {
            return Err(format!("{}: default host request failed {:?}", kind, outcome));
        }

        let mut config = client_config(kind, &origin.url("/"));
        config.headers = vec![("Host".to_owned(), "virtual.test".to_owned())];
        let client = build(&config)?;
        for _ in 0..3 {
            let outcome = client.execute().await;
            if outcome.error.is_some() {
                return Err(format!("{}: override request failed {:?}", kind, outcome));
            }
        }

        let requests = origin.requests();
        let hosts: Vec<Option<&str>> = requests.iter().map(|request| request.header("host")).collect();
        let authority = origin.authority();
        let expected = vec![
            Some(authority.as_str()),
            Some("virtual.test"),
            Some("virtual.test"),
            Some("virtual.test"),
        ];
        if hosts != expected {
            return Err(format!("{}: unexpected host headers {:?}", kind, hosts));
        }
    }
    Ok(())
}

#[tokio::test]
async fn streamed_body_is_sent_chunked() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_origin(Reply::status(200))?;
        let mut config = client_config(kind, &origin.url("/upload"));
        config.method = http::Method::PUT;
        config.body = BodySource::stream(|| {
            let stream: BodyStream = Box::new(Cursor::new(b"streamed-payload".to_vec()));
            Ok(stream)
        });
        let client = build(&config)?;

        for _ in 0..2 {
            let outcome = client.execute().await;
            if outcome.code != 200 || outcome.error.is_some() {
                return Err(format!("{}: unexpected outcome {:?}", kind, outcome));
            }
        }

        let requests = origin.requests();
        if requests.len() != 2 {
            return Err(format!("{}: expected 2 requests, got {}", kind, requests.len()));
        }
        for request in &requests {
            if request.header("transfer-encoding") != Some("chunked") {
                return Err(format!("{}: body not chunked {:?}", kind, request.headers));
            }
            if request.body != b"streamed-payload" {
                return Err(format!("{}: unexpected body {:?}", kind, request.body));
            }
        }
    }
    Ok(())
}

#[tokio::test]
async fn failing_producer_never_touches_the_network() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_origin(Reply::status(200))?;
        let mut config = client_config(kind, &origin.url("/"));
        config.method = http::Method::POST;
        config.body = BodySource::stream(|| Err(std::io::Error::other("payload unavailable")));
        let client = build(&config)?;

        for _ in 0..3 {
            match client.execute().await.into_parts() {
                (0, 0, Some(RequestError::BodyProducer { .. })) => {}
                other => return Err(format!("{}: unexpected outcome {:?}", kind, other)),
            }
        }
        if origin.accepted() != 0 {
            return Err(format!("{}: {} connections opened", kind, origin.accepted()));
        }
        if config.counters.read() != 0 || config.counters.written() != 0 {
            return Err(format!("{}: counters moved without traffic", kind));
        }
    }
    Ok(())
}

#[tokio::test]
async fn elapsed_time_includes_server_delay() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_origin(Reply::status(200).with_delay(Duration::from_millis(60)))?;
        let client = build(&client_config(kind, &origin.url("/slow")))?;
        let outcome = client.execute().await;
        if outcome.code != 200 || outcome.error.is_some() {
            return Err(format!("{}: unexpected outcome {:?}", kind, outcome));
        }
        if outcome.elapsed_micros < 50_000 {
            return Err(format!("{}: elapsed {}us too small", kind, outcome.elapsed_micros));
        }
    }
    Ok(())
}

#[tokio::test]
async fn timeout_is_a_transport_failure() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_origin(Reply::status(200).with_delay(Duration::from_millis(500)))?;
        let mut config = client_config(kind, &origin.url("/slow"));
        config.timeout = Duration::from_millis(50);
        let client = build(&config)?;

        let outcome = client.execute().await;
        if outcome.code != TRANSPORT_FAILURE {
            return Err(format!("{}: expected failure, got {:?}", kind, outcome));
        }
        if !outcome.error.as_ref().is_some_and(RequestError::is_timeout) {
            return Err(format!("{}: expected a timeout, got {:?}", kind, outcome.error));
        }
        if outcome.elapsed_micros < 40_000 || outcome.elapsed_micros > 450_000 {
            return Err(format!("{}: unexpected elapsed {}us", kind, outcome.elapsed_micros));
        }
    }
    Ok(())
}

#[tokio::test]
async fn byte_counters_grow_by_one_request_each_time() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_origin(Reply::status(200).with_body(b"hello world"))?;
        let mut config = client_config(kind, &origin.url("/count"));
        config.method = http::Method::POST;
        config.body = BodySource::fixed("ping");
        let counters = config.counters.clone();
        let client = build(&config)?;

        let outcome = client.execute().await;
        if outcome.error.is_some() {
            return Err(format!("{}: first request failed {:?}", kind, outcome));
        }
        let (read_once, written_once) = (counters.read(), counters.written());
        // At least the body bytes each way.
        if read_once < 11 || written_once < 4 {
            return Err(format!(
                "{}: counters too small ({}, {})",
                kind, read_once, written_once
            ));
        }

        let mut previous = (read_once, written_once);
        for _ in 0..3 {
            let outcome = client.execute().await;
            if outcome.error.is_some() {
                return Err(format!("{}: request failed {:?}", kind, outcome));
            }
            let current = (counters.read(), counters.written());
            if current.0 < previous.0 || current.1 < previous.1 {
                return Err(format!("{}: counters went backwards", kind));
            }
            previous = current;
        }
        if counters.read() != read_once.saturating_mul(4)
            || counters.written() != written_once.saturating_mul(4)
        {
            return Err(format!(
                "{}: expected 4x ({}, {}), got ({}, {})",
                kind,
                read_once,
                written_once,
                counters.read(),
                counters.written()
            ));
        }
    }
    Ok(())
}

#[tokio::test]
async fn disabled_keep_alive_opens_a_connection_per_request() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_origin(Reply::status(200))?;
        let mut config = client_config(kind, &origin.url("/"));
        config.disable_keep_alives = true;
        let client = build(&config)?;
        for _ in 0..3 {
            let outcome = client.execute().await;
            if outcome.code != 200 || outcome.error.is_some() {
                return Err(format!("{}: unexpected outcome {:?}", kind, outcome));
            }
        }
        if origin.accepted() != 3 {
            return Err(format!("{}: expected 3 connections, got {}", kind, origin.accepted()));
        }
    }
    Ok(())
}

#[tokio::test]
async fn disabled_keep_alive_sends_connection_close() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_origin(Reply::status(200))?;
        let mut config = client_config(kind, &origin.url("/"));
        config.disable_keep_alives = true;
        let counters = config.counters.clone();
        let client = build(&config)?;
        let outcome = client.execute().await;
        if outcome.error.is_some() {
            return Err(format!("{}: unexpected outcome {:?}", kind, outcome));
        }
        let requests = origin.requests();
        let request = requests.first().ok_or(format!("{}: no request recorded", kind))?;
        if request.header("connection") != Some("close") {
            return Err(format!("{}: expected Connection: close, got {:?}", kind, request.headers));
        }
        let received = u64::try_from(request.head_len).unwrap_or(u64::MAX);
        if counters.written() != received {
            return Err(format!(
                "{}: written {} but the server received {}",
                kind,
                counters.written(),
                received
            ));
        }
    }
    Ok(())
}

#[tokio::test]
async fn read_counter_matches_non_canonical_reason_phrases() -> Result<(), String> {
    for reason in ["Everything Fine", ""] {
        for kind in TRANSPORTS {
            let reply = Reply::status(200).with_reason(reason).with_body(b"hi");
            let expected = reply.wire_len().saturating_mul(2);
            let origin = spawn_origin(reply)?;
            let config = client_config(kind, &origin.url("/"));
            let counters = config.counters.clone();
            let client = build(&config)?;
            for _ in 0..2 {
                let outcome = client.execute().await;
                if outcome.code != 200 || outcome.error.is_some() {
                    return Err(format!("{}: unexpected outcome {:?}", kind, outcome));
                }
            }
            if counters.read() != expected {
                return Err(format!(
                    "{} with reason {:?}: read {} but the server sent {}",
                    kind,
                    reason,
                    counters.read(),
                    expected
                ));
            }
        }
    }
    Ok(())
}

#[tokio::test]
async fn header_names_are_sent_title_cased() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_origin(Reply::status(200))?;
        let mut config = client_config(kind, &origin.url("/"));
        config.headers = vec![("x-trace-id".to_owned(), "abc".to_owned())];
        let client = build(&config)?;
        let outcome = client.execute().await;
        if outcome.error.is_some() {
            return Err(format!("{}: unexpected outcome {:?}", kind, outcome));
        }
        let requests = origin.requests();
        let request = requests.first().ok_or(format!("{}: no request recorded", kind))?;
        let names: Vec<&str> = request.headers.iter().map(|(name, _)| name.as_str()).collect();
        if !names.contains(&"X-Trace-Id") || !names.contains(&"Host") {
            return Err(format!("{}: expected title-cased names, got {:?}", kind, names));
        }
    }
    Ok(())
}

#[tokio::test]
async fn server_closing_connections_is_handled() -> Result<(), String> {
    for kind in TRANSPORTS {
        let origin = spawn_origin(Reply::status(200).closing())?;
        let client = build(&client_config(kind, &origin.url("/")))?;
        for attempt in 0..3 {
            let outcome = client.execute().await;
            if outcome.code != 200 || outcome.error.is_some() {
                return Err(format!("{}: attempt {} gave {:?}", kind, attempt, outcome));
            }
        }
    }
    Ok(())
}

#[tokio::test]
async fn refused_connection_is_a_transport_failure() -> Result<(), String> {
    for kind in TRANSPORTS {
        let url = crate::support::refused_url("http")?;
        let client = build(&client_config(kind, &url))?;
        let outcome = client.execute().await;
        if outcome.code != TRANSPORT_FAILURE || outcome.error.is_none() {
            return Err(format!("{}: expected failure, got {:?}", kind, outcome));
        }
    }
    Ok(())
}
