// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use digipop_source::Loader;
use digipop_testkit::{RecordFaker, records_json, sample_dataset, temp_json_path};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

fn json_response(body: String, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

#[test]
fn http_loader_fetches_records_with_configured_headers() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let url = format!("http://{}/parts.json", server.server_addr());
    let body = records_json(&sample_dataset());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/parts.json");
        let token = request
            .headers()
            .iter()
            .find(|header| header.field.equiv("X-Api-Key"))
            .map(|header| header.value.as_str().to_owned());
        assert_eq!(token.as_deref(), Some("secret"));
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let loader = Loader::http(
        &url,
        Duration::from_secs(1),
        &[("X-Api-Key".to_owned(), "secret".to_owned())],
    )?;
    assert_eq!(loader.load()?, sample_dataset());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn http_loader_reports_server_errors() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let url = format!("http://{}/parts.json", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(Response::from_string("not found").with_status_code(404))
            .expect("response should succeed");
    });

    let loader = Loader::http(&url, Duration::from_secs(1), &[])?;
    let error = loader.load().expect_err("404 should fail");
    assert!(error.to_string().contains("404"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn load_or_empty_swallows_unreachable_endpoint() -> Result<()> {
    let loader = Loader::http("http://127.0.0.1:1/parts.json", Duration::from_millis(50), &[])?;
    let error = loader.load().expect_err("unreachable endpoint should fail");
    assert!(error.to_string().contains("cannot reach dataset"));
    assert!(loader.load_or_empty().is_empty());
    Ok(())
}

#[test]
fn file_loader_reads_json_array() -> Result<()> {
    let dataset = RecordFaker::new(3).dataset(25);
    let (_dir, path) = temp_json_path(&records_json(&dataset))?;

    let loaded = Loader::file(&path).load()?;
    assert_eq!(loaded, dataset);
    Ok(())
}

#[test]
fn file_loader_failure_falls_back_to_empty() -> Result<()> {
    let (_dir, path) = temp_json_path("{{ not json")?;
    let loader = Loader::file(&path);

    let error = loader.load().expect_err("malformed file should fail");
    assert!(format!("{error:#}").contains("parse dataset"));
    assert!(loader.load_or_empty().is_empty());

    let missing = Loader::file(path.with_file_name("missing.json"));
    assert!(missing.load_or_empty().is_empty());
    Ok(())
}
