use std::cell::RefCell;
use std::io::{Cursor, Write};

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use httpmock::prelude::*;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use aura_sample_data::app::{ProgressEvent, ProgressSink, ProvisionOutcome, Provisioner};
use aura_sample_data::config::ProvisionConfig;
use aura_sample_data::download::{ArchiveClient, HttpArchiveClient};
use aura_sample_data::error::ProvisionError;
use aura_sample_data::output::progress_text;

#[derive(Default)]
struct RecordingSink {
    events: RefCell<Vec<ProgressEvent>>,
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.events.borrow_mut().push(event);
    }
}

fn sample_archive() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.add_directory("data/", options).unwrap();
    for matter in ["matter-a", "matter-b", "matter-c"] {
        zip.start_file(format!("data/{matter}/summary.txt"), options)
            .unwrap();
        zip.write_all(format!("{matter} summary\n").repeat(200).as_bytes())
            .unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn provisioner_for(
    server: &MockServer,
    temp: &tempfile::TempDir,
) -> Provisioner<HttpArchiveClient> {
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let mut config = ProvisionConfig::with_root(root);
    config.source_url = server.url("/aura_sample_data.zip");
    Provisioner::new(config, HttpArchiveClient::new().unwrap())
}

#[test]
fn downloads_and_extracts_three_matters() {
    let server = MockServer::start();
    let archive = sample_archive();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/aura_sample_data.zip");
        then.status(200)
            .header("content-type", "application/zip")
            .body(&archive);
    });
    let temp = tempfile::tempdir().unwrap();
    let provisioner = provisioner_for(&server, &temp);
    let sink = RecordingSink::default();

    let outcome = provisioner.ensure_data_present(&sink).unwrap();

    mock.assert();
    assert_eq!(
        outcome,
        ProvisionOutcome::Downloaded {
            bytes: archive.len() as u64,
            entries: 3
        }
    );
    assert!(!provisioner.config().archive_path().exists());
    assert!(temp.path().join("data/matter-b/summary.txt").is_file());

    let rendered: Vec<String> = sink.events.borrow().iter().filter_map(progress_text).collect();
    assert_eq!(
        rendered
            .iter()
            .filter(|text| text.as_str() == "Progress: 100.0%")
            .count(),
        1
    );
    assert_eq!(rendered.last().map(String::as_str), Some("Progress: 100.0%"));
    assert_matches!(
        sink.events.borrow().last(),
        Some(ProgressEvent::Completed { entries: 3, .. })
    );
}

#[test]
fn present_data_makes_no_request() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/aura_sample_data.zip");
        then.status(200).body(sample_archive());
    });
    let temp = tempfile::tempdir().unwrap();
    std::fs::create_dir(temp.path().join("data")).unwrap();
    std::fs::write(temp.path().join("data/readme.txt"), b"already here").unwrap();
    let provisioner = provisioner_for(&server, &temp);

    let outcome = provisioner
        .ensure_data_present(&RecordingSink::default())
        .unwrap();

    assert_eq!(outcome, ProvisionOutcome::AlreadyPresent { entries: 1 });
    mock.assert_hits(0);
}

#[test]
fn not_found_is_an_http_status_error() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/aura_sample_data.zip");
        then.status(404).body("Not Found");
    });
    let temp = tempfile::tempdir().unwrap();
    let provisioner = provisioner_for(&server, &temp);

    let err = provisioner
        .ensure_data_present(&RecordingSink::default())
        .unwrap_err();

    mock.assert();
    assert_matches!(err, ProvisionError::HttpStatus { status: 404, .. });
    assert!(!temp.path().join("data").exists());
    assert!(!provisioner.config().archive_path().exists());
}

#[test]
fn served_garbage_is_an_archive_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/aura_sample_data.zip");
        then.status(200).body("<html>definitely not a zip</html>");
    });
    let temp = tempfile::tempdir().unwrap();
    let provisioner = provisioner_for(&server, &temp);

    let err = provisioner
        .ensure_data_present(&RecordingSink::default())
        .unwrap_err();

    assert_matches!(err, ProvisionError::ArchiveFormat(_));
    assert!(!provisioner.config().archive_path().exists());
    assert!(!temp.path().join("data").exists());
}

#[test]
fn refused_connection_is_a_network_error() {
    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("aura_sample_data.zip");
    let client = HttpArchiveClient::new().unwrap();

    let err = client
        .download(
            "http://127.0.0.1:1/aura_sample_data.zip",
            &destination,
            8192,
            &RecordingSink::default(),
        )
        .unwrap_err();

    assert_matches!(err, ProvisionError::Network { .. });
    assert!(!destination.exists());
}

#[test]
fn client_streams_body_in_bounded_chunks() {
    let server = MockServer::start();
    let body = vec![7u8; 20_000];
    server.mock(|when, then| {
        when.method(GET).path("/blob");
        then.status(200).body(&body);
    });
    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("blob.bin");
    let sink = RecordingSink::default();

    let written = HttpArchiveClient::new()
        .unwrap()
        .download(&server.url("/blob"), &destination, 4096, &sink)
        .unwrap();

    assert_eq!(written, 20_000);
    assert_eq!(std::fs::read(&destination).unwrap(), body);
    let events = sink.events.borrow();
    assert!(events.len() >= 5);
    let mut previous = 0;
    for event in events.iter() {
        let ProgressEvent::Progress { downloaded, total } = event else {
            panic!("unexpected event {event:?}");
        };
        assert!(*downloaded > previous);
        assert!(*downloaded - previous <= 4096);
        assert_eq!(*total, Some(20_000));
        previous = *downloaded;
    }
}
