//! Dataset files on disk, read directly and through the loader worker.

use std::fs;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use vgrid::loader::{LoadRequest, LoadResponse, load_dataset, start_loader_worker};
use vgrid::{GridConfig, GridError, GridEvent};

use crate::helpers::grid;

#[test]
fn loads_json_array_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.json");
    fs::write(&path, r#"[{"_id": 1, "name": "Ann"}, {"_id": 2, "name": "Bob"}]"#).unwrap();

    let ds = load_dataset(&path).unwrap();
    assert_eq!(ds.rows.len(), 2);
    assert!(ds.columns.is_none());
}

#[test]
fn loads_ndjson_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.ndjson");
    fs::write(&path, "{\"t\": 1, \"kind\": \"a\"}\n\n{\"t\": 2, \"kind\": \"b\"}\n").unwrap();

    let ds = load_dataset(&path).unwrap();
    assert_eq!(ds.rows.len(), 2);
    assert_eq!(ds.rows[1]["kind"], "b");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_dataset(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, GridError::Io(_)));
}

#[test]
fn worker_answers_each_request() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.json");
    fs::write(
        &good,
        r#"{"columns": [{"field": "name", "title": "Name", "width": 90}], "rows": [{"name": "x", "n": 1}]}"#,
    )
    .unwrap();
    let bad = dir.path().join("bad.json");
    fs::write(&bad, "{ not json").unwrap();

    let (req_tx, req_rx) = crossbeam_channel::unbounded();
    let (resp_tx, resp_rx) = crossbeam_channel::unbounded();
    let worker = std::thread::spawn(move || start_loader_worker(req_rx, resp_tx));

    req_tx.send(LoadRequest::Open(good.clone())).unwrap();
    req_tx.send(LoadRequest::Open(bad)).unwrap();
    drop(req_tx);

    let first = resp_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let (path, rows, columns) = match first {
        LoadResponse::Dataset { path, rows, columns } => (path, rows, columns),
        other => panic!("expected a dataset, got {other:?}"),
    };
    assert_eq!(path, good);
    assert_eq!(rows.len(), 1);
    let columns = columns.unwrap_or_default();
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].width, Some(90.0));

    let second = resp_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(matches!(second, LoadResponse::Error(msg) if msg.contains("bad.json")));

    worker.join().unwrap();
}

#[test]
fn loaded_document_drives_a_grid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("doc.json");
    fs::write(
        &path,
        r#"{"columns": [{"field": "name", "title": "Name"}], "rows": [{"n": 1, "name": "b"}, {"n": 2, "name": "a"}]}"#,
    )
    .unwrap();
    let ds = load_dataset(&path).unwrap();

    let now = Instant::now();
    let mut g = grid(GridConfig::default());
    if let Some(defs) = &ds.columns {
        g.set_column_defs(defs).unwrap();
    }
    g.set_rows(std::sync::Arc::new(ds.rows), now);
    assert_eq!(g.columns().columns(), vec!["name"]);
    assert!(g.on_header_click(0, now));
    let events = g.tick(now + Duration::from_millis(200));
    assert!(events.contains(&GridEvent::ActiveViewChanged { len: 2 }));
    assert_eq!(g.displayed_row(0).map(|r| r["n"].clone()), Some(serde_json::json!(2)));
}
