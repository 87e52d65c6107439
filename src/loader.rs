//! Background dataset loading. The worker owns all file I/O and answers
//! requests over channels so the UI thread never blocks on disk.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::column::ColumnDef;
use crate::error::{GridError, GridResult};
use crate::row::Row;

#[derive(Debug)]
pub enum LoadRequest {
    Open(PathBuf),
}

#[derive(Debug)]
pub enum LoadResponse {
    Dataset {
        path: PathBuf,
        rows: Vec<Row>,
        /// Column definitions shipped inside the file, if any
        columns: Option<Vec<ColumnDef>>,
    },
    Error(String),
}

#[derive(Debug)]
pub struct Dataset {
    pub rows: Vec<Row>,
    pub columns: Option<Vec<ColumnDef>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetFile {
    Rows(Vec<Value>),
    Document {
        rows: Vec<Value>,
        #[serde(default)]
        columns: Option<Vec<ColumnDef>>,
    },
}

pub fn start_loader_worker(req_rx: Receiver<LoadRequest>, resp_tx: Sender<LoadResponse>) {
    while let Ok(req) = req_rx.recv() {
        let resp = match req {
            LoadRequest::Open(path) => match load_dataset(&path) {
                Ok(ds) => {
                    info!(path = %path.display(), rows = ds.rows.len(), "dataset loaded");
                    LoadResponse::Dataset {
                        path,
                        rows: ds.rows,
                        columns: ds.columns,
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "dataset load failed");
                    LoadResponse::Error(format!("{}: {e}", path.display()))
                }
            },
        };
        if resp_tx.send(resp).is_err() {
            break;
        }
    }
}

/// Reads a dataset file. `.ndjson`/`.jsonl` files hold one object per line;
/// anything else is a JSON array of objects or `{ "rows": [...], "columns": [...] }`.
pub fn load_dataset(path: &Path) -> GridResult<Dataset> {
    let file = File::open(path)?;
    let is_lines = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ndjson") || e.eq_ignore_ascii_case("jsonl"));
    if is_lines {
        parse_lines(BufReader::new(file))
    } else {
        parse_document(BufReader::new(file))
    }
}

pub fn parse_document<R: Read>(reader: R) -> GridResult<Dataset> {
    let file: DatasetFile = serde_json::from_reader(reader)?;
    let (values, columns) = match file {
        DatasetFile::Rows(values) => (values, None),
        DatasetFile::Document { rows, columns } => (rows, columns),
    };
    let rows = values
        .into_iter()
        .enumerate()
        .map(|(i, v)| into_row(v, i))
        .collect::<GridResult<Vec<_>>>()?;
    Ok(Dataset { rows, columns })
}

pub fn parse_lines<R: BufRead>(reader: R) -> GridResult<Dataset> {
    let mut rows = Vec::new();
    let mut saw_content = false;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        saw_content = true;
        rows.push(into_row(serde_json::from_str(&line)?, i)?);
    }
    if !saw_content {
        return Err(GridError::EmptyFile);
    }
    Ok(Dataset {
        rows,
        columns: None,
    })
}

fn into_row(value: Value, idx: usize) -> GridResult<Row> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(GridError::InvalidData(format!(
            "row {idx} is not an object: {other}"
        ))),
    }
}
