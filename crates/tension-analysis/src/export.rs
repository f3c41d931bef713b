//! Document readers and atomic publishing.
//!
//! Every artifact is rendered to bytes first and then published by writing a
//! temporary file in the destination directory and renaming it into place.
//! Readers never treat a missing required document as empty.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

use tension_core::errors::{InputError, PipelineError, PipelineResult, PublishError};

use crate::atoms::RawAtomDocument;
use crate::contracts::EdgeLine;
use crate::drift::{DriftDocument, DriftMeta, DriftRecord};
use crate::tensions::Edge;

/// Pretty JSON with a trailing newline.
pub fn render_json<T: Serialize>(artifact: &str, value: &T) -> Result<Vec<u8>, PublishError> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| PublishError::Serialize {
        artifact: artifact.to_string(),
        message: e.to_string(),
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// One compact JSON edge per line. No edges renders as an empty file.
pub fn render_edges(edges: &[Edge]) -> Result<Vec<u8>, PublishError> {
    let mut bytes = Vec::new();
    for edge in edges {
        serde_json::to_writer(&mut bytes, edge).map_err(|e| PublishError::Serialize {
            artifact: edge.edge_id.clone(),
            message: e.to_string(),
        })?;
        bytes.push(b'\n');
    }
    Ok(bytes)
}

fn io_error(path: &Path, err: std::io::Error) -> PublishError {
    PublishError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Write `bytes` to a synced temporary file in `dir`, ready to be renamed
/// onto `path`. Dropping the result removes the temporary file.
fn stage(dir: &Path, path: &Path, bytes: &[u8]) -> Result<NamedTempFile, PublishError> {
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_error(path, e))?;
    tmp.write_all(bytes).map_err(|e| io_error(path, e))?;
    tmp.as_file().sync_all().map_err(|e| io_error(path, e))?;
    Ok(tmp)
}

/// Write `bytes` to `path` atomically. Parent directories are created.
pub fn publish(path: &Path, bytes: &[u8]) -> Result<(), PublishError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;

    let tmp = stage(parent, path, bytes)?;
    tmp.persist(path).map_err(|e| io_error(path, e.error))?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "published");
    Ok(())
}

/// Publish several files into `dir` as one set.
///
/// Every file is staged before the first rename. If a rename fails, the
/// files already renamed get their previous contents back, or are removed
/// when they did not exist, so readers never see a mix of two runs.
pub fn publish_set(dir: &Path, files: &[(&str, &[u8])]) -> Result<(), PublishError> {
    std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

    let mut staged = Vec::with_capacity(files.len());
    for (name, bytes) in files {
        let path = dir.join(name);
        let tmp = stage(dir, &path, bytes)?;
        let previous = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {
                Some(std::fs::read(&path).map_err(|e| io_error(&path, e))?)
            }
            _ => None,
        };
        staged.push((path, tmp, previous));
    }

    let mut committed: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());
    for (path, tmp, previous) in staged {
        if let Err(e) = tmp.persist(&path) {
            let err = io_error(&path, e.error);
            tracing::warn!(path = %path.display(), error = %err, "publish failed, rolling back");
            restore(&committed);
            return Err(err);
        }
        committed.push((path, previous));
    }

    tracing::debug!(dir = %dir.display(), files = committed.len(), "published set");
    Ok(())
}

fn restore(committed: &[(PathBuf, Option<Vec<u8>>)]) {
    for (path, previous) in committed.iter().rev() {
        let outcome = match previous {
            Some(bytes) => publish(path, bytes),
            None => std::fs::remove_file(path).map_err(|e| io_error(path, e)),
        };
        if let Err(e) = outcome {
            tracing::error!(path = %path.display(), error = %e, "rollback failed");
        }
    }
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), PublishError> {
    let bytes = render_json(&path.display().to_string(), value)?;
    publish(path, &bytes)
}

pub fn write_edges_atomic(path: &Path, edges: &[Edge]) -> Result<(), PublishError> {
    publish(path, &render_edges(edges)?)
}

fn read_required(path: &Path) -> Result<Vec<u8>, InputError> {
    std::fs::read(path).map_err(|e| InputError::from_io(path, &e))
}

/// Read and deserialize a required JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let bytes = read_required(path)?;
    serde_json::from_slice(&bytes).map_err(|e| InputError::malformed(path, e.to_string()))
}

#[derive(Deserialize)]
struct RawDriftDocument {
    meta: DriftMeta,
    records: Vec<Value>,
}

/// Read a drift document. Records that do not deserialize are dropped and
/// reported in the result's `errors`; a bad envelope is a hard error.
pub fn read_drift_document(path: &Path) -> Result<PipelineResult<DriftDocument>, InputError> {
    let raw: RawDriftDocument = read_json(path)?;
    let mut records = Vec::with_capacity(raw.records.len());
    let mut errors: Vec<PipelineError> = Vec::new();

    for (index, value) in raw.records.into_iter().enumerate() {
        match serde_json::from_value::<DriftRecord>(value) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), index, error = %e, "unreadable drift record, dropped");
                errors.push(
                    InputError::MalformedKey {
                        path: path.display().to_string(),
                        key: format!("records[{index}]"),
                        message: e.to_string(),
                    }
                    .into(),
                );
            }
        }
    }

    Ok(PipelineResult {
        data: DriftDocument::new(raw.meta.run_context, records),
        errors,
    })
}

/// Read an atom document, leaving individual atoms for the contract validator.
pub fn read_atom_document(path: &Path) -> Result<RawAtomDocument, InputError> {
    read_json(path)
}

/// Split an NDJSON edge document into numbered lines. Blank lines are skipped;
/// parse failures are kept for the contract validator to report.
pub fn parse_edge_lines(text: &str) -> Vec<EdgeLine> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| EdgeLine {
            line: i + 1,
            parsed: serde_json::from_str(line).map_err(|e| e.to_string()),
        })
        .collect()
}

pub fn read_edge_lines(path: &Path) -> Result<Vec<EdgeLine>, InputError> {
    let bytes = read_required(path)?;
    let text = String::from_utf8(bytes).map_err(|e| InputError::malformed(path, e.to_string()))?;
    Ok(parse_edge_lines(&text))
}
