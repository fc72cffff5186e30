use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::row::{Record, RowId};

/// Error type for table row files
#[derive(Debug, thiserror::Error)]
pub enum RowsError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{path}: expected a JSON array of row objects")]
    NotAnArray { path: PathBuf },
    #[error("{path}: row {index} has no string or integer id")]
    MissingId { path: PathBuf, index: usize },
    #[error("{path}: duplicate row id {id}")]
    DuplicateId { path: PathBuf, id: RowId },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Parse the contents of a row file. Every element must be an object with a
/// unique `id`.
pub fn parse_rows(text: &str, path: &Path) -> Result<Vec<Record>, RowsError> {
    let value: Value = serde_json::from_str(text).map_err(|e| RowsError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let Value::Array(items) = value else {
        return Err(RowsError::NotAnArray {
            path: path.to_path_buf(),
        });
    };

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let record = match item {
            Value::Object(map) => Record::from_map(map),
            _ => None,
        }
        .ok_or_else(|| RowsError::MissingId {
            path: path.to_path_buf(),
            index,
        })?;
        let id = record.id();
        if !seen.insert(id.clone()) {
            return Err(RowsError::DuplicateId {
                path: path.to_path_buf(),
                id,
            });
        }
        rows.push(record);
    }
    Ok(rows)
}

/// Read a row file. A file that does not exist yet is an empty table.
pub fn read_rows(path: &Path) -> Result<Vec<Record>, RowsError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path).map_err(|e| RowsError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_rows(&text, path)
}

/// Rows as pretty-printed JSON with a trailing newline
pub fn serialize_rows(rows: &[Record]) -> String {
    let values: Vec<&serde_json::Map<String, Value>> = rows.iter().map(|r| r.fields()).collect();
    let mut out = serde_json::to_string_pretty(&values).unwrap_or_else(|_| "[]".to_string());
    out.push('\n');
    out
}

/// Save rows atomically. On failure the content goes to the recovery log so
/// nothing the user accepted is lost.
pub fn write_rows(grid_dir: &Path, file: &str, rows: &[Record]) -> Result<(), RowsError> {
    let path = grid_dir.join(file);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| RowsError::WriteError {
            path: path.clone(),
            source: e,
        })?;
    }
    let content = serialize_rows(rows);
    if let Err(e) = recovery::atomic_write(&path, content.as_bytes()) {
        recovery::log_recovery(
            grid_dir,
            RecoveryEntry {
                timestamp: chrono::Utc::now(),
                category: RecoveryCategory::Write,
                description: "table write failed".to_string(),
                fields: vec![
                    ("Target".to_string(), file.to_string()),
                    ("Error".to_string(), e.to_string()),
                ],
                body: content,
            },
        );
        return Err(RowsError::WriteError { path, source: e });
    }
    tracing::debug!(file, rows = rows.len(), "rows written");
    Ok(())
}
