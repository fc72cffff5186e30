use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

/// Self-documenting header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- gridline recovery log: append-only
     Rows that could not be saved, and rows that were deleted, land here.
     Safe to delete once you no longer need them. -->

---
";

/// Category of a recovery entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    Write,
    Delete,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Write => write!(f, "write"),
            RecoveryCategory::Delete => write!(f, "delete"),
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

/// Return the path to the recovery log file.
pub fn recovery_log_path(grid_dir: &Path) -> PathBuf {
    grid_dir.join(".recovery.log")
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl RecoveryEntry {
    /// Format this entry as a markdown block for the recovery log.
    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} {}: {}\n\n",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description,
        );
        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        if !self.body.is_empty() {
            out.push_str("\n```json\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }
        out.push_str("\n---\n");
        out
    }
}

/// Append a recovery entry to the log. Failures are logged, never returned.
pub fn log_recovery(grid_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = log_recovery_inner(grid_dir, &entry) {
        tracing::warn!(error = %e, description = %entry.description, "could not write to recovery log");
    }
}

fn log_recovery_inner(grid_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(grid_dir);
    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())?;
    Ok(())
}

/// Keep deleted rows recoverable.
pub fn log_row_deletion(grid_dir: &Path, table_id: &str, rows: &[serde_json::Value]) {
    if rows.is_empty() {
        return;
    }
    let body = serde_json::to_string_pretty(rows).unwrap_or_default();
    log_recovery(
        grid_dir,
        RecoveryEntry {
            timestamp: Utc::now(),
            category: RecoveryCategory::Delete,
            description: format!("{} row(s) deleted", rows.len()),
            fields: vec![("Table".to_string(), table_id.to_string())],
            body,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.json");
        atomic_write(&path, b"[]").unwrap();
        atomic_write(&path, b"[1]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1]");
    }

    #[test]
    fn deletion_log_has_header_once() {
        let dir = TempDir::new().unwrap();
        log_row_deletion(dir.path(), "backlog", &[json!({"id": 1, "name": "A"})]);
        log_row_deletion(dir.path(), "backlog", &[json!({"id": 2})]);
        let log = std::fs::read_to_string(recovery_log_path(dir.path())).unwrap();
        assert_eq!(log.matches("gridline recovery log").count(), 1);
        assert_eq!(log.matches("delete: 1 row(s) deleted").count(), 2);
        assert!(log.contains("Table: backlog"));
        assert!(log.contains("\"name\": \"A\""));
    }

    #[test]
    fn empty_deletion_is_not_logged() {
        let dir = TempDir::new().unwrap();
        log_row_deletion(dir.path(), "backlog", &[]);
        assert!(!recovery_log_path(dir.path()).exists());
    }
}
