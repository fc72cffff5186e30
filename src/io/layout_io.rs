use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::grid::store::{LayoutError, LayoutStore};
use crate::io::recovery::atomic_write;

/// Width overrides persisted in `grid/.layout.json`.
///
/// Every read goes to disk and every write re-reads the file first, so grids
/// in other processes see each other's commits. No locking: last write wins.
#[derive(Debug, Clone)]
pub struct FileLayoutStore {
    path: PathBuf,
}

impl FileLayoutStore {
    pub fn new(grid_dir: &Path) -> Self {
        FileLayoutStore {
            path: grid_dir.join(".layout.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current entries. A missing or unreadable file is an empty store.
    pub fn entries(&self) -> BTreeMap<String, String> {
        let Ok(text) = fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        match serde_json::from_str(&text) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed layout file");
                BTreeMap::new()
            }
        }
    }

    fn update(&self, edit: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), LayoutError> {
        let mut entries = self.entries();
        edit(&mut entries);
        let mut content = serde_json::to_string_pretty(&entries)?;
        content.push('\n');
        atomic_write(&self.path, content.as_bytes()).map_err(|e| LayoutError::WriteError {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl LayoutStore for FileLayoutStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().remove(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), LayoutError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), LayoutError> {
        if !self.entries().contains_key(key) {
            return Ok(());
        }
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::column::ColumnModel;
    use crate::model::column::ColumnDef;
    use tempfile::TempDir;

    fn defs() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("name", "Name", 200),
            ColumnDef::new("size", "Size", 90),
        ]
    }

    #[test]
    fn overrides_survive_reload_from_disk() {
        let dir = TempDir::new().unwrap();
        let mut store = FileLayoutStore::new(dir.path());
        let mut model = ColumnModel::load("backlog", defs(), &store);
        model.set_override("name", 250, &mut store);

        let fresh = FileLayoutStore::new(dir.path());
        let reloaded = ColumnModel::load("backlog", defs(), &fresh);
        assert_eq!(reloaded.effective_width("name"), Some(250));

        model.clear_override("name", &mut store);
        let reloaded = ColumnModel::load("backlog", defs(), &fresh);
        assert_eq!(reloaded.effective_width("name"), Some(200));
        assert!(store.entries().is_empty());
    }

    #[test]
    fn two_writers_last_write_wins_without_losing_other_keys() {
        let dir = TempDir::new().unwrap();
        let mut a = FileLayoutStore::new(dir.path());
        let mut b = FileLayoutStore::new(dir.path());
        a.set("backlog:name", "250").unwrap();
        b.set("backlog:size", "120").unwrap();
        b.set("backlog:name", "300").unwrap();
        assert_eq!(a.get("backlog:name").as_deref(), Some("300"));
        assert_eq!(a.get("backlog:size").as_deref(), Some("120"));
    }

    #[test]
    fn malformed_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".layout.json"), "{not json").unwrap();
        let mut store = FileLayoutStore::new(dir.path());
        assert!(store.get("backlog:name").is_none());
        store.set("backlog:name", "180").unwrap();
        assert_eq!(store.get("backlog:name").as_deref(), Some("180"));
    }

    #[test]
    fn removing_absent_key_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let mut store = FileLayoutStore::new(dir.path());
        store.remove("backlog:name").unwrap();
        assert!(!store.path().exists());
    }
}
