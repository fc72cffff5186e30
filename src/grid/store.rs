use std::collections::HashMap;

/// Error type for layout persistence
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("could not write layout store {path}: {source}")]
    WriteError {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize layout store: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Durable key/value surface for column width overrides.
///
/// Keys are `"{table}:{column}"`, values are integer widths as strings.
/// Not transactional: the last writer wins.
pub trait LayoutStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), LayoutError>;
    fn remove(&mut self, key: &str) -> Result<(), LayoutError>;
}

/// Build the store key for one column of one table
pub fn layout_key(table_id: &str, column_key: &str) -> String {
    format!("{}:{}", table_id, column_key)
}

/// In-memory store, for tests and for grids that should not persist
#[derive(Debug, Clone, Default)]
pub struct MemoryLayoutStore {
    entries: HashMap<String, String>,
}

impl MemoryLayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LayoutStore for MemoryLayoutStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), LayoutError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), LayoutError> {
        self.entries.remove(key);
        Ok(())
    }
}
