use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::recovery::atomic_write;

/// Persisted TUI state (written to .state.json)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiState {
    /// Which table is active (table ID)
    #[serde(default)]
    pub active_table: String,
    /// Per-table state
    #[serde(default)]
    pub tables: HashMap<String, TableUiState>,
}

/// Per-table UI state
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TableUiState {
    /// Cursor row position in the derived view
    #[serde(default)]
    pub cursor: usize,
    /// Index of the focused visible column
    #[serde(default)]
    pub focused_column: usize,
    /// Horizontal scroll, in cells
    #[serde(default)]
    pub scroll_x: u16,
}

/// Read .state.json from the grid directory
pub fn read_ui_state(grid_dir: &Path) -> Option<UiState> {
    let path = grid_dir.join(".state.json");
    let content = fs::read_to_string(&path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Write .state.json to the grid directory
pub fn write_ui_state(grid_dir: &Path, state: &UiState) -> Result<(), std::io::Error> {
    let content = serde_json::to_string_pretty(state)?;
    atomic_write(&grid_dir.join(".state.json"), content.as_bytes())
}
