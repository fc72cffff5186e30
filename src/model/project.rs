use std::path::PathBuf;

use super::config::{ProjectConfig, TableConfig};
use super::row::Record;

/// One table: its configuration and its rows, in file order
#[derive(Debug, Clone)]
pub struct Table {
    pub config: TableConfig,
    pub rows: Vec<Record>,
}

/// A fully loaded gridline project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of `grid/`)
    pub root: PathBuf,
    /// Path to the `grid/` directory
    pub grid_dir: PathBuf,
    /// Parsed project.toml
    pub config: ProjectConfig,
    /// Loaded tables, in configuration order
    pub tables: Vec<Table>,
}

impl Project {
    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.config.id == id)
    }

    pub fn table_mut(&mut self, id: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.config.id == id)
    }
}
