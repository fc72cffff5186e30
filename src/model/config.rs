use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::column::{CellFormat, ColumnDef, DEFAULT_COLUMN_WIDTH, FilterKind};

/// Configuration from project.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectInfo,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
    #[serde(default)]
    pub ghost: GhostConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub id: String,
    pub name: String,
    /// Row file, relative to the grid/ directory
    pub file: String,
    #[serde(default = "default_true")]
    pub multiselect: bool,
    #[serde(default = "default_true")]
    pub deletable: bool,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
    /// Custom bulk actions offered while rows are selected
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub min_width: Option<u32>,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub filterable: Option<FilterKind>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub hidden_during_generation: bool,
    #[serde(default)]
    pub format: CellFormat,
}

impl ColumnConfig {
    /// Build the grid column. A missing or zero width degrades to the default.
    pub fn to_column_def(&self) -> ColumnDef {
        let width = match self.width {
            Some(w) if w > 0 => w,
            _ => {
                tracing::warn!(column = %self.key, "column has no usable width, using default");
                DEFAULT_COLUMN_WIDTH
            }
        };
        let label = self.label.clone().unwrap_or_else(|| self.key.clone());
        let mut def = ColumnDef::new(&self.key, &label, width);
        def.min_width = self.min_width;
        def.sortable = self.sortable;
        def.filterable = self.filterable;
        def.visible = self.visible;
        def.hidden_during_generation = self.hidden_during_generation;
        def.render = self.format.renderer(&self.key);
        def
    }
}

/// A bulk action that sets one field on every selected row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    pub label: String,
    #[serde(default = "default_action_icon")]
    pub icon: String,
    pub field: String,
    pub value: serde_json::Value,
}

fn default_true() -> bool {
    true
}

fn default_action_icon() -> String {
    "*".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostConfig {
    /// Estimated generation time for the progress bar, in milliseconds
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    /// Percentage the progress bar hangs at until the result arrives
    #[serde(default = "default_ceiling")]
    pub ceiling: f32,
    /// Delay between reaching 100% and showing the generated rows
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
    /// Rows requested when the count prompt is left empty
    #[serde(default = "default_count")]
    pub default_count: usize,
}

impl Default for GhostConfig {
    fn default() -> Self {
        GhostConfig {
            duration_ms: 2000,
            ceiling: 90.0,
            grace_ms: 500,
            default_count: 3,
        }
    }
}

fn default_duration_ms() -> u64 {
    2000
}

fn default_ceiling() -> f32 {
    90.0
}

fn default_grace_ms() -> u64 {
    500
}

fn default_count() -> usize {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub show_key_hints: bool,
    #[serde(default)]
    pub colors: HashMap<String, String>,
    /// Colors for tag-formatted values, keyed by value (e.g. `Open = "#44FF88"`)
    #[serde(default)]
    pub tag_colors: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
[project]
name = "Tenor"

[[tables]]
id = "backlog"
name = "Backlog"
file = "tables/backlog.json"

[[tables.columns]]
key = "name"
label = "Title"
width = 260
sortable = true
filterable = "search-only"

[[tables.columns]]
key = "status"
width = 0
filterable = "list"
format = "tag"
hidden_during_generation = true

[[tables.actions]]
label = "Mark done"
field = "status"
value = "Done"

[ghost]
ceiling = 85.0
"##;

    #[test]
    fn parse_full_config() {
        let config: ProjectConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.project.name, "Tenor");
        let table = &config.tables[0];
        assert!(table.multiselect);
        assert!(table.deletable);
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[0].filterable, Some(FilterKind::SearchOnly));
        assert_eq!(table.columns[1].filterable, Some(FilterKind::List));
        assert_eq!(table.columns[1].format, CellFormat::Tag);
        assert_eq!(table.actions[0].icon, "*");
        assert_eq!(config.ghost.ceiling, 85.0);
        assert_eq!(config.ghost.duration_ms, 2000);
        assert_eq!(config.ghost.grace_ms, 500);
    }

    #[test]
    fn column_config_degrades_gracefully() {
        let config: ProjectConfig = toml::from_str(SAMPLE).unwrap();
        let status = config.tables[0].columns[1].to_column_def();
        assert_eq!(status.default_width, DEFAULT_COLUMN_WIDTH);
        assert_eq!(status.label, "status");
        assert!(status.hidden_during_generation);
        assert!(status.render.is_some());

        let name = config.tables[0].columns[0].to_column_def();
        assert_eq!(name.default_width, 260);
        assert_eq!(name.label, "Title");
        assert!(name.sortable);
        assert!(name.render.is_none());
    }

    #[test]
    fn minimal_config_has_defaults() {
        let config: ProjectConfig = toml::from_str("[project]\nname = \"x\"\n").unwrap();
        assert!(config.tables.is_empty());
        assert_eq!(config.ghost.default_count, 3);
        assert!(config.ui.colors.is_empty());
    }
}
