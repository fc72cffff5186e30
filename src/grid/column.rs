use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::model::column::ColumnDef;

use super::store::{LayoutStore, layout_key};

/// Column declarations for one table plus the user's width overrides.
///
/// Overrides are read from the layout store when the model is loaded and
/// written back on every commit; an override exists only while the width
/// differs from the column's default.
#[derive(Debug, Clone)]
pub struct ColumnModel {
    table_id: String,
    columns: IndexMap<String, ColumnDef>,
    overrides: HashMap<String, u32>,
}

impl ColumnModel {
    /// Build the model for `table_id`, reading persisted overrides.
    /// Duplicate keys keep their first position and the last definition.
    pub fn load(table_id: &str, defs: Vec<ColumnDef>, store: &dyn LayoutStore) -> Self {
        let mut columns = IndexMap::new();
        for def in defs {
            if columns.contains_key(&def.key) {
                warn!(table = table_id, column = %def.key, "duplicate column key");
            }
            columns.insert(def.key.clone(), def);
        }
        let mut model = ColumnModel {
            table_id: table_id.to_string(),
            columns,
            overrides: HashMap::new(),
        };
        model.reload(store);
        model
    }

    /// Re-read overrides from the store (picks up other grids' commits).
    pub fn reload(&mut self, store: &dyn LayoutStore) {
        self.overrides.clear();
        for (key, def) in &self.columns {
            let Some(raw) = store.get(&layout_key(&self.table_id, key)) else {
                continue;
            };
            match raw.trim().parse::<u32>() {
                Ok(width) if width > 0 => {
                    let width = width.max(def.effective_min_width());
                    self.overrides.insert(key.clone(), width);
                }
                _ => warn!(table = %self.table_id, column = %key, value = %raw, "ignoring malformed width override"),
            }
        }
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn column(&self, key: &str) -> Option<&ColumnDef> {
        self.columns.get(key)
    }

    /// All declared columns, in declaration order
    pub fn all_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.values()
    }

    /// Columns to display, in declaration order
    pub fn visible_columns(&self) -> Vec<&ColumnDef> {
        self.columns.values().filter(|c| c.visible).collect()
    }

    /// Override if present, default width otherwise. None for unknown keys.
    pub fn effective_width(&self, key: &str) -> Option<u32> {
        let def = self.columns.get(key)?;
        Some(self.overrides.get(key).copied().unwrap_or(def.default_width))
    }

    /// `(key, effective width)` for every visible column
    pub fn visible_widths(&self) -> Vec<(String, u32)> {
        self.visible_columns()
            .into_iter()
            .map(|c| {
                let width = self.overrides.get(&c.key).copied().unwrap_or(c.default_width);
                (c.key.clone(), width)
            })
            .collect()
    }

    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    /// Commit a width for `key`. Clamped to the column's minimum; committing
    /// the default width removes the override. Unknown keys are ignored.
    /// Returns the width actually applied.
    pub fn set_override(&mut self, key: &str, width: u32, store: &mut dyn LayoutStore) -> Option<u32> {
        let def = self.columns.get(key)?;
        let width = width.max(def.effective_min_width());
        if width == def.default_width {
            self.clear_override(key, store);
            return Some(width);
        }
        self.overrides.insert(key.to_string(), width);
        let store_key = layout_key(&self.table_id, key);
        if let Err(e) = store.set(&store_key, &width.to_string()) {
            warn!(key = %store_key, error = %e, "width override not persisted");
        }
        debug!(table = %self.table_id, column = key, width, "width override set");
        Some(width)
    }

    /// Drop the override for `key` and erase its persisted entry.
    pub fn clear_override(&mut self, key: &str, store: &mut dyn LayoutStore) {
        if !self.columns.contains_key(key) {
            return;
        }
        self.overrides.remove(key);
        let store_key = layout_key(&self.table_id, key);
        if let Err(e) = store.remove(&store_key) {
            warn!(key = %store_key, error = %e, "width override not erased");
        }
        debug!(table = %self.table_id, column = key, "width override cleared");
    }

    /// Reset every column to its default width.
    pub fn clear_all_overrides(&mut self, store: &mut dyn LayoutStore) {
        let keys: Vec<String> = self.columns.keys().cloned().collect();
        for key in keys {
            self.clear_override(&key, store);
        }
    }
}
