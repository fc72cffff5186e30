use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::row::{GridRow, RowId, display_value};

/// Width used when a column definition has no usable width.
pub const DEFAULT_COLUMN_WIDTH: u32 = 150;

/// Floor for resizes when a column has no `min_width`.
pub const DEFAULT_MIN_WIDTH: u32 = 70;

/// How a column can be filtered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    /// Pick one of the distinct values observed in the column
    List,
    /// Free-text, case-insensitive substring match
    SearchOnly,
}

/// Context handed to a cell renderer.
pub struct CellContext<'a> {
    pub selection: &'a IndexSet<RowId>,
    pub is_ghost: bool,
}

pub type CellRenderer = Arc<dyn Fn(&dyn GridRow, &CellContext) -> String + Send + Sync>;

/// A column declaration. Order of declaration is display order.
#[derive(Clone)]
pub struct ColumnDef {
    pub key: String,
    pub label: String,
    pub default_width: u32,
    pub min_width: Option<u32>,
    pub sortable: bool,
    pub filterable: Option<FilterKind>,
    pub visible: bool,
    /// Ghost rows show a placeholder instead of this column's value
    pub hidden_during_generation: bool,
    pub render: Option<CellRenderer>,
}

impl fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("default_width", &self.default_width)
            .field("min_width", &self.min_width)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("visible", &self.visible)
            .field("hidden_during_generation", &self.hidden_during_generation)
            .field("render", &self.render.is_some())
            .finish()
    }
}

impl ColumnDef {
    pub fn new(key: &str, label: &str, default_width: u32) -> Self {
        ColumnDef {
            key: key.to_string(),
            label: label.to_string(),
            default_width: if default_width == 0 {
                DEFAULT_COLUMN_WIDTH
            } else {
                default_width
            },
            min_width: None,
            sortable: false,
            filterable: None,
            visible: true,
            hidden_during_generation: false,
            render: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn filterable(mut self, kind: FilterKind) -> Self {
        self.filterable = Some(kind);
        self
    }

    pub fn min_width(mut self, width: u32) -> Self {
        self.min_width = Some(width);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn hidden_during_generation(mut self) -> Self {
        self.hidden_during_generation = true;
        self
    }

    pub fn render(
        mut self,
        f: impl Fn(&dyn GridRow, &CellContext) -> String + Send + Sync + 'static,
    ) -> Self {
        self.render = Some(Arc::new(f));
        self
    }

    /// The floor a resize clamps to
    pub fn effective_min_width(&self) -> u32 {
        self.min_width.unwrap_or(DEFAULT_MIN_WIDTH)
    }

    /// Text for one cell: the renderer if present, the raw value otherwise.
    pub fn cell_text(&self, row: &dyn GridRow, ctx: &CellContext) -> String {
        match &self.render {
            Some(render) => render(row, ctx),
            None => display_value(row.field(&self.key)),
        }
    }
}

/// Built-in cell formats selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellFormat {
    /// Raw value
    #[default]
    Text,
    /// `[value]`
    Tag,
    /// `5 pts`
    Points,
    /// `[done, total]` as `done/total`
    Progress,
    /// A user object or name, `unassigned` when empty
    User,
}

impl CellFormat {
    /// Renderer for this format, or None for the raw-value fallback.
    pub fn renderer(self, key: &str) -> Option<CellRenderer> {
        let key = key.to_string();
        match self {
            CellFormat::Text => None,
            CellFormat::Tag => Some(Arc::new(move |row, _| {
                let text = display_value(row.field(&key));
                if text.is_empty() {
                    String::new()
                } else {
                    format!("[{}]", text)
                }
            })),
            CellFormat::Points => Some(Arc::new(move |row, _| {
                match row.field(&key).and_then(|v| v.as_f64()) {
                    Some(n) if n == 1.0 => "1 pt".to_string(),
                    Some(_) => format!("{} pts", display_value(row.field(&key))),
                    None => "-".to_string(),
                }
            })),
            CellFormat::Progress => Some(Arc::new(move |row, _| {
                match row.field(&key).and_then(|v| v.as_array()) {
                    Some(pair) if pair.len() == 2 => {
                        let done = display_value(pair.first());
                        let total = display_value(pair.get(1));
                        if done.is_empty() || total.is_empty() {
                            "-".to_string()
                        } else {
                            format!("{}/{}", done, total)
                        }
                    }
                    _ => "-".to_string(),
                }
            })),
            CellFormat::User => Some(Arc::new(move |row, _| {
                let value = row.field(&key);
                let name = match value.and_then(|v| v.as_object()) {
                    Some(obj) => obj
                        .get("displayName")
                        .or_else(|| obj.get("name"))
                        .map(|v| display_value(Some(v)))
                        .unwrap_or_default(),
                    None => display_value(value),
                };
                if name.is_empty() {
                    "unassigned".to_string()
                } else {
                    name
                }
            })),
        }
    }
}
