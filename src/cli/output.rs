use serde::Serialize;
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use crate::grid::ColumnModel;
use crate::model::FilterKind;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TableInfoJson {
    pub id: String,
    pub name: String,
    pub file: String,
    pub rows: usize,
}

#[derive(Serialize)]
pub struct RowListJson {
    pub table: String,
    /// Rows in the table before filtering
    pub total: usize,
    pub rows: Vec<Value>,
}

#[derive(Serialize)]
pub struct ColumnJson {
    pub key: String,
    pub label: String,
    pub width: u32,
    pub default_width: u32,
    pub min_width: u32,
    pub overridden: bool,
    pub sortable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filterable: Option<FilterKind>,
}

#[derive(Serialize)]
pub struct WidthJson {
    pub table: String,
    pub column: Option<String>,
    pub width: Option<u32>,
    pub reset: bool,
}

#[derive(Serialize)]
pub struct DeleteJson {
    pub table: String,
    pub deleted: Vec<Value>,
}

#[derive(Serialize)]
pub struct GenerateJson {
    pub table: String,
    pub generated: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Rows as generated, or as saved when accepted
    pub rows: Vec<Value>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn columns_to_json(columns: &ColumnModel) -> Vec<ColumnJson> {
    columns
        .visible_columns()
        .into_iter()
        .map(|c| ColumnJson {
            key: c.key.clone(),
            label: c.label.clone(),
            width: columns.effective_width(&c.key).unwrap_or(c.default_width),
            default_width: c.default_width,
            min_width: c.effective_min_width(),
            overridden: columns.is_overridden(&c.key),
            sortable: c.sortable,
            filterable: c.filterable,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Lay out `rows` under `headers` in left-aligned columns separated by two
/// spaces. Trailing padding is trimmed.
pub fn format_table(headers: &[String], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.width());
            }
        }
    }
    std::iter::once(headers)
        .chain(rows.iter().map(Vec::as_slice))
        .map(|cells| {
            let mut line = String::new();
            for (i, cell) in cells.iter().enumerate() {
                if i > 0 {
                    line.push_str("  ");
                }
                line.push_str(cell);
                let pad = widths.get(i).copied().unwrap_or(0).saturating_sub(cell.width());
                line.push_str(&" ".repeat(pad));
            }
            line.trim_end().to_string()
        })
        .collect()
}

/// One line per column: key, label, width and whether it is overridden
pub fn format_columns(columns: &[ColumnJson]) -> Vec<String> {
    let headers = ["KEY", "LABEL", "WIDTH", ""].map(String::from);
    let rows: Vec<Vec<String>> = columns
        .iter()
        .map(|c| {
            vec![
                c.key.clone(),
                c.label.clone(),
                format!("{}px", c.width),
                if c.overridden {
                    format!("(default {}px)", c.default_width)
                } else {
                    String::new()
                },
            ]
        })
        .collect();
    format_table(&headers, &rows)
}
