use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::model::column::FilterKind;
use crate::model::row::{GridRow, compare_values, display_value};

use super::column::ColumnModel;

/// Sort direction for the single active sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "\u{2191}",
            SortDirection::Desc => "\u{2193}",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub column_key: String,
    pub direction: SortDirection,
}

/// Sort and filter state for one grid. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    sort: Option<SortState>,
    /// Column key → filter value. A missing key means unfiltered; an empty
    /// string is a real value for list filters.
    filters: IndexMap<String, String>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    pub fn filters(&self) -> &IndexMap<String, String> {
        &self.filters
    }

    pub fn filter(&self, column_key: &str) -> Option<&str> {
        self.filters.get(column_key).map(|s| s.as_str())
    }

    pub fn is_filtered(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Sort by `column_key` in `direction`, replacing any previous sort.
    /// Asking for the sort that is already active stops sorting.
    /// Non-sortable and unknown columns are ignored.
    pub fn toggle_sort(&mut self, column_key: &str, direction: SortDirection, columns: &ColumnModel) {
        if !columns.column(column_key).is_some_and(|c| c.sortable) {
            return;
        }
        let same = self
            .sort
            .as_ref()
            .is_some_and(|s| s.column_key == column_key && s.direction == direction);
        if same {
            self.sort = None;
        } else {
            self.sort = Some(SortState {
                column_key: column_key.to_string(),
                direction,
            });
        }
        debug!(sort = ?self.sort, "sort changed");
    }

    /// Set a filter value. Only filterable columns accept one; an empty
    /// search-only value clears the filter instead. Returns whether the
    /// filter state now holds `value` for the column.
    pub fn set_filter(&mut self, column_key: &str, value: &str, columns: &ColumnModel) -> bool {
        let Some(kind) = columns.column(column_key).and_then(|c| c.filterable) else {
            return false;
        };
        if kind == FilterKind::SearchOnly && value.is_empty() {
            self.clear_filter(column_key);
            return false;
        }
        self.filters
            .insert(column_key.to_string(), value.to_string());
        debug!(column = column_key, value, "filter set");
        true
    }

    /// Remove the column's filter entirely
    pub fn clear_filter(&mut self, column_key: &str) {
        self.filters.shift_remove(column_key);
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// The visible row sequence: sorted (stable), then filtered.
    pub fn derive<'a, R: GridRow>(&self, rows: &'a [R], columns: &ColumnModel) -> Vec<&'a R> {
        let mut out: Vec<&R> = rows.iter().collect();
        if let Some(sort) = &self.sort {
            sort_rows(&mut out, &sort.column_key, sort.direction);
        }
        let active: Vec<(&str, FilterKind, &str)> = self
            .filters
            .iter()
            .filter_map(|(key, value)| {
                let kind = columns.column(key)?.filterable?;
                Some((key.as_str(), kind, value.as_str()))
            })
            .collect();
        if active.is_empty() {
            return out;
        }
        out.retain(|row| {
            active
                .iter()
                .all(|(key, kind, value)| row_matches(*row, key, *kind, value))
        });
        out
    }
}

/// Stable sort by one column. Equal values keep their relative order.
pub fn sort_rows<R: GridRow>(rows: &mut [&R], column_key: &str, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ord = compare_values(a.field(column_key), b.field(column_key));
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

/// Whether `row` passes one filter.
pub fn row_matches<R: GridRow + ?Sized>(row: &R, column_key: &str, kind: FilterKind, value: &str) -> bool {
    let cell = display_value(row.field(column_key));
    match kind {
        FilterKind::SearchOnly => cell.to_lowercase().contains(&value.to_lowercase()),
        FilterKind::List => cell == value,
    }
}

/// Options for a list filter: the distinct values of the column, in
/// first-seen order, among rows whose value contains `search`
/// (case-insensitive). The search narrows the options only.
pub fn list_candidates<R: GridRow>(rows: &[&R], column_key: &str, search: &str) -> Vec<String> {
    let needle = search.to_lowercase();
    let mut seen: IndexSet<String> = IndexSet::new();
    for row in rows {
        let cell = display_value(row.field(column_key));
        if needle.is_empty() || cell.to_lowercase().contains(&needle) {
            seen.insert(cell);
        }
    }
    seen.into_iter().collect()
}
