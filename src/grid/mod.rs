pub mod column;
pub mod ghost;
pub mod progress;
pub mod resize;
pub mod selection;
pub mod store;
pub mod view;

pub use column::ColumnModel;
pub use ghost::{BatchSummary, GhostError, GhostLifecycle, GhostStatus};
pub use progress::stutter_progress;
pub use resize::{GeometrySink, NoGeometry, ResetScope, ResizeEngine, ResizeState};
pub use selection::{BulkAction, PendingDelete, Selection};
pub use store::{LayoutError, LayoutStore, MemoryLayoutStore, layout_key};
pub use view::{SortDirection, SortState, ViewState, list_candidates};

use crate::model::column::{CellContext, ColumnDef};
use crate::model::row::{GridRow, RowId};

/// Shown in place of a value the generator has not produced yet
pub const GHOST_PLACEHOLDER: &str = "\u{2726}";

/// One grid instance: column layout, view derivation, selection and the
/// ghost batch for a single table. Rows are owned by the caller and passed
/// in; the grid only derives from them.
pub struct Grid<R> {
    columns: ColumnModel,
    resize: ResizeEngine,
    view: ViewState,
    selection: Selection,
    ghosts: GhostLifecycle<R>,
    store: Box<dyn LayoutStore>,
}

impl<R: GridRow> Grid<R> {
    pub fn new(
        table_id: &str,
        defs: Vec<ColumnDef>,
        store: Box<dyn LayoutStore>,
        ghosts: GhostLifecycle<R>,
    ) -> Self {
        let columns = ColumnModel::load(table_id, defs, &*store);
        Grid {
            columns,
            resize: ResizeEngine::new(),
            view: ViewState::new(),
            selection: Selection::new(),
            ghosts,
            store,
        }
    }

    pub fn table_id(&self) -> &str {
        self.columns.table_id()
    }

    pub fn columns(&self) -> &ColumnModel {
        &self.columns
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn ghosts(&self) -> &GhostLifecycle<R> {
        &self.ghosts
    }

    pub fn ghosts_mut(&mut self) -> &mut GhostLifecycle<R> {
        &mut self.ghosts
    }

    pub fn resize(&self) -> &ResizeEngine {
        &self.resize
    }

    // Derivation

    /// Rows in display order: sorted, then filtered
    pub fn visible_rows<'a>(&self, rows: &'a [R]) -> Vec<&'a R> {
        self.view.derive(rows, &self.columns)
    }

    pub fn visible_ids(&self, rows: &[R]) -> Vec<RowId> {
        self.visible_rows(rows).iter().map(|r| r.row_id()).collect()
    }

    pub fn toggle_sort(&mut self, column_key: &str, direction: SortDirection) {
        self.view.toggle_sort(column_key, direction, &self.columns);
    }

    /// Set a filter and drop selected rows that left the view.
    pub fn set_filter(&mut self, column_key: &str, value: &str, rows: &[R]) -> bool {
        let applied = self.view.set_filter(column_key, value, &self.columns);
        self.prune_selection(rows);
        applied
    }

    pub fn clear_filter(&mut self, column_key: &str) {
        self.view.clear_filter(column_key);
    }

    pub fn clear_filters(&mut self) {
        self.view.clear_filters();
    }

    /// List-filter options for `column_key`: distinct values among rows
    /// passing every other filter, narrowed by `search`.
    pub fn candidates(&self, rows: &[R], column_key: &str, search: &str) -> Vec<String> {
        let mut others = self.view.clone();
        others.clear_filter(column_key);
        let visible = others.derive(rows, &self.columns);
        list_candidates(&visible, column_key, search)
    }

    /// Drop selected rows that are not in the current view
    pub(crate) fn prune_selection(&mut self, rows: &[R]) {
        let visible = self.visible_ids(rows);
        self.selection.prune(&visible);
    }

    // Selection

    pub fn toggle_select(&mut self, id: RowId) {
        self.selection.toggle(id);
    }

    /// Select-all over the current filtered view
    pub fn toggle_all(&mut self, rows: &[R]) {
        let visible = self.visible_ids(rows);
        self.selection.toggle_all(&visible);
    }

    // Layout

    /// Effective width, or the live width while this column is dragged
    pub fn width(&self, column_key: &str) -> Option<u32> {
        self.resize
            .live_width(column_key)
            .or_else(|| self.columns.effective_width(column_key))
    }

    /// `(key, width)` for the visible columns, live widths included
    pub fn widths(&self) -> Vec<(String, u32)> {
        self.columns
            .visible_widths()
            .into_iter()
            .map(|(key, width)| {
                let width = self.resize.live_width(&key).unwrap_or(width);
                (key, width)
            })
            .collect()
    }

    pub fn pointer_down(&mut self, column_key: &str, x: i32) -> bool {
        self.resize.pointer_down(column_key, x, &self.columns)
    }

    pub fn pointer_move(&mut self, x: i32, sink: &mut dyn GeometrySink) -> Option<u32> {
        self.resize.pointer_move(x, sink)
    }

    pub fn pointer_up(&mut self, x: i32) -> Option<(String, u32)> {
        self.resize
            .pointer_up(x, &mut self.columns, &mut *self.store)
    }

    /// Commit a width directly, as a keyboard resize does
    pub fn set_width(&mut self, column_key: &str, width: u32) -> Option<u32> {
        self.columns
            .set_override(column_key, width, &mut *self.store)
    }

    pub fn reset_width(&mut self, column_key: &str, scope: ResetScope) {
        self.resize
            .reset(column_key, scope, &mut self.columns, &mut *self.store);
    }

    /// Pick up width commits made by other grids sharing the store
    pub fn reload_layout(&mut self) {
        self.columns.reload(&*self.store);
    }

    // Rendering

    /// Text for one cell. Ghost rows show a placeholder in columns whose
    /// values the generator does not produce.
    pub fn cell_text(&self, row: &R, column_key: &str, is_ghost: bool) -> String {
        let Some(def) = self.columns.column(column_key) else {
            return String::new();
        };
        if is_ghost && def.hidden_during_generation {
            return GHOST_PLACEHOLDER.to_string();
        }
        let ctx = CellContext {
            selection: self.selection.as_set(),
            is_ghost,
        };
        def.cell_text(row, &ctx)
    }

    /// Drop transient gesture state when the grid goes away
    pub fn teardown(&mut self) {
        if self.resize.cancel() {
            tracing::debug!(table = %self.table_id(), "resize drag abandoned on teardown");
        }
    }
}

impl<R> std::fmt::Debug for Grid<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("columns", &self.columns)
            .field("view", &self.view)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}
