use tracing::debug;

use super::column::ColumnModel;
use super::store::LayoutStore;

/// Imperative geometry hook: receives live widths while a drag is in
/// flight, bypassing the declarative re-render path. Implementations must
/// apply the width to the header and to every visible row.
pub trait GeometrySink {
    fn apply_width(&mut self, column_key: &str, width: u32);
}

/// A sink that ignores updates, for callers that re-render every frame.
pub struct NoGeometry;

impl GeometrySink for NoGeometry {
    fn apply_width(&mut self, _column_key: &str, _width: u32) {}
}

/// One resize gesture in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drag {
    pub column_key: String,
    pub start_x: i32,
    pub start_width: u32,
    pub min_width: u32,
    /// Width last pushed to the geometry sink
    pub width: u32,
}

/// Resize gesture state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResizeState {
    #[default]
    Idle,
    Dragging(Drag),
}

/// What a reset gesture applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    Column,
    All,
}

/// Width for a drag from `start_x` to `x`, clamped to `min_width`.
pub fn drag_width(start_width: u32, start_x: i32, x: i32, min_width: u32) -> u32 {
    let delta = i64::from(x) - i64::from(start_x);
    let raw = i64::from(start_width) + delta;
    let clamped = raw.clamp(i64::from(min_width), i64::from(u32::MAX));
    clamped as u32
}

/// Turns pointer gestures on column boundaries into width changes.
///
/// `Idle → Dragging → Idle`. Widths reach the column model (and the layout
/// store) only on pointer-up; during the drag they go to the geometry sink.
#[derive(Debug, Clone, Default)]
pub struct ResizeEngine {
    state: ResizeState,
}

impl ResizeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ResizeState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ResizeState::Dragging(_))
    }

    /// Live width of the dragged column, if `column_key` is being dragged
    pub fn live_width(&self, column_key: &str) -> Option<u32> {
        match &self.state {
            ResizeState::Dragging(drag) if drag.column_key == column_key => Some(drag.width),
            _ => None,
        }
    }

    /// Pointer pressed on the resize handle of `column_key`.
    /// Ignored (returns false) while another drag is active or the key is unknown.
    pub fn pointer_down(&mut self, column_key: &str, x: i32, columns: &ColumnModel) -> bool {
        if self.is_dragging() {
            return false;
        }
        let (Some(def), Some(width)) = (
            columns.column(column_key),
            columns.effective_width(column_key),
        ) else {
            return false;
        };
        debug!(column = column_key, x, width, "resize drag started");
        self.state = ResizeState::Dragging(Drag {
            column_key: column_key.to_string(),
            start_x: x,
            start_width: width,
            min_width: def.effective_min_width(),
            width,
        });
        true
    }

    /// Pointer moved during a drag: push the new width to the geometry sink.
    pub fn pointer_move(&mut self, x: i32, sink: &mut dyn GeometrySink) -> Option<u32> {
        let ResizeState::Dragging(drag) = &mut self.state else {
            return None;
        };
        let width = drag_width(drag.start_width, drag.start_x, x, drag.min_width);
        if width != drag.width {
            drag.width = width;
            sink.apply_width(&drag.column_key, width);
        }
        Some(width)
    }

    /// Pointer released: commit the final width to the column model and store.
    pub fn pointer_up(
        &mut self,
        x: i32,
        columns: &mut ColumnModel,
        store: &mut dyn LayoutStore,
    ) -> Option<(String, u32)> {
        let ResizeState::Dragging(drag) = std::mem::take(&mut self.state) else {
            return None;
        };
        let width = drag_width(drag.start_width, drag.start_x, x, drag.min_width);
        let applied = columns.set_override(&drag.column_key, width, store)?;
        debug!(column = %drag.column_key, width = applied, "resize committed");
        Some((drag.column_key, applied))
    }

    /// Abandon a drag without committing (teardown, focus loss).
    pub fn cancel(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = ResizeState::Idle;
        was_dragging
    }

    /// Modifier double-click on a handle: back to default width for one
    /// column or for all columns, erasing persisted overrides.
    pub fn reset(
        &mut self,
        column_key: &str,
        scope: ResetScope,
        columns: &mut ColumnModel,
        store: &mut dyn LayoutStore,
    ) {
        self.cancel();
        match scope {
            ResetScope::Column => columns.clear_override(column_key, store),
            ResetScope::All => columns.clear_all_overrides(store),
        }
    }
}
