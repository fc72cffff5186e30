use indexmap::IndexSet;
use tracing::{debug, info, warn};

use crate::model::row::RowId;

/// A caller-supplied operation applied to the selected rows
pub struct BulkAction<Ctx> {
    pub label: String,
    pub icon: String,
    action: Box<dyn Fn(&mut Ctx, &[RowId])>,
}

impl<Ctx> BulkAction<Ctx> {
    pub fn new(
        label: impl Into<String>,
        icon: impl Into<String>,
        action: impl Fn(&mut Ctx, &[RowId]) + 'static,
    ) -> Self {
        BulkAction {
            label: label.into(),
            icon: icon.into(),
            action: Box::new(action),
        }
    }

    pub fn run(&self, ctx: &mut Ctx, ids: &[RowId]) {
        (self.action)(ctx, ids)
    }

    /// Run the action on one row, whatever is selected
    pub fn run_row(&self, ctx: &mut Ctx, id: &RowId) {
        info!(action = %self.label, row = %id, "row action");
        self.run(ctx, std::slice::from_ref(id));
    }
}

impl<Ctx> std::fmt::Debug for BulkAction<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkAction")
            .field("label", &self.label)
            .field("icon", &self.icon)
            .finish_non_exhaustive()
    }
}

/// A delete handed to the caller, waiting for its success report
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "finish the delete so the selection learns the outcome"]
pub struct PendingDelete {
    ids: Vec<RowId>,
}

impl PendingDelete {
    /// Delete of a single row, independent of the selection
    pub fn row(id: RowId) -> Self {
        PendingDelete { ids: vec![id] }
    }

    pub fn ids(&self) -> &[RowId] {
        &self.ids
    }
}

/// Selected row identities, in the order they were selected.
///
/// Membership is sticky across filter changes: rows that leave the view stay
/// selected until explicitly cleared or pruned.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ids: IndexSet<RowId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn as_set(&self) -> &IndexSet<RowId> {
        &self.ids
    }

    pub fn ids(&self) -> Vec<RowId> {
        self.ids.iter().cloned().collect()
    }

    /// Flip membership of one row
    pub fn toggle(&mut self, id: RowId) {
        if !self.ids.shift_remove(&id) {
            self.ids.insert(id);
        }
    }

    /// Whether every row of the view is selected. False for an empty view.
    pub fn is_all_selected(&self, visible: &[RowId]) -> bool {
        !visible.is_empty() && visible.iter().all(|id| self.ids.contains(id))
    }

    /// Clear the selection if it covers the whole view, otherwise select
    /// exactly the view. A partial selection always escalates to "all".
    pub fn toggle_all(&mut self, visible: &[RowId]) {
        if self.is_all_selected(visible) {
            self.ids.clear();
        } else {
            self.ids = visible.iter().cloned().collect();
        }
        debug!(selected = self.ids.len(), "toggle all");
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop identities that are not in `visible`. Returns how many were removed.
    pub fn prune(&mut self, visible: &[RowId]) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| visible.contains(id));
        before - self.ids.len()
    }

    /// Bulk actions and delete are only offered with a non-empty selection
    pub fn actions_enabled(&self) -> bool {
        !self.ids.is_empty()
    }

    /// Run a bulk action over the selection. Returns false when disabled.
    pub fn run_action<Ctx>(&self, action: &BulkAction<Ctx>, ctx: &mut Ctx) -> bool {
        if !self.actions_enabled() {
            return false;
        }
        let ids = self.ids();
        info!(action = %action.label, rows = ids.len(), "bulk action");
        action.run(ctx, &ids);
        true
    }

    /// Start deleting the selected rows. None when nothing is selected.
    pub fn begin_delete(&self) -> Option<PendingDelete> {
        if !self.actions_enabled() {
            return None;
        }
        Some(PendingDelete { ids: self.ids() })
    }

    /// The caller reported the delete outcome. Only a success removes the
    /// deleted rows from the selection.
    pub fn finish_delete(&mut self, pending: PendingDelete, success: bool) {
        if !success {
            warn!(rows = pending.ids.len(), "delete failed, selection kept");
            return;
        }
        for id in &pending.ids {
            self.ids.shift_remove(id);
        }
        info!(rows = pending.ids.len(), "rows deleted");
    }

    /// Delete the selection through `on_delete`, which reports success.
    pub fn delete_with(&mut self, on_delete: impl FnOnce(&[RowId]) -> bool) -> bool {
        let Some(pending) = self.begin_delete() else {
            return false;
        };
        let success = on_delete(pending.ids());
        self.finish_delete(pending, success);
        success
    }
}
