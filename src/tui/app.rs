use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use crate::grid::{BulkAction, GhostLifecycle, Grid, LayoutStore, PendingDelete, SortDirection};
use crate::io::layout_io::FileLayoutStore;
use crate::io::project_io::{self, discover_project, load_project};
use crate::io::watcher::{FileEvent, GridWatcher};
use crate::model::{FilterKind, GhostConfig, Project, Record, RowId, TableConfig};
use crate::ops::generate::{GenerationJob, MAX_BATCH, RowGenerator, TemplateGenerator};
use crate::ops::row_ops;

use super::input;
use super::render;
use super::theme::Theme;

/// Column widths are stored in pixels; the terminal draws this many per cell.
pub const CELL_PX: u32 = 8;

/// Cells needed to draw a column of `px` pixels (at least one)
pub fn px_to_cells(px: u32) -> u16 {
    (px / CELL_PX).clamp(1, u32::from(u16::MAX)) as u16
}

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Filter popup open for one column
    Filter,
    /// Typing the number of rows to generate
    Generate,
    /// Waiting for y/n on a delete
    Confirm,
}

/// A transient message in the status row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// State of the filter popup
#[derive(Debug, Clone)]
pub struct FilterPopup {
    pub column_key: String,
    pub label: String,
    pub kind: FilterKind,
    /// Sub-search for list filters, the filter value for search-only ones
    pub input: String,
    /// Highlighted candidate (list filters)
    pub cursor: usize,
}

/// A resize handle drawn in the header, in screen cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderHandle {
    pub x: u16,
    pub column_key: String,
}

/// Screen positions recorded by the last render, for mouse hit-testing
#[derive(Debug, Clone, Default)]
pub struct HitMap {
    pub header_y: Option<u16>,
    pub handles: Vec<HeaderHandle>,
    /// First body row on screen, and the display index drawn there
    pub body_top: u16,
    pub body_first: usize,
    pub body_height: u16,
}

impl HitMap {
    pub fn handle_at(&self, x: u16, y: u16) -> Option<&str> {
        if self.header_y != Some(y) {
            return None;
        }
        self.handles
            .iter()
            .find(|h| h.x == x)
            .map(|h| h.column_key.as_str())
    }
}

/// What the cursor points at: a ghost awaiting review or a real row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorTarget {
    Ghost(RowId),
    Row(RowId),
}

/// Per-table grid plus its cursor and scroll position
pub struct TableView {
    pub grid: Grid<Record>,
    pub actions: Vec<BulkAction<Vec<Record>>>,
    /// Index into ghost rows followed by visible rows
    pub cursor: usize,
    /// Index into the visible columns
    pub focused_column: usize,
    /// Horizontal scroll, in cells
    pub scroll_x: u16,
    /// First display row drawn
    pub scroll_y: usize,
}

impl TableView {
    pub fn new(config: &TableConfig, ghost: &GhostConfig, store: Box<dyn LayoutStore>) -> Self {
        let defs = config.columns.iter().map(|c| c.to_column_def()).collect();
        let grid = Grid::new(&config.id, defs, store, GhostLifecycle::from_config(ghost));
        let actions = config
            .actions
            .iter()
            .map(|a| {
                let field = a.field.clone();
                let value = a.value.clone();
                BulkAction::new(a.label.clone(), a.icon.clone(), move |rows: &mut Vec<Record>, ids: &[RowId]| {
                    row_ops::apply_action(rows, ids, &field, &value);
                })
            })
            .collect();
        TableView {
            grid,
            actions,
            cursor: 0,
            focused_column: 0,
            scroll_x: 0,
            scroll_y: 0,
        }
    }

    pub fn table_id(&self) -> &str {
        self.grid.table_id()
    }

    /// Key of the focused visible column
    pub fn focused_key(&self) -> Option<String> {
        self.grid
            .columns()
            .visible_columns()
            .get(self.focused_column)
            .map(|c| c.key.clone())
    }

    pub fn ghost_count(&self) -> usize {
        self.grid.ghosts().items().len()
    }
}

/// A generation request in flight for one table
pub struct PendingJob {
    pub table_id: String,
    pub job: GenerationJob,
}

/// Main application state
pub struct App {
    pub project: Project,
    pub views: Vec<TableView>,
    pub active: usize,
    pub mode: Mode,
    pub should_quit: bool,
    pub theme: Theme,
    pub show_help: bool,
    pub status: Option<StatusMessage>,
    pub filter_popup: Option<FilterPopup>,
    /// Row count being typed in Generate mode
    pub count_input: String,
    pub pending_delete: Option<PendingDelete>,
    pub job: Option<PendingJob>,
    pub hit: HitMap,
    /// Last mouse press, for double-click detection
    pub last_click: Option<(Instant, u16, u16)>,
}

impl App {
    pub fn new(project: Project) -> Self {
        let grid_dir = project.grid_dir.clone();
        Self::with_store(project, move || {
            Box::new(FileLayoutStore::new(&grid_dir)) as Box<dyn LayoutStore>
        })
    }

    /// Build the app with a custom layout store per table
    pub fn with_store(project: Project, make_store: impl Fn() -> Box<dyn LayoutStore>) -> Self {
        let theme = Theme::from_config(&project.config.ui);
        let views = project
            .config
            .tables
            .iter()
            .map(|t| TableView::new(t, &project.config.ghost, make_store()))
            .collect();
        App {
            project,
            views,
            active: 0,
            mode: Mode::Navigate,
            should_quit: false,
            theme,
            show_help: false,
            status: None,
            filter_popup: None,
            count_input: String::new(),
            pending_delete: None,
            job: None,
            hit: HitMap::default(),
            last_click: None,
        }
    }

    pub fn current(&self) -> Option<&TableView> {
        self.views.get(self.active)
    }

    pub fn current_mut(&mut self) -> Option<&mut TableView> {
        self.views.get_mut(self.active)
    }

    pub fn current_config(&self) -> Option<&TableConfig> {
        let id = self.current()?.table_id();
        self.project.table(id).map(|t| &t.config)
    }

    /// Rows of the active table, in storage order
    pub fn current_rows(&self) -> &[Record] {
        self.current()
            .and_then(|v| self.project.table(v.table_id()))
            .map_or(&[], |t| t.rows.as_slice())
    }

    /// The active view and its table's rows, borrowed together
    pub fn view_and_rows(&mut self) -> Option<(&mut TableView, &mut Vec<Record>)> {
        let view = self.views.get_mut(self.active)?;
        let table = self.project.table_mut(view.grid.table_id())?;
        Some((view, &mut table.rows))
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::warn!(message = %text, "status error");
        self.status = Some(StatusMessage {
            text,
            is_error: true,
        });
    }

    /// Number of rows the cursor can visit: ghosts first, then the view
    pub fn cursor_len(&self) -> usize {
        let Some(view) = self.current() else {
            return 0;
        };
        view.ghost_count() + view.grid.visible_rows(self.current_rows()).len()
    }

    pub fn cursor_target(&self) -> Option<CursorTarget> {
        let view = self.current()?;
        let ghosts = view.grid.ghosts().items();
        if let Some(ghost) = ghosts.get(view.cursor) {
            return Some(CursorTarget::Ghost(ghost.id()));
        }
        let visible = view.grid.visible_rows(self.current_rows());
        visible
            .get(view.cursor - ghosts.len())
            .map(|r| CursorTarget::Row(r.id()))
    }

    pub fn clamp_cursor(&mut self) {
        let len = self.cursor_len();
        if let Some(view) = self.current_mut() {
            view.cursor = view.cursor.min(len.saturating_sub(1));
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.cursor_len();
        if let Some(view) = self.current_mut() {
            let next = view.cursor.saturating_add_signed(delta);
            view.cursor = next.min(len.saturating_sub(1));
        }
    }

    pub fn switch_table(&mut self, index: usize) {
        if index >= self.views.len() || index == self.active {
            return;
        }
        if let Some(view) = self.current_mut() {
            view.grid.teardown();
        }
        self.active = index;
        self.clamp_cursor();
    }

    fn persist(&mut self, table_id: &str) -> bool {
        match project_io::save_table(&self.project, table_id) {
            Ok(()) => true,
            Err(e) => {
                self.set_error(format!("save failed: {}", e));
                false
            }
        }
    }

    // Sorting and filtering

    pub fn sort_focused(&mut self, direction: SortDirection) {
        let Some(view) = self.current_mut() else {
            return;
        };
        let Some(key) = view.focused_key() else {
            return;
        };
        if !view.grid.columns().column(&key).is_some_and(|c| c.sortable) {
            self.set_status(format!("{} is not sortable", key));
            return;
        }
        view.grid.toggle_sort(&key, direction);
        self.clamp_cursor();
    }

    pub fn open_filter(&mut self) {
        let Some(view) = self.current() else {
            return;
        };
        let Some(key) = view.focused_key() else {
            return;
        };
        let Some(def) = view.grid.columns().column(&key) else {
            return;
        };
        let Some(kind) = def.filterable else {
            self.set_status(format!("{} is not filterable", def.label));
            return;
        };
        let input = match kind {
            FilterKind::SearchOnly => view.grid.view().filter(&key).unwrap_or_default().to_string(),
            FilterKind::List => String::new(),
        };
        self.filter_popup = Some(FilterPopup {
            column_key: key,
            label: def.label.clone(),
            kind,
            input,
            cursor: 0,
        });
        self.mode = Mode::Filter;
    }

    /// Options offered by the open list-filter popup
    pub fn filter_candidates(&self) -> Vec<String> {
        let (Some(view), Some(popup)) = (self.current(), self.filter_popup.as_ref()) else {
            return Vec::new();
        };
        view.grid
            .candidates(self.current_rows(), &popup.column_key, &popup.input)
    }

    /// Apply the popup's choice and close it
    pub fn apply_filter(&mut self) {
        let Some(popup) = self.filter_popup.take() else {
            return;
        };
        self.mode = Mode::Navigate;
        let value = match popup.kind {
            FilterKind::SearchOnly => popup.input.clone(),
            FilterKind::List => {
                let candidates = {
                    let Some(view) = self.current() else { return };
                    view.grid
                        .candidates(self.current_rows(), &popup.column_key, &popup.input)
                };
                match candidates.get(popup.cursor) {
                    Some(v) => v.clone(),
                    None => return,
                }
            }
        };
        if let Some((view, rows)) = self.view_and_rows() {
            view.grid.set_filter(&popup.column_key, &value, rows);
        }
        self.clamp_cursor();
    }

    pub fn clear_focused_filter(&mut self) {
        if let Some(view) = self.current_mut()
            && let Some(key) = view.focused_key()
        {
            view.grid.clear_filter(&key);
        }
        self.clamp_cursor();
    }

    // Selection and bulk actions

    pub fn toggle_cursor_selection(&mut self) {
        if let Some(CursorTarget::Row(id)) = self.cursor_target()
            && let Some(view) = self.current_mut()
        {
            view.grid.toggle_select(id);
        }
    }

    pub fn toggle_all(&mut self) {
        if let Some((view, rows)) = self.view_and_rows() {
            view.grid.toggle_all(rows);
        }
    }

    /// Run the table's first configured action over the selection
    pub fn run_first_action(&mut self) {
        let Some((view, rows)) = self.view_and_rows() else {
            return;
        };
        let Some(action) = view.actions.first() else {
            self.set_status("no bulk actions configured");
            return;
        };
        let label = action.label.clone();
        let count = view.grid.selection().len();
        if !view.grid.selection().run_action(action, rows) {
            self.set_status("select rows first");
            return;
        }
        let table_id = view.table_id().to_string();
        if self.persist(&table_id) {
            self.set_status(format!("{}: {} rows", label, count));
        }
    }

    /// Run the table's first configured action on the cursor row only
    pub fn run_row_action(&mut self) {
        let Some(CursorTarget::Row(id)) = self.cursor_target() else {
            self.set_status("move the cursor to a row first");
            return;
        };
        let Some((view, rows)) = self.view_and_rows() else {
            return;
        };
        let Some(action) = view.actions.first() else {
            self.set_status("no bulk actions configured");
            return;
        };
        let label = action.label.clone();
        action.run_row(rows, &id);
        let table_id = view.table_id().to_string();
        if self.persist(&table_id) {
            self.set_status(format!("{}: row {}", label, id));
        }
    }

    /// Ask for confirmation to delete the selection, or the cursor row when
    /// nothing is selected.
    pub fn begin_delete(&mut self) {
        if !self.current_config().is_some_and(|c| c.deletable) {
            self.set_status("rows in this table cannot be deleted");
            return;
        }
        let target = self.cursor_target();
        let Some(view) = self.current() else {
            return;
        };
        let pending = match view.grid.selection().begin_delete() {
            Some(pending) => Some(pending),
            None => match target {
                Some(CursorTarget::Row(id)) => Some(PendingDelete::row(id)),
                _ => None,
            },
        };
        if let Some(pending) = pending {
            self.pending_delete = Some(pending);
            self.mode = Mode::Confirm;
        }
    }

    /// Ask for confirmation to delete just the cursor row
    pub fn begin_row_delete(&mut self) {
        if !self.current_config().is_some_and(|c| c.deletable) {
            self.set_status("rows in this table cannot be deleted");
            return;
        }
        if let Some(CursorTarget::Row(id)) = self.cursor_target() {
            self.pending_delete = Some(PendingDelete::row(id));
            self.mode = Mode::Confirm;
        }
    }

    pub fn finish_delete(&mut self, confirmed: bool) {
        self.mode = Mode::Navigate;
        let Some(pending) = self.pending_delete.take() else {
            return;
        };
        if !confirmed {
            return;
        }
        let Some((view, rows)) = self.view_and_rows() else {
            return;
        };
        let removed = row_ops::delete_rows(rows, pending.ids());
        let table_id = view.table_id().to_string();
        let result = project_io::save_after_delete(&self.project, &table_id, &removed);
        let success = result.is_ok();
        if let Err(e) = result {
            self.set_error(format!("delete failed: {}", e));
            // Put the rows back the way the file has them
            if let Err(e) = project_io::reload_table(&mut self.project, &table_id) {
                tracing::warn!(table = %table_id, error = %e, "reload after failed delete");
            }
        } else {
            self.set_status(format!("deleted {} rows", removed.len()));
        }
        if let Some(view) = self.current_mut() {
            view.grid.selection_mut().finish_delete(pending, success);
        }
        self.clamp_cursor();
    }

    // Layout

    /// Change the focused column's width by `cells` terminal cells
    pub fn nudge_width(&mut self, cells: i32) {
        let Some(view) = self.current_mut() else {
            return;
        };
        let Some(key) = view.focused_key() else {
            return;
        };
        let Some(width) = view.grid.width(&key) else {
            return;
        };
        let target = (i64::from(width) + i64::from(cells) * i64::from(CELL_PX)).max(0) as u32;
        if let Some(applied) = view.grid.set_width(&key, target) {
            self.set_status(format!("{}: {}px", key, applied));
        }
    }

    // Ghost rows

    /// Start generating `count` rows for the active table
    pub fn start_generation(&mut self, count: usize) {
        if count == 0 || count > MAX_BATCH {
            self.set_error(format!("row count must be 1..={}", MAX_BATCH));
            return;
        }
        if self.job.is_some() {
            self.set_error("a generation request is already running");
            return;
        }
        let Some(view) = self.views.get(self.active) else {
            return;
        };
        let Some(table) = self.project.table(view.table_id()) else {
            return;
        };
        let generator = TemplateGenerator::for_table(table, &self.project.config.ghost);
        let estimate = generator.estimated_duration(count);
        let table_id = table.config.id.clone();
        let Some(view) = self.current_mut() else {
            return;
        };
        if let Err(e) = view.grid.ghosts_mut().begin_loading(count, estimate, Instant::now()) {
            self.set_error(e.to_string());
            return;
        }
        let job = GenerationJob::spawn(Arc::new(generator), count);
        self.job = Some(PendingJob { table_id, job });
        self.status = None;
    }

    /// Collect a finished generation job and advance ghost timers
    pub fn poll_generation(&mut self, now: Instant) {
        if let Some(pending) = &self.job
            && let Some(result) = pending.job.poll()
        {
            let table_id = pending.table_id.clone();
            self.job = None;
            let Some(view) = self.views.iter_mut().find(|v| v.table_id() == table_id) else {
                return;
            };
            match result {
                Ok(rows) => match view.grid.ghosts_mut().finish_loading(rows, now) {
                    Ok(Some(_)) => self.set_status("generator returned no rows"),
                    Ok(None) => {}
                    Err(e) => self.set_error(e.to_string()),
                },
                Err(e) => {
                    view.grid.ghosts_mut().abort();
                    self.set_error(e.to_string());
                }
            }
        }
        let mut became_ready = false;
        for view in &mut self.views {
            became_ready |= view.grid.ghosts_mut().tick(now);
        }
        if became_ready {
            self.clamp_cursor();
        }
    }

    /// Whether the loop should redraw on a short interval
    pub fn needs_tick(&self) -> bool {
        self.job.is_some() || self.views.iter().any(|v| v.grid.ghosts().needs_tick())
    }

    pub fn accept_ghost(&mut self, id: &RowId) {
        let Some((view, rows)) = self.view_and_rows() else {
            return;
        };
        let result = view.grid.ghosts_mut().accept(id, |row| {
            row_ops::merge_ghost(rows, row);
        });
        let table_id = view.table_id().to_string();
        match result {
            Ok(summary) => {
                self.persist(&table_id);
                if let Some(summary) = summary {
                    self.set_status(format!(
                        "batch done: {} accepted, {} rejected",
                        summary.accepted, summary.rejected
                    ));
                }
            }
            Err(e) => self.set_error(e.to_string()),
        }
        self.clamp_cursor();
    }

    pub fn reject_ghost(&mut self, id: &RowId) {
        let Some(view) = self.current_mut() else {
            return;
        };
        match view.grid.ghosts_mut().reject(id) {
            Ok(Some(summary)) => self.set_status(format!(
                "batch done: {} accepted, {} rejected",
                summary.accepted, summary.rejected
            )),
            Ok(None) => {}
            Err(e) => self.set_error(e.to_string()),
        }
        self.clamp_cursor();
    }

    pub fn accept_all_ghosts(&mut self) {
        let Some((view, rows)) = self.view_and_rows() else {
            return;
        };
        let result = view.grid.ghosts_mut().accept_all(|row| {
            row_ops::merge_ghost(rows, row);
        });
        let table_id = view.table_id().to_string();
        match result {
            Ok(summary) => {
                if self.persist(&table_id) {
                    self.set_status(format!("accepted {} rows", summary.accepted));
                }
            }
            Err(e) => self.set_error(e.to_string()),
        }
        self.clamp_cursor();
    }

    pub fn reject_all_ghosts(&mut self) {
        let Some(view) = self.current_mut() else {
            return;
        };
        match view.grid.ghosts_mut().reject_all() {
            Ok(summary) => self.set_status(format!("rejected {} rows", summary.rejected)),
            Err(e) => self.set_error(e.to_string()),
        }
        self.clamp_cursor();
    }

    // External changes

    pub fn handle_file_events(&mut self, events: Vec<FileEvent>) {
        for event in events {
            match event {
                FileEvent::Changed(paths) => {
                    for path in paths {
                        self.reload_path(&path);
                    }
                }
                FileEvent::LayoutChanged => {
                    for view in &mut self.views {
                        view.grid.reload_layout();
                    }
                }
            }
        }
        self.clamp_cursor();
    }

    fn reload_path(&mut self, path: &Path) {
        if path == self.project.grid_dir.join("project.toml") {
            self.set_status("project.toml changed; restart to apply");
            return;
        }
        let Some(table_id) = project_io::table_for_path(&self.project, path).map(str::to_string) else {
            return;
        };
        match project_io::reload_table(&mut self.project, &table_id) {
            Ok(()) => tracing::info!(table = %table_id, "table reloaded after external change"),
            Err(e) => {
                self.set_error(format!("reload {}: {}", table_id, e));
                return;
            }
        }
        // Rows that vanished must not stay selected
        let Some(table) = self.project.table(&table_id) else {
            return;
        };
        for view in self.views.iter_mut().filter(|v| v.table_id() == table_id) {
            view.grid.prune_selection(&table.rows);
        }
    }
}

/// Restore UI state from .state.json
pub fn restore_ui_state(app: &mut App) {
    use crate::io::state::read_ui_state;

    let Some(ui_state) = read_ui_state(&app.project.grid_dir) else {
        return;
    };
    if let Some(idx) = app
        .views
        .iter()
        .position(|v| v.table_id() == ui_state.active_table)
    {
        app.active = idx;
    }
    for view in &mut app.views {
        if let Some(saved) = ui_state.tables.get(view.table_id()) {
            view.cursor = saved.cursor;
            view.focused_column = saved
                .focused_column
                .min(view.grid.columns().visible_columns().len().saturating_sub(1));
            view.scroll_x = saved.scroll_x;
        }
    }
    app.clamp_cursor();
}

/// Save UI state to .state.json
pub fn save_ui_state(app: &App) {
    use crate::io::state::{TableUiState, UiState, write_ui_state};

    let mut tables = HashMap::new();
    for view in &app.views {
        tables.insert(
            view.table_id().to_string(),
            TableUiState {
                cursor: view.cursor,
                focused_column: view.focused_column,
                scroll_x: view.scroll_x,
            },
        );
    }
    let ui_state = UiState {
        active_table: app
            .current()
            .map(|v| v.table_id().to_string())
            .unwrap_or_default(),
        tables,
    };
    if let Err(e) = write_ui_state(&app.project.grid_dir, &ui_state) {
        tracing::warn!(error = %e, "could not save ui state");
    }
}

/// Route tracing output to `grid/.gridline.log`; the terminal belongs to the UI.
fn init_logging(grid_dir: &Path) {
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(grid_dir.join(".gridline.log"))
    else {
        return;
    };
    let filter = EnvFilter::try_from_env("GRIDLINE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

/// Run the TUI application
pub fn run(project_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let start = match project_dir {
        Some(dir) => std::path::PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let root = discover_project(&start)?;
    let project = load_project(&root)?;
    init_logging(&project.grid_dir);
    tracing::info!(root = %root.display(), tables = project.tables.len(), "tui started");

    let watcher = match GridWatcher::start(&project.grid_dir) {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "file watcher unavailable");
            None
        }
    };

    let mut app = App::new(project);
    restore_ui_state(&mut app);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref());

    for view in &mut app.views {
        view.grid.teardown();
    }
    save_ui_state(&app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&GridWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut save_counter = 0u32;
    loop {
        app.poll_generation(Instant::now());
        if let Some(watcher) = watcher {
            let events = watcher.poll();
            if !events.is_empty() {
                app.handle_file_events(events);
            }
        }

        terminal.draw(|frame| render::render(frame, app))?;

        // Progress bars animate while a batch is loading
        let timeout = if app.needs_tick() {
            Duration::from_millis(50)
        } else {
            Duration::from_millis(250)
        };
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    input::handle_key(app, key);
                    // Debounced state save: every ~5 key presses
                    save_counter += 1;
                    if save_counter >= 5 {
                        save_ui_state(app);
                        save_counter = 0;
                    }
                }
                Event::Mouse(mouse) => input::handle_mouse(app, mouse, Instant::now()),
                Event::FocusLost => {
                    if let Some(view) = app.current_mut() {
                        view.grid.teardown();
                    }
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn px_to_cells_floors_and_never_hits_zero() {
        assert_eq!(px_to_cells(200), 25);
        assert_eq!(px_to_cells(70), 8);
        assert_eq!(px_to_cells(3), 1);
    }

    #[test]
    fn cursor_walks_ghosts_then_rows() {
        let mut app = app_with_backlog();
        assert_eq!(app.cursor_target(), Some(CursorTarget::Row(RowId::Num(1))));
        load_ghosts(&mut app, 2);
        assert_eq!(app.cursor_len(), 5);
        assert_eq!(app.cursor_target(), Some(CursorTarget::Ghost(RowId::Num(-1))));
        app.move_cursor(2);
        assert_eq!(app.cursor_target(), Some(CursorTarget::Row(RowId::Num(1))));
        app.move_cursor(100);
        assert_eq!(app.cursor_target(), Some(CursorTarget::Row(RowId::Num(3))));
    }

    #[test]
    fn sort_on_unsortable_column_reports() {
        let mut app = app_with_backlog();
        app.current_mut().unwrap().focused_column = 1;
        app.sort_focused(SortDirection::Asc);
        assert!(app.status.as_ref().unwrap().text.contains("not sortable"));
        assert!(app.current().unwrap().grid.view().sort().is_none());
    }

    #[test]
    fn list_filter_popup_applies_candidate() {
        let mut app = app_with_backlog();
        app.current_mut().unwrap().focused_column = 1;
        app.open_filter();
        assert_eq!(app.mode, Mode::Filter);
        assert_eq!(app.filter_candidates(), vec!["Todo", "Done"]);
        app.filter_popup.as_mut().unwrap().cursor = 1;
        app.apply_filter();
        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(app.cursor_len(), 1);
        assert_eq!(app.cursor_target(), Some(CursorTarget::Row(RowId::Num(2))));
    }

    #[test]
    fn cancelled_delete_keeps_rows() {
        let mut app = app_with_backlog();
        app.begin_delete();
        assert_eq!(app.mode, Mode::Confirm);
        app.finish_delete(false);
        assert_eq!(app.current_rows().len(), 3);
        // The cursor row stood in for the empty selection without joining it
        assert!(app.current().unwrap().grid.selection().is_empty());
    }

    #[test]
    fn row_delete_targets_cursor_row_and_keeps_selection() {
        let mut app = app_with_backlog();
        app.toggle_cursor_selection();
        app.move_cursor(1);
        app.toggle_cursor_selection();
        app.move_cursor(1);

        app.begin_row_delete();
        assert_eq!(app.mode, Mode::Confirm);
        assert_eq!(app.pending_delete.as_ref().unwrap().ids(), &[RowId::Num(3)]);
        app.finish_delete(true);

        let ids: Vec<RowId> = app.current_rows().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![RowId::Num(1), RowId::Num(2)]);
        assert_eq!(
            app.current().unwrap().grid.selection().ids(),
            vec![RowId::Num(1), RowId::Num(2)]
        );
    }

    #[test]
    fn row_action_touches_only_cursor_row() {
        let mut app = app_with_backlog();
        app.toggle_cursor_selection();
        app.move_cursor(2);
        app.run_row_action();
        assert_eq!(app.status.as_ref().unwrap().text, "Mark done: row 3");
        let rows = app.current_rows();
        assert_eq!(rows[0].get("status"), Some(&serde_json::json!("Todo")));
        assert_eq!(rows[2].get("status"), Some(&serde_json::json!("Done")));
        assert_eq!(app.current().unwrap().grid.selection().ids(), vec![RowId::Num(1)]);
    }

    #[test]
    fn reload_prunes_rows_that_disappeared() {
        let mut app = app_with_backlog();
        app.toggle_all();
        let table = app.project.table_mut("backlog").unwrap();
        table.rows.retain(|r| r.id() != RowId::Num(2));
        let file = table.config.file.clone();
        let path = app.project.grid_dir.join(file);
        project_io::save_table(&app.project, "backlog").unwrap();
        app.handle_file_events(vec![FileEvent::Changed(vec![path])]);
        assert_eq!(
            app.current().unwrap().grid.selection().ids(),
            vec![RowId::Num(1), RowId::Num(3)]
        );
    }

    #[test]
    fn nudge_width_commits_in_cells() {
        let mut app = app_with_backlog();
        app.nudge_width(2);
        assert_eq!(app.current().unwrap().grid.width("name"), Some(216));
        app.nudge_width(-100);
        assert_eq!(app.current().unwrap().grid.width("name"), Some(70));
    }

    #[test]
    fn reject_all_ends_the_batch() {
        let mut app = app_with_backlog();
        load_ghosts(&mut app, 2);
        app.reject_all_ghosts();
        assert_eq!(app.status.as_ref().unwrap().text, "rejected 2 rows");
        assert_eq!(app.current().unwrap().ghost_count(), 0);
        assert_eq!(app.current_rows().len(), 3);
    }

    #[test]
    fn generation_job_is_collected_by_poll() {
        let mut app = app_with_backlog();
        app.project.config.ghost.duration_ms = 0;
        app.start_generation(2);
        assert!(app.needs_tick());
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.job.is_some() {
            assert!(Instant::now() < deadline, "generator never answered");
            std::thread::sleep(Duration::from_millis(5));
            app.poll_generation(Instant::now());
        }
        // Grace delay still runs before the rows are reviewable
        app.poll_generation(Instant::now() + Duration::from_secs(1));
        assert_eq!(app.current().unwrap().ghost_count(), 2);
        assert!(!app.needs_tick());
    }

    #[test]
    fn oversized_generation_is_refused() {
        let mut app = app_with_backlog();
        app.start_generation(MAX_BATCH + 1);
        assert!(app.status.as_ref().unwrap().is_error);
        assert!(app.job.is_none());
    }
}
