use crossterm::event::{KeyCode, KeyEvent};

use crate::grid::{ResetScope, SortDirection};
use crate::tui::app::{App, CursorTarget, Mode};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Esc => {
            app.status = None;
            if let Some(view) = app.current_mut() {
                view.grid.selection_mut().clear();
            }
        }

        // Tables
        KeyCode::Tab => {
            if !app.views.is_empty() {
                app.switch_table((app.active + 1) % app.views.len());
            }
        }
        KeyCode::BackTab => {
            if !app.views.is_empty() {
                let n = app.views.len();
                app.switch_table((app.active + n - 1) % n);
            }
        }

        // Cursor
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1),
        KeyCode::PageDown => app.move_cursor(10),
        KeyCode::PageUp => app.move_cursor(-10),
        KeyCode::Home => {
            if let Some(view) = app.current_mut() {
                view.cursor = 0;
            }
        }
        KeyCode::End => app.move_cursor(isize::MAX),
        KeyCode::Char('h') | KeyCode::Left => {
            if let Some(view) = app.current_mut() {
                view.focused_column = view.focused_column.saturating_sub(1);
            }
        }
        KeyCode::Char('l') | KeyCode::Right => {
            if let Some(view) = app.current_mut() {
                let last = view.grid.columns().visible_columns().len().saturating_sub(1);
                view.focused_column = (view.focused_column + 1).min(last);
            }
        }

        // Sort and filter
        KeyCode::Char('s') => app.sort_focused(SortDirection::Asc),
        KeyCode::Char('S') => app.sort_focused(SortDirection::Desc),
        KeyCode::Char('f') => app.open_filter(),
        KeyCode::Char('F') => app.clear_focused_filter(),

        // Widths
        KeyCode::Char('<') => app.nudge_width(-1),
        KeyCode::Char('>') => app.nudge_width(1),
        KeyCode::Char('=') => {
            if let Some(view) = app.current_mut()
                && let Some(key) = view.focused_key()
            {
                view.grid.reset_width(&key, ResetScope::Column);
            }
        }
        KeyCode::Char('+') => {
            if let Some(view) = app.current_mut() {
                view.grid.reset_width("", ResetScope::All);
            }
        }

        // Selection
        KeyCode::Char(' ') => app.toggle_cursor_selection(),
        KeyCode::Char('a') => app.toggle_all(),
        KeyCode::Char('d') => app.begin_delete(),
        KeyCode::Char('x') => app.run_first_action(),
        KeyCode::Char('D') => app.begin_row_delete(),
        KeyCode::Char('X') => app.run_row_action(),

        // Ghost rows
        KeyCode::Char('g') => {
            if app.current().is_some_and(|v| v.grid.ghosts().is_active()) {
                app.set_status("finish reviewing the current batch first");
                return;
            }
            app.count_input = app.project.config.ghost.default_count.to_string();
            app.mode = Mode::Generate;
        }
        KeyCode::Char('y') => {
            if let Some(CursorTarget::Ghost(id)) = app.cursor_target() {
                app.accept_ghost(&id);
            }
        }
        KeyCode::Char('n') => {
            if let Some(CursorTarget::Ghost(id)) = app.cursor_target() {
                app.reject_ghost(&id);
            }
        }
        KeyCode::Char('Y') => {
            if app.current().is_some_and(|v| v.ghost_count() > 0) {
                app.accept_all_ghosts();
            }
        }
        KeyCode::Char('N') => {
            if app.current().is_some_and(|v| v.ghost_count() > 0) {
                app.reject_all_ghosts();
            }
        }
        _ => {}
    }
}
