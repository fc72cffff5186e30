use std::time::{Duration, Instant};

use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::grid::{GeometrySink, ResetScope};
use crate::tui::app::{App, CELL_PX};

/// Two presses on the same cell within this window are a double-click
const DOUBLE_CLICK: Duration = Duration::from_millis(400);

/// Keeps the status row in step with the dragged width
struct StatusReadout<'a> {
    status: &'a mut Option<String>,
}

impl GeometrySink for StatusReadout<'_> {
    fn apply_width(&mut self, column_key: &str, width: u32) {
        *self.status = Some(format!("{}: {}px", column_key, width));
    }
}

fn to_px(x: u16) -> i32 {
    i32::from(x) * CELL_PX as i32
}

/// Handle a mouse event. Handles in the header row start resize drags;
/// clicks in the body move the cursor.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent, now: Instant) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => press(app, mouse, now),
        MouseEventKind::Drag(MouseButton::Left) => {
            let mut readout = None;
            if let Some(view) = app.current_mut() {
                view.grid.pointer_move(
                    to_px(mouse.column),
                    &mut StatusReadout {
                        status: &mut readout,
                    },
                );
            }
            if let Some(text) = readout {
                app.set_status(text);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            let committed = app
                .current_mut()
                .and_then(|view| view.grid.pointer_up(to_px(mouse.column)));
            if let Some((key, width)) = committed {
                app.set_status(format!("{}: {}px", key, width));
            }
        }
        MouseEventKind::ScrollDown => app.move_cursor(3),
        MouseEventKind::ScrollUp => app.move_cursor(-3),
        _ => {}
    }
}

fn press(app: &mut App, mouse: MouseEvent, now: Instant) {
    let (x, y) = (mouse.column, mouse.row);
    let double = app
        .last_click
        .is_some_and(|(at, lx, ly)| lx == x && ly == y && now.duration_since(at) <= DOUBLE_CLICK);
    app.last_click = if double { None } else { Some((now, x, y)) };

    if let Some(key) = app.hit.handle_at(x, y).map(str::to_string) {
        let Some(view) = app.current_mut() else {
            return;
        };
        if double && mouse.modifiers.contains(KeyModifiers::CONTROL) {
            let scope = if mouse.modifiers.contains(KeyModifiers::ALT) {
                ResetScope::All
            } else {
                ResetScope::Column
            };
            view.grid.reset_width(&key, scope);
            app.set_status(match scope {
                ResetScope::All => "all column widths reset".to_string(),
                ResetScope::Column => format!("{} width reset", key),
            });
            return;
        }
        view.grid.pointer_down(&key, to_px(x));
        return;
    }

    // Body click: put the cursor on the clicked row
    let hit = &app.hit;
    if y < hit.body_top || y >= hit.body_top + hit.body_height {
        return;
    }
    let display = hit.body_first + usize::from(y - hit.body_top);
    let loading = app.current().map_or(0, |v| v.grid.ghosts().loading_rows());
    let Some(index) = display.checked_sub(loading) else {
        return;
    };
    if index < app.cursor_len()
        && let Some(view) = app.current_mut()
    {
        view.cursor = index;
    }
}
