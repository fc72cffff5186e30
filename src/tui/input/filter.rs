use crossterm::event::{KeyCode, KeyEvent};

use crate::model::FilterKind;
use crate::tui::app::{App, Mode};

pub(super) fn handle_filter(app: &mut App, key: KeyEvent) {
    let candidate_count = app.filter_candidates().len();
    let Some(popup) = app.filter_popup.as_mut() else {
        app.mode = Mode::Navigate;
        return;
    };
    match key.code {
        KeyCode::Esc => {
            app.filter_popup = None;
            app.mode = Mode::Navigate;
        }
        KeyCode::Enter => app.apply_filter(),
        KeyCode::Down | KeyCode::Tab if popup.kind == FilterKind::List => {
            if popup.cursor + 1 < candidate_count {
                popup.cursor += 1;
            }
        }
        KeyCode::Up | KeyCode::BackTab if popup.kind == FilterKind::List => {
            popup.cursor = popup.cursor.saturating_sub(1);
        }
        KeyCode::Backspace => {
            popup.input.pop();
            popup.cursor = 0;
        }
        KeyCode::Char(c) => {
            popup.input.push(c);
            popup.cursor = 0;
        }
        _ => {}
    }
}
