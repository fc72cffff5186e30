use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, Mode};

pub(super) fn handle_generate_prompt(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.count_input.clear();
            app.mode = Mode::Navigate;
        }
        KeyCode::Enter => {
            app.mode = Mode::Navigate;
            let input = std::mem::take(&mut app.count_input);
            match input.parse::<usize>() {
                Ok(count) => app.start_generation(count),
                Err(_) => app.set_error(format!("not a row count: {:?}", input)),
            }
        }
        KeyCode::Backspace => {
            app.count_input.pop();
        }
        KeyCode::Char(c) if c.is_ascii_digit() && app.count_input.len() < 3 => {
            app.count_input.push(c);
        }
        _ => {}
    }
}
