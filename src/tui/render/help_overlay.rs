use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;

/// Label standing in for the table's first bulk action
const ACTION_SLOT: &str = "\0action";

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("\u{2191}\u{2193}/jk", "Move cursor"),
            ("\u{2190}\u{2192}/hl", "Focus column"),
            ("Tab", "Next table"),
        ],
    ),
    (
        "View",
        &[
            ("s/S", "Sort ascending/descending"),
            ("f", "Filter focused column"),
            ("F", "Clear focused filter"),
            ("</>", "Narrow/widen column"),
            ("=/+", "Reset column/all widths"),
        ],
    ),
    (
        "Rows",
        &[
            ("space", "Toggle selection"),
            ("a", "Select all/none"),
            ("x", ACTION_SLOT),
            ("d", "Delete selected rows"),
            ("X/D", "Action/delete on cursor row only"),
            ("g", "Generate rows"),
            ("y/n", "Accept/reject generated row"),
            ("Y/N", "Accept/reject all"),
        ],
    ),
    (
        "Mouse",
        &[
            ("drag \u{2502}", "Resize column"),
            ("^dbl-click", "Reset column width"),
            ("^M-dbl-click", "Reset all widths"),
        ],
    ),
    ("Global", &[("?", "Toggle this help"), ("q", "Quit")]),
];

const KEY_COLUMN: usize = 16;

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let overlay_area = centered_rect(60, 90, area);
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(bg);
    let header_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let action = app
        .current()
        .and_then(|v| v.actions.first())
        .map_or("Run bulk action", |a| a.label.as_str());

    let mut lines = vec![Line::from(Span::styled(" Key Bindings", header_style))];
    for (title, bindings) in SECTIONS {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", title), header_style)));
        for (key, desc) in *bindings {
            let desc = if *desc == ACTION_SLOT { action } else { *desc };
            lines.push(Line::from(vec![
                Span::styled(format!(" {:<width$}", key, width = KEY_COLUMN - 1), key_style),
                Span::styled(desc.to_string(), desc_style),
            ]));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(
        Paragraph::new(lines).block(block).style(Style::default().bg(bg)),
        overlay_area,
    );
}

/// Create a centered rectangle of the given percentage of the parent
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn lists_table_action() {
        let app = app_with_backlog();
        let output = render_to_string(TERM_W, 40, |frame, area| {
            render_help_overlay(frame, &app, area)
        });
        assert!(output.contains("Key Bindings"));
        assert!(output.contains("Mark done"));
        assert!(output.contains("Resize column"));
    }

    #[test]
    fn centered_rect_is_centered() {
        let r = centered_rect(50, 50, Rect::new(0, 0, 100, 40));
        assert_eq!(r, Rect::new(25, 10, 50, 20));
    }
}
