use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};

use super::helpers::spans_width;

/// Navigate-mode hint when `[ui] show_key_hints` is on
const KEY_HINTS: &str = "s sort  f filter  a all  g generate  ? help";

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let text = |s: String| Span::styled(s, Style::default().fg(app.theme.text_bright).bg(bg));
    let cursor = || Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)); // ▌

    let (mut spans, hint) = match app.mode {
        Mode::Navigate if app.project.config.ui.show_key_hints => (navigate_spans(app), KEY_HINTS),
        Mode::Navigate => (navigate_spans(app), "? help"),
        Mode::Filter => {
            let popup = app.filter_popup.as_ref();
            let label = popup.map_or("", |p| p.label.as_str());
            let input = popup.map_or("", |p| p.input.as_str());
            (
                vec![text(format!("filter {}: {}", label, input)), cursor()],
                "Enter apply  Esc cancel",
            )
        }
        Mode::Generate => (
            vec![text(format!("generate rows: {}", app.count_input)), cursor()],
            "Enter start  Esc cancel",
        ),
        Mode::Confirm => {
            let count = app.pending_delete.as_ref().map_or(0, |p| p.ids().len());
            let noun = if count == 1 { "row" } else { "rows" };
            (
                vec![Span::styled(
                    format!("Delete {} {}? y/n", count, noun),
                    Style::default().fg(app.theme.error).bg(bg),
                )],
                "",
            )
        }
    };

    let content_width = spans_width(&spans);
    let hint_width = hint.chars().count();
    if !hint.is_empty() && content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

/// A pending status message, else row and selection counts
fn navigate_spans(app: &App) -> Vec<Span<'static>> {
    let bg = app.theme.background;
    if let Some(status) = &app.status {
        let color = if status.is_error { app.theme.error } else { app.theme.text_bright };
        return vec![Span::styled(status.text.clone(), Style::default().fg(color).bg(bg))];
    }
    let Some(view) = app.current() else {
        return Vec::new();
    };
    let rows = view.grid.visible_rows(app.current_rows()).len();
    let mut spans = vec![Span::styled(
        format!("{} rows", rows),
        Style::default().fg(app.theme.dim).bg(bg),
    )];
    let selected = view.grid.selection().len();
    if selected > 0 {
        spans.push(Span::styled(
            format!("  {} selected", selected),
            Style::default().fg(app.theme.highlight).bg(bg),
        ));
        if let Some(action) = view.actions.first() {
            spans.push(Span::styled(
                format!("  x {}  d delete", action.label),
                Style::default().fg(app.theme.dim).bg(bg),
            ));
        } else {
            spans.push(Span::styled("  d delete", Style::default().fg(app.theme.dim).bg(bg)));
        }
    }
    let ghosts = view.ghost_count();
    if ghosts > 0 {
        spans.push(Span::styled(
            format!("  {} to review (y/n, Y/N all)", ghosts),
            Style::default().fg(app.theme.ghost).bg(bg),
        ));
    }
    spans
}
