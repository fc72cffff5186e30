use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::App;

/// Render the tab bar: one tab per table, with separator line below
pub fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Split into tab row and separator row
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tabs
            Constraint::Length(1), // separator
        ])
        .split(area);

    let sep_cols = render_tabs(frame, app, chunks[0]);
    render_separator(frame, app, chunks[1], &sep_cols);
}

/// Render tabs and return the column positions of each separator character.
fn render_tabs(frame: &mut Frame, app: &App, area: Rect) -> Vec<usize> {
    let mut spans: Vec<Span> = Vec::new();
    let mut sep_cols: Vec<usize> = Vec::new();
    let sep = Span::styled(
        "\u{2502}",
        Style::default().fg(app.theme.dim).bg(app.theme.background),
    );

    // Leading icon
    let bg_style = Style::default().bg(app.theme.background);
    spans.push(Span::styled(" ", bg_style));
    spans.push(Span::styled(
        "\u{25A6}",
        Style::default().fg(app.theme.accent).bg(app.theme.background),
    ));
    spans.push(Span::styled(" ", bg_style));

    for (i, view) in app.views.iter().enumerate() {
        let name = app
            .project
            .table(view.table_id())
            .map_or(view.table_id(), |t| t.config.name.as_str());
        let is_current = i == app.active;
        let style = tab_style(app, is_current);
        spans.push(Span::styled(format!(" {} ", name), style));
        // A batch of generated rows is loading or waiting for review
        if view.grid.ghosts().is_active() {
            let tab_bg = if is_current { app.theme.selection_bg } else { app.theme.background };
            spans.push(Span::styled(
                "\u{2726}",
                Style::default().fg(app.theme.ghost).bg(tab_bg),
            ));
            spans.push(Span::styled(" ", Style::default().bg(tab_bg)));
        }
        sep_cols.push(spans.iter().map(|s| s.content.chars().count()).sum());
        spans.push(sep.clone());
    }

    let line = Line::from(spans);
    let tabs = Paragraph::new(line).style(Style::default().bg(app.theme.background));
    frame.render_widget(tabs, area);
    sep_cols
}

/// Right-aligned summary of the active sort and filters
fn view_indicator(app: &App) -> Vec<Span<'static>> {
    let bg = app.theme.background;
    let Some(view) = app.current() else {
        return Vec::new();
    };
    let state = view.grid.view();
    let mut spans = Vec::new();
    if let Some(sort) = state.sort() {
        spans.push(Span::styled("sort: ", Style::default().fg(app.theme.accent).bg(bg)));
        spans.push(Span::styled(
            format!("{} {}", sort.column_key, sort.direction.arrow()),
            Style::default().fg(app.theme.text).bg(bg),
        ));
    }
    if state.is_filtered() {
        if !spans.is_empty() {
            spans.push(Span::styled("  ", Style::default().bg(bg)));
        }
        spans.push(Span::styled("filter: ", Style::default().fg(app.theme.accent).bg(bg)));
        let text = state
            .filters()
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(" ");
        spans.push(Span::styled(text, Style::default().fg(app.theme.text).bg(bg)));
    }
    spans
}

fn render_separator(frame: &mut Frame, app: &App, area: Rect, sep_cols: &[usize]) {
    let width = area.width as usize;
    let bg = app.theme.background;
    let dim = app.theme.dim;

    let indicator_spans = view_indicator(app);
    let indicator_width: usize = indicator_spans.iter().map(|s| s.content.chars().count()).sum();
    // +2: one space before indicator, one space after (right edge buffer)
    let separator_end = if indicator_spans.is_empty() {
        width
    } else {
        width.saturating_sub(indicator_width + 2)
    };

    let mut sep_text = String::with_capacity(separator_end * 3);
    for col in 0..separator_end {
        if sep_cols.contains(&col) {
            sep_text.push('\u{2534}');
        } else {
            sep_text.push('\u{2500}');
        }
    }
    let mut spans = vec![Span::styled(sep_text, Style::default().fg(dim).bg(bg))];
    if !indicator_spans.is_empty() {
        spans.push(Span::styled(" ", Style::default().bg(bg)));
        spans.extend(indicator_spans);
    }

    let line = Line::from(spans);
    let sep_widget = Paragraph::new(line).style(Style::default().bg(bg));
    frame.render_widget(sep_widget, area);
}

/// Style for a tab: highlighted if current, normal otherwise
fn tab_style(app: &App, is_current: bool) -> Style {
    if is_current {
        Style::default()
            .fg(app.theme.text_bright)
            .bg(app.theme.selection_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.text).bg(app.theme.background)
    }
}
