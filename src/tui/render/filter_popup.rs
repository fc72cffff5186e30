use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use regex::RegexBuilder;

use crate::model::FilterKind;
use crate::tui::app::App;

use super::help_overlay::centered_rect;
use super::push_highlighted_spans;

/// Render the filter popup for the focused column over the table area.
/// List filters show the distinct values narrowed by the typed sub-search;
/// search-only filters show just the text box.
pub fn render_filter_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(popup) = app.filter_popup.as_ref() else {
        return;
    };
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let bg = app.theme.background;
    let text_style = Style::default().fg(app.theme.text).bg(bg);
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);
    let cursor_span = Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg));

    let mut lines: Vec<Line> = Vec::new();
    match popup.kind {
        FilterKind::SearchOnly => {
            lines.push(Line::from(vec![
                Span::styled(" contains: ", dim_style),
                Span::styled(popup.input.clone(), text_style),
                cursor_span,
            ]));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                " Enter applies; an empty value clears",
                dim_style,
            )));
        }
        FilterKind::List => {
            lines.push(Line::from(vec![
                Span::styled(" search: ", dim_style),
                Span::styled(popup.input.clone(), text_style),
                cursor_span,
            ]));
            lines.push(Line::from(""));
            let candidates = app.filter_candidates();
            if candidates.is_empty() {
                lines.push(Line::from(Span::styled(" no matching values", dim_style)));
            }
            let search_re = if popup.input.is_empty() {
                None
            } else {
                RegexBuilder::new(&regex::escape(&popup.input))
                    .case_insensitive(true)
                    .build()
                    .ok()
            };
            let current = app
                .current()
                .and_then(|v| v.grid.view().filter(&popup.column_key));
            // Rows available below the search line and the borders
            let room = usize::from(popup_area.height.saturating_sub(4)).max(1);
            let first = popup.cursor.saturating_sub(room - 1);
            for (i, value) in candidates.iter().enumerate().skip(first).take(room) {
                let selected = i == popup.cursor;
                let row_bg = if selected { app.theme.selection_bg } else { bg };
                let base = Style::default()
                    .fg(if selected { app.theme.text_bright } else { app.theme.text })
                    .bg(row_bg);
                let highlight = Style::default()
                    .fg(app.theme.search_match_fg)
                    .bg(app.theme.search_match_bg);
                let marker = if current == Some(value.as_str()) { " \u{2022} " } else { "   " };
                let mut spans = vec![Span::styled(marker, Style::default().fg(app.theme.highlight).bg(row_bg))];
                let shown = if value.is_empty() { "(empty)" } else { value.as_str() };
                push_highlighted_spans(&mut spans, shown, base, highlight, search_re.as_ref());
                if selected {
                    spans.push(Span::styled(
                        " ".repeat(usize::from(popup_area.width)),
                        Style::default().bg(row_bg),
                    ));
                }
                lines.push(Line::from(spans));
            }
        }
    }

    let title = Span::styled(
        format!(" Filter: {} ", popup.label),
        Style::default()
            .fg(app.theme.text_bright)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .style(Style::default().bg(bg));
    let paragraph = Paragraph::new(lines).block(block).style(Style::default().bg(bg));
    frame.render_widget(paragraph, popup_area);
}
