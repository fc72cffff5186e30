use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::grid::{ResizeState, SortState};
use crate::model::{CellFormat, Record, TableConfig, display_value};
use crate::tui::app::{App, HeaderHandle, HitMap, TableView, px_to_cells};
use crate::tui::theme::Theme;

use super::helpers::{fit_cell, progress_bar};

/// `[x] ` in front of every row of a multiselect table
const CHECKBOX_CELLS: usize = 4;
const GHOST_MARK: &str = " \u{2726}  ";
const HANDLE: &str = "\u{2502}";

/// One visible column, positioned in content cells (before scrolling)
struct ColumnSlot {
    key: String,
    label: String,
    format: CellFormat,
    start: usize,
    cells: usize,
}

impl ColumnSlot {
    /// Content x of the resize handle after this column
    fn handle_x(&self) -> usize {
        self.start + self.cells
    }
}

fn column_slots(view: &TableView, config: Option<&TableConfig>, prefix: usize) -> Vec<ColumnSlot> {
    let mut x = prefix;
    view.grid
        .widths()
        .into_iter()
        .map(|(key, px)| {
            let cells = usize::from(px_to_cells(px));
            let label = view
                .grid
                .columns()
                .column(&key)
                .map(|c| c.label.clone())
                .unwrap_or_else(|| key.clone());
            let format = config
                .and_then(|c| c.columns.iter().find(|col| col.key == key))
                .map(|col| col.format)
                .unwrap_or_default();
            let slot = ColumnSlot {
                key,
                label,
                format,
                start: x,
                cells,
            };
            x += cells + 1;
            slot
        })
        .collect()
}

/// Render the active table: header with resize handles, then loading rows,
/// ghost rows awaiting review and the derived view.
pub fn render_table_view(frame: &mut Frame, app: &mut App, area: Rect, now: Instant) {
    app.hit = HitMap::default();
    let bg = app.theme.background;
    let Some(view) = app.views.get(app.active) else {
        let msg = Line::from(Span::styled(
            "  No tables configured: add [[tables]] to grid/project.toml",
            Style::default().fg(app.theme.dim).bg(bg),
        ));
        frame.render_widget(Paragraph::new(msg).style(Style::default().bg(bg)), area);
        return;
    };
    if area.height < 3 || area.width == 0 {
        return;
    }
    let theme = &app.theme;
    let table = app.project.table(view.table_id());
    let config = table.map(|t| &t.config);
    let rows: &[Record] = table.map_or(&[], |t| t.rows.as_slice());
    let multiselect = config.is_some_and(|c| c.multiselect);
    let prefix = if multiselect { CHECKBOX_CELLS } else { 0 };
    let slots = column_slots(view, config, prefix);
    let total_width = slots.last().map_or(prefix, |s| s.handle_x() + 1);
    let width = usize::from(area.width);

    // Horizontal scroll keeps the focused column on screen
    let mut scroll_x = usize::from(view.scroll_x).min(total_width.saturating_sub(width));
    if let Some(slot) = slots.get(view.focused_column) {
        let start = if view.focused_column == 0 { 0 } else { slot.start };
        let end = slot.handle_x() + 1;
        if start < scroll_x {
            scroll_x = start;
        } else if end > scroll_x + width {
            scroll_x = end - width.min(end);
        }
    }

    let visible = view.grid.visible_rows(rows);
    let visible_ids: Vec<_> = visible.iter().map(|r| r.id()).collect();

    // Header
    let dragging = match view.grid.resize().state() {
        ResizeState::Dragging(drag) => Some(drag.column_key.as_str()),
        ResizeState::Idle => None,
    };
    let header_style = Style::default()
        .fg(theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let mut header: Vec<Span> = Vec::new();
    if multiselect {
        let all = view.grid.selection().is_all_selected(&visible_ids);
        header.push(Span::styled(if all { "[x] " } else { "[ ] " }, header_style));
    }
    for (i, slot) in slots.iter().enumerate() {
        let label = header_label(slot, view.grid.view().sort(), view.grid.view().filter(&slot.key).is_some());
        let style = if i == view.focused_column {
            header_style.fg(theme.highlight)
        } else {
            header_style
        };
        header.push(Span::styled(fit_cell(&label, slot.cells), style));
        let handle_color = if dragging == Some(slot.key.as_str()) {
            theme.highlight
        } else {
            theme.dim
        };
        header.push(Span::styled(HANDLE, Style::default().fg(handle_color).bg(bg)));
    }

    let mut rule = String::with_capacity(total_width * 3);
    for x in 0..total_width {
        if slots.iter().any(|s| s.handle_x() == x) {
            rule.push('\u{253C}');
        } else {
            rule.push('\u{2500}');
        }
    }

    // Body: loading placeholders, ghosts, then the view
    let ghosts = view.grid.ghosts();
    let loading = ghosts.loading_rows();
    let ghost_items = ghosts.items();
    let total = loading + ghost_items.len() + visible.len();
    let body_height = usize::from(area.height - 2);
    let cursor_display = loading + view.cursor;
    let mut scroll_y = view.scroll_y.min(total.saturating_sub(1));
    if cursor_display < scroll_y {
        scroll_y = cursor_display;
    } else if cursor_display >= scroll_y + body_height {
        scroll_y = cursor_display + 1 - body_height;
    }

    let mut body: Vec<Line> = Vec::new();
    if total == 0 {
        let text = if view.grid.view().is_filtered() {
            "  No rows match the current filters (F clears)"
        } else {
            "  No rows"
        };
        body.push(Line::from(Span::styled(text, Style::default().fg(theme.dim).bg(bg))));
    }
    let progress = ghosts.progress(now).unwrap_or(0.0);
    for display in scroll_y..total.min(scroll_y + body_height) {
        let is_cursor = display == cursor_display;
        let line = if display < loading {
            loading_line(theme, prefix, total_width, progress)
        } else if let Some(ghost) = ghost_items.get(display - loading) {
            ghost_line(view, theme, &slots, prefix, ghost, is_cursor)
        } else {
            let row = visible[display - loading - ghost_items.len()];
            row_line(view, theme, &slots, multiselect, row, is_cursor)
        };
        body.push(line);
    }

    // Hit-testing positions for the mouse
    let mut handles = Vec::new();
    for slot in &slots {
        let x = slot.handle_x();
        if x >= scroll_x && x - scroll_x < width {
            handles.push(HeaderHandle {
                x: area.x + (x - scroll_x) as u16,
                column_key: slot.key.clone(),
            });
        }
    }
    let hit = HitMap {
        header_y: Some(area.y),
        handles,
        body_top: area.y + 2,
        body_first: scroll_y,
        body_height: area.height - 2,
    };

    let scroll = (0, scroll_x.min(usize::from(u16::MAX)) as u16);
    let header_widget = Paragraph::new(vec![
        Line::from(header),
        Line::from(Span::styled(rule, Style::default().fg(theme.dim).bg(bg))),
    ])
    .style(Style::default().bg(bg))
    .scroll(scroll);
    let body_widget = Paragraph::new(body)
        .style(Style::default().bg(bg))
        .scroll(scroll);

    frame.render_widget(header_widget, Rect { height: 2, ..area });
    frame.render_widget(
        body_widget,
        Rect {
            y: area.y + 2,
            height: area.height - 2,
            ..area
        },
    );

    app.hit = hit;
    if let Some(view) = app.views.get_mut(app.active) {
        view.scroll_x = scroll_x.min(usize::from(u16::MAX)) as u16;
        view.scroll_y = scroll_y;
    }
}

/// Column label with sort arrow and filter marker
fn header_label(slot: &ColumnSlot, sort: Option<&SortState>, filtered: bool) -> String {
    let mut label = slot.label.clone();
    if let Some(sort) = sort.filter(|s| s.column_key == slot.key) {
        label.push(' ');
        label.push_str(sort.direction.arrow());
    }
    if filtered {
        label.push_str(" \u{2261}");
    }
    label
}

fn loading_line(theme: &Theme, prefix: usize, total_width: usize, progress: f32) -> Line<'static> {
    let text = format!(
        "Generating... {} {:>3.0}%",
        progress_bar(progress, 20),
        progress
    );
    let cells = total_width.saturating_sub(prefix).max(text.chars().count());
    Line::from(vec![
        Span::styled(" ".repeat(prefix), Style::default().bg(theme.background)),
        Span::styled(
            fit_cell(&text, cells),
            Style::default().fg(theme.ghost).bg(theme.background),
        ),
    ])
}

fn ghost_line(
    view: &TableView,
    theme: &Theme,
    slots: &[ColumnSlot],
    prefix: usize,
    ghost: &Record,
    is_cursor: bool,
) -> Line<'static> {
    let row_bg = if is_cursor { theme.selection_bg } else { theme.background };
    let cell_style = Style::default()
        .fg(theme.dim)
        .bg(row_bg)
        .add_modifier(Modifier::ITALIC);
    let mut spans = Vec::new();
    if prefix > 0 {
        spans.push(Span::styled(GHOST_MARK, Style::default().fg(theme.ghost).bg(row_bg)));
    }
    for slot in slots {
        let text = view.grid.cell_text(ghost, &slot.key, true);
        spans.push(Span::styled(fit_cell(&text, slot.cells), cell_style));
        spans.push(Span::styled(HANDLE, Style::default().fg(theme.dim).bg(row_bg)));
    }
    let hint_color = if is_cursor { theme.highlight } else { theme.dim };
    spans.push(Span::styled(
        " [y]accept [n]reject",
        Style::default().fg(hint_color).bg(row_bg),
    ));
    Line::from(spans)
}

fn row_line(
    view: &TableView,
    theme: &Theme,
    slots: &[ColumnSlot],
    multiselect: bool,
    row: &Record,
    is_cursor: bool,
) -> Line<'static> {
    let selected = view.grid.selection().contains(&row.id());
    let row_bg = if is_cursor { theme.selection_bg } else { theme.background };
    let text_color = if is_cursor || selected { theme.text_bright } else { theme.text };
    let mut spans = Vec::new();
    if multiselect {
        let (mark, color) = if selected {
            ("[x] ", theme.highlight)
        } else {
            ("[ ] ", theme.dim)
        };
        spans.push(Span::styled(mark, Style::default().fg(color).bg(row_bg)));
    }
    for (i, slot) in slots.iter().enumerate() {
        let text = view.grid.cell_text(row, &slot.key, false);
        let fg = cell_color(theme, slot, row).unwrap_or(text_color);
        let mut style = Style::default().fg(fg).bg(row_bg);
        if is_cursor && i == view.focused_column {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        spans.push(Span::styled(fit_cell(&text, slot.cells), style));
        spans.push(Span::styled(HANDLE, Style::default().fg(theme.dim).bg(row_bg)));
    }
    Line::from(spans)
}

/// Tag cells take the configured color for their value
fn cell_color(theme: &Theme, slot: &ColumnSlot, row: &Record) -> Option<Color> {
    if slot.format != CellFormat::Tag {
        return None;
    }
    let value = display_value(row.get(&slot.key));
    theme.tag_colors.get(&value).copied()
}
