use ratatui::text::Span;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells
pub(super) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Fit `text` into exactly `cells` cells: truncated with `…` when too long,
/// padded with spaces when short.
pub(super) fn fit_cell(text: &str, cells: usize) -> String {
    if cells == 0 {
        return String::new();
    }
    // Cells are single-line
    let text = text.replace(['\n', '\t'], " ");
    let width = display_width(&text);
    if width <= cells {
        return format!("{}{}", text, " ".repeat(cells - width));
    }
    let budget = cells - 1;
    let mut used = 0;
    let mut out = String::new();
    for grapheme in text.graphemes(true) {
        let gw = display_width(grapheme);
        if used + gw > budget {
            break;
        }
        used += gw;
        out.push_str(grapheme);
    }
    out.push('\u{2026}');
    out.push_str(&" ".repeat(budget - used));
    out
}

/// Compute total display width of a slice of spans
pub(super) fn spans_width(spans: &[Span]) -> usize {
    spans.iter().map(|s| display_width(&s.content)).sum()
}

/// A bar of `cells` cells filled to `percent`
pub(super) fn progress_bar(percent: f32, cells: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * cells as f32).round() as usize;
    let filled = filled.min(cells);
    format!("{}{}", "\u{2588}".repeat(filled), "\u{2591}".repeat(cells - filled))
}
