use std::collections::HashMap;

use ratatui::style::Color;

use crate::model::UiConfig;

/// Colors the grid is drawn with, by role
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    /// Focused column, active sort, dragged handle
    pub highlight: Color,
    pub dim: Color,
    /// Chrome labels: the tab icon, sort and filter indicators
    pub accent: Color,
    /// Loading rows, ghost marks and the review count
    pub ghost: Color,
    pub error: Color,
    /// Cursor row and the active tab
    pub selection_bg: Color,
    pub search_match_bg: Color,
    pub search_match_fg: Color,
    /// Colors for `tag`-formatted cells, keyed by display value
    pub tag_colors: HashMap<String, Color>,
}

const TODO_BLUE: Color = Color::Rgb(0x44, 0x88, 0xFF);
const GOLD: Color = Color::Rgb(0xFF, 0xD7, 0x00);
const RED: Color = Color::Rgb(0xFF, 0x44, 0x44);
const GREEN: Color = Color::Rgb(0x44, 0xFF, 0x88);

impl Default for Theme {
    fn default() -> Self {
        let tag_colors = [
            ("Todo", TODO_BLUE),
            ("In Progress", GOLD),
            ("Blocked", RED),
            ("Done", GREEN),
        ]
        .into_iter()
        .map(|(tag, color)| (tag.to_string(), color))
        .collect();

        Theme {
            background: Color::Rgb(0x0C, 0x00, 0x1B),
            text: Color::Rgb(0xB0, 0xAA, 0xFF),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0xFB, 0x41, 0x96),
            dim: Color::Rgb(0x7D, 0x78, 0xBF),
            accent: Color::Rgb(0xCC, 0x66, 0xFF),
            ghost: Color::Rgb(0xCC, 0x66, 0xFF),
            error: RED,
            selection_bg: Color::Rgb(0x3D, 0x14, 0x38),
            search_match_bg: Color::Rgb(0x40, 0xE0, 0xD0),
            search_match_fg: Color::Rgb(0x0C, 0x00, 0x1B),
            tag_colors,
        }
    }
}

/// Parse `#RRGGBB` or the short `#RGB` form
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(Color::Rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        // #abc is #aabbcc
        3 => {
            let mut rgb = [0u8; 3];
            for (slot, i) in rgb.iter_mut().zip(0..3) {
                *slot = channel(&hex[i..i + 1])? * 0x11;
            }
            Some(Color::Rgb(rgb[0], rgb[1], rgb[2]))
        }
        _ => None,
    }
}

impl Theme {
    /// Defaults overlaid with `[ui.colors]` and `[ui.tag_colors]`.
    /// Unparseable colors and unknown roles are skipped with a warning.
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = Theme::default();

        for (role, value) in &ui.colors {
            let Some(color) = parse_hex_color(value) else {
                tracing::warn!(role = %role, value = %value, "ignoring unparseable color");
                continue;
            };
            if !theme.set_role(role, color) {
                tracing::warn!(role = %role, "ignoring unknown color role");
            }
        }

        for (tag, value) in &ui.tag_colors {
            match parse_hex_color(value) {
                Some(color) => {
                    theme.tag_colors.insert(tag.clone(), color);
                }
                None => tracing::warn!(tag = %tag, value = %value, "ignoring unparseable tag color"),
            }
        }

        theme
    }

    fn set_role(&mut self, role: &str, color: Color) -> bool {
        let slot = match role {
            "background" => &mut self.background,
            "text" => &mut self.text,
            "text_bright" => &mut self.text_bright,
            "highlight" => &mut self.highlight,
            "dim" => &mut self.dim,
            "accent" => &mut self.accent,
            "ghost" => &mut self.ghost,
            "error" => &mut self.error,
            "selection_bg" => &mut self.selection_bg,
            "search_match_bg" => &mut self.search_match_bg,
            "search_match_fg" => &mut self.search_match_fg,
            _ => return false,
        };
        *slot = color;
        true
    }

    /// Color for a tag value, falling back to the text color
    pub fn tag_color(&self, tag: &str) -> Color {
        self.tag_colors.get(tag).copied().unwrap_or(self.text)
    }
}
