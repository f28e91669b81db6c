//! Colors, text styles and border glyph sets.

use once_cell::sync::Lazy;

use crate::config::{ColorDepth, EnvConfig};

static COLOR_DEPTH: Lazy<ColorDepth> = Lazy::new(|| EnvConfig::from_env().color_depth);

/// Color depth detected for this process.
pub fn color_depth() -> ColorDepth {
    *COLOR_DEPTH
}

/// Text style wrappers. Each closes only what it opened.
pub struct Style;

impl Style {
    pub fn bold(text: &str) -> String {
        wrap(text, "1", "22")
    }

    pub fn dim(text: &str) -> String {
        wrap(text, "2", "22")
    }

    pub fn italic(text: &str) -> String {
        wrap(text, "3", "23")
    }

    pub fn underline(text: &str) -> String {
        wrap(text, "4", "24")
    }

    pub fn inverse(text: &str) -> String {
        wrap(text, "7", "27")
    }

    pub fn hidden(text: &str) -> String {
        wrap(text, "8", "28")
    }

    pub fn strikethrough(text: &str) -> String {
        wrap(text, "9", "29")
    }

    pub fn overline(text: &str) -> String {
        wrap(text, "53", "55")
    }
}

fn wrap(text: &str, open: &str, close: &str) -> String {
    format!("\x1b[{open}m{text}\x1b[{close}m")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// One of the 16 palette colors, 0..=15.
    Palette(u8),
    Ansi256(u8),
    Rgb(u8, u8, u8),
}

impl Color {
    pub const BLACK: Color = Color::Palette(0);
    pub const RED: Color = Color::Palette(1);
    pub const GREEN: Color = Color::Palette(2);
    pub const YELLOW: Color = Color::Palette(3);
    pub const BLUE: Color = Color::Palette(4);
    pub const MAGENTA: Color = Color::Palette(5);
    pub const CYAN: Color = Color::Palette(6);
    pub const WHITE: Color = Color::Palette(7);
    pub const GRAY: Color = Color::Palette(8);

    /// Parses `#rrggbb` or `#rgb` (the `#` is optional). Unparseable input is black.
    pub fn hex(code: &str) -> Color {
        let (r, g, b) = hex_to_rgb(code);
        Color::Rgb(r, g, b)
    }

    /// Foreground SGR parameters at the process color depth.
    pub fn fg_params(self) -> String {
        self.params_at(color_depth(), false)
    }

    /// Background SGR parameters at the process color depth.
    pub fn bg_params(self) -> String {
        self.params_at(color_depth(), true)
    }

    pub fn params_at(self, depth: ColorDepth, background: bool) -> String {
        let offset = if background { 10 } else { 0 };
        match self.downsample(depth) {
            Color::Palette(idx) if idx < 8 => format!("{}", 30 + offset + idx as u16),
            Color::Palette(idx) => format!("{}", 90 + offset + (idx as u16 - 8)),
            Color::Ansi256(code) => format!("{};5;{code}", 38 + offset),
            Color::Rgb(r, g, b) => format!("{};2;{r};{g};{b}", 38 + offset),
        }
    }

    pub fn downsample(self, depth: ColorDepth) -> Color {
        match (self, depth) {
            (Color::Rgb(r, g, b), ColorDepth::Ansi256) => Color::Ansi256(rgb_to_ansi256(r, g, b)),
            (Color::Rgb(r, g, b), ColorDepth::Ansi16) => {
                Color::Palette(ansi256_to_palette(rgb_to_ansi256(r, g, b)))
            }
            (Color::Ansi256(code), ColorDepth::Ansi16) => Color::Palette(ansi256_to_palette(code)),
            (color, _) => color,
        }
    }

    pub fn paint(self, text: &str) -> String {
        format!("\x1b[{}m{text}\x1b[39m", self.fg_params())
    }

    pub fn paint_bg(self, text: &str) -> String {
        format!("\x1b[{}m{text}\x1b[49m", self.bg_params())
    }

    pub fn rgb(self) -> Option<(u8, u8, u8)> {
        match self {
            Color::Rgb(r, g, b) => Some((r, g, b)),
            _ => None,
        }
    }
}

/// Accent palette used by the built-in widgets.
pub struct Theme;

impl Theme {
    pub const RED: Color = Color::Rgb(0xff, 0x6b, 0x80);
    pub const DARK_RED: Color = Color::Rgb(0x7a, 0x29, 0x36);
    pub const FADED_RED: Color = Color::Rgb(0x69, 0x48, 0x4d);
    pub const LIGHT_ORANGE: Color = Color::Rgb(0xeb, 0x9f, 0x7f);
    pub const ORANGE: Color = Color::Rgb(0xd7, 0x77, 0x57);
    pub const GREEN: Color = Color::Rgb(0x4e, 0xba, 0x65);
    pub const DARK_GREEN: Color = Color::Rgb(0x22, 0x5c, 0x2b);
    pub const FADED_GREEN: Color = Color::Rgb(0x47, 0x58, 0x4a);
    pub const BLUE: Color = Color::Rgb(0xb1, 0xb9, 0xf9);
    pub const PURPLE: Color = Color::Rgb(0xa6, 0x69, 0xff);
    pub const GRAY: Color = Color::Rgb(0xaa, 0xaa, 0xaa);
    pub const DARK_GRAY: Color = Color::Rgb(0x88, 0x88, 0x88);
    pub const WHITE: Color = Color::Rgb(0xff, 0xff, 0xff);
}

pub fn hex_to_rgb(code: &str) -> (u8, u8, u8) {
    let digits = code.trim().trim_start_matches('#');
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return (0, 0, 0),
    };
    match u32::from_str_radix(&expanded, 16) {
        Ok(value) => ((value >> 16) as u8, (value >> 8) as u8, value as u8),
        Err(_) => (0, 0, 0),
    }
}

/// Nearest xterm-256 index, using the 24-step grey ramp for neutral colors.
pub fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        return (((r as f32 - 8.0) / 247.0 * 24.0).round() as u8) + 232;
    }
    let scale = |c: u8| (c as f32 / 255.0 * 5.0).round() as u8;
    16 + 36 * scale(r) + 6 * scale(g) + scale(b)
}

/// Maps an xterm-256 index onto the 16-color palette.
pub fn ansi256_to_palette(code: u8) -> u8 {
    if code < 16 {
        return code;
    }
    let (r, g, b) = if code >= 232 {
        let level = ((code - 232) as f32 * 10.0 + 8.0) / 255.0;
        (level, level, level)
    } else {
        let code = code - 16;
        let remainder = code % 36;
        (
            (code / 36) as f32 / 5.0,
            (remainder / 6) as f32 / 5.0,
            (remainder % 6) as f32 / 5.0,
        )
    };
    let value = (r.max(g).max(b) * 2.0).round();
    if value == 0.0 {
        return 0;
    }
    let idx = ((b.round() as u8) << 2) | ((g.round() as u8) << 1) | (r.round() as u8);
    if value >= 2.0 {
        idx + 8
    } else {
        idx
    }
}

/// Linear mix of two colors; `alpha` is the weight of `a`.
pub fn blend(a: (u8, u8, u8), b: (u8, u8, u8), alpha: f32) -> (u8, u8, u8) {
    let mix = |x: u8, y: u8| (x as f32 * alpha + y as f32 * (1.0 - alpha)) as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderStyle {
    pub top_left: char,
    pub top: char,
    pub top_right: char,
    pub right: char,
    pub bottom_right: char,
    pub bottom: char,
    pub bottom_left: char,
    pub left: char,
}

const fn glyphs(set: [char; 8]) -> BorderStyle {
    BorderStyle {
        top_left: set[0],
        top: set[1],
        top_right: set[2],
        right: set[3],
        bottom_right: set[4],
        bottom: set[5],
        bottom_left: set[6],
        left: set[7],
    }
}

impl BorderStyle {
    pub const SINGLE: BorderStyle = glyphs(['┌', '─', '┐', '│', '┘', '─', '└', '│']);
    pub const DOUBLE: BorderStyle = glyphs(['╔', '═', '╗', '║', '╝', '═', '╚', '║']);
    pub const ROUND: BorderStyle = glyphs(['╭', '─', '╮', '│', '╯', '─', '╰', '│']);
    pub const BOLD: BorderStyle = glyphs(['┏', '━', '┓', '┃', '┛', '━', '┗', '┃']);
    pub const SINGLE_DOUBLE: BorderStyle = glyphs(['╓', '─', '╖', '║', '╜', '─', '╙', '║']);
    pub const DOUBLE_SINGLE: BorderStyle = glyphs(['╒', '═', '╕', '│', '╛', '═', '╘', '│']);
    pub const CLASSIC: BorderStyle = glyphs(['+', '-', '+', '|', '+', '-', '+', '|']);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(hex_to_rgb("#ff8000"), (255, 128, 0));
        assert_eq!(hex_to_rgb("0f0"), (0, 255, 0));
        assert_eq!(hex_to_rgb("nope"), (0, 0, 0));
    }

    #[test]
    fn ansi256_conversion_uses_grey_ramp() {
        assert_eq!(rgb_to_ansi256(0, 0, 0), 16);
        assert_eq!(rgb_to_ansi256(255, 255, 255), 231);
        assert_eq!(rgb_to_ansi256(128, 128, 128), 244);
        assert_eq!(rgb_to_ansi256(255, 0, 0), 196);
    }

    #[test]
    fn palette_conversion() {
        assert_eq!(ansi256_to_palette(196), 9);
        assert_eq!(ansi256_to_palette(16), 0);
        assert_eq!(ansi256_to_palette(3), 3);
    }

    #[test]
    fn params_follow_depth() {
        let orange = Color::hex("#ff8000");
        assert_eq!(orange.params_at(ColorDepth::TrueColor, false), "38;2;255;128;0");
        assert_eq!(orange.params_at(ColorDepth::Ansi256, true), "48;5;214");
        assert_eq!(Color::RED.params_at(ColorDepth::Ansi16, false), "31");
        assert_eq!(Color::GRAY.params_at(ColorDepth::Ansi16, true), "100");
    }

    #[test]
    fn styles_close_what_they_open() {
        assert_eq!(Style::bold("x"), "\x1b[1mx\x1b[22m");
        assert_eq!(Style::inverse("x"), "\x1b[7mx\x1b[27m");
    }

    #[test]
    fn blend_mixes_channels() {
        assert_eq!(blend((255, 255, 255), (0, 0, 0), 0.5), (127, 127, 127));
    }
}
