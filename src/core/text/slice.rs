//! Style-preserving column slicing.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{segments, Segment, SgrState};
use super::width::{grapheme_width, visible_width};

/// Returns the visible-column window `[start, end)` of `input`.
///
/// Styles active where the window begins are re-opened before its first visible grapheme,
/// and anything still open at the window's end is closed, so the result can be placed
/// anywhere without leaking or losing styling. A wide grapheme straddling either edge is
/// left out. Non-style escapes (hyperlinks, cursor codes) inside the window are kept.
pub fn slice_styled(input: &str, start: usize, end: usize) -> String {
    let mut out = String::new();
    if start >= end {
        return out;
    }

    let mut wanted = SgrState::default();
    let mut emitted = SgrState::default();
    let mut pending = false;
    let mut col = 0;

    'walk: for segment in segments(input) {
        match segment {
            Segment::Escape(escape) => match escape.sgr_params() {
                Some(params) => {
                    wanted.apply(params);
                    pending = true;
                }
                None => {
                    if col >= start && col < end {
                        out.push_str(escape.text);
                    }
                }
            },
            Segment::Text(text) => {
                for grapheme in text.graphemes(true) {
                    if col >= end {
                        break 'walk;
                    }
                    let width = grapheme_width(grapheme);
                    if col >= start && col + width <= end {
                        if pending {
                            out.push_str(&SgrState::transition(&emitted, &wanted));
                            emitted = wanted.clone();
                            pending = false;
                        }
                        out.push_str(grapheme);
                    }
                    col += width;
                }
            }
        }
    }

    out.push_str(&emitted.close_codes());
    out
}

/// Cuts `input` to at most `width` columns and pads it with spaces to exactly `width`.
pub fn fit_to_width(input: &str, width: usize) -> String {
    let mut line = if visible_width(input) > width || input.contains('\x1b') {
        slice_styled(input, 0, width)
    } else {
        input.to_string()
    };
    let actual = visible_width(&line);
    if actual < width {
        line.push_str(&" ".repeat(width - actual));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::text::ansi::strip_styles;

    #[test]
    fn plain_slice() {
        assert_eq!(slice_styled("hello world", 6, 11), "world");
        assert_eq!(slice_styled("hello", 3, 3), "");
    }

    #[test]
    fn style_reopened_mid_span() {
        let input = "\x1b[31mhello\x1b[39m world";
        assert_eq!(slice_styled(input, 2, 4), "\x1b[31mll\x1b[39m");
    }

    #[test]
    fn style_outside_window_is_not_emitted() {
        let input = "ab\x1b[1mcd\x1b[22mef";
        assert_eq!(slice_styled(input, 0, 2), "ab");
        assert_eq!(slice_styled(input, 4, 6), "ef");
    }

    #[test]
    fn foreground_background_and_attrs_close_independently() {
        let input = "\x1b[44m\x1b[1mab\x1b[22mcd\x1b[49m";
        let slice = slice_styled(input, 1, 3);
        assert_eq!(strip_styles(&slice), "bc");
        assert_eq!(slice, "\x1b[1;44mb\x1b[22mc\x1b[49m");
    }

    #[test]
    fn full_reset_inside_window_closes_specifically() {
        let input = "\x1b[4;32mab\x1b[0mcd";
        assert_eq!(slice_styled(input, 0, 4), "\x1b[4;32mab\x1b[24;39mcd");
    }

    #[test]
    fn wide_grapheme_on_edge_is_dropped() {
        assert_eq!(slice_styled("a日b", 0, 2), "a");
        assert_eq!(slice_styled("a日b", 1, 3), "日");
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit_to_width("ab", 4), "ab  ");
        assert_eq!(fit_to_width("abcdef", 3), "abc");
        assert_eq!(fit_to_width("\x1b[1mab", 3), "\x1b[1mab\x1b[22m ");
    }
}
