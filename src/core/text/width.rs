//! Column width of graphemes and styled strings.

use emojis::get as emoji_get;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::ansi::{segments, Segment};

/// Columns a tab occupies. Text content expands tabs to this many spaces before layout.
pub const TAB_WIDTH: usize = 4;

pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_empty() {
        return 0;
    }
    if grapheme == "\t" {
        return TAB_WIDTH;
    }
    if emoji_get(grapheme).is_some() {
        return 2;
    }

    grapheme
        .chars()
        .map(|ch| {
            if ch.is_control() {
                0
            } else {
                UnicodeWidthChar::width(ch).unwrap_or(0)
            }
        })
        .sum()
}

/// Terminal columns occupied by `input`, ignoring escape sequences. East Asian wide and
/// fullwidth characters count as two.
pub fn visible_width(input: &str) -> usize {
    if input.is_ascii() && !input.contains('\x1b') && !input.contains('\t') {
        return input.bytes().filter(|b| !b.is_ascii_control()).count();
    }

    segments(input)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => text.graphemes(true).map(grapheme_width).sum(),
            Segment::Escape(_) => 0,
        })
        .sum()
}

/// Widest line of a multi-line string.
pub fn max_line_width<'a>(lines: impl IntoIterator<Item = &'a String>) -> usize {
    lines
        .into_iter()
        .map(|line| visible_width(line))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_are_ignored() {
        assert_eq!(visible_width("hi\x1b[31m!!\x1b[0m"), 4);
        assert_eq!(visible_width("\x1b]8;;https://example.com\x07link\x1b]8;;\x07"), 4);
    }

    #[test]
    fn east_asian_wide_counts_two() {
        assert_eq!(visible_width("日本"), 4);
        assert_eq!(visible_width("a界b"), 4);
    }

    #[test]
    fn emoji_counts_two() {
        assert_eq!(visible_width("😀"), 2);
        assert_eq!(visible_width("ok 😀"), 5);
    }

    #[test]
    fn control_characters_have_no_width() {
        assert_eq!(visible_width("a\rb"), 2);
        assert_eq!(visible_width("\t"), TAB_WIDTH);
    }

    #[test]
    fn max_line_width_picks_widest() {
        let lines = vec!["ab".to_string(), "\x1b[1mabcd\x1b[22m".to_string()];
        assert_eq!(max_line_width(&lines), 4);
        assert_eq!(max_line_width(&Vec::new()), 0);
    }
}
