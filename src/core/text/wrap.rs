//! Line wrapping for styled text.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{segments, Segment, SgrState};
use super::slice::slice_styled;
use super::width::grapheme_width;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrap {
    /// Break every `max_width` columns.
    Exact,
    /// Break at whitespace, hard-breaking words longer than the line.
    #[default]
    Words,
    /// Word wrap that keeps the last column free for a cursor glyph. Whitespace at a wrap
    /// point stays on the closed line (in the reserved column) and nothing is dropped, so
    /// a cursor drawn on whitespace never disappears.
    WordsWithCursor,
}

/// Wraps `input` to lines of at most `max_width` columns.
///
/// Explicit newlines always break. Styles are carried across breaks: every output line
/// re-opens what was active where it starts and closes what it leaves open.
pub fn wrap_lines(input: &str, max_width: usize, mode: Wrap) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in split_paragraphs(input) {
        if max_width == 0 {
            lines.push(String::new());
            continue;
        }
        wrap_paragraph(&paragraph, max_width, mode, &mut lines);
    }
    lines
}

/// Splits on `\n`, prefixing each paragraph after the first with the style codes active
/// at the split.
pub fn split_paragraphs(input: &str) -> Vec<String> {
    if !input.contains('\x1b') {
        return input.split('\n').map(str::to_string).collect();
    }

    let mut paragraphs = Vec::new();
    let mut state = SgrState::default();
    let mut current = String::new();
    for segment in segments(input) {
        match segment {
            Segment::Escape(escape) => {
                if let Some(params) = escape.sgr_params() {
                    state.apply(params);
                }
                current.push_str(escape.text);
            }
            Segment::Text(text) => {
                let mut parts = text.split('\n');
                if let Some(first) = parts.next() {
                    current.push_str(first);
                }
                for part in parts {
                    paragraphs.push(std::mem::take(&mut current));
                    current.push_str(&state.open_codes());
                    current.push_str(part);
                }
            }
        }
    }
    paragraphs.push(current);
    paragraphs
}

fn wrap_paragraph(paragraph: &str, max_width: usize, mode: Wrap, out: &mut Vec<String>) {
    let plain: String = segments(paragraph)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Text(text) => Some(text),
            Segment::Escape(_) => None,
        })
        .collect();
    let cells: Vec<(bool, usize)> = plain
        .graphemes(true)
        .map(|g| (g.chars().all(char::is_whitespace), grapheme_width(g)))
        .collect();

    // cols[i] is the column where grapheme i starts.
    let mut cols = Vec::with_capacity(cells.len() + 1);
    let mut total = 0;
    for &(_, width) in &cells {
        cols.push(total);
        total += width;
    }
    cols.push(total);

    let whole = |from: usize, to: usize| {
        if from == 0 && to == cells.len() && !paragraph.contains('\x1b') {
            paragraph.to_string()
        } else {
            slice_styled(paragraph, cols[from], cols[to])
        }
    };

    if total <= max_width {
        out.push(whole(0, cells.len()));
        return;
    }

    let content_width = match mode {
        Wrap::WordsWithCursor => max_width.saturating_sub(1).max(1),
        _ => max_width,
    };

    let mut idx = 0;
    let mut first = true;
    while idx < cells.len() {
        if !first && mode == Wrap::Words {
            while idx < cells.len() && cells[idx].0 {
                idx += 1;
            }
            if idx == cells.len() {
                break;
            }
        }
        first = false;

        let budget = match mode {
            Wrap::WordsWithCursor => max_width,
            _ => content_width,
        };
        if cols[cells.len()] - cols[idx] <= budget {
            out.push(whole(idx, cells.len()));
            break;
        }

        let mut limit = idx;
        while limit < cells.len() && cols[limit + 1] - cols[idx] <= content_width {
            limit += 1;
        }
        if limit == idx {
            limit = idx + 1;
        }

        let (line_end, next) = if mode == Wrap::Exact {
            (limit, limit)
        } else if limit < cells.len() && cells[limit].0 {
            match mode {
                Wrap::WordsWithCursor if cols[limit + 1] - cols[idx] <= max_width => {
                    (limit + 1, limit + 1)
                }
                Wrap::WordsWithCursor => (limit, limit),
                _ => (limit, limit + 1),
            }
        } else {
            match (idx + 1..limit).rev().find(|&pos| cells[pos].0) {
                Some(space) if mode == Wrap::WordsWithCursor => (space + 1, space + 1),
                Some(space) => (space, space + 1),
                None => (limit, limit),
            }
        };

        out.push(whole(idx, line_end));
        idx = next;
    }
}
