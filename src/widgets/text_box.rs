//! Multi-line text box with Emacs-style editing, history paging and undo.
//!
//! Cursor positions count chars, not bytes. Vertical motion works on visual lines: each
//! newline-delimited paragraph is cut into chunks of the rendered content width.

use std::collections::VecDeque;
use std::rc::Rc;

use tracing::trace;

use crate::core::component::{Controller, Length, Node, Styled, Text, Widget};
use crate::core::style::{Color, Style};
use crate::core::text::wrap::Wrap;
use crate::runtime::context::Context;

const UNDO_LIMIT: usize = 1000;
const STOP_CHARS: &str = " \t\n<>@/|&;(){}[]\"'`";

fn is_stop_char(ch: char) -> bool {
    STOP_CHARS.contains(ch)
}

/// Keeps newlines, turns carriage returns into newlines, drops other control characters.
fn clean_insert(input: &str) -> Vec<char> {
    input
        .chars()
        .filter_map(|ch| match ch {
            '\r' | '\n' => Some('\n'),
            ch if ch.is_control() => None,
            ch => Some(ch),
        })
        .collect()
}

pub type InputFilter = Rc<dyn Fn(&str, usize) -> bool>;
pub type PageCallback = Rc<dyn Fn(usize)>;
pub type ChangeCallback = Rc<dyn Fn(&str)>;
pub type SubmitCallback = Rc<dyn Fn(&str) -> bool>;

/// Props for [`TextBoxController`].
#[derive(Clone)]
pub struct TextBox {
    pub width: Length,
    /// Replaces the current text whenever it differs from it.
    pub text: Option<String>,
    pub placeholder: String,
    pub wrap: Wrap,
    pub color: Option<Color>,
    pub placeholder_color: Option<Color>,
    pub highlight_color: Color,
    /// Earlier entries reachable by paging up. The in-progress text is appended.
    pub history: Option<Vec<String>>,
    /// Sees every input with the cursor position first; returning false swallows it.
    pub on_input: Option<InputFilter>,
    pub on_page: Option<PageCallback>,
    pub on_change: Option<ChangeCallback>,
    /// Returning true accepts the submission and clears the undo stack.
    pub on_submit: Option<SubmitCallback>,
}

impl Default for TextBox {
    fn default() -> Self {
        Self {
            width: Length::Fraction(1.0),
            text: None,
            placeholder: String::new(),
            wrap: Wrap::Words,
            color: None,
            placeholder_color: None,
            highlight_color: Color::GRAY,
            history: None,
            on_input: None,
            on_page: None,
            on_change: None,
            on_submit: None,
        }
    }
}

impl TextBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: impl Into<Length>) -> Self {
        self.width = width.into();
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn placeholder_color(mut self, color: Color) -> Self {
        self.placeholder_color = Some(color);
        self
    }

    pub fn highlight_color(mut self, color: Color) -> Self {
        self.highlight_color = color;
        self
    }

    pub fn history(mut self, history: Vec<String>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn on_input(mut self, filter: impl Fn(&str, usize) -> bool + 'static) -> Self {
        self.on_input = Some(Rc::new(filter));
        self
    }

    pub fn on_page(mut self, callback: impl Fn(usize) + 'static) -> Self {
        self.on_page = Some(Rc::new(callback));
        self
    }

    pub fn on_change(mut self, callback: impl Fn(&str) + 'static) -> Self {
        self.on_change = Some(Rc::new(callback));
        self
    }

    pub fn on_submit(mut self, callback: impl Fn(&str) -> bool + 'static) -> Self {
        self.on_submit = Some(Rc::new(callback));
        self
    }
}

impl Widget for TextBox {
    type Controller = TextBoxController;
}

/// Working copy of the fields an edit may change.
struct Draft {
    text: Vec<char>,
    cursor: usize,
    history_idx: usize,
}

pub struct TextBoxController {
    text: Vec<char>,
    cursor: usize,
    history: Vec<String>,
    history_idx: usize,
    mark: Option<usize>,
    kill_buffer: String,
    undo: VecDeque<(Vec<char>, usize)>,
    /// Columns of the rendered text at the last layout. `None` means unbounded.
    content_width: Option<usize>,
}

impl TextBoxController {
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor.min(self.text.len())
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.text.len());
    }

    pub fn mark(&self) -> Option<usize> {
        self.mark
    }

    pub fn kill_buffer(&self) -> &str {
        &self.kill_buffer
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn history_index(&self) -> usize {
        self.history_idx
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Visual line and column of the cursor.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let cursor = self.cursor();
        let mut line = 0;
        let mut start = 0;
        for paragraph in self.text.split(|ch| *ch == '\n') {
            let end = start + paragraph.len();
            if cursor <= end {
                let offset = cursor - start;
                return match self.content_width {
                    Some(width) if width > 0 && offset > 0 => {
                        let row = (offset - 1) / width;
                        (line + row, offset - row * width)
                    }
                    _ => (line, offset),
                };
            }
            line += self.paragraph_lines(paragraph.len());
            start = end + 1;
        }
        (line, 0)
    }

    pub fn total_lines(&self) -> usize {
        self.text
            .split(|ch| *ch == '\n')
            .map(|paragraph| self.paragraph_lines(paragraph.len()))
            .sum()
    }

    fn paragraph_lines(&self, len: usize) -> usize {
        match self.content_width {
            Some(width) if width > 0 => len.div_ceil(width).max(1),
            _ => 1,
        }
    }

    /// Char range `[start, end)` of visual line `target`.
    fn line_bounds(&self, target: usize) -> (usize, usize) {
        let mut line = 0;
        let mut start = 0;
        for paragraph in self.text.split(|ch| *ch == '\n') {
            let count = self.paragraph_lines(paragraph.len());
            if target < line + count {
                let row = target - line;
                return match self.content_width {
                    Some(width) if width > 0 => {
                        let line_start = start + row * width;
                        (line_start, (line_start + width).min(start + paragraph.len()))
                    }
                    _ => (start, start + paragraph.len()),
                };
            }
            line += count;
            start += paragraph.len() + 1;
        }
        (self.text.len(), self.text.len())
    }

    fn set_text(&mut self, widget: &TextBox, text: Vec<char>) {
        self.text = text;
        let value = self.text();
        if let Some(on_change) = &widget.on_change {
            on_change(&value);
        }
        if let Some(slot) = self.history.get_mut(self.history_idx) {
            *slot = value;
        }
    }

    fn page(&self, widget: &TextBox, draft: &mut Draft, direction: isize) {
        let last = self.history.len().saturating_sub(1);
        let next = draft.history_idx.saturating_add_signed(direction).min(last);
        if next == draft.history_idx {
            return;
        }
        if let Some(on_page) = &widget.on_page {
            on_page(next);
        }
        let entry: Vec<char> = self.history[next].chars().collect();
        draft.cursor = entry.len();
        draft.text = entry;
        draft.history_idx = next;
    }

    fn change_line(&self, widget: &TextBox, draft: &mut Draft, direction: isize) {
        let (line, col) = self.cursor_line_col();
        let total = self.total_lines();
        if (direction < 0 && line == 0) || (direction > 0 && line + 1 >= total) {
            self.page(widget, draft, direction);
            return;
        }
        let target = line.saturating_add_signed(direction);
        let (start, end) = self.line_bounds(target);
        draft.cursor = (start + col).min(end);
    }

    fn handle_escape(&self, widget: &TextBox, draft: &mut Draft, seq: &str) {
        let text = &mut draft.text;
        match seq {
            "[D" => draft.cursor = draft.cursor.saturating_sub(1),
            "[C" => draft.cursor = (draft.cursor + 1).min(text.len()),
            "[A" => self.change_line(widget, draft, -1),
            "[B" => self.change_line(widget, draft, 1),
            "[5~" => self.page(widget, draft, -1),
            "[6~" => self.page(widget, draft, 1),
            "[H" | "[1~" => draft.cursor = paragraph_start(text, draft.cursor),
            "[F" | "[4~" => draft.cursor = paragraph_end(text, draft.cursor),
            "[3~" => {
                if draft.cursor < text.len() {
                    text.remove(draft.cursor);
                }
            }
            "\x7f" => {
                let start = word_start(text, draft.cursor);
                text.drain(start..draft.cursor);
                draft.cursor = start;
            }
            "d" => {
                let end = delete_word_end(text, draft.cursor);
                text.drain(draft.cursor..end);
            }
            "\r" => {
                text.insert(draft.cursor, '\n');
                draft.cursor += 1;
            }
            "f" => draft.cursor = word_end(text, draft.cursor),
            "b" => draft.cursor = word_start(text, draft.cursor),
            _ => trace!(sequence = ?seq, "unbound escape sequence"),
        }
    }

    fn styled(&self, widget: &TextBox) -> String {
        if self.text.is_empty() && !widget.placeholder.is_empty() {
            let mut chars = widget.placeholder.chars();
            let first: String = chars.next().into_iter().collect();
            let rest: String = chars.collect();
            let rest = match widget.placeholder_color {
                Some(color) => color.paint(&rest),
                None => Style::dim(&rest),
            };
            return Style::inverse(&first) + &rest;
        }

        // A space before each newline gives a cursor at the end of a paragraph a cell.
        let shown = |pos: usize| pos + self.text[..pos].iter().filter(|ch| **ch == '\n').count();
        let cursor = self.cursor();
        let mut display = Vec::with_capacity(self.text.len());
        for ch in &self.text {
            if *ch == '\n' {
                display.push(' ');
            }
            display.push(*ch);
        }
        let mut shown_cursor = shown(cursor);
        if display.get(shown_cursor) == Some(&'\n') {
            shown_cursor -= 1;
        }
        let shown_mark = self.mark.map(|mark| shown(mark.min(self.text.len())));

        let span = |start: usize, end: usize| -> String {
            display[start.min(display.len())..end.min(display.len())]
                .iter()
                .collect()
        };
        let under = display
            .get(shown_cursor)
            .map_or_else(|| " ".to_string(), |ch| ch.to_string());

        let styled = match shown_mark {
            Some(mark) => {
                let (start, end) = (mark.min(shown_cursor), mark.max(shown_cursor));
                let highlight = |text: String| widget.highlight_color.paint_bg(&text);
                if shown_cursor == end {
                    span(0, start)
                        + &highlight(span(start, end))
                        + &Style::inverse(&under)
                        + &span(end + 1, display.len())
                } else {
                    span(0, start)
                        + &Style::inverse(&under)
                        + &highlight(span(start + 1, end))
                        + &span(end, display.len())
                }
            }
            None => {
                span(0, shown_cursor) + &Style::inverse(&under) + &span(shown_cursor + 1, display.len())
            }
        };
        match widget.color {
            Some(color) => color.paint(&styled),
            None => styled,
        }
    }
}

fn paragraph_start(text: &[char], cursor: usize) -> usize {
    text[..cursor]
        .iter()
        .rposition(|ch| *ch == '\n')
        .map_or(0, |idx| idx + 1)
}

fn paragraph_end(text: &[char], cursor: usize) -> usize {
    text[cursor..]
        .iter()
        .position(|ch| *ch == '\n')
        .map_or(text.len(), |idx| cursor + idx)
}

/// Start of the word before `cursor`, skipping stop characters first.
fn word_start(text: &[char], cursor: usize) -> usize {
    let mut pos = cursor;
    while pos > 0 && is_stop_char(text[pos - 1]) {
        pos -= 1;
    }
    while pos > 0 && !is_stop_char(text[pos - 1]) {
        pos -= 1;
    }
    pos
}

/// Past the current word and the stop characters after it.
fn word_end(text: &[char], cursor: usize) -> usize {
    let mut pos = cursor;
    while pos < text.len() && !is_stop_char(text[pos]) {
        pos += 1;
    }
    while pos < text.len() && is_stop_char(text[pos]) {
        pos += 1;
    }
    pos
}

/// Past the stop characters at `cursor` and the word after them.
fn delete_word_end(text: &[char], cursor: usize) -> usize {
    let mut pos = cursor;
    while pos < text.len() && is_stop_char(text[pos]) {
        pos += 1;
    }
    while pos < text.len() && !is_stop_char(text[pos]) {
        pos += 1;
    }
    pos
}

impl Controller for TextBoxController {
    type Widget = TextBox;

    fn create(widget: &TextBox) -> Self {
        let text: Vec<char> = widget.text.as_deref().unwrap_or_default().chars().collect();
        let mut history = widget.history.clone().unwrap_or_default();
        history.push(text.iter().collect());
        Self {
            cursor: text.len(),
            text,
            history_idx: history.len() - 1,
            history,
            mark: None,
            kill_buffer: String::new(),
            undo: VecDeque::new(),
            content_width: None,
        }
    }

    fn contents(&self, widget: &TextBox) -> Vec<Option<Node>> {
        let wrap = match widget.wrap {
            Wrap::Exact => Wrap::Exact,
            _ => Wrap::WordsWithCursor,
        };
        let text = Text::new(self.styled(widget))
            .wrap(wrap)
            .width(widget.width);
        vec![Some(text.into())]
    }

    fn handle_update(&mut self, old: &TextBox, new: &TextBox) {
        if let Some(text) = &new.text {
            if text.chars().ne(self.text.iter().copied()) {
                self.text = text.chars().collect();
                self.cursor = self.text.len();
            }
        }
        if new.history.is_some() && new.history != old.history {
            let mut history = new.history.clone().unwrap_or_default();
            history.push(self.text());
            self.history_idx = history.len() - 1;
            self.history = history;
        }
    }

    fn handle_input(&mut self, widget: &TextBox, ctx: &mut Context<'_, Self>, input: &str) {
        if let Some(width) = ctx.child_content_width(0) {
            self.content_width = Some(width);
        }
        if let Some(filter) = &widget.on_input {
            if !filter(input, self.cursor()) {
                return;
            }
        }
        ctx.invalidate();

        let mut draft = Draft {
            text: self.text.clone(),
            cursor: self.cursor(),
            history_idx: self.history_idx,
        };
        let text = &mut draft.text;
        match input {
            "\r" => {
                if let Some(on_submit) = &widget.on_submit {
                    if on_submit(&self.text()) {
                        self.undo.clear();
                    }
                }
            }
            "\x7f" | "\x08" => {
                if draft.cursor > 0 {
                    draft.cursor -= 1;
                    text.remove(draft.cursor);
                }
            }
            "\x01" => draft.cursor = paragraph_start(text, draft.cursor),
            "\x02" => draft.cursor = draft.cursor.saturating_sub(1),
            "\x03" => {}
            "\x04" => {
                if draft.cursor < text.len() {
                    text.remove(draft.cursor);
                }
            }
            "\x05" => draft.cursor = paragraph_end(text, draft.cursor),
            "\x06" => draft.cursor = (draft.cursor + 1).min(text.len()),
            "\x07" => self.mark = None,
            "\x0b" => {
                let end = paragraph_end(text, draft.cursor);
                self.kill_buffer = text.drain(draft.cursor..end).collect();
            }
            "\x0e" => self.change_line(widget, &mut draft, 1),
            "\x0f" => text.insert(draft.cursor, '\n'),
            "\x10" => self.change_line(widget, &mut draft, -1),
            "\x14" => {
                if draft.cursor > 0 && draft.cursor < text.len() {
                    text.swap(draft.cursor - 1, draft.cursor);
                    draft.cursor += 1;
                }
            }
            "\x17" => {
                if let Some(mark) = self.mark.take() {
                    let mark = mark.min(text.len());
                    let (start, end) = (mark.min(draft.cursor), mark.max(draft.cursor));
                    self.kill_buffer = text.drain(start..end).collect();
                    draft.cursor = start;
                }
            }
            "\x19" => {
                let yank: Vec<char> = self.kill_buffer.chars().collect();
                let len = yank.len();
                text.splice(draft.cursor..draft.cursor, yank);
                draft.cursor += len;
            }
            "\x1f" => {
                if let Some((previous, cursor)) = self.undo.pop_back() {
                    self.cursor = cursor;
                    if previous != self.text {
                        self.set_text(widget, previous);
                    }
                }
                return;
            }
            "\x00" => self.mark = Some(draft.cursor),
            seq if seq.starts_with('\x1b') => self.handle_escape(widget, &mut draft, &seq[1..]),
            chars => {
                let insert = clean_insert(chars);
                let len = insert.len();
                text.splice(draft.cursor..draft.cursor, insert);
                draft.cursor += len;
            }
        }

        let changed = draft.text != self.text;
        if changed {
            self.undo.push_back((self.text.clone(), self.cursor()));
            if self.undo.len() > UNDO_LIMIT {
                self.undo.pop_front();
            }
        }
        self.cursor = draft.cursor;
        self.history_idx = draft.history_idx;
        if changed {
            self.set_text(widget, draft.text);
        }
    }
}
