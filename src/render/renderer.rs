//! Diff renderer: turns successive frames into the minimal terminal update.
//!
//! The cursor always rests at column 0 of the line below the last rendered line. An update
//! moves up to the first line that differs and rewrites it and everything after it.

use tracing::debug;

use crate::core::output::TerminalCmd;
use crate::core::text::width::visible_width;

#[derive(Debug, Default)]
pub struct DiffRenderer {
    previous: Option<Vec<String>>,
    clear_on_shrink: bool,
}

impl DiffRenderer {
    pub fn new(clear_on_shrink: bool) -> Self {
        Self {
            previous: None,
            clear_on_shrink,
        }
    }

    /// Lines currently on screen, including blank lines left behind by a shrink.
    pub fn previous_lines(&self) -> &[String] {
        self.previous.as_deref().unwrap_or(&[])
    }

    /// Forget the previous frame so the next render prints in full without moving up.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Commands that bring a terminal showing the previous frame to `lines`. `rows` is the
    /// terminal height.
    pub fn render(&mut self, lines: Vec<String>, rows: usize) -> Vec<TerminalCmd> {
        let Some(mut previous) = self.previous.take() else {
            let mut text = lines.join("\r\n");
            text.push_str("\r\n");
            self.previous = Some(lines);
            return vec![TerminalCmd::Text(text)];
        };

        let mut cmds = Vec::new();
        let shrink = previous.len().saturating_sub(lines.len());
        if shrink > rows / 2 || (self.clear_on_shrink && shrink > 0) {
            debug!(
                previous = previous.len(),
                next = lines.len(),
                rows,
                "frame shrank, clearing"
            );
            cmds.push(TerminalCmd::ClearScreen);
            previous.clear();
        }

        let mut lines = lines;
        let total = previous.len().max(lines.len());
        lines.resize(total, String::new());

        let Some(mut first) = (0..total).find(|idx| {
            previous.get(*idx).map_or("", String::as_str) != lines[*idx].as_str()
        }) else {
            self.previous = Some(lines);
            return cmds;
        };

        // The cursor rests on the row below the frame, so only `rows - 1` lines are reachable.
        if previous.len() - first >= rows {
            debug!(first, previous = previous.len(), rows, "change above viewport, clearing");
            cmds.push(TerminalCmd::ClearScreen);
            previous.clear();
            first = 0;
        }

        cmds.push(TerminalCmd::CursorUp(previous.len() - first));
        for (idx, line) in lines.iter().enumerate().skip(first) {
            cmds.push(TerminalCmd::Text(line.clone()));
            let old_width = previous.get(idx).map_or(0, |old| visible_width(old));
            if visible_width(line) < old_width {
                cmds.push(TerminalCmd::EraseLineEnd);
            }
            cmds.push(TerminalCmd::text("\r\n"));
        }

        self.previous = Some(lines);
        cmds
    }
}
