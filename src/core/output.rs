//! Typed terminal output commands and a single output gate.
//!
//! Invariant: all terminal writes flow through `OutputGate::flush(..)`.

use std::io;

use crate::core::terminal::Terminal;

pub const BRACKETED_PASTE_ENABLE: &str = "\x1b[?2004h";
pub const BRACKETED_PASTE_DISABLE: &str = "\x1b[?2004l";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCmd {
    /// Text, possibly carrying style codes.
    Text(String),

    /// Cursor visibility.
    HideCursor,
    ShowCursor,

    /// Bracketed paste mode: pasted text arrives wrapped in `ESC[200~` .. `ESC[201~`.
    BracketedPasteEnable,
    BracketedPasteDisable,

    /// Move the cursor up `n` lines, keeping the column.
    CursorUp(usize),
    EraseLineEnd,
    /// Erase the whole screen and home the cursor.
    ClearScreen,
}

impl TerminalCmd {
    pub fn text(data: impl Into<String>) -> Self {
        Self::Text(data.into())
    }

    /// Escape sequence for this command. `CursorUp(0)` encodes to nothing.
    pub fn encode(&self, out: &mut String) {
        match self {
            TerminalCmd::Text(data) => out.push_str(data),
            TerminalCmd::HideCursor => out.push_str("\x1b[?25l"),
            TerminalCmd::ShowCursor => out.push_str("\x1b[?25h"),
            TerminalCmd::BracketedPasteEnable => out.push_str(BRACKETED_PASTE_ENABLE),
            TerminalCmd::BracketedPasteDisable => out.push_str(BRACKETED_PASTE_DISABLE),
            TerminalCmd::CursorUp(0) => {}
            TerminalCmd::CursorUp(n) => {
                out.push_str(&format!("\x1b[{n}A"));
            }
            TerminalCmd::EraseLineEnd => out.push_str("\x1b[K"),
            TerminalCmd::ClearScreen => out.push_str("\x1b[2J\x1b[H"),
        }
    }
}

#[derive(Debug, Default)]
pub struct OutputGate {
    cmds: Vec<TerminalCmd>,
}

impl OutputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: TerminalCmd) {
        self.cmds.push(cmd);
    }

    pub fn extend<I>(&mut self, cmds: I)
    where
        I: IntoIterator<Item = TerminalCmd>,
    {
        self.cmds.extend(cmds);
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    /// Encodes buffered commands without writing them.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for cmd in &self.cmds {
            cmd.encode(&mut out);
        }
        out
    }

    /// Flush buffered commands to the terminal in a single write.
    ///
    /// This is the single write gate: `Terminal::write(..)` must not be called
    /// from anywhere else.
    pub fn flush<T: Terminal>(&mut self, term: &mut T) -> io::Result<()> {
        if self.cmds.is_empty() {
            return Ok(());
        }
        let data = self.encode();
        self.cmds.clear();
        term.write(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_up_zero_encodes_to_nothing() {
        let mut out = String::new();
        TerminalCmd::CursorUp(0).encode(&mut out);
        assert!(out.is_empty());
        TerminalCmd::CursorUp(3).encode(&mut out);
        assert_eq!(out, "\x1b[3A");
    }

    #[test]
    fn gate_encodes_in_push_order() {
        let mut gate = OutputGate::new();
        gate.push(TerminalCmd::HideCursor);
        gate.extend([TerminalCmd::text("hi"), TerminalCmd::EraseLineEnd]);
        assert_eq!(gate.encode(), "\x1b[?25lhi\x1b[K");
        gate.clear();
        gate.extend([TerminalCmd::BracketedPasteEnable, TerminalCmd::BracketedPasteDisable]);
        assert_eq!(gate.encode(), "\x1b[?2004h\x1b[?2004l");
        gate.clear();
        assert!(gate.is_empty());
    }
}
