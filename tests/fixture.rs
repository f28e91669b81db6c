#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use ask_tui::{strip_styles, ElementTree, NodeId, Terminal};

/// In-memory terminal: scripted input batches in, written bytes out.
pub struct TestTerminal {
    pub written: String,
    pub inputs: VecDeque<Vec<String>>,
    pub columns: u16,
    pub rows: u16,
    pub tty: bool,
    pub starts: usize,
    pub stops: usize,
}

impl TestTerminal {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            written: String::new(),
            inputs: VecDeque::new(),
            columns,
            rows,
            tty: true,
            starts: 0,
            stops: 0,
        }
    }

    /// Queue one poll worth of key sequences per entry.
    pub fn with_keys(mut self, keys: &[&str]) -> Self {
        self.inputs
            .extend(keys.iter().map(|key| vec![key.to_string()]));
        self
    }

    pub fn take_written(&mut self) -> String {
        std::mem::take(&mut self.written)
    }
}

impl Terminal for TestTerminal {
    fn start(&mut self) -> io::Result<()> {
        self.starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        self.stops += 1;
        Ok(())
    }

    fn poll_input(&mut self, _timeout: Duration) -> io::Result<Vec<String>> {
        Ok(self.inputs.pop_front().unwrap_or_default())
    }

    fn write(&mut self, data: &str) -> io::Result<()> {
        self.written.push_str(data);
        Ok(())
    }

    fn columns(&self) -> u16 {
        self.columns
    }

    fn rows(&self) -> u16 {
        self.rows
    }

    fn is_tty(&self) -> bool {
        self.tty
    }
}

pub fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|line| line.to_string()).collect()
}

/// Lay out at `width` and render the tree rooted at `root` without styles.
pub fn plain_frame(tree: &mut ElementTree, root: NodeId, width: usize) -> Vec<String> {
    tree.layout(Some(width), None);
    ask_tui::render::render(tree, root)
        .iter()
        .map(|line| strip_styles(line))
        .collect()
}
