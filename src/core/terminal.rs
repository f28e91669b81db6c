//! Terminal trait: the only I/O seam of the runtime.

use std::io;
use std::time::Duration;

/// Minimal terminal interface for the runtime.
pub trait Terminal {
    /// Enter raw mode. Implementations skip mode changes when not attached to a tty.
    fn start(&mut self) -> io::Result<()>;

    /// Restore the mode saved by `start`. Must be safe to call more than once.
    fn stop(&mut self) -> io::Result<()>;

    /// Wait up to `timeout` for input and return it framed into logical key sequences.
    fn poll_input(&mut self, timeout: Duration) -> io::Result<Vec<String>>;

    /// Write output to the terminal.
    fn write(&mut self, data: &str) -> io::Result<()>;

    /// Terminal dimensions.
    fn columns(&self) -> u16;
    fn rows(&self) -> u16;

    /// Whether output goes to a tty. Cursor show/hide is skipped otherwise.
    fn is_tty(&self) -> bool {
        true
    }
}
