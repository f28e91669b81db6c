//! Platform-specific terminal integrations.

pub mod input;
pub mod process_terminal;

pub use input::InputFramer;
pub use process_terminal::{
    install_signal_handlers, ProcessTerminal, SignalHookGuard, TerminalRestore,
};
