//! Main loop: poll input, reconcile, lay out, render and diff.
//!
//! Invariant: every byte written to the terminal goes through the runtime's `OutputGate`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::config::EnvConfig;
use crate::core::component::{Controller, Flex, Node};
use crate::core::output::{OutputGate, TerminalCmd};
use crate::core::terminal::Terminal;
use crate::error::Result;
use crate::logging;
use crate::platform::process_terminal::{install_signal_handlers, ProcessTerminal, TerminalRestore};
use crate::render::compose;
use crate::render::renderer::DiffRenderer;
use crate::runtime::context::{Handle, Updater};
use crate::runtime::tree::{ElementTree, NodeId};

/// Restores the terminal once, from whichever exit path gets there first.
struct CrashCleanup {
    ran: AtomicBool,
    restore: TerminalRestore,
}

impl CrashCleanup {
    fn new(restore: TerminalRestore) -> Self {
        Self {
            ran: AtomicBool::new(false),
            restore,
        }
    }

    fn run(&self) {
        if self.ran.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(err) = self.restore.restore() {
            warn!(error = %err, "terminal restore failed");
        }
    }
}

pub struct Runtime<T: Terminal> {
    terminal: T,
    tree: ElementTree,
    root: NodeId,
    renderer: DiffRenderer,
    output: OutputGate,
    poll_interval: Duration,
    last_columns: Option<u16>,
    started: bool,
    stopped: bool,
}

impl<T: Terminal> Runtime<T> {
    pub fn new(terminal: T, root: impl Into<Node>) -> Self {
        Self::with_config(terminal, root, &EnvConfig::from_env())
    }

    pub fn with_config(terminal: T, root: impl Into<Node>, config: &EnvConfig) -> Self {
        let mut tree = ElementTree::new();
        let root = tree.mount_root(Flex::vertical().child(root));
        Self {
            terminal,
            tree,
            root,
            renderer: DiffRenderer::new(config.clear_on_shrink),
            output: OutputGate::new(),
            poll_interval: config.poll_interval,
            last_columns: None,
            started: false,
            stopped: false,
        }
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ElementTree {
        &mut self.tree
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    pub fn updater(&self) -> Updater {
        self.tree.updater()
    }

    /// Handle to the first mounted controller of type `C`.
    pub fn handle<C: Controller>(&self) -> Option<Handle<C>> {
        let id = self.tree.find::<C>()?;
        self.tree.handle::<C>(id)
    }

    /// Enter raw mode, hide the cursor, turn on bracketed paste and print the first frame.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.terminal.start()?;
        self.started = true;
        debug!(
            columns = self.terminal.columns(),
            rows = self.terminal.rows(),
            tty = self.terminal.is_tty(),
            "runtime started"
        );
        if self.terminal.is_tty() {
            self.output.push(TerminalCmd::HideCursor);
            self.output.push(TerminalCmd::BracketedPasteEnable);
        }
        self.draw()
    }

    /// One loop iteration. Returns false once exit has been requested.
    pub fn tick(&mut self) -> Result<bool> {
        let inputs = self.terminal.poll_input(self.poll_interval)?;
        for input in &inputs {
            trace!(input = ?input, "input");
            self.tree.propagate(input);
        }
        let applied = self.tree.drain_messages();
        if applied > 0 {
            trace!(applied, "out-of-band updates");
        }
        self.tree.reconcile_dirty();
        self.draw()?;
        Ok(!self.tree.exit_requested())
    }

    /// Clear the screen and print the current frame in full.
    pub fn redraw(&mut self) -> Result<()> {
        self.output.push(TerminalCmd::ClearScreen);
        self.renderer.reset();
        self.draw()
    }

    /// Run until exit is requested. The terminal is restored on every return path.
    pub fn run(&mut self) -> Result<()> {
        let result = self.run_loop();
        let stopped = self.stop();
        result.and(stopped)
    }

    fn run_loop(&mut self) -> Result<()> {
        self.start()?;
        while self.tick()? {}
        Ok(())
    }

    /// Turn off bracketed paste, show the cursor and restore the terminal mode. Later calls
    /// do nothing.
    pub fn stop(&mut self) -> Result<()> {
        if !self.started || self.stopped {
            return Ok(());
        }
        self.stopped = true;
        if self.terminal.is_tty() {
            self.output.push(TerminalCmd::BracketedPasteDisable);
            self.output.push(TerminalCmd::ShowCursor);
        }
        let flushed = self.output.flush(&mut self.terminal);
        let restored = self.terminal.stop();
        debug!("runtime stopped");
        flushed?;
        restored?;
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let columns = self.terminal.columns();
        let rows = self.terminal.rows() as usize;
        if self.last_columns.is_some_and(|last| last != columns) {
            // Reflowed lines no longer match what the diff expects to be on screen.
            debug!(columns, "terminal width changed, redrawing");
            self.output.push(TerminalCmd::ClearScreen);
            self.renderer.reset();
        }
        self.last_columns = Some(columns);

        self.tree.layout(Some(columns as usize), None);
        let lines = compose::render(&self.tree, self.root);
        self.output.extend(self.renderer.render(lines, rows));
        self.output.flush(&mut self.terminal)?;
        Ok(())
    }
}

impl<T: Terminal> Drop for Runtime<T> {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(error = %err, "terminal restore during drop failed");
        }
    }
}

/// Take over the process terminal and run `root` until a controller requests exit.
///
/// Logging is set up from the environment first; a logging failure is not fatal.
pub fn run(root: impl Into<Node>) -> Result<()> {
    let config = EnvConfig::from_env();
    let _ = logging::init(&config);

    let terminal = ProcessTerminal::new();
    let cleanup = Arc::new(CrashCleanup::new(terminal.restore_handle()));
    let signal_cleanup = Arc::clone(&cleanup);
    let _signals = install_signal_handlers(move |_signal| signal_cleanup.run())?;

    let mut runtime = Runtime::with_config(terminal, root, &config);
    let result = runtime.run();
    drop(runtime);
    cleanup.run();
    result
}
