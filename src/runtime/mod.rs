//! Element tree, reconciliation, layout and the main loop.

pub mod context;
pub mod layout;
pub mod reconcile;
pub mod tree;
pub mod tui;

pub use context::{Context, Handle, Updater};
pub use tree::{ElementTree, NodeId};
pub use tui::{run, Runtime};
