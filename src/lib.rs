//! Inline terminal UI runtime for chat-style CLIs.
//!
//! Invariant: single output gate. Only `core::output::OutputGate::flush(..)` writes to the
//! terminal.
//!
//! # Public API Overview
//! - Describe UI as [`Text`] and [`Flex`] elements plus [`Widget`]s whose long-lived
//!   [`Controller`] owns state across renders.
//! - Mount a root with [`run`] (process terminal) or drive a [`Runtime`] over any
//!   [`Terminal`] implementation.
//! - Reach controllers from other threads through [`Handle`] and [`Updater`].
//! - Use the ANSI-aware text helpers ([`visible_width`], [`wrap_lines`], [`slice_styled`])
//!   when formatting content.

#![allow(
    clippy::derivable_impls,
    clippy::needless_range_loop,
    clippy::question_mark,
    clippy::too_many_arguments,
    clippy::type_complexity,
    clippy::unnecessary_map_or
)]

pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod widgets;

/// Component model: elements, widgets and sizing props.
pub use crate::core::component::{
    Axis, Border, Controller, Flex, Length, Node, Props, Sides, Spacing, Styled, Text, Widget,
    WidgetNode,
};

/// Colors, text styles and border glyphs.
pub use crate::core::style::{BorderStyle, Color, Style, Theme};

/// Terminal seam and the process-backed implementation.
pub use crate::core::terminal::Terminal;
pub use crate::platform::{InputFramer, ProcessTerminal};

/// Runtime entry points and cross-thread access to controllers.
pub use crate::runtime::{run, Context, ElementTree, Handle, NodeId, Runtime, Updater};

/// Built-in widgets.
pub use crate::widgets::{
    diff_view, highlight_code, markdown_text, render_markdown, spinner_line, OptionItem,
    OptionList, OptionListController, Spinner, SpinnerController, TextBox, TextBoxController,
};

pub use crate::config::{ColorDepth, EnvConfig};
pub use crate::error::{Error, Result};

/// Escape stripping for measuring and testing styled text.
pub use crate::core::text::ansi::strip_styles;
/// Column slicing and padding that keep styles intact.
pub use crate::core::text::slice::{fit_to_width, slice_styled};
/// Visible width helper that ignores ANSI control sequences.
pub use crate::core::text::width::visible_width;
/// Wrapping with the three wrap modes.
pub use crate::core::text::wrap::{wrap_lines, Wrap};
