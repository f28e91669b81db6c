//! Core types: the component model, styles, text primitives and the terminal seam.

pub mod component;
pub mod output;
pub mod style;
pub mod terminal;
pub mod text;
