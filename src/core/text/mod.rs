//! ANSI-aware text primitives: escape scanning, width measurement, slicing and wrapping.
//!
//! Everything here is pure (string in, string out) so components can use it without touching
//! the render layer.

pub mod ansi;
pub mod slice;
pub mod width;
pub mod wrap;
