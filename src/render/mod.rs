//! Frame composition and the line-diff renderer.

pub mod compose;
pub mod renderer;

pub use compose::render;
pub use renderer::DiffRenderer;
