pub mod renderer;

pub use renderer::{DuelStatus, Glyph, Renderer, board_glyphs};
