pub mod ghost;
pub mod renderer;

pub use ghost::{CursorPosition, GhostPainter, PaintStrategy, visible_ghost};
pub use renderer::TerminalRenderer;

use unicode_width::UnicodeWidthChar;

/// Number of terminal columns `text` occupies.
pub fn display_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}
