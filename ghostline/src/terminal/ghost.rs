//! Painting ghost text after the cursor without moving it.

use crossterm::cursor::{MoveTo, RestorePosition, SavePosition};
use crossterm::queue;
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{Clear, ClearType};
use serde::Deserialize;
use std::io::{self, Write};
use unicode_width::UnicodeWidthChar;

use super::display_width;

/// How ghost text is drawn and erased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintStrategy {
    /// Save the cursor, draw, restore. Erase clears to end of line.
    #[default]
    SaveRestore,
    /// Remember where and how much was drawn; erase overwrites it with
    /// spaces and seeks back.
    Overwrite,
}

impl std::str::FromStr for PaintStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "save_restore" | "save-restore" => Ok(PaintStrategy::SaveRestore),
            "overwrite" => Ok(PaintStrategy::Overwrite),
            _ => Err(format!(
                "Invalid paint strategy: {s}. Valid strategies are: save_restore, overwrite"
            )),
        }
    }
}

/// Zero-based cell of the terminal cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    pub column: u16,
    pub row: u16,
}

impl CursorPosition {
    pub fn new(column: u16, row: u16) -> Self {
        Self { column, row }
    }
}

#[derive(Debug, Clone, Copy)]
struct Painted {
    at: CursorPosition,
    columns: usize,
}

/// Part of `suffix` that fits between the cursor and the right edge.
///
/// Ghost text never wraps: it is cut at the last column and nothing is shown
/// when the cursor already sits at or past the edge.
pub fn visible_ghost(suffix: &str, cursor_column: u16, width: u16) -> &str {
    let remaining = usize::from(width).saturating_sub(usize::from(cursor_column));
    if remaining == 0 {
        return "";
    }
    let mut used = 0;
    for (idx, ch) in suffix.char_indices() {
        used += UnicodeWidthChar::width(ch).unwrap_or(0);
        if used > remaining {
            return &suffix[..idx];
        }
    }
    suffix
}

#[derive(Debug, Default)]
pub struct GhostPainter {
    strategy: PaintStrategy,
    painted: Option<Painted>,
}

impl GhostPainter {
    pub fn new(strategy: PaintStrategy) -> Self {
        Self {
            strategy,
            painted: None,
        }
    }

    pub fn is_painted(&self) -> bool {
        self.painted.is_some()
    }

    /// Replace whatever ghost text is on screen with `suffix`, drawn dim at
    /// `at`. The cursor ends where it started.
    pub fn paint<W: Write>(
        &mut self,
        out: &mut W,
        suffix: &str,
        at: CursorPosition,
        width: u16,
    ) -> io::Result<()> {
        self.erase(out)?;
        let visible = visible_ghost(suffix, at.column, width);
        if visible.is_empty() {
            return Ok(());
        }

        match self.strategy {
            PaintStrategy::SaveRestore => queue!(
                out,
                SavePosition,
                SetAttribute(Attribute::Dim),
                Print(visible),
                SetAttribute(Attribute::Reset),
                RestorePosition
            )?,
            PaintStrategy::Overwrite => queue!(
                out,
                SetAttribute(Attribute::Dim),
                Print(visible),
                SetAttribute(Attribute::Reset),
                MoveTo(at.column, at.row)
            )?,
        }
        self.painted = Some(Painted {
            at,
            columns: display_width(visible),
        });
        Ok(())
    }

    /// Remove painted ghost text, leaving the cursor in place.
    pub fn erase<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let Some(painted) = self.painted.take() else {
            return Ok(());
        };
        match self.strategy {
            PaintStrategy::SaveRestore => queue!(
                out,
                SavePosition,
                Clear(ClearType::UntilNewLine),
                RestorePosition
            ),
            PaintStrategy::Overwrite => queue!(
                out,
                MoveTo(painted.at.column, painted.at.row),
                Print(" ".repeat(painted.columns)),
                MoveTo(painted.at.column, painted.at.row)
            ),
        }
    }

    /// Drop bookkeeping for text that is already gone, e.g. after the line
    /// was submitted and the screen moved on.
    pub fn forget(&mut self) {
        self.painted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIM: &str = "\x1b[2m";
    const RESET: &str = "\x1b[0m";

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn truncates_to_remaining_columns() {
        assert_eq!(visible_ghost("longsuffix", 8, 10), "lo");
        assert_eq!(visible_ghost("longsuffix", 0, 80), "longsuffix");
        assert_eq!(visible_ghost("longsuffix", 10, 10), "");
        assert_eq!(visible_ghost("longsuffix", 12, 10), "");
    }

    #[test]
    fn wide_character_is_not_split() {
        assert_eq!(visible_ghost("aあ", 7, 10), "aあ");
        assert_eq!(visible_ghost("aあ", 8, 10), "a");
    }

    #[test]
    fn save_restore_paints_dim_text() {
        let mut painter = GhostPainter::new(PaintStrategy::SaveRestore);
        let out = render(|out| painter.paint(out, "longsuffix", CursorPosition::new(8, 0), 10));
        assert_eq!(out, format!("\x1b7{DIM}lo{RESET}\x1b8"));
        assert!(painter.is_painted());
    }

    #[test]
    fn save_restore_erase_clears_to_end_of_line() {
        let mut painter = GhostPainter::new(PaintStrategy::SaveRestore);
        render(|out| painter.paint(out, "tus", CursorPosition::new(4, 2), 80));
        let out = render(|out| painter.erase(out));
        assert_eq!(out, "\x1b7\x1b[K\x1b8");
        assert!(!painter.is_painted());
    }

    #[test]
    fn overwrite_erase_blanks_exact_cells() {
        let mut painter = GhostPainter::new(PaintStrategy::Overwrite);
        let painted = render(|out| painter.paint(out, "tus", CursorPosition::new(4, 2), 80));
        assert_eq!(painted, format!("{DIM}tus{RESET}\x1b[3;5H"));

        let erased = render(|out| painter.erase(out));
        assert_eq!(erased, "\x1b[3;5H   \x1b[3;5H");
    }

    #[test]
    fn nothing_painted_when_no_room() {
        let mut painter = GhostPainter::new(PaintStrategy::Overwrite);
        let out = render(|out| painter.paint(out, "tus", CursorPosition::new(80, 0), 80));
        assert!(out.is_empty());
        assert!(!painter.is_painted());
        assert!(render(|out| painter.erase(out)).is_empty());
    }

    #[test]
    fn repaint_erases_previous_ghost_first() {
        let mut painter = GhostPainter::new(PaintStrategy::Overwrite);
        render(|out| painter.paint(out, "tus", CursorPosition::new(4, 0), 80));
        let out = render(|out| painter.paint(out, "x", CursorPosition::new(5, 0), 80));
        assert!(out.starts_with("\x1b[1;5H   \x1b[1;5H"));
        assert!(out.ends_with(&format!("{DIM}x{RESET}\x1b[1;6H")));
    }

    #[test]
    fn strategy_parses_from_config_strings() {
        assert_eq!("overwrite".parse::<PaintStrategy>(), Ok(PaintStrategy::Overwrite));
        assert_eq!("save-restore".parse::<PaintStrategy>(), Ok(PaintStrategy::SaveRestore));
        assert!("blink".parse::<PaintStrategy>().is_err());
    }
}
