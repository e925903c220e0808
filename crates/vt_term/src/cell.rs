//! A single styled glyph on the grid.

use crate::color::Style;

/// One grid cell. `glyph` holds a single user-perceived character (a
/// grapheme, not necessarily a single `char` — combining marks ride along
/// with their base character), or is empty for the right half of a wide
/// glyph. `width` is 1 or 2; a width-2 glyph occupies this cell and has an
/// empty, width-1 placeholder cell immediately to its right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub glyph: Box<str>,
    pub width: u8,
    pub style: Style,
}

impl Cell {
    pub fn blank(style: Style) -> Self {
        Cell {
            glyph: " ".into(),
            width: 1,
            style,
        }
    }

    pub fn is_blank(&self) -> bool {
        &*self.glyph == " " && self.style == Style::default()
    }

    /// The empty right-half placeholder of a wide glyph.
    pub fn wide_continuation(style: Style) -> Self {
        Cell {
            glyph: "".into(),
            width: 1,
            style,
        }
    }

    pub fn is_wide_continuation(&self) -> bool {
        self.glyph.is_empty()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::blank(Style::default())
    }
}
