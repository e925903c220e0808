//! Read-only view over scrolled-off primary-buffer lines.
//!
//! Only compiled with the `scrollback` feature; the default build
//! discards scrolled-off lines exactly as `erase_in_display(2)` does, per
//! the non-goal that scrollback beyond the visible window is an optional
//! extension, not part of the core.

use crate::line::Line;
use crate::terminal::Terminal;

impl Terminal {
    /// Scrolled-off lines from the primary buffer, oldest first. Empty
    /// unless the terminal was constructed with
    /// [`Terminal::new_with_scrollback`] and scrolling has occurred.
    pub fn scrollback(&self) -> impl Iterator<Item = &Line> {
        self.primary().scrollback()
    }
}
