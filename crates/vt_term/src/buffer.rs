//! Fixed-size grid of lines, cursor, margins, tab stops, and saved state.

use crate::cell::Cell;
use crate::charset::CharsetId;
use crate::color::Style;
use crate::line::{glyph_width, Line};

/// A saved cursor, as written by DECSC (`ESC 7`) / SCOSC (`CSI s`) and read
/// back by DECRC (`ESC 8`) / SCORC (`CSI u`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedCursor {
    pub row: usize,
    pub col: usize,
    pub style: Style,
    pub pending_wrap: bool,
    pub origin_mode: bool,
    pub charsets: [CharsetId; 4],
    pub active_charset_gl: usize,
}

/// One screen of cells plus everything needed to address and mutate it.
/// `Terminal` owns two of these (primary and alternate) and a reference to
/// whichever is active.
#[derive(Debug, Clone)]
pub struct Buffer {
    width: usize,
    height: usize,
    lines: Vec<Line>,
    pub cursor_row: usize,
    pub cursor_col: usize,
    saved_cursor: Option<SavedCursor>,
    pub scroll_top: usize,
    pub scroll_bottom: usize,
    tab_stops: Vec<bool>,
    pub current_style: Style,
    pub pending_wrap: bool,
    pub origin_mode: bool,
    pub auto_wrap: bool,
    pub insert_mode: bool,
    pub charsets: [CharsetId; 4],
    pub active_charset_gl: usize,
    pub active_charset_gr: usize,
    #[cfg(feature = "scrollback")]
    scrollback: std::collections::VecDeque<Line>,
    #[cfg(feature = "scrollback")]
    scrollback_cap: usize,
}

const DEFAULT_TAB_WIDTH: usize = 8;

impl Buffer {
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Buffer {
            width,
            height,
            lines: (0..height).map(|_| Line::new(width, Style::default())).collect(),
            cursor_row: 0,
            cursor_col: 0,
            saved_cursor: None,
            scroll_top: 0,
            scroll_bottom: height - 1,
            tab_stops: default_tab_stops(width),
            current_style: Style::default(),
            pending_wrap: false,
            origin_mode: false,
            auto_wrap: true,
            insert_mode: false,
            charsets: [CharsetId::Ascii; 4],
            active_charset_gl: 0,
            active_charset_gr: 1,
            #[cfg(feature = "scrollback")]
            scrollback: std::collections::VecDeque::new(),
            #[cfg(feature = "scrollback")]
            scrollback_cap: 0,
        }
    }

    #[cfg(feature = "scrollback")]
    pub fn with_scrollback_cap(width: usize, height: usize, cap: usize) -> Self {
        let mut buf = Buffer::new(width, height);
        buf.scrollback_cap = cap;
        buf
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn line(&self, row: usize) -> Option<&Line> {
        self.lines.get(row)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    #[cfg(feature = "scrollback")]
    pub fn scrollback(&self) -> impl Iterator<Item = &Line> {
        self.scrollback.iter()
    }

    /// Row/col clamped and adjusted for origin mode: rows are relative to
    /// `scroll_top` and clamped to the scroll region.
    fn resolve_abs(&self, row: usize, col: usize) -> (usize, usize) {
        let row = if self.origin_mode {
            (self.scroll_top + row).min(self.scroll_bottom)
        } else {
            row.min(self.height - 1)
        };
        (row, col.min(self.width.saturating_sub(1)))
    }

    pub fn cursor_move_abs(&mut self, row: usize, col: usize) {
        let (row, col) = self.resolve_abs(row, col);
        self.cursor_row = row;
        self.cursor_col = col;
        self.pending_wrap = false;
    }

    pub fn cursor_move_rel(&mut self, drow: i32, dcol: i32) {
        let (lo, hi) = (self.scroll_top, self.scroll_bottom);
        let row = (self.cursor_row as i32 + drow).clamp(lo as i32, hi as i32) as usize;
        let col = (self.cursor_col as i32 + dcol).clamp(0, self.width as i32 - 1) as usize;
        self.cursor_row = row;
        self.cursor_col = col;
        self.pending_wrap = false;
    }

    /// Unclamped-to-scroll-region relative motion (CUU/CUD/CUF/CUB are
    /// clamped to the whole buffer, not the scroll region, unlike
    /// `cursor_move_rel`'s default which is used by line-feed style moves).
    pub fn cursor_move_clamped_to_buffer(&mut self, drow: i32, dcol: i32) {
        let row = (self.cursor_row as i32 + drow).clamp(0, self.height as i32 - 1) as usize;
        let col = (self.cursor_col as i32 + dcol).clamp(0, self.width as i32 - 1) as usize;
        self.cursor_row = row;
        self.cursor_col = col;
        self.pending_wrap = false;
    }

    pub fn carriage_return(&mut self) {
        self.cursor_col = 0;
        self.pending_wrap = false;
    }

    pub fn backspace(&mut self) {
        self.cursor_col = self.cursor_col.saturating_sub(1);
        self.pending_wrap = false;
    }

    pub fn line_feed(&mut self) {
        if self.cursor_row == self.scroll_bottom {
            self.scroll_up(1);
        } else if self.cursor_row + 1 < self.height {
            self.cursor_row += 1;
        }
    }

    pub fn reverse_line_feed(&mut self) {
        if self.cursor_row == self.scroll_top {
            self.scroll_down(1);
        } else if self.cursor_row > 0 {
            self.cursor_row -= 1;
        }
    }

    pub fn write_char(&mut self, grapheme: &str) {
        let width = glyph_width(grapheme);
        if self.pending_wrap && self.auto_wrap {
            self.lines[self.cursor_row].wrapped = true;
            self.line_feed();
            self.cursor_col = 0;
            self.pending_wrap = false;
        }
        let col = self.cursor_col.min(self.width - 1);
        if self.insert_mode {
            let fill = Cell::blank(self.current_style);
            self.lines[self.cursor_row].insert_cells(col, width as usize, fill);
        }
        self.lines[self.cursor_row].set(col, grapheme, self.current_style);
        let next_col = col + width as usize;
        if next_col >= self.width {
            self.cursor_col = self.width;
            self.pending_wrap = true;
        } else {
            self.cursor_col = next_col;
        }
    }

    pub fn tab_forward(&mut self, n: usize) {
        for _ in 0..n {
            let start = self.cursor_col.min(self.tab_stops.len().saturating_sub(1)) + 1;
            match self.tab_stops[start..].iter().position(|&s| s) {
                Some(offset) => self.cursor_col = start + offset,
                None => {
                    self.cursor_col = self.width - 1;
                    break;
                }
            }
        }
        self.pending_wrap = false;
    }

    pub fn tab_back(&mut self, n: usize) {
        for _ in 0..n {
            match self.tab_stops[..self.cursor_col].iter().rposition(|&s| s) {
                Some(pos) => self.cursor_col = pos,
                None => {
                    self.cursor_col = 0;
                    break;
                }
            }
        }
        self.pending_wrap = false;
    }

    pub fn set_tab_stop(&mut self) {
        if self.cursor_col < self.tab_stops.len() {
            self.tab_stops[self.cursor_col] = true;
        }
    }

    pub fn clear_tab_stop(&mut self) {
        if self.cursor_col < self.tab_stops.len() {
            self.tab_stops[self.cursor_col] = false;
        }
    }

    pub fn clear_all_tab_stops(&mut self) {
        self.tab_stops.fill(false);
    }

    pub fn reset_tab_stops(&mut self) {
        self.tab_stops = default_tab_stops(self.width);
    }

    pub fn scroll_up(&mut self, n: usize) {
        let (top, bottom) = (self.scroll_top, self.scroll_bottom);
        let n = n.min(bottom - top + 1);
        for _ in 0..n {
            #[cfg(feature = "scrollback")]
            {
                if top == 0 && self.scrollback_cap > 0 {
                    self.push_scrollback(self.lines[top].clone());
                }
            }
            let removed = self.lines.remove(top);
            let _ = removed;
            self.lines.insert(bottom, Line::new(self.width, self.blank_style()));
        }
    }

    pub fn scroll_down(&mut self, n: usize) {
        let (top, bottom) = (self.scroll_top, self.scroll_bottom);
        let n = n.min(bottom - top + 1);
        for _ in 0..n {
            self.lines.remove(bottom);
            self.lines.insert(top, Line::new(self.width, self.blank_style()));
        }
    }

    #[cfg(feature = "scrollback")]
    fn push_scrollback(&mut self, line: Line) {
        self.scrollback.push_back(line);
        while self.scrollback.len() > self.scrollback_cap {
            self.scrollback.pop_front();
        }
    }

    /// Background-only style used to fill vacated lines, per spec ("filling
    /// vacated lines with blanks styled using current_style's background").
    fn blank_style(&self) -> Style {
        Style {
            bg: self.current_style.bg,
            ..Style::default()
        }
    }

    pub fn insert_lines(&mut self, n: usize) {
        if self.cursor_row < self.scroll_top || self.cursor_row > self.scroll_bottom {
            return;
        }
        let saved_top = self.scroll_top;
        self.scroll_top = self.cursor_row;
        self.scroll_down(n);
        self.scroll_top = saved_top;
    }

    pub fn delete_lines(&mut self, n: usize) {
        if self.cursor_row < self.scroll_top || self.cursor_row > self.scroll_bottom {
            return;
        }
        let saved_top = self.scroll_top;
        self.scroll_top = self.cursor_row;
        self.scroll_up(n);
        self.scroll_top = saved_top;
    }

    pub fn insert_chars(&mut self, n: usize) {
        let fill = Cell::blank(self.current_style);
        self.lines[self.cursor_row].insert_cells(self.cursor_col, n, fill);
    }

    pub fn delete_chars(&mut self, n: usize) {
        let fill = Cell::blank(self.blank_style());
        self.lines[self.cursor_row].delete_cells(self.cursor_col, n, fill);
    }

    pub fn erase_chars(&mut self, n: usize) {
        let style = self.blank_style();
        let to = self.cursor_col + n;
        self.lines[self.cursor_row].clear_range(self.cursor_col, to, style);
    }

    pub fn clear_rect(&mut self, top: usize, left: usize, bottom: usize, right: usize, style: Style) {
        for row in top..=bottom.min(self.height - 1) {
            self.lines[row].clear_range(left, right + 1, style);
        }
    }

    pub fn erase_in_display(&mut self, mode: u16) {
        let style = self.blank_style();
        match mode {
            0 => {
                self.lines[self.cursor_row].clear_range(self.cursor_col, self.width, style);
                for row in self.cursor_row + 1..self.height {
                    self.lines[row].clear(style);
                }
            }
            1 => {
                for row in 0..self.cursor_row {
                    self.lines[row].clear(style);
                }
                self.lines[self.cursor_row].clear_range(0, self.cursor_col + 1, style);
            }
            2 | 3 => {
                #[cfg(feature = "scrollback")]
                if mode == 3 && self.scrollback_cap > 0 {
                    for row in 0..self.height {
                        self.push_scrollback(self.lines[row].clone());
                    }
                }
                for row in 0..self.height {
                    self.lines[row].clear(style);
                }
            }
            _ => {}
        }
    }

    pub fn erase_in_line(&mut self, mode: u16) {
        let style = self.blank_style();
        let row = self.cursor_row;
        match mode {
            0 => self.lines[row].clear_range(self.cursor_col, self.width, style),
            1 => self.lines[row].clear_range(0, self.cursor_col + 1, style),
            2 => self.lines[row].clear(style),
            _ => {}
        }
    }

    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some(SavedCursor {
            row: self.cursor_row,
            col: self.cursor_col,
            style: self.current_style,
            pending_wrap: self.pending_wrap,
            origin_mode: self.origin_mode,
            charsets: self.charsets,
            active_charset_gl: self.active_charset_gl,
        });
    }

    pub fn restore_cursor(&mut self) {
        let Some(saved) = self.saved_cursor else {
            self.cursor_row = 0;
            self.cursor_col = 0;
            self.pending_wrap = false;
            return;
        };
        self.cursor_row = saved.row.min(self.height - 1);
        self.cursor_col = saved.col.min(self.width - 1);
        self.current_style = saved.style;
        self.pending_wrap = saved.pending_wrap;
        self.origin_mode = saved.origin_mode;
        self.charsets = saved.charsets;
        self.active_charset_gl = saved.active_charset_gl;
    }

    pub fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        let top = top.min(self.height - 1);
        let bottom = bottom.min(self.height - 1);
        if top < bottom {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        } else {
            self.scroll_top = 0;
            self.scroll_bottom = self.height - 1;
        }
        self.cursor_move_abs(0, 0);
    }

    pub fn resize(&mut self, new_width: usize, new_height: usize) {
        let new_width = new_width.max(1);
        let new_height = new_height.max(1);
        let fill = Cell::blank(Style::default());
        for line in &mut self.lines {
            line.resize(new_width, fill.clone());
        }
        if new_height > self.lines.len() {
            self.lines.resize_with(new_height, || Line::new(new_width, Style::default()));
        } else {
            self.lines.truncate(new_height);
        }
        self.tab_stops = default_tab_stops(new_width);
        self.width = new_width;
        self.height = new_height;
        self.scroll_top = 0;
        self.scroll_bottom = new_height - 1;
        self.cursor_row = self.cursor_row.min(new_height - 1);
        self.cursor_col = self.cursor_col.min(new_width - 1);
        self.pending_wrap = false;
    }

    /// Clear to blanks without touching cursor or mode state — used when
    /// switching into the alternate buffer per mode 1049/47.
    pub fn clear_all(&mut self) {
        let style = Style::default();
        for line in &mut self.lines {
            line.clear(style);
        }
    }

    pub fn reset(&mut self) {
        let width = self.width;
        let height = self.height;
        *self = Buffer::new(width, height);
        #[cfg(feature = "scrollback")]
        {
            self.scrollback_cap = 0;
        }
    }
}

fn default_tab_stops(width: usize) -> Vec<bool> {
    (0..width).map(|c| c > 0 && c % DEFAULT_TAB_WIDTH == 0).collect()
}
