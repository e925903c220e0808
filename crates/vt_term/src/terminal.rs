//! The terminal state machine: owns both buffers, mode state, and the
//! device-reply output queue; consumes parser events and mutates the
//! active buffer.

use vt_parser::{CsiSequence, Parser, VtSink};

use crate::buffer::Buffer;
use crate::charset::CharsetId;
use crate::color::Style;
use crate::input::{KeyEvent, Modifiers, MouseAction, MouseButton};

/// Which buffer is currently receiving output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveBuffer {
    Primary,
    Alternate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseMode {
    #[default]
    Off,
    X10,
    Normal,
    ButtonEvent,
    AnyEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseEncoding {
    #[default]
    X10,
    Utf8,
    Sgr,
    Urxvt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeypadMode {
    #[default]
    Normal,
    Application,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorKeysMode {
    #[default]
    Normal,
    Application,
}

/// The public embedder-facing terminal. Implements [`VtSink`] directly so
/// that driving it is just `Parser::new().feed(bytes, &mut terminal)` —
/// the parser never holds a reference back to this type.
pub struct Terminal {
    primary: Buffer,
    alternate: Buffer,
    active: ActiveBuffer,
    parser: Parser,
    pub title: String,
    pub icon_name: String,
    pub mouse_mode: MouseMode,
    pub mouse_encoding: MouseEncoding,
    pub bracketed_paste: bool,
    pub keypad_mode: KeypadMode,
    pub cursor_keys_mode: CursorKeysMode,
    pub cursor_visible: bool,
    pub focus_reporting: bool,
    output: Vec<u8>,
    last_printable: Option<(String, u8)>,
    alt_saved_primary_cursor: Option<(usize, usize)>,
    on_title_changed: Option<Box<dyn FnMut(&str)>>,
    on_bell: Option<Box<dyn FnMut()>>,
    on_resize_requested: Option<Box<dyn FnMut(usize, usize)>>,
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("active", &self.active)
            .field("title", &self.title)
            .field("mouse_mode", &self.mouse_mode)
            .finish_non_exhaustive()
    }
}

/// A read-only view over terminal state, for rendering.
pub struct Snapshot<'a> {
    pub buffer: &'a Buffer,
    pub cursor_row: usize,
    pub cursor_col: usize,
    pub cursor_visible: bool,
    pub title: &'a str,
}

impl Terminal {
    pub fn new(width: usize, height: usize) -> Self {
        Terminal {
            primary: Buffer::new(width, height),
            alternate: Buffer::new(width, height),
            active: ActiveBuffer::Primary,
            parser: Parser::new(),
            title: String::new(),
            icon_name: String::new(),
            mouse_mode: MouseMode::Off,
            mouse_encoding: MouseEncoding::X10,
            bracketed_paste: false,
            keypad_mode: KeypadMode::Normal,
            cursor_keys_mode: CursorKeysMode::Normal,
            cursor_visible: true,
            focus_reporting: false,
            output: Vec::new(),
            last_printable: None,
            alt_saved_primary_cursor: None,
            on_title_changed: None,
            on_bell: None,
            on_resize_requested: None,
        }
    }

    #[cfg(feature = "scrollback")]
    pub fn new_with_scrollback(width: usize, height: usize, lines: usize) -> Self {
        let mut term = Terminal::new(width, height);
        term.primary = Buffer::with_scrollback_cap(width, height, lines);
        term
    }

    pub fn on_title_changed(&mut self, hook: impl FnMut(&str) + 'static) {
        self.on_title_changed = Some(Box::new(hook));
    }

    pub fn on_bell(&mut self, hook: impl FnMut() + 'static) {
        self.on_bell = Some(Box::new(hook));
    }

    pub fn on_resize_requested(&mut self, hook: impl FnMut(usize, usize) + 'static) {
        self.on_resize_requested = Some(Box::new(hook));
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        let mut parser = std::mem::take(&mut self.parser);
        parser.feed(bytes, self);
        self.parser = parser;
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.primary.resize(width, height);
        self.alternate.resize(width, height);
    }

    pub fn input_key(&mut self, event: KeyEvent, modifiers: Modifiers) -> Vec<u8> {
        crate::input::encode_key_with_mods(event, modifiers, self.cursor_keys_mode, self.keypad_mode)
    }

    pub fn input_mouse(&mut self, x: u16, y: u16, button: MouseButton, action: MouseAction, modifiers: Modifiers) -> Vec<u8> {
        if self.mouse_mode == MouseMode::Off {
            return Vec::new();
        }
        if action == MouseAction::Move
            && !matches!(self.mouse_mode, MouseMode::ButtonEvent | MouseMode::AnyEvent)
        {
            return Vec::new();
        }
        if action == MouseAction::Move && self.mouse_mode == MouseMode::ButtonEvent && button == MouseButton::None {
            return Vec::new();
        }
        let buf = self.active_buffer();
        let x = x.clamp(1, buf.width() as u16);
        let y = y.clamp(1, buf.height() as u16);
        crate::input::encode_mouse(x, y, button, action, modifiers, self.mouse_encoding)
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Encode a pasted payload for sending upstream, wrapping it in the
    /// bracketed-paste markers when mode 2004 is active.
    pub fn encode_paste(&self, payload: &[u8]) -> Vec<u8> {
        if !self.bracketed_paste {
            return payload.to_vec();
        }
        let mut out = Vec::with_capacity(payload.len() + 12);
        out.extend_from_slice(b"\x1b[200~");
        out.extend_from_slice(payload);
        out.extend_from_slice(b"\x1b[201~");
        out
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let buffer = self.active_buffer();
        Snapshot {
            buffer,
            cursor_row: buffer.cursor_row,
            cursor_col: buffer.cursor_col,
            cursor_visible: self.cursor_visible,
            title: &self.title,
        }
    }

    #[cfg(feature = "scrollback")]
    pub(crate) fn primary(&self) -> &Buffer {
        &self.primary
    }

    fn active_buffer(&self) -> &Buffer {
        match self.active {
            ActiveBuffer::Primary => &self.primary,
            ActiveBuffer::Alternate => &self.alternate,
        }
    }

    fn active_mut(&mut self) -> &mut Buffer {
        match self.active {
            ActiveBuffer::Primary => &mut self.primary,
            ActiveBuffer::Alternate => &mut self.alternate,
        }
    }

    fn enter_alt_buffer(&mut self, save_cursor_and_clear: bool) {
        if self.active == ActiveBuffer::Alternate {
            return;
        }
        self.alt_saved_primary_cursor = Some((self.primary.cursor_row, self.primary.cursor_col));
        self.active = ActiveBuffer::Alternate;
        if save_cursor_and_clear {
            self.alternate.clear_all();
            self.alternate.cursor_move_abs(0, 0);
        }
    }

    fn leave_alt_buffer(&mut self) {
        if self.active == ActiveBuffer::Primary {
            return;
        }
        self.active = ActiveBuffer::Primary;
        if let Some((row, col)) = self.alt_saved_primary_cursor.take() {
            self.primary.cursor_move_abs(row, col);
        }
    }

    pub fn soft_reset(&mut self) {
        let buf = self.active_mut();
        buf.origin_mode = false;
        buf.auto_wrap = true;
        let height = buf.height();
        buf.set_scroll_region(0, height - 1);
        buf.current_style = Style::default();
        self.cursor_keys_mode = CursorKeysMode::Normal;
        self.keypad_mode = KeypadMode::Normal;
    }

    pub fn full_reset(&mut self) {
        self.primary.reset();
        self.alternate.reset();
        self.active = ActiveBuffer::Primary;
        self.mouse_mode = MouseMode::Off;
        self.mouse_encoding = MouseEncoding::X10;
        self.bracketed_paste = false;
        self.keypad_mode = KeypadMode::Normal;
        self.cursor_keys_mode = CursorKeysMode::Normal;
        self.cursor_visible = true;
        self.focus_reporting = false;
        self.last_printable = None;
        self.alt_saved_primary_cursor = None;
    }

    fn reply(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }

    fn translate_print(&self, ch: char) -> char {
        let buf = self.active_buffer();
        let set = buf.charsets[buf.active_charset_gl];
        set.translate(ch)
    }

    fn set_private_mode(&mut self, code: u16, enabled: bool) {
        match code {
            1 => {
                self.cursor_keys_mode = if enabled { CursorKeysMode::Application } else { CursorKeysMode::Normal };
            }
            3 => {
                // 132-column mode: stubbed, accepted and ignored.
            }
            6 => self.active_mut().origin_mode = enabled,
            7 => self.active_mut().auto_wrap = enabled,
            12 => {
                // cursor blink, cosmetic only
            }
            25 => self.cursor_visible = enabled,
            47 => {
                if enabled {
                    self.enter_alt_buffer(false);
                } else {
                    self.leave_alt_buffer();
                }
            }
            1047 => {
                if enabled {
                    self.enter_alt_buffer(true);
                } else {
                    self.active_mut().clear_all();
                    self.leave_alt_buffer();
                }
            }
            1048 => {
                if enabled {
                    self.active_mut().save_cursor();
                } else {
                    self.active_mut().restore_cursor();
                }
            }
            1049 => {
                if enabled {
                    self.primary.save_cursor();
                    self.enter_alt_buffer(true);
                } else {
                    self.leave_alt_buffer();
                    self.primary.restore_cursor();
                }
            }
            1000 => self.mouse_mode = if enabled { MouseMode::X10 } else { MouseMode::Off },
            1002 => self.mouse_mode = if enabled { MouseMode::ButtonEvent } else { MouseMode::Off },
            1003 => self.mouse_mode = if enabled { MouseMode::AnyEvent } else { MouseMode::Off },
            1005 => self.mouse_encoding = if enabled { MouseEncoding::Utf8 } else { MouseEncoding::X10 },
            1006 => self.mouse_encoding = if enabled { MouseEncoding::Sgr } else { MouseEncoding::X10 },
            1015 => self.mouse_encoding = if enabled { MouseEncoding::Urxvt } else { MouseEncoding::X10 },
            2004 => self.bracketed_paste = enabled,
            1004 => self.focus_reporting = enabled,
            _ => log::debug!("unhandled DEC private mode {code}"),
        }
    }

    fn set_ansi_mode(&mut self, code: u16, enabled: bool) {
        match code {
            4 => self.active_mut().insert_mode = enabled,
            _ => log::debug!("unhandled ANSI mode {code}"),
        }
    }

    fn dispatch_window_op(&mut self, csi: &CsiSequence) {
        match csi.param(0, 0) {
            8 => {
                if let Some((rows, cols)) = csi.raw_param(1).zip(csi.raw_param(2)) {
                    if let Some(hook) = &mut self.on_resize_requested {
                        hook(cols as usize, rows as usize);
                    }
                }
            }
            18 => {
                let buf = self.active_buffer();
                self.reply_csi_t(buf.height(), buf.width());
            }
            _ => {}
        }
    }

    fn reply_csi_t(&mut self, rows: usize, cols: usize) {
        self.reply(format!("\x1b[8;{rows};{cols}t").as_bytes());
    }

    fn dispatch_osc(&mut self, payload: &[u8]) {
        let text = String::from_utf8_lossy(payload);
        let mut parts = text.splitn(2, ';');
        let Some(code) = parts.next() else { return };
        let rest = parts.next().unwrap_or("");
        match code {
            "0" => {
                self.set_title(rest);
                self.icon_name = rest.to_string();
            }
            "1" => self.icon_name = rest.to_string(),
            "2" => self.set_title(rest),
            "4" => {
                // palette set: "n;rgb:RR/GG/BB" — accepted, not stored (no
                // indexed-palette table is part of this crate's model).
            }
            "10" | "11" | "12" => {
                // default fg/bg/cursor color set: accepted, no-op.
            }
            "52" => {
                // clipboard: accepted, no-op.
            }
            "104" => {
                // reset palette: no-op, nothing was stored.
            }
            _ => log::debug!("unhandled OSC code {code}"),
        }
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        if let Some(hook) = &mut self.on_title_changed {
            hook(title);
        }
    }
}

impl VtSink for Terminal {
    fn print(&mut self, ch: char) {
        let ch = self.translate_print(ch);
        let mut buf = [0u8; 4];
        let s = ch.encode_utf8(&mut buf);
        let width = crate::line::glyph_width(s);
        self.last_printable = Some((s.to_string(), width));
        self.active_mut().write_char(s);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            0x07 => {
                if let Some(hook) = &mut self.on_bell {
                    hook();
                }
            }
            0x08 => self.active_mut().backspace(),
            0x09 => self.active_mut().tab_forward(1),
            0x0A | 0x0B | 0x0C => self.active_mut().line_feed(),
            0x0D => self.active_mut().carriage_return(),
            0x0E => self.active_mut().active_charset_gl = 1,
            0x0F => self.active_mut().active_charset_gl = 0,
            _ => {}
        }
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], finalizer: u8) {
        match intermediates {
            [] => match finalizer {
                b'c' => self.full_reset(),
                b'7' => self.active_mut().save_cursor(),
                b'8' => self.active_mut().restore_cursor(),
                b'D' => self.active_mut().line_feed(),
                b'M' => self.active_mut().reverse_line_feed(),
                b'E' => {
                    self.active_mut().carriage_return();
                    self.active_mut().line_feed();
                }
                _ => log::debug!("unhandled ESC final {finalizer:#x}"),
            },
            [b'('] => {
                if let Some(set) = CharsetId::from_final(finalizer) {
                    self.active_mut().charsets[0] = set;
                }
            }
            [b')'] => {
                if let Some(set) = CharsetId::from_final(finalizer) {
                    self.active_mut().charsets[1] = set;
                }
            }
            _ => log::debug!("unhandled ESC intermediates {intermediates:?} final {finalizer:#x}"),
        }
    }

    fn csi_dispatch(&mut self, csi: CsiSequence) {
        if !csi.intermediates.is_empty() && csi.intermediates != [b'!'] {
            log::debug!("unhandled CSI intermediates {:?}", csi.intermediates);
            return;
        }
        let private = csi.private_marker;
        match (private, csi.finalizer) {
            (None, b'@') => self.active_mut().insert_chars(csi.param(0, 1) as usize),
            (None, b'A') => self.active_mut().cursor_move_clamped_to_buffer(-(csi.param(0, 1) as i32), 0),
            (None, b'B') => self.active_mut().cursor_move_clamped_to_buffer(csi.param(0, 1) as i32, 0),
            (None, b'C') => self.active_mut().cursor_move_clamped_to_buffer(0, csi.param(0, 1) as i32),
            (None, b'D') => self.active_mut().cursor_move_clamped_to_buffer(0, -(csi.param(0, 1) as i32)),
            (None, b'E') => {
                let n = csi.param(0, 1) as i32;
                self.active_mut().cursor_move_clamped_to_buffer(n, 0);
                self.active_mut().carriage_return();
            }
            (None, b'F') => {
                let n = csi.param(0, 1) as i32;
                self.active_mut().cursor_move_clamped_to_buffer(-n, 0);
                self.active_mut().carriage_return();
            }
            (None, b'G') | (None, b'`') => {
                let col = csi.param(0, 1).saturating_sub(1) as usize;
                let row = self.active_buffer().cursor_row;
                self.active_mut().cursor_move_abs(row, col);
            }
            (None, b'H') | (None, b'f') => {
                let row = csi.param(0, 1).saturating_sub(1) as usize;
                let col = csi.param(1, 1).saturating_sub(1) as usize;
                self.active_mut().cursor_move_abs(row, col);
            }
            (None, b'I') => self.active_mut().tab_forward(csi.param(0, 1) as usize),
            (None, b'Z') => self.active_mut().tab_back(csi.param(0, 1) as usize),
            (None, b'J') => self.active_mut().erase_in_display(csi.param(0, 0)),
            (None, b'K') => self.active_mut().erase_in_line(csi.param(0, 0)),
            (None, b'L') => self.active_mut().insert_lines(csi.param(0, 1) as usize),
            (None, b'M') => self.active_mut().delete_lines(csi.param(0, 1) as usize),
            (None, b'P') => self.active_mut().delete_chars(csi.param(0, 1) as usize),
            (None, b'S') => self.active_mut().scroll_up(csi.param(0, 1) as usize),
            (None, b'T') => self.active_mut().scroll_down(csi.param(0, 1) as usize),
            (None, b'X') => self.active_mut().erase_chars(csi.param(0, 1) as usize),
            (None, b'b') => {
                if let Some((glyph, _)) = self.last_printable.clone() {
                    for _ in 0..csi.param(0, 1) {
                        self.active_mut().write_char(&glyph);
                    }
                }
            }
            (None, b'd') => {
                let row = csi.param(0, 1).saturating_sub(1) as usize;
                let col = self.active_buffer().cursor_col;
                self.active_mut().cursor_move_abs(row, col);
            }
            (None, b'g') => match csi.param(0, 0) {
                0 => self.active_mut().clear_tab_stop(),
                3 => self.active_mut().clear_all_tab_stops(),
                _ => {}
            },
            (None, b'h') => {
                for p in &csi.params {
                    self.set_ansi_mode(p.value, true);
                }
            }
            (None, b'l') => {
                for p in &csi.params {
                    self.set_ansi_mode(p.value, false);
                }
            }
            (Some(b'?'), b'h') => {
                for p in &csi.params {
                    self.set_private_mode(p.value, true);
                }
            }
            (Some(b'?'), b'l') => {
                for p in &csi.params {
                    self.set_private_mode(p.value, false);
                }
            }
            (None, b'm') => self.active_mut().current_style.apply_sgr(&csi.params),
            (None, b'n') => match csi.param(0, 0) {
                5 => self.reply(b"\x1b[0n"),
                6 => {
                    let buf = self.active_buffer();
                    let (row, col) = (buf.cursor_row + 1, buf.cursor_col + 1);
                    self.reply(format!("\x1b[{row};{col}R").as_bytes());
                }
                _ => {}
            },
            (None, b'c') => self.reply(b"\x1b[?62;c"),
            (Some(b'>'), b'c') => self.reply(b"\x1b[>0;0;0c"),
            (None, b'r') => {
                let top = csi.param(0, 1).saturating_sub(1) as usize;
                let bottom = csi.raw_param(1).map(|v| v.saturating_sub(1) as usize);
                let height = self.active_buffer().height();
                self.active_mut().set_scroll_region(top, bottom.unwrap_or(height - 1));
            }
            (None, b's') => self.active_mut().save_cursor(),
            (None, b'u') => self.active_mut().restore_cursor(),
            (None, b't') => self.dispatch_window_op(&csi),
            (None, b'p') if csi.intermediates == [b'!'] => self.soft_reset(),
            _ => log::debug!("unhandled CSI {:?} final {:#x}", csi.params, csi.finalizer),
        }
    }

    fn osc_dispatch(&mut self, payload: &[u8]) {
        self.dispatch_osc(payload);
    }
}
