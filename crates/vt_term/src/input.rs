//! Reverse-direction encoding: abstract key/mouse events to the byte
//! sequences sent upstream to the child process.

use crate::terminal::{CursorKeysMode, KeypadMode, MouseEncoding};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const META  = 0b1000;
    }
}

impl Modifiers {
    /// The xterm modifier parameter: `1 + flags`, or `None` if no modifier
    /// is held (xterm omits the parameter entirely in that case).
    fn xterm_param(self) -> Option<u16> {
        if self.is_empty() {
            None
        } else {
            Some(1 + self.bits() as u16)
        }
    }
}

/// A named, non-printable key. Printable keys are represented directly as
/// [`KeyEvent::Char`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyName {
    Up,
    Down,
    Right,
    Left,
    Home,
    End,
    Insert,
    Delete,
    PageUp,
    PageDown,
    F(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Char(char),
    Named(KeyName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MouseButton {
    None,
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Press,
    Release,
    Move,
}

pub fn encode_key(event: KeyEvent, cursor_keys: CursorKeysMode, keypad: KeypadMode) -> Vec<u8> {
    encode_key_with_mods(event, Modifiers::empty(), cursor_keys, keypad)
}

pub fn encode_key_with_mods(
    event: KeyEvent,
    mods: Modifiers,
    cursor_keys: CursorKeysMode,
    keypad: KeypadMode,
) -> Vec<u8> {
    match event {
        KeyEvent::Char(ch) => encode_char(ch, mods),
        KeyEvent::Named(name) => encode_named(name, mods, cursor_keys, keypad),
    }
}

fn encode_char(ch: char, mods: Modifiers) -> Vec<u8> {
    let mut out = Vec::new();
    if mods.contains(Modifiers::ALT) || mods.contains(Modifiers::META) {
        out.push(0x1B);
    }
    if mods.contains(Modifiers::CTRL) && ch.is_ascii_alphabetic() {
        out.push(ch.to_ascii_uppercase() as u8 & 0x1F);
        return prefix(out);
    }
    let mut buf = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    prefix(out)
}

fn prefix(mut out: Vec<u8>) -> Vec<u8> {
    // encode_char already wrote any Alt/Meta ESC prefix ahead of the byte
    // it wraps; nothing further to do here, this exists to keep the two
    // code paths (Ctrl-letter vs plain) symmetric in the caller above.
    out.shrink_to_fit();
    out
}

fn encode_named(name: KeyName, mods: Modifiers, cursor_keys: CursorKeysMode, keypad: KeypadMode) -> Vec<u8> {
    let letter = match name {
        KeyName::Up => Some(b'A'),
        KeyName::Down => Some(b'B'),
        KeyName::Right => Some(b'C'),
        KeyName::Left => Some(b'D'),
        KeyName::Home => Some(b'H'),
        KeyName::End => Some(b'F'),
        _ => None,
    };
    if let Some(letter) = letter {
        return match mods.xterm_param() {
            None => match cursor_keys {
                CursorKeysMode::Normal => format!("\x1b[{}", letter as char).into_bytes(),
                CursorKeysMode::Application => format!("\x1bO{}", letter as char).into_bytes(),
            },
            Some(n) => format!("\x1b[1;{n}{}", letter as char).into_bytes(),
        };
    }
    match name {
        KeyName::Insert => tilde_sequence(2, mods),
        KeyName::Delete => tilde_sequence(3, mods),
        KeyName::PageUp => tilde_sequence(5, mods),
        KeyName::PageDown => tilde_sequence(6, mods),
        KeyName::F(n) => encode_function_key(n, mods, keypad),
        KeyName::Up | KeyName::Down | KeyName::Right | KeyName::Left | KeyName::Home | KeyName::End => {
            unreachable!("handled by letter match above")
        }
    }
}

fn tilde_sequence(code: u16, mods: Modifiers) -> Vec<u8> {
    match mods.xterm_param() {
        None => format!("\x1b[{code}~").into_bytes(),
        Some(n) => format!("\x1b[{code};{n}~").into_bytes(),
    }
}

/// `F1..F4` have their own SS3 letters; `F5` and up use the `CSI n ~` form.
/// `keypad` has no bearing on function keys (only keypad digits do), kept
/// as a parameter for symmetry with the arrow-key dispatch above.
fn encode_function_key(n: u8, mods: Modifiers, _keypad: KeypadMode) -> Vec<u8> {
    match n {
        1..=4 => {
            let letter = (b'P' + (n - 1)) as char;
            match mods.xterm_param() {
                None => format!("\x1bO{letter}").into_bytes(),
                Some(m) => format!("\x1b[1;{m}{letter}").into_bytes(),
            }
        }
        5 => tilde_sequence(15, mods),
        6 => tilde_sequence(17, mods),
        7 => tilde_sequence(18, mods),
        8 => tilde_sequence(19, mods),
        9 => tilde_sequence(20, mods),
        10 => tilde_sequence(21, mods),
        11 => tilde_sequence(23, mods),
        12 => tilde_sequence(24, mods),
        _ => Vec::new(),
    }
}

pub fn encode_mouse(
    x: u16,
    y: u16,
    button: MouseButton,
    action: MouseAction,
    mods: Modifiers,
    encoding: MouseEncoding,
) -> Vec<u8> {
    match encoding {
        MouseEncoding::X10 => {
            let cb = 32 + legacy_button_code(button, action) + modifier_bits(mods);
            let cx = (x.min(223) + 32) as u8;
            let cy = (y.min(223) + 32) as u8;
            vec![0x1B, b'[', b'M', cb as u8, cx, cy]
        }
        MouseEncoding::Utf8 => {
            let cb = 32 + legacy_button_code(button, action) + modifier_bits(mods);
            let mut out = vec![0x1B, b'[', b'M', cb as u8];
            out.extend(encode_utf8_coord(x + 32));
            out.extend(encode_utf8_coord(y + 32));
            out
        }
        MouseEncoding::Sgr => {
            // SGR carries the real button in both press and release; the
            // final letter (M/m) disambiguates instead of the X10 "3 means
            // released" convention.
            let final_byte = if action == MouseAction::Release { 'm' } else { 'M' };
            let cb = sgr_button_code(button, action) + modifier_bits(mods);
            format!("\x1b[<{cb};{x};{y}{final_byte}").into_bytes()
        }
        MouseEncoding::Urxvt => {
            let cb = 32 + legacy_button_code(button, action) + modifier_bits(mods);
            format!("\x1b[{cb};{x};{y}M").into_bytes()
        }
    }
}

/// xterm mouse reporting ORs these bits into the button code: bit 2 (4) for
/// Shift, bit 3 (8) for Meta/Alt, bit 4 (16) for Ctrl.
fn modifier_bits(mods: Modifiers) -> u16 {
    let mut bits = 0;
    if mods.contains(Modifiers::SHIFT) {
        bits += 4;
    }
    if mods.contains(Modifiers::ALT) || mods.contains(Modifiers::META) {
        bits += 8;
    }
    if mods.contains(Modifiers::CTRL) {
        bits += 16;
    }
    bits
}

fn encode_utf8_coord(value: u16) -> Vec<u8> {
    let mut buf = [0u8; 4];
    char::from_u32(value as u32)
        .unwrap_or('\u{FFFD}')
        .encode_utf8(&mut buf)
        .as_bytes()
        .to_vec()
}

fn base_button_code(button: MouseButton) -> u16 {
    match button {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
        MouseButton::None => 3,
        MouseButton::WheelUp => 64,
        MouseButton::WheelDown => 65,
    }
}

/// X10/UTF8/URXVT encodings collapse every release to button code 3,
/// regardless of which button was released.
fn legacy_button_code(button: MouseButton, action: MouseAction) -> u16 {
    if action == MouseAction::Release && !matches!(button, MouseButton::WheelUp | MouseButton::WheelDown) {
        3
    } else if action == MouseAction::Move {
        base_button_code(button) + 32
    } else {
        base_button_code(button)
    }
}

fn sgr_button_code(button: MouseButton, action: MouseAction) -> u16 {
    if action == MouseAction::Move {
        base_button_code(button) + 32
    } else {
        base_button_code(button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_char_is_utf8_bytes() {
        assert_eq!(encode_key(KeyEvent::Char('é'), CursorKeysMode::Normal, KeypadMode::Normal), "é".as_bytes());
    }

    #[test]
    fn ctrl_letter_is_masked() {
        let bytes = encode_key_with_mods(KeyEvent::Char('c'), Modifiers::CTRL, CursorKeysMode::Normal, KeypadMode::Normal);
        assert_eq!(bytes, vec![0x03]);
    }

    #[test]
    fn alt_prefixes_esc() {
        let bytes = encode_key_with_mods(KeyEvent::Char('x'), Modifiers::ALT, CursorKeysMode::Normal, KeypadMode::Normal);
        assert_eq!(bytes, vec![0x1B, b'x']);
    }

    #[test]
    fn arrow_normal_mode() {
        let bytes = encode_key(KeyEvent::Named(KeyName::Up), CursorKeysMode::Normal, KeypadMode::Normal);
        assert_eq!(bytes, b"\x1b[A");
    }

    #[test]
    fn arrow_application_mode() {
        let bytes = encode_key(KeyEvent::Named(KeyName::Up), CursorKeysMode::Application, KeypadMode::Normal);
        assert_eq!(bytes, b"\x1bOA");
    }

    #[test]
    fn arrow_with_shift_uses_csi_1_n_form() {
        let bytes =
            encode_key_with_mods(KeyEvent::Named(KeyName::Up), Modifiers::SHIFT, CursorKeysMode::Normal, KeypadMode::Normal);
        assert_eq!(bytes, b"\x1b[1;2A");
    }

    #[test]
    fn delete_key() {
        let bytes = encode_key(KeyEvent::Named(KeyName::Delete), CursorKeysMode::Normal, KeypadMode::Normal);
        assert_eq!(bytes, b"\x1b[3~");
    }

    #[test]
    fn f5_uses_tilde_form() {
        let bytes = encode_key(KeyEvent::Named(KeyName::F(5)), CursorKeysMode::Normal, KeypadMode::Normal);
        assert_eq!(bytes, b"\x1b[15~");
    }

    #[test]
    fn x10_mouse_press() {
        let bytes = encode_mouse(5, 10, MouseButton::Left, MouseAction::Press, Modifiers::empty(), MouseEncoding::X10);
        assert_eq!(bytes, vec![0x1B, b'[', b'M', 32, 5 + 32, 10 + 32]);
    }

    #[test]
    fn sgr_mouse_release() {
        let bytes = encode_mouse(5, 10, MouseButton::Left, MouseAction::Release, Modifiers::empty(), MouseEncoding::Sgr);
        assert_eq!(bytes, b"\x1b[<0;5;10m");
    }

    #[test]
    fn sgr_mouse_press_with_shift() {
        let bytes = encode_mouse(5, 10, MouseButton::Left, MouseAction::Press, Modifiers::SHIFT, MouseEncoding::Sgr);
        assert_eq!(bytes, b"\x1b[<4;5;10M");
    }

    #[test]
    fn bracketed_paste_wraps_payload() {
        let payload = b"pasted text";
        let mut wrapped = b"\x1b[200~".to_vec();
        wrapped.extend_from_slice(payload);
        wrapped.extend_from_slice(b"\x1b[201~");
        assert!(wrapped.starts_with(b"\x1b[200~"));
        assert!(wrapped.ends_with(b"\x1b[201~"));
    }
}
