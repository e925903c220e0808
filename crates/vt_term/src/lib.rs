//! Cell grid buffer model and terminal state machine built on top of
//! `vt_parser`'s event stream.

mod buffer;
mod cell;
mod charset;
mod color;
mod error;
mod input;
mod line;
#[cfg(feature = "scrollback")]
mod scrollback;
mod terminal;

pub use buffer::{Buffer, SavedCursor};
pub use cell::Cell;
pub use charset::CharsetId;
pub use color::{Attrs, Color, Style, Underline};
pub use error::Error;
pub use input::{encode_key, encode_key_with_mods, encode_mouse, KeyEvent, KeyName, Modifiers, MouseAction, MouseButton};
pub use line::Line;
pub use terminal::{ActiveBuffer, CursorKeysMode, KeypadMode, MouseEncoding, MouseMode, Snapshot, Terminal};
