//! A byte-oriented VT100/ANSI parser, shaped after Paul Williams' DEC
//! VT500-series state diagram.
//!
//! This crate has no notion of a screen buffer or cursor — it turns a byte
//! stream into a sequence of [`VtSink`] callbacks ([`events::VtSink::print`],
//! `execute`, `esc_dispatch`, `csi_dispatch`, `osc_dispatch`, and the DCS
//! hook/put/unhook trio). A terminal state machine built on top of this
//! crate owns the buffer and implements [`VtSink`] to apply those events.
//!
//! The parser is resumable: splitting a byte stream at any boundary,
//! including mid-escape-sequence or mid-UTF-8-codepoint, and feeding the
//! pieces across separate [`Parser::feed`] calls produces exactly the same
//! events as feeding the whole stream at once.

mod events;
mod params;
mod parser;
mod state;

pub use events::{CsiParam, CsiSequence, VtSink};
pub use parser::Parser;
