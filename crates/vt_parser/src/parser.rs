use crate::events::{CsiSequence, VtSink};
use crate::params::ParamBuffer;
use crate::state::{self, ParserState};

const DEFAULT_MAX_STRING_LEN: usize = 8 * 1024;

const CAN: u8 = 0x18;
const SUB: u8 = 0x1A;
const ESC: u8 = 0x1B;
const BEL: u8 = 0x07;

/// Byte-driven VT100/ANSI state machine.
///
/// `feed` is resumable: the parser's internal state (current state, the
/// parameter buffer, intermediates, the OSC/DCS string buffer, and any
/// partially-decoded UTF-8 sequence) survives across calls, so splitting a
/// byte stream at arbitrary boundaries — including inside an escape
/// sequence or a UTF-8 codepoint — yields identical emitted events to
/// feeding it all at once.
pub struct Parser {
    state: ParserState,
    params: ParamBuffer,
    intermediates: Vec<u8>,
    private_marker: Option<u8>,
    string_buf: Vec<u8>,
    string_overflowed: bool,
    max_string_len: usize,
    string_saw_esc: bool,
    utf8: utf8parse::Parser,
    resume_state: ParserState,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Ground,
            params: ParamBuffer::default(),
            intermediates: Vec::new(),
            private_marker: None,
            string_buf: Vec::new(),
            string_overflowed: false,
            max_string_len: DEFAULT_MAX_STRING_LEN,
            string_saw_esc: false,
            utf8: utf8parse::Parser::new(),
            resume_state: ParserState::Ground,
        }
    }

    /// Override the OSC/DCS/SOS-PM-APC string accumulation cap (default 8 KiB).
    pub fn with_max_string_len(mut self, max_len: usize) -> Self {
        self.max_string_len = max_len.max(1);
        self
    }

    /// Feed a chunk of bytes through the state machine, invoking `sink` for
    /// every event the bytes produce. Never blocks, never fails: malformed
    /// input is recovered from per spec (substitution characters, silent
    /// ignoring of unknown sequences, truncated OSC/DCS payloads).
    pub fn feed<S: VtSink>(&mut self, bytes: &[u8], sink: &mut S) {
        for &byte in bytes {
            self.advance(byte, sink);
        }
    }

    fn advance<S: VtSink>(&mut self, byte: u8, sink: &mut S) {
        // CAN/SUB abort whatever sequence is in progress, everywhere.
        if (byte == CAN || byte == SUB) && self.state != ParserState::Utf8Continuation {
            if self.state != ParserState::Ground {
                log::trace!("cancelling in-progress sequence on 0x{byte:02X}");
            }
            self.reset_to_ground();
            return;
        }

        if self.state == ParserState::Utf8Continuation {
            self.advance_utf8(byte, sink);
            return;
        }

        // ESC interrupts any non-string state.
        if byte == ESC && !self.in_string_state() {
            self.enter_escape();
            return;
        }

        match self.state {
            ParserState::Ground => self.ground(byte, sink),
            ParserState::Escape => self.escape(byte, sink),
            ParserState::EscapeIntermediate => self.escape_intermediate(byte, sink),
            ParserState::CsiEntry => self.csi_entry(byte, sink),
            ParserState::CsiParam => self.csi_param(byte, sink),
            ParserState::CsiIntermediate => self.csi_intermediate(byte, sink),
            ParserState::CsiIgnore => self.csi_ignore(byte, sink),
            ParserState::DcsEntry => self.dcs_entry(byte, sink),
            ParserState::DcsParam => self.dcs_param(byte, sink),
            ParserState::DcsIntermediate => self.dcs_intermediate(byte, sink),
            ParserState::DcsPassthrough => self.dcs_passthrough(byte, sink),
            ParserState::DcsIgnore => self.dcs_ignore(byte),
            ParserState::OscString => self.osc_string(byte, sink),
            ParserState::SosPmApcString => self.sos_pm_apc_string(byte),
            ParserState::Utf8Continuation => unreachable!("handled above"),
        }
    }

    fn in_string_state(&self) -> bool {
        matches!(
            self.state,
            ParserState::OscString | ParserState::SosPmApcString | ParserState::DcsPassthrough | ParserState::DcsIgnore
        )
    }

    fn reset_to_ground(&mut self) {
        self.params.clear();
        self.intermediates.clear();
        self.private_marker = None;
        self.string_buf.clear();
        self.string_overflowed = false;
        self.string_saw_esc = false;
        self.state = ParserState::Ground;
    }

    fn enter_escape(&mut self) {
        self.params.clear();
        self.intermediates.clear();
        self.private_marker = None;
        self.state = ParserState::Escape;
    }

    // --- GROUND --------------------------------------------------------

    fn ground<S: VtSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            _ if state::is_c0_execute(byte) => sink.execute(byte),
            0x20..=0x7E => sink.print(byte as char),
            0x80..=0xFF => {
                self.resume_state = ParserState::Ground;
                self.state = ParserState::Utf8Continuation;
                self.advance_utf8(byte, sink);
            }
            _ => {}
        }
    }

    fn advance_utf8<S: VtSink>(&mut self, byte: u8, sink: &mut S) {
        // Any byte reaching here that isn't >= 0x80 can't continue or start
        // a UTF-8 sequence (ASCII and sub-0x80 controls are routed through
        // `ground`/`advance` before ever reaching this state): the pending
        // lead byte(s) were a malformed/truncated sequence on their own.
        if byte < 0x80 {
            sink.print('\u{FFFD}');
            self.utf8 = utf8parse::Parser::new();
            self.state = self.resume_state;
            self.advance(byte, sink);
            return;
        }
        let mut recv = SinkReceiver::new(sink);
        self.utf8.advance(&mut recv, byte);
        if recv.done {
            self.state = self.resume_state;
        }
    }

    // --- ESCAPE ----------------------------------------------------------

    fn escape<S: VtSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            b'[' => {
                self.params.clear();
                self.intermediates.clear();
                self.private_marker = None;
                self.state = ParserState::CsiEntry;
            }
            b']' => {
                self.string_buf.clear();
                self.string_overflowed = false;
                self.string_saw_esc = false;
                self.state = ParserState::OscString;
            }
            b'P' => {
                self.params.clear();
                self.intermediates.clear();
                self.private_marker = None;
                self.state = ParserState::DcsEntry;
            }
            b'X' | b'^' | b'_' => {
                self.string_buf.clear();
                self.state = ParserState::SosPmApcString;
            }
            _ if state::is_intermediate(byte) => {
                self.intermediates.push(byte);
                self.state = ParserState::EscapeIntermediate;
            }
            0x30..=0x7E => {
                let intermediates = std::mem::take(&mut self.intermediates);
                sink.esc_dispatch(&intermediates, byte);
                self.state = ParserState::Ground;
            }
            _ if state::is_c0_execute(byte) => sink.execute(byte),
            _ => {}
        }
    }

    fn escape_intermediate<S: VtSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            _ if state::is_intermediate(byte) => self.intermediates.push(byte),
            0x30..=0x7E => {
                let intermediates = std::mem::take(&mut self.intermediates);
                sink.esc_dispatch(&intermediates, byte);
                self.state = ParserState::Ground;
            }
            _ if state::is_c0_execute(byte) => sink.execute(byte),
            _ => {}
        }
    }

    // --- CSI ---------------------------------------------------------------

    fn csi_entry<S: VtSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            _ if state::is_private_marker(byte) => {
                self.private_marker = Some(byte);
                self.state = ParserState::CsiParam;
            }
            b'0'..=b'9' => {
                self.params.digit(byte - b'0');
                self.state = ParserState::CsiParam;
            }
            b';' => {
                self.params.separator();
                self.state = ParserState::CsiParam;
            }
            b':' => {
                self.params.sub_separator();
                self.state = ParserState::CsiParam;
            }
            _ if state::is_intermediate(byte) => {
                self.intermediates.push(byte);
                self.state = ParserState::CsiIntermediate;
            }
            _ if state::is_csi_final(byte) => self.dispatch_csi(byte, sink),
            _ if state::is_c0_execute(byte) => sink.execute(byte),
            _ => self.state = ParserState::CsiIgnore,
        }
    }

    fn csi_param<S: VtSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            b'0'..=b'9' => self.params.digit(byte - b'0'),
            b';' => self.params.separator(),
            b':' => self.params.sub_separator(),
            _ if state::is_private_marker(byte) => self.state = ParserState::CsiIgnore,
            _ if state::is_intermediate(byte) => {
                self.intermediates.push(byte);
                self.state = ParserState::CsiIntermediate;
            }
            _ if state::is_csi_final(byte) => self.dispatch_csi(byte, sink),
            _ if state::is_c0_execute(byte) => sink.execute(byte),
            _ => self.state = ParserState::CsiIgnore,
        }
    }

    fn csi_intermediate<S: VtSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            _ if state::is_intermediate(byte) => self.intermediates.push(byte),
            _ if state::is_csi_final(byte) => self.dispatch_csi(byte, sink),
            _ if state::is_c0_execute(byte) => sink.execute(byte),
            _ => self.state = ParserState::CsiIgnore,
        }
    }

    fn csi_ignore<S: VtSink>(&mut self, byte: u8, sink: &mut S) {
        if state::is_csi_final(byte) {
            self.reset_to_ground();
        } else if state::is_c0_execute(byte) {
            sink.execute(byte);
        }
    }

    fn dispatch_csi<S: VtSink>(&mut self, finalizer: u8, sink: &mut S) {
        let params = self.params.finish();
        let intermediates = std::mem::take(&mut self.intermediates);
        let private_marker = self.private_marker.take();
        self.state = ParserState::Ground;
        sink.csi_dispatch(CsiSequence {
            private_marker,
            params,
            intermediates,
            finalizer,
        });
    }

    // --- DCS -----------------------------------------------------------

    fn dcs_entry<S: VtSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            _ if state::is_private_marker(byte) => {
                self.private_marker = Some(byte);
                self.state = ParserState::DcsParam;
            }
            b'0'..=b'9' => {
                self.params.digit(byte - b'0');
                self.state = ParserState::DcsParam;
            }
            b';' => {
                self.params.separator();
                self.state = ParserState::DcsParam;
            }
            b':' => {
                self.params.sub_separator();
                self.state = ParserState::DcsParam;
            }
            _ if state::is_intermediate(byte) => {
                self.intermediates.push(byte);
                self.state = ParserState::DcsIntermediate;
            }
            0x40..=0x7E => self.enter_dcs_passthrough(byte, sink),
            _ => self.state = ParserState::DcsIgnore,
        }
    }

    fn dcs_param<S: VtSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            b'0'..=b'9' => self.params.digit(byte - b'0'),
            b';' => self.params.separator(),
            b':' => self.params.sub_separator(),
            _ if state::is_intermediate(byte) => {
                self.intermediates.push(byte);
                self.state = ParserState::DcsIntermediate;
            }
            0x40..=0x7E => self.enter_dcs_passthrough(byte, sink),
            _ => self.state = ParserState::DcsIgnore,
        }
    }

    fn dcs_intermediate<S: VtSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            _ if state::is_intermediate(byte) => self.intermediates.push(byte),
            0x40..=0x7E => self.enter_dcs_passthrough(byte, sink),
            _ => self.state = ParserState::DcsIgnore,
        }
    }

    fn enter_dcs_passthrough<S: VtSink>(&mut self, finalizer: u8, sink: &mut S) {
        let params: Vec<u16> = self.params.finish().into_iter().map(|p| p.value).collect();
        let intermediates = std::mem::take(&mut self.intermediates);
        let private_marker = self.private_marker.take();
        sink.dcs_hook(private_marker, &params, &intermediates, finalizer);
        self.string_saw_esc = false;
        self.state = ParserState::DcsPassthrough;
    }

    fn dcs_passthrough<S: VtSink>(&mut self, byte: u8, sink: &mut S) {
        if self.string_saw_esc {
            self.string_saw_esc = false;
            if byte == b'\\' {
                sink.dcs_unhook();
                self.reset_to_ground();
            } else {
                // Not a real ST: re-enter escape processing for this byte.
                self.reset_to_ground();
                self.advance(ESC, sink);
                self.advance(byte, sink);
            }
            return;
        }
        if byte == ESC {
            self.string_saw_esc = true;
            return;
        }
        sink.dcs_put(byte);
    }

    fn dcs_ignore(&mut self, byte: u8) {
        if self.string_saw_esc {
            if byte == b'\\' {
                self.reset_to_ground();
                return;
            }
            self.string_saw_esc = byte == ESC;
            return;
        }
        if byte == ESC {
            self.string_saw_esc = true;
        }
    }

    // --- OSC / SOS-PM-APC -------------------------------------------------

    fn osc_string<S: VtSink>(&mut self, byte: u8, sink: &mut S) {
        if self.string_saw_esc {
            self.string_saw_esc = false;
            if byte == b'\\' {
                self.finish_osc(sink);
            } else {
                self.reset_to_ground();
                self.advance(ESC, sink);
                self.advance(byte, sink);
            }
            return;
        }
        match byte {
            BEL => self.finish_osc(sink),
            ESC => self.string_saw_esc = true,
            _ => self.push_string_byte(byte),
        }
    }

    fn finish_osc<S: VtSink>(&mut self, sink: &mut S) {
        if self.string_overflowed {
            log::debug!("OSC payload exceeded {} bytes, dispatching truncated", self.max_string_len);
        }
        let payload = std::mem::take(&mut self.string_buf);
        self.string_overflowed = false;
        self.state = ParserState::Ground;
        sink.osc_dispatch(&payload);
    }

    fn sos_pm_apc_string(&mut self, byte: u8) {
        if self.string_saw_esc {
            if byte == b'\\' {
                self.reset_to_ground();
                return;
            }
            self.string_saw_esc = byte == ESC;
            return;
        }
        match byte {
            ESC => self.string_saw_esc = true,
            _ => self.push_string_byte(byte),
        }
    }

    fn push_string_byte(&mut self, byte: u8) {
        if self.string_buf.len() < self.max_string_len {
            self.string_buf.push(byte);
        } else {
            self.string_overflowed = true;
        }
    }
}

struct SinkReceiver<'a, S> {
    sink: &'a mut S,
    done: bool,
}

impl<'a, S> SinkReceiver<'a, S> {
    fn new(sink: &'a mut S) -> Self {
        Self { sink, done: false }
    }
}

impl<'a, S: VtSink> utf8parse::Receiver for SinkReceiver<'a, S> {
    fn codepoint(&mut self, c: char) {
        self.sink.print(c);
        self.done = true;
    }

    fn invalid_sequence(&mut self) {
        self.sink.print('\u{FFFD}');
        self.done = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CsiSequence, VtSink};

    #[derive(Default)]
    struct Recorder {
        printed: String,
        executed: Vec<u8>,
        csi: Vec<CsiSequence>,
        osc: Vec<Vec<u8>>,
        esc: Vec<(Vec<u8>, u8)>,
    }

    impl VtSink for Recorder {
        fn print(&mut self, ch: char) {
            self.printed.push(ch);
        }
        fn execute(&mut self, byte: u8) {
            self.executed.push(byte);
        }
        fn esc_dispatch(&mut self, intermediates: &[u8], finalizer: u8) {
            self.esc.push((intermediates.to_vec(), finalizer));
        }
        fn csi_dispatch(&mut self, csi: CsiSequence) {
            self.csi.push(csi);
        }
        fn osc_dispatch(&mut self, payload: &[u8]) {
            self.osc.push(payload.to_vec());
        }
    }

    #[test]
    fn prints_ascii() {
        let mut p = Parser::new();
        let mut r = Recorder::default();
        p.feed(b"Hello", &mut r);
        assert_eq!(r.printed, "Hello");
    }

    #[test]
    fn parses_sgr_csi() {
        let mut p = Parser::new();
        let mut r = Recorder::default();
        p.feed(b"\x1b[31;1m", &mut r);
        assert_eq!(r.csi.len(), 1);
        assert_eq!(r.csi[0].finalizer, b'm');
        assert_eq!(r.csi[0].params[0].value, 31);
        assert_eq!(r.csi[0].params[1].value, 1);
    }

    #[test]
    fn parses_private_mode_csi() {
        let mut p = Parser::new();
        let mut r = Recorder::default();
        p.feed(b"\x1b[?1049h", &mut r);
        assert_eq!(r.csi[0].private_marker, Some(b'?'));
        assert_eq!(r.csi[0].params[0].value, 1049);
        assert_eq!(r.csi[0].finalizer, b'h');
    }

    #[test]
    fn parses_sub_params() {
        let mut p = Parser::new();
        let mut r = Recorder::default();
        p.feed(b"\x1b[38:2::255:128:0m", &mut r);
        assert_eq!(r.csi[0].params[0].value, 38);
        assert_eq!(r.csi[0].params[0].sub_params, vec![2, 0, 255, 128, 0]);
    }

    #[test]
    fn osc_terminated_by_bel() {
        let mut p = Parser::new();
        let mut r = Recorder::default();
        p.feed(b"\x1b]0;my title\x07", &mut r);
        assert_eq!(r.osc, vec![b"0;my title".to_vec()]);
    }

    #[test]
    fn osc_terminated_by_st() {
        let mut p = Parser::new();
        let mut r = Recorder::default();
        p.feed(b"\x1b]2;title\x1b\\", &mut r);
        assert_eq!(r.osc, vec![b"2;title".to_vec()]);
    }

    #[test]
    fn unicode_codepoint() {
        let mut p = Parser::new();
        let mut r = Recorder::default();
        p.feed("é".as_bytes(), &mut r);
        assert_eq!(r.printed, "é");
    }

    #[test]
    fn unicode_split_across_feeds() {
        let bytes = "é".as_bytes().to_vec();
        assert_eq!(bytes.len(), 2);
        let mut p = Parser::new();
        let mut r = Recorder::default();
        p.feed(&bytes[..1], &mut r);
        assert!(r.printed.is_empty());
        p.feed(&bytes[1..], &mut r);
        assert_eq!(r.printed, "é");
    }

    #[test]
    fn malformed_utf8_emits_replacement() {
        let mut p = Parser::new();
        let mut r = Recorder::default();
        p.feed(&[0xFF, b'A'], &mut r);
        assert_eq!(r.printed, "\u{FFFD}A");
    }

    #[test]
    fn resumability_across_arbitrary_splits() {
        let input = b"A\x1b[31;1mB\x1b]0;t\x07C\x1b P1;2q\x00\x1b\\D";
        let mut whole_parser = Parser::new();
        let mut whole = Recorder::default();
        whole_parser.feed(input, &mut whole);

        for split in 0..=input.len() {
            let mut parser = Parser::new();
            let mut rec = Recorder::default();
            parser.feed(&input[..split], &mut rec);
            parser.feed(&input[split..], &mut rec);
            assert_eq!(rec.printed, whole.printed, "split at {split}");
            assert_eq!(rec.csi, whole.csi, "split at {split}");
            assert_eq!(rec.osc, whole.osc, "split at {split}");
        }
    }

    #[test]
    fn cancel_aborts_sequence() {
        let mut p = Parser::new();
        let mut r = Recorder::default();
        p.feed(b"\x1b[31;\x18m", &mut r);
        // CAN aborts the CSI; the trailing 'm' prints as ordinary text.
        assert!(r.csi.is_empty());
        assert_eq!(r.printed, "m");
    }

    #[test]
    fn osc_overflow_still_dispatches_truncated() {
        let mut p = Parser::new().with_max_string_len(4);
        let mut r = Recorder::default();
        p.feed(b"\x1b]0;abcdefgh\x07", &mut r);
        assert_eq!(r.osc, vec![b"0;ab".to_vec()]);
    }
}
