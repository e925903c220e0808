//! Event types emitted by [`crate::Parser`] and the sink trait that receives them.

/// A parsed CSI parameter together with its `:`-separated sub-parameters.
///
/// `CSI 38:2::255:0:0 m` parses as one [`CsiParam`] with `value = 38` and
/// `sub_params = [2, 0, 255, 0, 0]` (an empty sub-parameter, as in the
/// elided `::` above, counts as zero per spec).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CsiParam {
    pub value: u16,
    pub sub_params: Vec<u16>,
}

impl CsiParam {
    pub fn new(value: u16) -> Self {
        Self { value, sub_params: Vec::new() }
    }
}

/// A fully-parsed CSI sequence handed to [`VtSink::csi_dispatch`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CsiSequence {
    /// The leading private-marker byte (`<`, `=`, `>`, `?`), if present.
    pub private_marker: Option<u8>,
    pub params: Vec<CsiParam>,
    /// Intermediate bytes (`0x20..=0x2F`) accumulated before the final byte.
    pub intermediates: Vec<u8>,
    pub finalizer: u8,
}

impl CsiSequence {
    /// The Nth parameter value, or `default` if it was elided or is zero
    /// (per the ANSI convention that an omitted or zero parameter means
    /// "use the default").
    pub fn param(&self, index: usize, default: u16) -> u16 {
        match self.params.get(index) {
            Some(p) if p.value != 0 => p.value,
            _ => default,
        }
    }

    /// The raw Nth parameter value with no default substitution.
    pub fn raw_param(&self, index: usize) -> Option<u16> {
        self.params.get(index).map(|p| p.value)
    }

    pub fn is_private(&self, marker: u8) -> bool {
        self.private_marker == Some(marker)
    }
}

/// Sink for events emitted by the parser state machine. A terminal state
/// machine implements this trait directly; the parser is generic over it
/// so that dispatch does not go through a boxed `dyn` call on the hot
/// per-byte path (see the "Event dispatch" design note).
pub trait VtSink {
    /// A decoded, user-visible codepoint (already UTF-8 decoded).
    fn print(&mut self, ch: char);

    /// A C0/C1 control byte executed in place (`0x00..=0x1F` minus `ESC`,
    /// plus `0x7F`/DEL where applicable).
    fn execute(&mut self, byte: u8);

    /// `ESC <intermediates> <final>` outside of CSI/OSC/DCS.
    fn esc_dispatch(&mut self, intermediates: &[u8], finalizer: u8);

    fn csi_dispatch(&mut self, csi: CsiSequence);

    /// `OSC <payload> (ST|BEL)`. `payload` excludes the terminator.
    fn osc_dispatch(&mut self, payload: &[u8]);

    /// A DCS sequence has opened; `params`/`intermediates` mirror CSI's.
    fn dcs_hook(&mut self, private_marker: Option<u8>, params: &[u16], intermediates: &[u8], finalizer: u8) {
        let _ = (private_marker, params, intermediates, finalizer);
    }

    /// A byte inside an open DCS string.
    fn dcs_put(&mut self, byte: u8) {
        let _ = byte;
    }

    /// The DCS string has been terminated.
    fn dcs_unhook(&mut self) {}
}
