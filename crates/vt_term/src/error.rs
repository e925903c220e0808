//! Fallible embedder-facing operations.
//!
//! Per-byte parsing and terminal mutation never fail — malformed input is
//! handled by the recovery rules (clamp, substitute, truncate), not
//! propagated as errors. This type exists for the few genuinely fallible
//! entry points and for tests asserting on malformed-input handling.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("terminal size {width}x{height} is invalid, must be at least 1x1")]
    InvalidSize { width: usize, height: usize },
}
