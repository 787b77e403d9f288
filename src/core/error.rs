//! Protocol error types

use thiserror::Error;

/// Errors surfaced by the protocol engine
///
/// Write-not-acknowledged and read-back mismatches are *not* errors; the
/// operation layer reports those as `Ok(false)` because they are expected,
/// recoverable outcomes (device busy, momentary desync). Everything in this
/// enum indicates either bad caller input or protocol desynchronization that
/// higher-level retries cannot safely paper over.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Write value outside the allowed 0x00..=0xFF range, rejected before any I/O
    #[error("value out of range: {value:#06X} (allowed 0x00..=0xFF)")]
    InvalidValue {
        /// The rejected value
        value: u16,
    },

    /// A register access received the wrong number of reply bytes
    #[error("unexpected reply length: expected {expected} bytes, got {got}")]
    ShortRead {
        /// Bytes the frame shape requires
        expected: usize,
        /// Bytes actually received before the timeout
        got: usize,
    },

    /// Reply checksum did not match the sum of the preceding bytes
    #[error("checksum mismatch: computed {computed:#04X}, received {received:#04X}")]
    ChecksumMismatch {
        /// Checksum computed over the reply body
        computed: u8,
        /// Checksum byte the device sent
        received: u8,
    },

    /// Probe/key-exchange exceeded the retry budget or returned unexpected bytes
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// Transport-level I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
