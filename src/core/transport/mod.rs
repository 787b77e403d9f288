//! Transport layer
//!
//! The protocol engine only needs a duplex byte channel: a blocking,
//! full-frame `send` and a blocking `receive` that returns after a timeout
//! with however many bytes arrived. A short (even empty) read is data, not
//! a channel failure; the session layer decides what it means.
//!
//! Implementations:
//! - [`SerialTransport`] for real hardware over the `serialport` crate
//! - [`crate::core::simulator::DeviceSimulator`] for tests and dry runs

mod serial;

pub use serial::{SerialConfig, SerialTransport};

use std::io;

/// Duplex byte channel the session drives
pub trait Transport: Send {
    /// Send a complete frame, blocking until it is written out
    fn send(&mut self, data: &[u8]) -> io::Result<()>;

    /// Receive up to `len` bytes, blocking up to the transport's timeout
    ///
    /// Returns fewer than `len` bytes (possibly zero) when the device stays
    /// silent; errors are reserved for channel-level failures.
    fn receive(&mut self, len: usize) -> io::Result<Vec<u8>>;
}
