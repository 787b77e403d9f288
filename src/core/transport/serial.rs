//! Serial port transport implementation

use super::Transport;
use crate::core::error::ProtocolError;
use serde::{Deserialize, Serialize};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Serial port configuration
///
/// The controller's RS-232 interface is fixed at 8 data bits, no parity,
/// one stop bit and no flow control; only the port name, baud rate and
/// response timeout are worth configuring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Port name (e.g., COM3, /dev/ttyUSB0)
    pub port: String,
    /// Baud rate; the device ships at 19200
    pub baud_rate: u32,
    /// Response timeout for blocking reads
    pub timeout: Duration,
}

impl SerialConfig {
    /// Create a new serial configuration with device default settings
    pub fn new(port: &str) -> Self {
        Self {
            port: port.to_string(),
            baud_rate: 19_200,
            timeout: Duration::from_secs(2),
        }
    }

    /// Set baud rate
    #[must_use]
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set response timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new("/dev/ttyUSB0")
    }
}

/// Serial port transport
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open the configured port with the device's line discipline
    pub fn open(config: &SerialConfig) -> Result<Self, ProtocolError> {
        tracing::debug!("Opening serial port {} at {} baud", config.port, config.baud_rate);

        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.timeout)
            .open()
            .map_err(io::Error::from)?;

        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }

    fn receive(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buffer = vec![0u8; len];
        let mut filled = 0;

        while filled < len {
            match self.port.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                // Timeout means the device is done talking; hand back what
                // arrived and let the caller judge the length.
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e),
            }
        }

        buffer.truncate(filled);
        Ok(buffer)
    }
}
