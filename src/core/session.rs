//! Session management with the handshake state machine
//!
//! A [`Session`] owns one transport and the XOR key negotiated with the
//! device. The handshake runs as an explicit bounded loop over the states
//! `Idle → Probing → KeyNegotiating → Established` (terminal `Failed`),
//! carrying the attempt counter so it can never recurse or spin forever.
//!
//! One protocol quirk is preserved deliberately: once a key is negotiated,
//! every *outgoing* byte (checksum included) is XORed with it, but replies
//! come back unkeyed and are verified as received. Observed device behavior
//! is asymmetric; do not "fix" this by decrypting replies without checking
//! against real hardware.

use super::error::ProtocolError;
use super::frame;
use super::transport::Transport;
use crate::config::ProtocolConfig;

/// Manufacturer default key assumed when the device keeps a key from an
/// earlier session and ignores unkeyed traffic
pub const DEFAULT_KEY: u8 = 0x55;

/// Probe byte opening the handshake
const PROBE: u8 = 0x00;

/// Reply the device gives to a successful probe
const PROBE_READY: u8 = 0x07;

/// Command byte opening the key-exchange frame
const KEY_EXCHANGE: u8 = 0x2F;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No handshake attempted yet
    Idle,
    /// Probe sent, waiting for the ready byte
    Probing,
    /// Probe acknowledged, key exchange in flight
    KeyNegotiating,
    /// Key negotiated; register access is permitted
    Established,
    /// Handshake retry budget exhausted or protocol violated
    Failed,
}

impl SessionState {
    /// Check if register access is permitted in this state
    pub fn is_established(&self) -> bool {
        matches!(self, Self::Established)
    }

    /// Check if state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Outcome of a single probe exchange
enum ProbeReply {
    Ready,
    Silent,
    Unexpected(u8),
}

/// Outcome of a single key-exchange attempt
enum KeyReply {
    Key(u8),
    Silent,
    Corrupt,
}

/// The stateful handshake and key relationship with one device
///
/// Configuration (timeouts, retry budget, register map) is immutable for
/// the session's lifetime; only the key and the lifecycle state mutate.
pub struct Session<T: Transport> {
    transport: T,
    config: ProtocolConfig,
    key: Option<u8>,
    state: SessionState,
}

impl<T: Transport> Session<T> {
    /// Create a session over `transport`; no bytes are exchanged yet
    pub fn new(transport: T, config: ProtocolConfig) -> Self {
        Self {
            transport,
            config,
            key: None,
            state: SessionState::Idle,
        }
    }

    /// Get current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get the negotiated XOR key, if any
    pub fn key(&self) -> Option<u8> {
        self.key
    }

    /// Get the session configuration
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handshake with the device if not already established
    ///
    /// This is the single funnel every register access goes through, so
    /// callers never need their own "do we have a key yet" guards.
    pub fn ensure_established(&mut self) -> Result<(), ProtocolError> {
        if self.state.is_established() {
            return Ok(());
        }
        self.handshake()
    }

    /// Run the probe/key-exchange handshake
    ///
    /// Bounded by the configured retry budget; on exhaustion the session
    /// lands in [`SessionState::Failed`] and an error is returned.
    pub fn handshake(&mut self) -> Result<(), ProtocolError> {
        if self.state.is_established() {
            return Ok(());
        }

        let budget = self.config.handshake_retries;
        for attempt in 1..=budget {
            tracing::debug!("Handshake attempt {}/{}", attempt, budget);

            self.state = SessionState::Probing;
            match self.probe()? {
                ProbeReply::Ready => {}
                ProbeReply::Silent => {
                    // A silent box usually still holds a key from an earlier
                    // session; assume the manufacturer default and re-probe.
                    tracing::debug!("No probe reply, retrying under default key");
                    self.key = Some(DEFAULT_KEY);
                    continue;
                }
                ProbeReply::Unexpected(byte) => {
                    self.state = SessionState::Failed;
                    return Err(ProtocolError::HandshakeFailed(format!(
                        "unexpected probe reply: {byte:#04X}"
                    )));
                }
            }

            self.state = SessionState::KeyNegotiating;
            match self.negotiate_key()? {
                KeyReply::Key(key) => {
                    self.key = Some(key);
                    self.state = SessionState::Established;
                    tracing::debug!("Handshake complete, key is {:#04X}", key);
                    return Ok(());
                }
                KeyReply::Silent => {
                    tracing::debug!("No key-exchange reply, restarting under default key");
                    self.key = Some(DEFAULT_KEY);
                }
                KeyReply::Corrupt => {
                    tracing::debug!("Corrupt key-exchange reply, restarting handshake");
                }
            }
        }

        self.state = SessionState::Failed;
        Err(ProtocolError::HandshakeFailed(format!(
            "retry budget of {budget} attempts exhausted"
        )))
    }

    /// Send the probe byte and classify the single-byte reply
    fn probe(&mut self) -> Result<ProbeReply, ProtocolError> {
        let mut probe = [PROBE];
        frame::apply_key(&mut probe, self.key);
        self.transport.send(&probe)?;

        let reply = self.transport.receive(1)?;
        Ok(match reply.first() {
            None => ProbeReply::Silent,
            Some(&PROBE_READY) => ProbeReply::Ready,
            Some(&other) => ProbeReply::Unexpected(other),
        })
    }

    /// Send the key-exchange frame and derive the session key
    fn negotiate_key(&mut self) -> Result<KeyReply, ProtocolError> {
        let mut request = vec![KEY_EXCHANGE, 0x00];
        request.push(frame::sum8(&request));
        frame::apply_key(&mut request, self.key);
        self.transport.send(&request)?;

        let reply = self.transport.receive(3)?;
        tracing::trace!("Key-exchange reply: {}", hex::encode(&reply));
        if reply.is_empty() {
            return Ok(KeyReply::Silent);
        }
        if reply.len() != 3 || !frame::verify_checksum(&reply) {
            return Ok(KeyReply::Corrupt);
        }
        Ok(KeyReply::Key(DEFAULT_KEY ^ reply[1]))
    }

    /// Read one register byte
    ///
    /// Implicitly handshakes when the session is not established. A reply
    /// shorter than three bytes is always an error here, unlike the
    /// handshake where silence has defined recoveries.
    pub fn read_register(&mut self, address: u16) -> Result<u8, ProtocolError> {
        self.ensure_established()?;

        let mut request = frame::encode_read(address);
        frame::apply_key(&mut request, self.key);
        tracing::trace!("Read {:#06X}: sending {}", address, hex::encode(&request));
        self.transport.send(&request)?;

        let reply = self.transport.receive(frame::READ_REPLY_LEN)?;
        tracing::trace!("Read {:#06X}: reply {}", address, hex::encode(&reply));
        if reply.len() != frame::READ_REPLY_LEN {
            return Err(ProtocolError::ShortRead {
                expected: frame::READ_REPLY_LEN,
                got: reply.len(),
            });
        }
        if !frame::verify_checksum(&reply) {
            return Err(ProtocolError::ChecksumMismatch {
                computed: frame::sum8(&reply[..frame::READ_REPLY_LEN - 1]),
                received: reply[frame::READ_REPLY_LEN - 1],
            });
        }

        Ok(reply[1])
    }

    /// Write one register byte, returning whether the device acked
    ///
    /// A missing or non-ack reply is an expected, recoverable outcome and
    /// comes back as `Ok(false)`; only framing and transport problems are
    /// errors. `value` must fit a register byte.
    pub fn write_register(&mut self, address: u16, value: u16) -> Result<bool, ProtocolError> {
        let mut request = frame::encode_write(address, value)?;
        self.ensure_established()?;

        frame::apply_key(&mut request, self.key);
        tracing::trace!("Write {:#06X}: sending {}", address, hex::encode(&request));
        self.transport.send(&request)?;

        let reply = self.transport.receive(1)?;
        match reply.first() {
            Some(&frame::WRITE_ACK) => Ok(true),
            Some(&other) => {
                tracing::debug!("Write {:#06X} not acked: got {:#04X}", address, other);
                Ok(false)
            }
            None => {
                tracing::debug!("Write {:#06X} not acked: no reply", address);
                Ok(false)
            }
        }
    }

    /// Write 0 into the device's key register and drop the local key
    ///
    /// The write goes out under the current key, then the session returns
    /// to [`SessionState::Idle`] with no key, matching the device side.
    pub fn reset_key(&mut self) -> Result<bool, ProtocolError> {
        tracing::debug!("Resetting communication key");
        let acked = self.write_register(self.config.registers.comm_key, 0x00)?;
        self.key = None;
        self.state = SessionState::Idle;
        Ok(acked)
    }

    /// Tear the session down, attempting a key reset first
    ///
    /// Safe to call on a session that never established: the reset write is
    /// skipped entirely rather than sent under a key that was never
    /// negotiated. Note the default-key fallback can leave a key behind on a
    /// failed handshake, so the gate is the lifecycle state, not the key.
    /// A failed reset is logged, never propagated, so the transport is
    /// always released.
    pub fn close(mut self) {
        if self.state.is_established() {
            match self.reset_key() {
                Ok(true) => tracing::debug!("Session key reset"),
                Ok(false) => tracing::warn!("Key reset not acknowledged by device"),
                Err(e) => tracing::warn!("Key reset failed: {}", e),
            }
        }
    }
}
