//! Software device simulator
//!
//! A [`DeviceSimulator`] implements [`Transport`] and answers exactly like
//! the controller: probe ack, key exchange, checksummed read replies, write
//! acks, and a register file backing it all. Once a key is negotiated it
//! expects incoming frames XORed with that key while its own replies stay
//! unkeyed, matching the hardware's asymmetry. Deterministic, so tests can
//! assert on exact traffic.

use super::frame;
use super::registers::{Mode, PowerLevel, RegisterMap};
use super::transport::Transport;
use std::collections::{HashMap, VecDeque};
use std::io;

/// Reply the simulator gives to a valid probe
const PROBE_READY: u8 = 0x07;

/// Echo byte opening the simulator's key-exchange reply
const KEY_EXCHANGE_ECHO: u8 = 0x21;

/// Echo byte opening the simulator's read replies
const READ_ECHO: u8 = 0x22;

/// In-memory stand-in for one stimulation controller
pub struct DeviceSimulator {
    map: RegisterMap,
    registers: HashMap<u16, u8>,
    /// Key the box currently expects on incoming bytes
    key: Option<u8>,
    /// Key byte the box offers during the exchange
    negotiation_byte: u8,
    pending: VecDeque<u8>,
    write_count: u64,
}

impl Default for DeviceSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceSimulator {
    /// Create a freshly powered-on box with no communication key
    pub fn new() -> Self {
        let map = RegisterMap::default();
        let mut registers = HashMap::new();
        registers.insert(map.current_mode, Mode::PowerOn as u8);
        registers.insert(map.power_level, PowerLevel::Normal as u8);
        registers.insert(map.control_flags, 0x00);
        registers.insert(map.ma_min, 0x05);
        registers.insert(map.ma_max, 0xFA);
        registers.insert(map.eeprom_favorite_mode, Mode::Waves as u8);
        registers.insert(map.eeprom_power_level, PowerLevel::Normal as u8);

        Self {
            map,
            registers,
            key: None,
            negotiation_byte: 0x2A,
            pending: VecDeque::new(),
            write_count: 0,
        }
    }

    /// Create a box still holding `key` from an earlier session
    ///
    /// Such a box ignores unkeyed traffic, which is exactly the silent-probe
    /// scenario the handshake's default-key fallback exists for.
    #[must_use]
    pub fn with_stale_key(mut self, key: u8) -> Self {
        self.key = Some(key);
        self
    }

    /// Set the key byte offered during the exchange
    #[must_use]
    pub fn negotiation_byte(mut self, byte: u8) -> Self {
        self.negotiation_byte = byte;
        self
    }

    /// Peek at a register's current value
    pub fn register(&self, address: u16) -> u8 {
        self.registers.get(&address).copied().unwrap_or(0)
    }

    /// Poke a register value directly, bypassing the protocol
    pub fn set_register(&mut self, address: u16, value: u8) {
        self.registers.insert(address, value);
    }

    /// Number of write frames received so far, acked or not
    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    /// Check whether the box currently holds a communication key
    pub fn is_keyed(&self) -> bool {
        self.key.is_some()
    }

    fn reply(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes);
    }

    fn handle(&mut self, data: &[u8]) {
        match data {
            [0x00] => self.reply(&[PROBE_READY]),
            [frame::READ_FRAME, hi, lo, _] if frame::verify_checksum(data) => {
                let address = u16::from_be_bytes([*hi, *lo]);
                let value = self.register(address);
                let mut reply = vec![READ_ECHO, value];
                reply.push(frame::sum8(&reply));
                self.reply(&reply);
            }
            [frame::WRITE_FRAME, hi, lo, value, _] => {
                self.write_count += 1;
                if !frame::verify_checksum(data) {
                    // Corrupt write: answer with a non-ack byte
                    self.reply(&[PROBE_READY]);
                    return;
                }
                let address = u16::from_be_bytes([*hi, *lo]);
                self.registers.insert(address, *value);
                if address == self.map.comm_key && *value == 0x00 {
                    self.key = None;
                }
                self.reply(&[frame::WRITE_ACK]);
            }
            [0x2F, host_key, _] if frame::verify_checksum(data) => {
                let mut reply = vec![KEY_EXCHANGE_ECHO, self.negotiation_byte];
                reply.push(frame::sum8(&reply));
                self.reply(&reply);
                // The combined key both sides settle on
                self.key = Some(0x55 ^ host_key ^ self.negotiation_byte);
            }
            // Everything else is noise; a real box stays silent
            _ => {}
        }
    }
}

impl Transport for DeviceSimulator {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        let mut decoded = data.to_vec();
        frame::apply_key(&mut decoded, self.key);
        self.handle(&decoded);
        Ok(())
    }

    fn receive(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let take = len.min(self.pending.len());
        Ok(self.pending.drain(..take).collect())
    }
}
