//! Core module containing the protocol engine
//!
//! This module provides:
//! - Frame codec (read/write frames, checksums, XOR keying)
//! - Transport layer (serial port, plus a software simulator)
//! - Session management with the handshake state machine
//! - Device operations (modes, power levels, channel levels, EEPROM slots)
//! - Register address tables and device constant enumerations

pub mod device;
pub mod error;
pub mod frame;
pub mod registers;
pub mod session;
pub mod simulator;
pub mod transport;
