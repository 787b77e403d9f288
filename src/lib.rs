//! # Stimlink Core Library
//!
//! A host-side driver for MK-312 compatible stimulation controllers attached
//! over an RS-232 interface (typically a USB-serial adapter).
//!
//! The controller speaks a small byte protocol: two frame shapes (address
//! read and address write), a sum-mod-256 checksum, and an optional XOR key
//! negotiated at session start. On top of the raw register access this crate
//! implements the device-level operations:
//!
//! - Mode switching with settle/verify sequencing
//! - Power-level control (live register and EEPROM-persisted)
//! - ADC enable/disable (front-panel potentiometer lockout)
//! - Channel level control (A, B and the range-adjusted multi adjust)
//! - Favorite-mode load/read/write
//!
//! ## Example
//!
//! ```rust,no_run
//! use stimlink::{Device, DriverConfig, Mode, PowerLevel};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = DriverConfig::default();
//!     config.serial.port = "/dev/ttyUSB0".to_string();
//!
//!     let mut device = Device::open(&config)?;
//!     device.switch_mode(Mode::Waves)?;
//!     device.set_power_level(PowerLevel::Normal)?;
//!     device.close();
//!     Ok(())
//! }
//! ```
//!
//! The [`core::simulator::DeviceSimulator`] implements the same protocol in
//! software, so everything above runs without hardware in tests.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod core;

// Re-exports for convenience
pub use crate::config::{ConfigError, DriverConfig, ProtocolConfig};
pub use crate::core::device::Device;
pub use crate::core::error::ProtocolError;
pub use crate::core::registers::{BoxCommand, Mode, PowerLevel, RegisterMap};
pub use crate::core::session::{Session, SessionState};
pub use crate::core::transport::{SerialConfig, SerialTransport, Transport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
