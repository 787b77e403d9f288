//! Driver configuration
//!
//! Configuration is immutable for the lifetime of a session; live state
//! (the negotiated key, the lifecycle state) lives in
//! [`crate::core::session::Session`]. Everything here serializes to TOML so
//! a deployment can pin its port, timing and register map in one file.

use crate::core::registers::RegisterMap;
use crate::core::transport::SerialConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or saving a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File contents are not valid TOML for this schema
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Protocol timing, retry and address-table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Handshake attempts before giving up
    pub handshake_retries: u32,
    /// Pause after a register write so firmware can apply the change
    /// before a dependent command is issued
    pub settle_delay: Duration,
    /// Register address table
    pub registers: RegisterMap,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            handshake_retries: 4,
            settle_delay: Duration::from_millis(100),
            registers: RegisterMap::default(),
        }
    }
}

/// Complete driver configuration: serial line plus protocol parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Serial port settings
    pub serial: SerialConfig,
    /// Protocol settings
    pub protocol: ProtocolConfig,
}

impl DriverConfig {
    /// Load config from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save config to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_device() {
        let config = DriverConfig::default();
        assert_eq!(config.serial.baud_rate, 19_200);
        assert_eq!(config.protocol.handshake_retries, 4);
        assert_eq!(config.protocol.settle_delay, Duration::from_millis(100));
        assert_eq!(config.protocol.registers.comm_key, 0x4213);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = DriverConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: DriverConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.serial.port, config.serial.port);
        assert_eq!(parsed.protocol.handshake_retries, config.protocol.handshake_retries);
        assert_eq!(
            parsed.protocol.registers.current_mode,
            config.protocol.registers.current_mode
        );
    }
}
