//! Device operations composed over raw register access
//!
//! Every operation is a short linear sequence of register reads/writes with
//! fixed settle delays between dependent steps: the firmware needs real time
//! to apply a register change before the next command means anything.
//! Outcomes follow one rule throughout: a nack or a read-back mismatch is
//! `Ok(false)` (device busy, momentary desync, the caller may retry),
//! while malformed replies stay hard errors.

use super::error::ProtocolError;
use super::registers::{BoxCommand, Mode, PowerLevel, RegisterMap};
use super::session::Session;
use super::transport::{SerialTransport, Transport};
use crate::config::DriverConfig;
use std::time::Duration;

/// High-level handle to one stimulation controller
pub struct Device<T: Transport> {
    session: Session<T>,
    registers: RegisterMap,
    settle_delay: Duration,
}

impl Device<SerialTransport> {
    /// Open the configured serial port and wrap it in a device handle
    ///
    /// No handshake happens yet; the first operation triggers it.
    pub fn open(config: &DriverConfig) -> Result<Self, ProtocolError> {
        let transport = SerialTransport::open(&config.serial)?;
        Ok(Self::new(Session::new(transport, config.protocol.clone())))
    }
}

impl<T: Transport> Device<T> {
    /// Wrap an existing session
    pub fn new(session: Session<T>) -> Self {
        let registers = session.config().registers;
        let settle_delay = session.config().settle_delay;
        Self {
            session,
            registers,
            settle_delay,
        }
    }

    /// Access the underlying session
    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    /// Mutably access the underlying session for raw register work
    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    fn settle(&self) {
        std::thread::sleep(self.settle_delay);
    }

    /// Issue a command to the command register
    pub fn command(&mut self, command: BoxCommand) -> Result<bool, ProtocolError> {
        tracing::debug!("Command: {}", command.name());
        self.session
            .write_register(self.registers.command, command as u8 as u16)
    }

    /// Get the mode currently running on the device
    pub fn current_mode(&mut self) -> Result<Option<Mode>, ProtocolError> {
        let raw = self.session.read_register(self.registers.current_mode)?;
        Ok(Mode::from_u8(raw))
    }

    /// Switch to `mode`, driving the device's menu sequence
    ///
    /// Short-circuits to `true` when the requested mode is already running.
    /// Otherwise: write the mode register, settle, exit the menu, settle,
    /// select the new mode, settle, then read back and compare. Any nack
    /// along the way aborts with `false`; there are no partial retries.
    pub fn switch_mode(&mut self, mode: Mode) -> Result<bool, ProtocolError> {
        tracing::debug!("Switching to mode {}", mode.name());

        if self.session.read_register(self.registers.current_mode)? == mode as u8 {
            return Ok(true);
        }

        if !self
            .session
            .write_register(self.registers.current_mode, mode as u8 as u16)?
        {
            return Ok(false);
        }
        self.settle();

        if !self.command(BoxCommand::ExitMenu)? {
            return Ok(false);
        }
        self.settle();

        if !self.command(BoxCommand::NewMode)? {
            return Ok(false);
        }
        self.settle();

        Ok(self.session.read_register(self.registers.current_mode)? == mode as u8)
    }

    /// Get the live power level
    pub fn power_level(&mut self) -> Result<Option<PowerLevel>, ProtocolError> {
        let raw = self.session.read_register(self.registers.power_level)?;
        Ok(PowerLevel::from_u8(raw))
    }

    /// Set the live power level, verified by read-back
    pub fn set_power_level(&mut self, level: PowerLevel) -> Result<bool, ProtocolError> {
        tracing::debug!("Setting power level {}", level.name());

        if !self
            .session
            .write_register(self.registers.power_level, level as u8 as u16)?
        {
            return Ok(false);
        }
        self.settle();

        Ok(self.session.read_register(self.registers.power_level)? == level as u8)
    }

    /// Disable the ADC, locking out the front-panel potentiometers
    ///
    /// Required before the channel levels can be driven from the host.
    pub fn disable_adc(&mut self) -> Result<bool, ProtocolError> {
        tracing::debug!("Disabling ADC");
        let flags = self.session.read_register(self.registers.control_flags)?;
        let flags = flags | (1 << self.registers.adc_disable_bit);
        // Success is the write ack; the flag is not read back. The original
        // protocol behaves this way and it is kept as-is.
        self.session
            .write_register(self.registers.control_flags, flags as u16)
    }

    /// Re-enable the ADC, returning control to the front panel
    pub fn enable_adc(&mut self) -> Result<bool, ProtocolError> {
        tracing::debug!("Enabling ADC");
        let flags = self.session.read_register(self.registers.control_flags)?;
        let flags = flags & !(1 << self.registers.adc_disable_bit);
        self.session
            .write_register(self.registers.control_flags, flags as u16)
    }

    /// Write a direct channel level with local range validation and read-back
    fn set_direct_level(&mut self, address: u16, level: u16) -> Result<bool, ProtocolError> {
        if level > 0xFF {
            tracing::debug!("Level {:#06X} outside 0x00..=0xFF, not sent", level);
            return Ok(false);
        }
        if !self.session.write_register(address, level)? {
            return Ok(false);
        }
        Ok(u16::from(self.session.read_register(address)?) == level)
    }

    /// Set the channel A level (0–255); needs the ADC disabled
    pub fn set_level_a(&mut self, level: u16) -> Result<bool, ProtocolError> {
        self.set_direct_level(self.registers.level_a, level)
    }

    /// Get the channel A level
    pub fn level_a(&mut self) -> Result<u8, ProtocolError> {
        self.session.read_register(self.registers.level_a)
    }

    /// Set the channel B level (0–255); needs the ADC disabled
    pub fn set_level_b(&mut self, level: u16) -> Result<bool, ProtocolError> {
        self.set_direct_level(self.registers.level_b, level)
    }

    /// Get the channel B level
    pub fn level_b(&mut self) -> Result<u8, ProtocolError> {
        self.session.read_register(self.registers.level_b)
    }

    /// Get the multi-adjust bounds the device reports for the current mode
    ///
    /// Two sequential reads with no atomicity between them; the bounds only
    /// move on a mode change, which the caller controls.
    pub fn multi_adjust_range(&mut self) -> Result<(u8, u8), ProtocolError> {
        let min = self.session.read_register(self.registers.ma_min)?;
        let max = self.session.read_register(self.registers.ma_max)?;
        Ok((min, max))
    }

    /// Set the multi-adjust level, validated against the device's bounds
    ///
    /// The valid range depends on the running mode, so the bounds are read
    /// first; an out-of-range level returns `false` without issuing a write.
    pub fn set_level_ma(&mut self, level: u16) -> Result<bool, ProtocolError> {
        let (min, max) = self.multi_adjust_range()?;
        if level < u16::from(min) || level > u16::from(max) {
            tracing::debug!(
                "Multi-adjust level {:#06X} outside {:#04X}..={:#04X}, not sent",
                level,
                min,
                max
            );
            return Ok(false);
        }
        if !self.session.write_register(self.registers.level_ma, level)? {
            return Ok(false);
        }
        Ok(u16::from(self.session.read_register(self.registers.level_ma)?) == level)
    }

    /// Get the multi-adjust level
    pub fn level_ma(&mut self) -> Result<u8, ProtocolError> {
        self.session.read_register(self.registers.level_ma)
    }

    /// Start the favorite mode stored in EEPROM
    pub fn load_favorite_mode(&mut self) -> Result<bool, ProtocolError> {
        self.command(BoxCommand::StartFavorite)
    }

    /// Get the favorite mode persisted in EEPROM
    pub fn favorite_mode(&mut self) -> Result<Option<Mode>, ProtocolError> {
        let raw = self
            .session
            .read_register(self.registers.eeprom_favorite_mode)?;
        Ok(Mode::from_u8(raw))
    }

    /// Persist `mode` as the favorite in EEPROM
    ///
    /// Short-circuits to `true` when the stored value already matches,
    /// sparing an EEPROM write cycle.
    pub fn set_favorite_mode(&mut self, mode: Mode) -> Result<bool, ProtocolError> {
        let slot = self.registers.eeprom_favorite_mode;
        if self.session.read_register(slot)? == mode as u8 {
            return Ok(true);
        }
        if !self.session.write_register(slot, mode as u8 as u16)? {
            return Ok(false);
        }
        Ok(self.session.read_register(slot)? == mode as u8)
    }

    /// Get the power level persisted in EEPROM
    pub fn saved_power_level(&mut self) -> Result<Option<PowerLevel>, ProtocolError> {
        let raw = self
            .session
            .read_register(self.registers.eeprom_power_level)?;
        Ok(PowerLevel::from_u8(raw))
    }

    /// Persist `level` as the power level in EEPROM
    ///
    /// Same idempotent shape as [`Device::set_favorite_mode`].
    pub fn save_power_level(&mut self, level: PowerLevel) -> Result<bool, ProtocolError> {
        let slot = self.registers.eeprom_power_level;
        if self.session.read_register(slot)? == level as u8 {
            return Ok(true);
        }
        if !self.session.write_register(slot, level as u8 as u16)? {
            return Ok(false);
        }
        Ok(self.session.read_register(slot)? == level as u8)
    }

    /// Close the device, resetting the session key first
    pub fn close(self) {
        self.session.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProtocolConfig;
    use crate::core::simulator::DeviceSimulator;
    use std::time::Duration;

    fn device() -> Device<DeviceSimulator> {
        let config = ProtocolConfig {
            settle_delay: Duration::ZERO,
            ..ProtocolConfig::default()
        };
        Device::new(Session::new(DeviceSimulator::new(), config))
    }

    #[test]
    fn test_switch_mode_full_sequence() {
        let mut device = device();
        assert!(device.switch_mode(Mode::Intense).unwrap());
        assert_eq!(device.current_mode().unwrap(), Some(Mode::Intense));
    }

    #[test]
    fn test_switch_mode_noop_when_already_active() {
        let mut device = device();
        assert!(device.switch_mode(Mode::Intense).unwrap());

        let writes_before = device.session().transport().write_count();
        assert!(device.switch_mode(Mode::Intense).unwrap());
        // Already running: read-and-return, no writes at all
        assert_eq!(device.session().transport().write_count(), writes_before);
    }

    #[test]
    fn test_set_power_level_read_back() {
        let mut device = device();
        assert!(device.set_power_level(PowerLevel::High).unwrap());
        assert_eq!(device.power_level().unwrap(), Some(PowerLevel::High));
    }

    #[test]
    fn test_adc_bit_set_and_clear() {
        let mut device = device();
        let bit = 1 << device.registers.adc_disable_bit;
        let flags_addr = device.registers.control_flags;

        assert!(device.disable_adc().unwrap());
        let flags = device.session_mut().read_register(flags_addr).unwrap();
        assert_eq!(flags & bit, bit);

        assert!(device.enable_adc().unwrap());
        let flags = device.session_mut().read_register(flags_addr).unwrap();
        assert_eq!(flags & bit, 0);
    }

    #[test]
    fn test_direct_level_range_check_before_io() {
        let mut device = device();
        // Establish first so the write counter only tracks the operation
        device.session_mut().ensure_established().unwrap();

        let writes_before = device.session().transport().write_count();
        assert!(!device.set_level_a(0x100).unwrap());
        assert_eq!(device.session().transport().write_count(), writes_before);

        assert!(device.set_level_a(0x80).unwrap());
        assert_eq!(device.level_a().unwrap(), 0x80);
        assert!(device.set_level_b(0x40).unwrap());
        assert_eq!(device.level_b().unwrap(), 0x40);
    }

    #[test]
    fn test_multi_adjust_honors_device_bounds() {
        let mut device = device();
        let (min, max) = device.multi_adjust_range().unwrap();

        let writes_before = device.session().transport().write_count();
        assert!(!device.set_level_ma(u16::from(max) + 1).unwrap());
        assert!(!device.set_level_ma(u16::from(min).wrapping_sub(1)).unwrap());
        // Rejected levels never reach the wire
        assert_eq!(device.session().transport().write_count(), writes_before);

        assert!(device.set_level_ma(u16::from(min)).unwrap());
        assert_eq!(device.level_ma().unwrap(), min);
    }

    #[test]
    fn test_favorite_mode_write_is_idempotent() {
        let mut device = device();
        assert!(device.set_favorite_mode(Mode::Waves).unwrap());
        assert_eq!(device.favorite_mode().unwrap(), Some(Mode::Waves));

        let writes_before = device.session().transport().write_count();
        // Stored value already matches: no EEPROM write issued
        assert!(device.set_favorite_mode(Mode::Waves).unwrap());
        assert_eq!(device.session().transport().write_count(), writes_before);

        assert!(device.set_favorite_mode(Mode::Stroke).unwrap());
        assert_eq!(device.favorite_mode().unwrap(), Some(Mode::Stroke));
    }

    #[test]
    fn test_saved_power_level_round_trip() {
        let mut device = device();
        assert!(device.save_power_level(PowerLevel::Low).unwrap());
        assert_eq!(device.saved_power_level().unwrap(), Some(PowerLevel::Low));

        let writes_before = device.session().transport().write_count();
        assert!(device.save_power_level(PowerLevel::Low).unwrap());
        assert_eq!(device.session().transport().write_count(), writes_before);
    }

    #[test]
    fn test_load_favorite_mode_hits_command_register() {
        let mut device = device();
        assert!(device.load_favorite_mode().unwrap());
        let command_addr = device.registers.command;
        let raw = device.session_mut().read_register(command_addr).unwrap();
        assert_eq!(raw, BoxCommand::StartFavorite as u8);
    }
}
