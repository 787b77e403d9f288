//! Register addresses and device constant enumerations
//!
//! The controller exposes its state as a flat 16-bit address space. Live
//! registers (mode, power level, channel levels, control flags, command
//! slot) sit in RAM; the EEPROM-backed slots (favorite mode, persisted
//! power level) survive power cycles. The addresses below match the
//! documented memory map of the MK-312/ET-312 firmware; [`RegisterMap`] is
//! plain configuration so a variant firmware can override any of them.

use serde::{Deserialize, Serialize};

/// Address table for the device's register space
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegisterMap {
    /// Control flags register (r15); holds the ADC-disable bit
    pub control_flags: u16,
    /// Command register; accepts [`BoxCommand`] values
    pub command: u16,
    /// Currently running mode
    pub current_mode: u16,
    /// Live power level
    pub power_level: u16,
    /// Channel A output level
    pub level_a: u16,
    /// Channel B output level
    pub level_b: u16,
    /// Multi-adjust level
    pub level_ma: u16,
    /// Lower bound the device reports for the multi-adjust range
    pub ma_min: u16,
    /// Upper bound the device reports for the multi-adjust range
    pub ma_max: u16,
    /// Communication key register; writing 0 drops the session key
    pub comm_key: u16,
    /// EEPROM-backed favorite mode slot
    pub eeprom_favorite_mode: u16,
    /// EEPROM-backed power level slot
    pub eeprom_power_level: u16,
    /// Bit position of the ADC-disable flag inside `control_flags`
    pub adc_disable_bit: u8,
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self {
            control_flags: 0x400F,
            command: 0x4070,
            current_mode: 0x407B,
            power_level: 0x41F4,
            level_a: 0x4064,
            level_b: 0x4065,
            level_ma: 0x4066,
            ma_min: 0x4086,
            ma_max: 0x4087,
            comm_key: 0x4213,
            eeprom_favorite_mode: 0x8008,
            eeprom_power_level: 0x8009,
            adc_disable_bit: 0,
        }
    }
}

/// Stimulation modes selectable through the mode register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Mode {
    /// Value seen right after power-on, before any mode is selected
    PowerOn = 0x00,
    Waves = 0x76,
    Stroke = 0x77,
    Climb = 0x78,
    Combo = 0x79,
    Intense = 0x7A,
    Rhythm = 0x7B,
    Audio1 = 0x7C,
    Audio2 = 0x7D,
    Audio3 = 0x7E,
    Split = 0x7F,
    Random1 = 0x80,
    Random2 = 0x81,
    Toggle = 0x82,
    Orgasm = 0x83,
    Torment = 0x84,
    Phase1 = 0x85,
    Phase2 = 0x86,
    Phase3 = 0x87,
    User1 = 0x88,
    User2 = 0x89,
    User3 = 0x8A,
    User4 = 0x8B,
    User5 = 0x8C,
    User6 = 0x8D,
    User7 = 0x8E,
}

impl Mode {
    /// Get all selectable modes, in device order
    pub fn all() -> &'static [Mode] {
        &[
            Mode::Waves,
            Mode::Stroke,
            Mode::Climb,
            Mode::Combo,
            Mode::Intense,
            Mode::Rhythm,
            Mode::Audio1,
            Mode::Audio2,
            Mode::Audio3,
            Mode::Split,
            Mode::Random1,
            Mode::Random2,
            Mode::Toggle,
            Mode::Orgasm,
            Mode::Torment,
            Mode::Phase1,
            Mode::Phase2,
            Mode::Phase3,
            Mode::User1,
            Mode::User2,
            Mode::User3,
            Mode::User4,
            Mode::User5,
            Mode::User6,
            Mode::User7,
        ]
    }

    /// Get mode from the register byte
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Mode::PowerOn),
            0x76 => Some(Mode::Waves),
            0x77 => Some(Mode::Stroke),
            0x78 => Some(Mode::Climb),
            0x79 => Some(Mode::Combo),
            0x7A => Some(Mode::Intense),
            0x7B => Some(Mode::Rhythm),
            0x7C => Some(Mode::Audio1),
            0x7D => Some(Mode::Audio2),
            0x7E => Some(Mode::Audio3),
            0x7F => Some(Mode::Split),
            0x80 => Some(Mode::Random1),
            0x81 => Some(Mode::Random2),
            0x82 => Some(Mode::Toggle),
            0x83 => Some(Mode::Orgasm),
            0x84 => Some(Mode::Torment),
            0x85 => Some(Mode::Phase1),
            0x86 => Some(Mode::Phase2),
            0x87 => Some(Mode::Phase3),
            0x88 => Some(Mode::User1),
            0x89 => Some(Mode::User2),
            0x8A => Some(Mode::User3),
            0x8B => Some(Mode::User4),
            0x8C => Some(Mode::User5),
            0x8D => Some(Mode::User6),
            0x8E => Some(Mode::User7),
            _ => None,
        }
    }

    /// Get name of mode
    pub fn name(&self) -> &'static str {
        match self {
            Mode::PowerOn => "Power On",
            Mode::Waves => "Waves",
            Mode::Stroke => "Stroke",
            Mode::Climb => "Climb",
            Mode::Combo => "Combo",
            Mode::Intense => "Intense",
            Mode::Rhythm => "Rhythm",
            Mode::Audio1 => "Audio 1",
            Mode::Audio2 => "Audio 2",
            Mode::Audio3 => "Audio 3",
            Mode::Split => "Split",
            Mode::Random1 => "Random 1",
            Mode::Random2 => "Random 2",
            Mode::Toggle => "Toggle",
            Mode::Orgasm => "Orgasm",
            Mode::Torment => "Torment",
            Mode::Phase1 => "Phase 1",
            Mode::Phase2 => "Phase 2",
            Mode::Phase3 => "Phase 3",
            Mode::User1 => "User 1",
            Mode::User2 => "User 2",
            Mode::User3 => "User 3",
            Mode::User4 => "User 4",
            Mode::User5 => "User 5",
            Mode::User6 => "User 6",
            Mode::User7 => "User 7",
        }
    }
}

/// Output power levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PowerLevel {
    /// Low output range
    Low = 0x01,
    /// Normal output range
    Normal = 0x02,
    /// High output range
    High = 0x03,
}

impl PowerLevel {
    /// Get power level from the register byte
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(PowerLevel::Low),
            0x02 => Some(PowerLevel::Normal),
            0x03 => Some(PowerLevel::High),
            _ => None,
        }
    }

    /// Get name of power level
    pub fn name(&self) -> &'static str {
        match self {
            PowerLevel::Low => "Low",
            PowerLevel::Normal => "Normal",
            PowerLevel::High => "High",
        }
    }
}

/// Commands accepted by the command register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BoxCommand {
    /// Leave whatever menu the front panel is in
    ExitMenu = 0x0A,
    /// Activate the mode currently in the mode register
    NewMode = 0x12,
    /// Start the favorite mode stored in EEPROM
    StartFavorite = 0x19,
}

impl BoxCommand {
    /// Get name of command
    pub fn name(&self) -> &'static str {
        match self {
            BoxCommand::ExitMenu => "Exit Menu",
            BoxCommand::NewMode => "New Mode",
            BoxCommand::StartFavorite => "Start Favorite",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trip() {
        for &mode in Mode::all() {
            assert_eq!(Mode::from_u8(mode as u8), Some(mode));
        }
        assert_eq!(Mode::from_u8(0x00), Some(Mode::PowerOn));
        assert_eq!(Mode::from_u8(0x75), None);
        assert_eq!(Mode::from_u8(0x8F), None);
    }

    #[test]
    fn test_power_level_round_trip() {
        assert_eq!(PowerLevel::from_u8(0x01), Some(PowerLevel::Low));
        assert_eq!(PowerLevel::from_u8(0x02), Some(PowerLevel::Normal));
        assert_eq!(PowerLevel::from_u8(0x03), Some(PowerLevel::High));
        assert_eq!(PowerLevel::from_u8(0x00), None);
        assert_eq!(PowerLevel::from_u8(0x04), None);
    }

    #[test]
    fn test_default_map_partitions() {
        let map = RegisterMap::default();
        // EEPROM-backed slots live in the upper half of the address space
        assert!(map.eeprom_favorite_mode >= 0x8000);
        assert!(map.eeprom_power_level >= 0x8000);
        assert!(map.current_mode < 0x8000);
        assert!(map.adc_disable_bit < 8);
    }
}
