use embedded_onewire::OneWireCrc;

use crate::Configuration;

/// Contents of the sensor scratchpad, as returned by the Read Scratchpad command.
///
/// | Byte | Content |
/// |------|---------|
/// | 0-1  | Temperature register, little-endian |
/// | 2    | T<sub>H</sub> alarm register |
/// | 3    | T<sub>L</sub> alarm register |
/// | 4    | [Configuration] register |
/// | 5    | Reserved |
/// | 6    | Count remain (ModelS) |
/// | 7    | Count per °C (ModelS) |
/// | 8    | CRC-8 of bytes 0-7 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scratchpad([u8; Scratchpad::LEN]);

impl Scratchpad {
    /// Size of the scratchpad in bytes.
    pub const LEN: usize = 9;

    /// Wraps raw scratchpad bytes.
    pub const fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Temperature register, bytes 0 and 1.
    pub fn raw_temperature(&self) -> u16 {
        u16::from_le_bytes([self.0[0], self.0[1]])
    }

    /// High alarm trip point.
    pub fn t_high(&self) -> u8 {
        self.0[2]
    }

    /// Low alarm trip point.
    pub fn t_low(&self) -> u8 {
        self.0[3]
    }

    /// Configuration register.
    pub fn configuration(&self) -> Configuration {
        Configuration::from_bits(self.0[4])
    }

    /// Count remain.
    pub fn count_remain(&self) -> u8 {
        self.0[6]
    }

    /// Count per °C.
    pub fn count_per_c(&self) -> u8 {
        self.0[7]
    }

    /// CRC byte sent by the sensor.
    pub fn crc(&self) -> u8 {
        self.0[8]
    }

    /// Whether the CRC byte matches the other eight bytes.
    pub fn is_valid(&self) -> bool {
        OneWireCrc::validate(&self.0)
    }
}

impl From<[u8; Scratchpad::LEN]> for Scratchpad {
    fn from(bytes: [u8; Scratchpad::LEN]) -> Self {
        Self(bytes)
    }
}

impl From<Scratchpad> for [u8; Scratchpad::LEN] {
    fn from(scratchpad: Scratchpad) -> Self {
        scratchpad.0
    }
}
