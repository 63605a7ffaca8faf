use core::fmt::{Display, Formatter};
use embedded_onewire::OneWireCrc;
use log::{debug, warn};

use crate::{Ds18x20Error, Ds18x20Result, ReadoutResolution};

/// Family code of the DS1820 and DS18S20.
pub const FAMILY_DS18S20: u8 = 0x10;
/// Family code of the DS18B20.
pub const FAMILY_DS18B20: u8 = 0x28;
/// Family code of the DS1822.
pub const FAMILY_DS1822: u8 = 0x22;

/// Decoding behaviour of a sensor, selected by its family code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// DS1820 / DS18S20. Native 9-bit resolution, extended using the
    /// "count remain" and "count per °C" registers.
    ModelS,
    /// DS18B20 / DS1822. Configurable 9 to 12-bit resolution.
    ModelB,
}

impl Variant {
    /// Variant for a family code, `None` for devices outside the DS18x20 family.
    pub const fn from_family_code(code: u8) -> Option<Self> {
        match code {
            FAMILY_DS18S20 => Some(Self::ModelS),
            FAMILY_DS18B20 | FAMILY_DS1822 => Some(Self::ModelB),
            _ => None,
        }
    }

    /// Resolution a request for `bits` ends up with on this variant.
    ///
    /// ModelS sensors only convert at 9 bits.
    pub const fn clamp_resolution(&self, bits: u8) -> ReadoutResolution {
        match self {
            Self::ModelS => ReadoutResolution::Resolution9bit,
            Self::ModelB => ReadoutResolution::from_bits_clamped(bits),
        }
    }

    /// Resolution of the sensor after power-on.
    pub const fn default_resolution(&self) -> ReadoutResolution {
        match self {
            Self::ModelS => ReadoutResolution::Resolution9bit,
            Self::ModelB => ReadoutResolution::Resolution12bit,
        }
    }
}

impl TryFrom<char> for Variant {
    type Error = char;

    /// One character model name: `'S'`/`'s'` or `'B'`/`'b'`.
    fn try_from(model: char) -> Result<Self, Self::Error> {
        match model {
            'S' | 's' => Ok(Self::ModelS),
            'B' | 'b' => Ok(Self::ModelB),
            other => Err(other),
        }
    }
}

/// ROM code and variant of an identified sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    rom: u64,
    variant: Variant,
}

impl Identity {
    /// Checks the ROM code CRC and maps its family code to a [`Variant`].
    ///
    /// # Errors
    /// [`Ds18x20Error::InvalidCrc`] if byte 7 is not the CRC-8 of bytes 0-6,
    /// [`Ds18x20Error::UnsupportedDevice`] if the family is not a DS18x20.
    pub fn from_rom<E>(rom: u64) -> Ds18x20Result<Self, E> {
        let address = rom.to_le_bytes();
        let crc = OneWireCrc::compute(&address[..7]);
        if crc != address[7] {
            warn!("Invalid ROM CRC {:02x} for {:02x?}, expected {:02x}", address[7], address, crc);
            return Err(Ds18x20Error::InvalidCrc);
        }
        let Some(variant) = Variant::from_family_code(address[0]) else {
            warn!("Device {:02x?} doesn't belong to the DS18x20 family", address);
            return Err(Ds18x20Error::UnsupportedDevice(address[0]));
        };
        let identity = Self { rom, variant };
        debug!("{} is a {:?} sensor", identity, variant);
        Ok(identity)
    }

    /// 64-bit ROM code, family code in the least significant byte.
    pub fn rom(&self) -> u64 {
        self.rom
    }

    /// ROM code in bus order: family code, six serial bytes, CRC.
    pub fn address(&self) -> [u8; 8] {
        self.rom.to_le_bytes()
    }

    /// Family code, the first ROM byte.
    pub fn family_code(&self) -> u8 {
        self.rom as u8
    }

    /// 48-bit serial number.
    pub fn serial(&self) -> u64 {
        (self.rom >> 8) & 0xffff_ffff_ffff
    }

    /// Decoding variant.
    pub fn variant(&self) -> Variant {
        self.variant
    }
}

/// Formats the identity the way the Linux `w1` subsystem names devices, e.g. `28-0000057bc2e5`.
impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02x}-{:012x}", self.family_code(), self.serial())
    }
}
