use core::fmt::{Debug, Display, Formatter};
use embedded_onewire::OneWireError;

/// Errors reported by the DS18x20 driver.
#[derive(Debug, PartialEq, Eq)]
pub enum Ds18x20Error<E> {
    /// Error from the 1-Wire bus.
    Bus(OneWireError<E>),
    /// The search did not return any device address.
    NotFound,
    /// CRC-8 mismatch on a ROM code or a scratchpad.
    InvalidCrc,
    /// The family code does not belong to the DS18x20 family.
    UnsupportedDevice(u8),
    /// The handle was never identified.
    NotPresent,
}

impl<E> From<OneWireError<E>> for Ds18x20Error<E> {
    fn from(value: OneWireError<E>) -> Self {
        Self::Bus(value)
    }
}

impl<E: Debug> Display for Ds18x20Error<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "1-Wire bus error: {e:?}"),
            Self::NotFound => f.write_str("no device found on the bus"),
            Self::InvalidCrc => f.write_str("CRC mismatch"),
            Self::UnsupportedDevice(code) => {
                write!(f, "family code {code:#04x} is not a DS18x20 sensor")
            }
            Self::NotPresent => f.write_str("sensor not present"),
        }
    }
}

/// Results of DS18x20 driver calls.
pub type Ds18x20Result<T, E> = Result<T, Ds18x20Error<E>>;
