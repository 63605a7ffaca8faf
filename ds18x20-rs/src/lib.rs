#![no_std]
//! # ds18x20
//!
//! Driver for the DS18x20 family of 1-Wire digital thermometers:
//!
//! | Device            | Family code | [`Variant`]          |
//! |-------------------|-------------|----------------------|
//! | DS1820, DS18S20   | `0x10`      | [`Variant::ModelS`]  |
//! | DS18B20           | `0x28`      | [`Variant::ModelB`]  |
//! | DS1822            | `0x22`      | [`Variant::ModelB`]  |
//!
//! The driver works with any bus master implementing [`OneWire`]. A [`Ds18x20`] handle is
//! obtained by identifying a sensor on the bus, from a known ROM code, or by asserting
//! the model of a single sensor wired to the bus:
//!
//! ```ignore
//! let mut sensor = Ds18x20::identify(&mut bus)?;
//! sensor.set_resolution(&mut bus, 11)?;
//! sensor.start_conversion(&mut bus)?;
//! delay.delay_us(sensor.conversion_time_us());
//! let celsius = sensor.read_checked(&mut bus)?;
//! ```
//!
//! Every operation borrows the bus mutably for its whole transaction, so several handles
//! can share one bus without interleaving.

mod decode;
mod error;
mod family;
mod resolution;
mod scratchpad;
mod sensor;

pub use decode::{Temperature, count_remain_correction, to_float};
pub use embedded_onewire::{OneWire, OneWireError, OneWireResult, OneWireSearch, OneWireSearchKind};
pub use error::{Ds18x20Error, Ds18x20Result};
pub use family::{FAMILY_DS1822, FAMILY_DS18B20, FAMILY_DS18S20, Identity, Variant};
pub use resolution::{Configuration, MAX_CONVERSION_TIME_US, ReadoutResolution};
pub use scratchpad::Scratchpad;
pub use sensor::Ds18x20;
