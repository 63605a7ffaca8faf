//! Scratchpad to temperature conversion.
//!
//! Both variants are brought to the same 16-bit two's complement fixed-point word
//! (1 sign bit, 7 integer bits, 8 fractional bits) before conversion to `f32`.
//! A lower resolution only zeroes low bits, the scale is always 1/256 °C.

use fixed::types::I8F8;
use log::trace;

use crate::{Scratchpad, Variant};

/// Fixed-point temperature in °C, bit-for-bit the decoded temperature word.
pub type Temperature = I8F8;

/// Count per °C of a ModelS sensor when the count remain register is usable.
const COUNT_PER_C: u8 = 0x10;

/// Extends a ModelS reading, shifted to 1/16 °C units, to full 12-bit precision
/// using the count remain register.
///
/// `T = T_read - 0.25 + (count_per_c - count_remain) / count_per_c`, with `count_per_c = 16`.
pub const fn count_remain_correction(raw: u16, count_remain: u8) -> u16 {
    (raw & 0xfff0)
        .wrapping_add(12)
        .wrapping_sub(count_remain as u16)
}

/// Converts the fixed-point temperature word to °C.
pub fn to_float(word: u16) -> f32 {
    if word & 0x8000 != 0 {
        -((!word).wrapping_add(1) as f32) / 256.0
    } else {
        word as f32 / 256.0
    }
}

impl Variant {
    /// Temperature register brought to 1/16 °C per bit, with the bits the sensor
    /// did not convert cleared.
    pub fn refine(&self, scratchpad: &Scratchpad) -> u16 {
        let raw = scratchpad.raw_temperature();
        trace!("raw = {:#06x}", raw);
        match self {
            Variant::ModelS => {
                let raw = raw << 3; // 9-bit reading
                if scratchpad.count_per_c() == COUNT_PER_C {
                    count_remain_correction(raw, scratchpad.count_remain())
                } else {
                    raw
                }
            }
            // at lower resolution the low bits are undefined
            Variant::ModelB => raw & !scratchpad.configuration().resolution().undefined_bits(),
        }
    }

    /// The fixed-point temperature word of a scratchpad.
    pub fn fixed_point(&self, scratchpad: &Scratchpad) -> u16 {
        self.refine(scratchpad) << 4
    }

    /// Decodes a scratchpad to °C. The CRC is not checked.
    pub fn decode(&self, scratchpad: &Scratchpad) -> f32 {
        to_float(self.fixed_point(scratchpad))
    }

    /// Decodes a scratchpad to a fixed-point temperature. The CRC is not checked.
    pub fn temperature(&self, scratchpad: &Scratchpad) -> Temperature {
        Temperature::from_bits(self.fixed_point(scratchpad) as i16)
    }
}
