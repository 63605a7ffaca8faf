use bitfield_struct::bitfield;

/// Conversion time at 12-bit resolution, and of every ModelS conversion, in microseconds.
pub const MAX_CONVERSION_TIME_US: u32 = 750_000;

/// Resolution of a temperature conversion.
///
/// The discriminant is the full configuration register value the sensor reports
/// for that resolution.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ReadoutResolution {
    /// 0.5 °C steps, 93.75 ms conversion.
    Resolution9bit = 0x1f,
    /// 0.25 °C steps, 187.5 ms conversion.
    Resolution10bit = 0x3f,
    /// 0.125 °C steps, 375 ms conversion.
    Resolution11bit = 0x5f,
    /// 0.0625 °C steps, 750 ms conversion. Power-on default.
    #[default]
    Resolution12bit = 0x7f,
}

impl ReadoutResolution {
    /// Resolution for a bit count, clamped to 9..=12.
    pub const fn from_bits_clamped(bits: u8) -> Self {
        use ReadoutResolution::*;
        match bits {
            0..=9 => Resolution9bit,
            10 => Resolution10bit,
            11 => Resolution11bit,
            _ => Resolution12bit,
        }
    }

    /// Resolution encoded by the two resolution bits of the configuration register.
    pub const fn from_code(code: u8) -> Self {
        use ReadoutResolution::*;
        match code & 0b11 {
            0b00 => Resolution9bit,
            0b01 => Resolution10bit,
            0b10 => Resolution11bit,
            _ => Resolution12bit,
        }
    }

    /// Number of bits of the conversion result.
    pub const fn bits(&self) -> u8 {
        use ReadoutResolution::*;
        match self {
            Resolution9bit => 9,
            Resolution10bit => 10,
            Resolution11bit => 11,
            Resolution12bit => 12,
        }
    }

    /// Value of the two resolution bits of the configuration register.
    pub const fn code(&self) -> u8 {
        self.bits() - 9
    }

    /// Maximum conversion time at this resolution, in microseconds.
    pub const fn delay_us(&self) -> u32 {
        use ReadoutResolution::*;
        match self {
            Resolution9bit => MAX_CONVERSION_TIME_US / 8,
            Resolution10bit => MAX_CONVERSION_TIME_US / 4,
            Resolution11bit => MAX_CONVERSION_TIME_US / 2,
            Resolution12bit => MAX_CONVERSION_TIME_US,
        }
    }

    /// Low bits of the raw temperature register left undefined at this resolution.
    pub const fn undefined_bits(&self) -> u16 {
        use ReadoutResolution::*;
        match self {
            Resolution9bit => 0b111,
            Resolution10bit => 0b011,
            Resolution11bit => 0b001,
            Resolution12bit => 0,
        }
    }
}

impl TryFrom<u8> for ReadoutResolution {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use ReadoutResolution::*;
        match value {
            0x1f => Ok(Resolution9bit),
            0x3f => Ok(Resolution10bit),
            0x5f => Ok(Resolution11bit),
            0x7f => Ok(Resolution12bit),
            _ => Err("Invalid readout resolution"),
        }
    }
}

/// # Configuration register
///
/// Byte 4 of the scratchpad. Only bits 5 and 6 are meaningful, they select the
/// conversion resolution (`R1 R0`, `bits - 9`). The remaining bits read as `1`
/// (bits 0-4) and `0` (bit 7) on a DS18B20, and the whole byte reads as `0xff`
/// on a DS18S20. They are carried through unchanged when the resolution is updated.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct Configuration {
    #[bits(5)]
    __reserved_low: u8,
    /// Resolution bits `R1 R0`.
    #[bits(2)]
    pub resolution_code: u8,
    #[bits(1)]
    __reserved_high: u8,
}

impl Configuration {
    /// Resolution currently selected by the register.
    pub fn resolution(&self) -> ReadoutResolution {
        ReadoutResolution::from_code(self.resolution_code())
    }

    /// The register with the resolution bits replaced.
    pub fn with_resolution(self, resolution: ReadoutResolution) -> Self {
        self.with_resolution_code(resolution.code())
    }
}
