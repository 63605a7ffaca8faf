use embedded_hal::delay::DelayNs;
use embedded_onewire::{OneWire, OneWireCrc, OneWireError, OneWireResult, OneWireSearch};
use log::{debug, trace, warn};

use crate::{
    Ds18x20Error, Ds18x20Result, Identity, MAX_CONVERSION_TIME_US, ReadoutResolution, Scratchpad,
    Variant,
};

/// Handle to a single DS18x20 sensor.
///
/// A handle is *present* once it knows which [`Variant`] it talks to, either because
/// the sensor was identified on the bus or because the model was asserted with
/// [`with_variant`](Ds18x20::with_variant). An absent handle (e.g. [`Default`]) never
/// touches the bus.
///
/// Identified handles select their sensor with Match ROM. Handles without a ROM code
/// use Skip ROM, which only works with a single sensor on the bus.
#[derive(Debug, Clone, Default)]
pub struct Ds18x20 {
    identity: Option<Identity>,
    variant: Option<Variant>,
    resolution: ReadoutResolution,
    scratchpad: Scratchpad,
}

impl From<Identity> for Ds18x20 {
    fn from(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            ..Self::with_variant(identity.variant())
        }
    }
}

impl Ds18x20 {
    /// Identifies the first sensor found by a new search of the bus.
    ///
    /// # Errors
    /// [`Ds18x20Error::NotFound`] if the search returns no address,
    /// [`Ds18x20Error::InvalidCrc`] if the ROM code is corrupted,
    /// [`Ds18x20Error::UnsupportedDevice`] if the device is not a DS18x20, and bus errors.
    pub fn identify<O: OneWire>(bus: &mut O) -> Ds18x20Result<Self, O::BusError> {
        let mut search = OneWireSearch::default();
        Self::identify_next(bus, &mut search)
    }

    /// Identifies the next device reported by `search`.
    ///
    /// Calling this repeatedly with the same cursor walks every device on the bus,
    /// [`Ds18x20Error::NotFound`] marks the end of the enumeration.
    pub fn identify_next<O: OneWire>(
        bus: &mut O,
        search: &mut OneWireSearch,
    ) -> Ds18x20Result<Self, O::BusError> {
        let rom = match search.next(bus) {
            Ok(Some(rom)) => rom,
            Ok(None) | Err(OneWireError::NoDevicePresent) => {
                debug!("No addresses");
                return Err(Ds18x20Error::NotFound);
            }
            Err(e) => return Err(e.into()),
        };
        debug!("ROM = {:02x?}", rom.to_le_bytes());
        Self::from_rom(rom)
    }

    /// Builds a handle for a sensor with a known ROM code, without any bus traffic.
    ///
    /// # Errors
    /// See [`Identity::from_rom`].
    pub fn from_rom<E>(rom: u64) -> Ds18x20Result<Self, E> {
        Identity::from_rom(rom).map(Self::from)
    }

    /// Handle for the only sensor on the bus, of a known variant.
    pub fn with_variant(variant: Variant) -> Self {
        Self {
            variant: Some(variant),
            resolution: variant.default_resolution(),
            ..Default::default()
        }
    }

    /// Handle for the only sensor on the bus, from a one character model name:
    /// `'S'`/`'s'` or `'B'`/`'b'`. Any other character gives an absent handle.
    pub fn with_model(model: char) -> Self {
        match Variant::try_from(model) {
            Ok(variant) => Self::with_variant(variant),
            Err(model) => {
                warn!("Unknown DS18x20 model {:?}", model);
                Self::default()
            }
        }
    }

    /// Sets the resolution the sensor is known to be configured for, without bus traffic.
    ///
    /// Useful when the configuration was stored in the sensor EEPROM earlier.
    pub fn with_resolution(mut self, resolution: ReadoutResolution) -> Self {
        self.resolution = match self.variant {
            Some(variant) => variant.clamp_resolution(resolution.bits()),
            None => resolution,
        };
        self
    }

    /// Whether the handle talks to a supported sensor.
    pub fn is_present(&self) -> bool {
        self.variant.is_some()
    }

    /// Decoding variant, `None` when absent.
    pub fn variant(&self) -> Option<Variant> {
        self.variant
    }

    /// ROM code, `None` when the handle was not built from a ROM code.
    pub fn rom(&self) -> Option<u64> {
        self.identity.map(|identity| identity.rom())
    }

    /// Identity of the sensor, `None` when the handle was not built from a ROM code.
    pub fn identity(&self) -> Option<Identity> {
        self.identity
    }

    /// Resolution of the next conversion, as last written or read back from the sensor.
    pub fn resolution(&self) -> ReadoutResolution {
        self.resolution
    }

    /// Scratchpad as of the last read.
    pub fn scratchpad(&self) -> &Scratchpad {
        &self.scratchpad
    }

    /// Time to wait after [`start_conversion`](Ds18x20::start_conversion) before reading,
    /// in microseconds. Zero when absent.
    pub fn conversion_time_us(&self) -> u32 {
        match self.variant {
            Some(Variant::ModelS) => MAX_CONVERSION_TIME_US,
            Some(Variant::ModelB) => self.resolution.delay_us(),
            None => 0,
        }
    }

    /// Selects the sensor: Match ROM with a ROM code, Skip ROM otherwise.
    fn address<O: OneWire>(&self, bus: &mut O) -> OneWireResult<(), O::BusError> {
        bus.address(self.rom())
    }

    /// Sets the conversion resolution, clamped to 9..=12 bits (always 9 on ModelS).
    ///
    /// The alarm registers and the reserved configuration bits are written back unchanged.
    /// The new configuration only lives in the scratchpad until
    /// [`save_configuration`](Ds18x20::save_configuration). Does nothing when absent.
    ///
    /// # Errors
    /// [`Ds18x20Error::InvalidCrc`] if the scratchpad read before the update is corrupted,
    /// in which case nothing is written. Bus errors.
    pub fn set_resolution<O: OneWire>(
        &mut self,
        bus: &mut O,
        bits: u8,
    ) -> Ds18x20Result<(), O::BusError> {
        let Some(variant) = self.variant else {
            return Ok(());
        };
        let resolution = variant.clamp_resolution(bits);
        let scratchpad = self.read_scratchpad(bus)?;
        if !scratchpad.is_valid() {
            warn!("Scratchpad CRC mismatch, resolution not written");
            return Err(Ds18x20Error::InvalidCrc);
        }
        let config = scratchpad.configuration().with_resolution(resolution);
        self.address(bus)?;
        bus.write_byte(DS18X20_WRITE_SCRATCH)?;
        bus.write_bytes(&[scratchpad.t_high(), scratchpad.t_low(), config.into_bits()])?;
        debug!("Resolution set to {} bits", resolution.bits());
        self.resolution = resolution;
        Ok(())
    }

    /// Copies the alarm and configuration registers to the sensor EEPROM.
    /// Does nothing when absent.
    pub fn save_configuration<O: OneWire>(&self, bus: &mut O) -> Ds18x20Result<(), O::BusError> {
        if !self.is_present() {
            return Ok(());
        }
        self.address(bus)?;
        bus.write_byte(DS18X20_COPY_SCRATCH)?;
        Ok(())
    }

    /// Reloads the alarm and configuration registers from the sensor EEPROM.
    /// Does nothing when absent.
    ///
    /// The tracked resolution is updated on the next read.
    pub fn recall_configuration<O: OneWire>(&self, bus: &mut O) -> Ds18x20Result<(), O::BusError> {
        if !self.is_present() {
            return Ok(());
        }
        self.address(bus)?;
        bus.write_byte(DS18X20_RECALL_EEPROM)?;
        Ok(())
    }

    /// Starts a temperature conversion and returns immediately.
    ///
    /// Wait [`conversion_time_us`](Ds18x20::conversion_time_us) before reading the result.
    /// Does nothing when absent.
    pub fn start_conversion<O: OneWire>(&self, bus: &mut O) -> Ds18x20Result<(), O::BusError> {
        if !self.is_present() {
            return Ok(());
        }
        self.address(bus)?;
        bus.write_byte(DS18X20_START_CONV)?;
        Ok(())
    }

    /// Starts a temperature conversion on every sensor of the bus at once.
    pub fn start_conversion_all<O: OneWire>(bus: &mut O) -> Ds18x20Result<(), O::BusError> {
        bus.address(None)?;
        bus.write_byte(DS18X20_START_CONV)?;
        Ok(())
    }

    /// Reads the scratchpad of the sensor. The CRC is not checked.
    ///
    /// On ModelB sensors a valid scratchpad also refreshes the tracked
    /// [`resolution`](Ds18x20::resolution).
    ///
    /// # Errors
    /// [`Ds18x20Error::NotPresent`] when absent, and bus errors.
    pub fn read_scratchpad<O: OneWire>(
        &mut self,
        bus: &mut O,
    ) -> Ds18x20Result<Scratchpad, O::BusError> {
        let Some(variant) = self.variant else {
            return Err(Ds18x20Error::NotPresent);
        };
        self.address(bus)?;
        bus.write_byte(DS18X20_READ_SCRATCH)?;
        let mut buf = [0; Scratchpad::LEN];
        bus.read_bytes(&mut buf)?;
        self.scratchpad = Scratchpad::new(buf);
        trace!("Scratchpad {:02x?}", buf);
        if variant == Variant::ModelB && self.scratchpad.is_valid() {
            self.resolution = self.scratchpad.configuration().resolution();
        }
        Ok(self.scratchpad)
    }

    /// Reads the last conversion result in °C, without checking the scratchpad CRC.
    ///
    /// Returns `0.0` without bus traffic when absent. Prefer
    /// [`read_checked`](Ds18x20::read_checked), which tells the two cases apart.
    pub fn read<O: OneWire>(&mut self, bus: &mut O) -> Ds18x20Result<f32, O::BusError> {
        let Some(variant) = self.variant else {
            return Ok(0.0);
        };
        let scratchpad = self.read_scratchpad(bus)?;
        Ok(variant.decode(&scratchpad))
    }

    /// Reads the last conversion result in °C.
    ///
    /// # Errors
    /// [`Ds18x20Error::NotPresent`] when absent, [`Ds18x20Error::InvalidCrc`] if the
    /// scratchpad is corrupted, and bus errors.
    pub fn read_checked<O: OneWire>(&mut self, bus: &mut O) -> Ds18x20Result<f32, O::BusError> {
        let Some(variant) = self.variant else {
            return Err(Ds18x20Error::NotPresent);
        };
        let scratchpad = self.read_scratchpad(bus)?;
        if !scratchpad.is_valid() {
            warn!(
                "Invalid scratchpad CRC {:02x}, expected {:02x}",
                scratchpad.crc(),
                OneWireCrc::compute(&scratchpad.as_bytes()[..8])
            );
            return Err(Ds18x20Error::InvalidCrc);
        }
        Ok(variant.decode(&scratchpad))
    }

    /// Starts a conversion, waits for it to complete and reads the checked result in °C.
    ///
    /// # Errors
    /// See [`read_checked`](Ds18x20::read_checked).
    pub fn measure<O: OneWire, D: DelayNs>(
        &mut self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds18x20Result<f32, O::BusError> {
        if !self.is_present() {
            return Err(Ds18x20Error::NotPresent);
        }
        self.start_conversion(bus)?;
        delay.delay_us(self.conversion_time_us()); // wait till conversion is finished
        self.read_checked(bus)
    }
}

const DS18X20_START_CONV: u8 = 0x44;
const DS18X20_READ_SCRATCH: u8 = 0xbe;
const DS18X20_WRITE_SCRATCH: u8 = 0x4e;
const DS18X20_COPY_SCRATCH: u8 = 0x48;
const DS18X20_RECALL_EEPROM: u8 = 0xb8;
