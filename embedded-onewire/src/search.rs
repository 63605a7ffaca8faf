use crate::{
    OneWire, OneWireStatus, ONEWIRE_CONDITIONAL_SEARCH_CMD, ONEWIRE_SEARCH_CMD,
    error::OneWireError,
};

/// Search cursor for discovering devices on a 1-Wire bus.
///
/// The cursor implements the [1-Wire search algorithm](https://www.analog.com/en/resources/app-notes/1wire-search-algorithm.html)
/// and holds all of its state. It does not borrow the bus: every call to [next](OneWireSearch::next)
/// takes the bus explicitly, so devices found by the search can be talked to between two steps of
/// the enumeration.
#[derive(Debug, Clone)]
pub struct OneWireSearch {
    cmd: u8,
    last_device: bool,
    last_discrepancy: u8,
    family: u8,
    rom: [u8; 8],
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Type of search performed using [`OneWireSearch`].
pub enum OneWireSearchKind {
    /// Normal search
    Normal = ONEWIRE_SEARCH_CMD,
    /// Search only for devices with alarm
    Alarmed = ONEWIRE_CONDITIONAL_SEARCH_CMD,
}

impl Default for OneWireSearch {
    fn default() -> Self {
        Self::new(OneWireSearchKind::Normal)
    }
}

impl OneWireSearch {
    /// Creates a new [`OneWireSearch`] cursor positioned before the first device.
    ///
    /// # Arguments
    /// * `kind` - The search to run, see [`OneWireSearchKind`].
    pub fn new(kind: OneWireSearchKind) -> Self {
        Self {
            cmd: kind as _,
            last_device: false,
            last_discrepancy: 0,
            family: 0,
            rom: [0; 8],
        }
    }

    /// Creates a new [`OneWireSearch`] cursor that only reports devices of a specific family.
    ///
    /// Devices of other families are still walked by the search but skipped.
    /// # Arguments
    /// * `kind` - The search to run, see [`OneWireSearchKind`].
    /// * `family` - The family code of the devices to search for.
    pub fn with_family(kind: OneWireSearchKind, family: u8) -> Self {
        Self {
            family,
            ..Self::new(kind)
        }
    }

    /// Resets the search state, so that the next call to [next](OneWireSearch::next)
    /// starts a new enumeration from the first device.
    pub fn reset(&mut self) {
        self.last_device = false;
        self.last_discrepancy = 0;
        self.rom = [0; 8];
    }

    /// Whether the last device on the bus has been reported.
    pub fn is_exhausted(&self) -> bool {
        self.last_device
    }

    /// Turns the cursor into an iterator over the ROM codes on `onewire`.
    pub fn iter<T: OneWire>(self, onewire: &mut T) -> OneWireSearchIter<'_, T> {
        OneWireSearchIter {
            search: Some(self),
            onewire,
        }
    }

    /// Searches for the next device on the 1-Wire bus.
    ///
    /// This method can be called repeatedly to find all devices on the bus.
    /// Once all devices have been reported, it returns `None` until the cursor is [reset](OneWireSearch::reset).
    ///
    /// The ROM code is returned as read from the bus; its CRC byte is **not** validated here,
    /// use [`OneWireCrc::validate`](crate::OneWireCrc::validate) on `rom.to_le_bytes()`.
    ///
    /// # Returns
    /// A result containing the ROM code of the found device as a `u64` value.
    ///
    /// | Bit | Description |
    /// |-----|-------------|
    /// | 0-7 | Family code (e.g., 0x28 for DS18B20) |
    /// | 8-55 | Serial number, least significant byte first |
    /// | 56-63 | CRC-8 (`0b1_0001_1001` poly) |
    ///
    /// # Errors
    /// [`OneWireError::NoDevicePresent`] if no device answers the reset pulse,
    /// [`OneWireError::ShortCircuit`] if the bus is shorted, and any bus error.
    #[allow(clippy::should_implement_trait)]
    pub fn next<T: OneWire>(
        &mut self,
        onewire: &mut T,
    ) -> Result<Option<u64>, OneWireError<T::BusError>> {
        loop {
            let Some(rom) = self.step(onewire)? else {
                return Ok(None);
            };
            if self.family == 0 || rom as u8 == self.family {
                return Ok(Some(rom));
            }
        }
    }

    /// Verifies if the device with the given ROM code is present on the 1-Wire bus.
    ///
    /// This function resets the search state, and calling [next](OneWireSearch::next)
    /// after this call will start a new search.
    pub fn verify<T: OneWire>(
        &mut self,
        onewire: &mut T,
        rom: u64,
    ) -> Result<bool, OneWireError<T::BusError>> {
        self.reset();
        self.rom = rom.to_le_bytes(); // Walk the path of the ROM to verify
        self.last_discrepancy = 64;
        let res = self.step(onewire)?;
        self.reset();
        Ok(res == Some(rom))
    }

    /// One pass of the search algorithm over the 64 ROM bits.
    fn step<T: OneWire>(
        &mut self,
        onewire: &mut T,
    ) -> Result<Option<u64>, OneWireError<T::BusError>> {
        if self.last_device {
            return Ok(None);
        }
        let status = onewire.reset()?;
        if status.shortcircuit() {
            return Err(OneWireError::ShortCircuit);
        }
        if !status.presence() {
            return Err(OneWireError::NoDevicePresent);
        }
        let mut id_bit_num: u8 = 1;
        let mut last_zero: u8 = 0;
        let mut idx: usize = 0; // Index in the ROM array
        let mut rom_mask: u8 = 1; // Mask for the current bit in the ROM byte
        onewire.write_byte(self.cmd)?;
        let found = loop {
            // Direction to take if the devices disagree on this bit
            let dir = if id_bit_num < self.last_discrepancy {
                self.rom[idx] & rom_mask > 0
            } else {
                id_bit_num == self.last_discrepancy
            };
            let (id_bit, complement_bit, taken, write) = match onewire.read_triplet(dir) {
                Ok((id_bit, complement_bit, taken)) => (id_bit, complement_bit, taken, false),
                Err(OneWireError::Unimplemented) => {
                    let id_bit = onewire.read_bit()?;
                    let complement_bit = onewire.read_bit()?;
                    (id_bit, complement_bit, dir, true)
                }
                Err(e) => return Err(e),
            };
            if id_bit && complement_bit {
                // No device took part in this time slot
                break false;
            }
            let set = if id_bit != complement_bit {
                id_bit
            } else {
                if !taken {
                    last_zero = id_bit_num;
                }
                taken
            };
            if set {
                self.rom[idx] |= rom_mask;
            } else {
                self.rom[idx] &= !rom_mask;
            }
            if write {
                onewire.write_bit(set)?;
            }

            id_bit_num += 1;
            rom_mask <<= 1;
            if rom_mask == 0 {
                idx += 1;
                rom_mask = 1;
            }
            if id_bit_num > 64 {
                self.last_discrepancy = last_zero;
                self.last_device = self.last_discrepancy == 0;
                break true;
            }
        };

        if !found || self.rom[0] == 0 {
            // Nothing sensible was read, start over on the next call
            self.reset();
            return Ok(None);
        }
        Ok(Some(u64::from_le_bytes(self.rom)))
    }
}

/// Iterator over the ROM codes found by a [`OneWireSearch`].
///
/// Stops after the first error.
pub struct OneWireSearchIter<'a, T> {
    search: Option<OneWireSearch>,
    onewire: &'a mut T,
}

impl<T: OneWire> Iterator for OneWireSearchIter<'_, T> {
    type Item = Result<u64, OneWireError<T::BusError>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut search = self.search.take()?;
        let result = search.next(self.onewire).transpose()?;
        if result.is_ok() {
            self.search = Some(search);
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::{OneWireSearch, OneWireSearchKind};
    use crate::{OneWire, OneWireCrc, OneWireError, OneWireResult, OneWireStatus};
    use rand::Rng;
    use std::vec::Vec;

    struct Presence(bool);

    impl OneWireStatus for Presence {
        fn presence(&self) -> bool {
            self.0
        }

        fn shortcircuit(&self) -> bool {
            false
        }
    }

    /// Wired-AND bus with devices that only understand the search command.
    struct SearchBus {
        roms: Vec<u64>,
        active: Vec<bool>,
        bit: u32,
        complement_next: bool,
        triplet: bool,
    }

    impl SearchBus {
        fn new(roms: &[u64]) -> Self {
            Self {
                roms: roms.to_vec(),
                active: Vec::new(),
                bit: 0,
                complement_next: false,
                triplet: false,
            }
        }

        fn sample(&self, complement: bool) -> bool {
            self.roms
                .iter()
                .zip(self.active.iter())
                .filter(|(_, active)| **active)
                .all(|(rom, _)| ((rom >> self.bit) & 1 == 1) != complement)
        }

        fn select(&mut self, dir: bool) {
            for (rom, active) in self.roms.iter().zip(self.active.iter_mut()) {
                if ((rom >> self.bit) & 1 == 1) != dir {
                    *active = false;
                }
            }
            self.bit += 1;
        }
    }

    impl OneWire for SearchBus {
        type Status = Presence;
        type BusError = ();

        fn reset(&mut self) -> OneWireResult<Presence, ()> {
            self.active = std::vec![true; self.roms.len()];
            self.bit = 0;
            self.complement_next = false;
            Ok(Presence(!self.roms.is_empty()))
        }

        fn write_byte(&mut self, _byte: u8) -> OneWireResult<(), ()> {
            Ok(())
        }

        fn read_byte(&mut self) -> OneWireResult<u8, ()> {
            Ok(0xff)
        }

        fn write_bit(&mut self, bit: bool) -> OneWireResult<(), ()> {
            self.select(bit);
            Ok(())
        }

        fn read_bit(&mut self) -> OneWireResult<bool, ()> {
            let bit = self.sample(self.complement_next);
            self.complement_next = !self.complement_next;
            Ok(bit)
        }

        fn read_triplet(&mut self, direction: bool) -> OneWireResult<(bool, bool, bool), ()> {
            if !self.triplet {
                return Err(OneWireError::Unimplemented);
            }
            let id_bit = self.sample(false);
            let complement_bit = self.sample(true);
            let taken = match (id_bit, complement_bit) {
                (false, false) => direction,
                (id_bit, _) => id_bit,
            };
            self.select(taken);
            Ok((id_bit, complement_bit, taken))
        }
    }

    fn with_crc(family: u8, serial: u64) -> u64 {
        let mut bytes = (family as u64 | (serial & 0xffff_ffff_ffff) << 8).to_le_bytes();
        bytes[7] = OneWireCrc::compute(&bytes[..7]);
        u64::from_le_bytes(bytes)
    }

    fn sorted_by_search_order(roms: &[u64]) -> Vec<u64> {
        // The search takes the 0 branch first, starting from the least significant bit
        let mut sorted = roms.to_vec();
        sorted.sort_by_key(|rom| rom.reverse_bits());
        sorted
    }

    #[test]
    fn finds_single_device() {
        let rom = with_crc(0x28, 0x0000_057b_c2e5);
        let mut bus = SearchBus::new(&[rom]);
        let mut search = OneWireSearch::default();
        assert_eq!(search.next(&mut bus), Ok(Some(rom)));
        assert!(search.is_exhausted());
        assert_eq!(search.next(&mut bus), Ok(None));
    }

    #[test]
    fn enumerates_all_devices_in_order() {
        let roms = [
            with_crc(0x28, 0x0000_057b_c2e5),
            with_crc(0x10, 0x0008_024d_496e),
            with_crc(0x22, 0x0000_0012_3456),
            with_crc(0x28, 0x0000_057b_c2e4),
        ];
        let mut bus = SearchBus::new(&roms);
        let found: Vec<u64> = OneWireSearch::default()
            .iter(&mut bus)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(found, sorted_by_search_order(&roms));
    }

    #[test]
    fn triplet_and_bitwise_agree() {
        let mut rng = rand::rng();
        let roms: Vec<u64> = (0..12)
            .map(|_| with_crc(rng.random_range(1..=0xff), rng.random()))
            .collect();
        let mut bitwise = SearchBus::new(&roms);
        let mut triplet = SearchBus::new(&roms);
        triplet.triplet = true;
        let a: Vec<u64> = OneWireSearch::default()
            .iter(&mut bitwise)
            .collect::<Result<_, _>>()
            .unwrap();
        let b: Vec<u64> = OneWireSearch::default()
            .iter(&mut triplet)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a, sorted_by_search_order(&roms));
    }

    #[test]
    fn family_filter_skips_other_devices() {
        let sensor = with_crc(0x28, 0x0000_0000_0001);
        let roms = [with_crc(0x10, 0x0000_0000_0002), sensor, with_crc(0x01, 0x2)];
        let mut bus = SearchBus::new(&roms);
        let mut search = OneWireSearch::with_family(OneWireSearchKind::Normal, 0x28);
        assert_eq!(search.next(&mut bus), Ok(Some(sensor)));
        assert_eq!(search.next(&mut bus), Ok(None));
    }

    #[test]
    fn reset_restarts_enumeration() {
        let roms = [with_crc(0x28, 0x1), with_crc(0x28, 0x2)];
        let mut bus = SearchBus::new(&roms);
        let mut search = OneWireSearch::default();
        let first = search.next(&mut bus).unwrap();
        search.next(&mut bus).unwrap();
        search.reset();
        assert_eq!(search.next(&mut bus).unwrap(), first);
    }

    #[test]
    fn empty_bus_reports_no_presence() {
        let mut bus = SearchBus::new(&[]);
        let mut search = OneWireSearch::default();
        assert_eq!(search.next(&mut bus), Err(OneWireError::NoDevicePresent));
    }

    #[test]
    fn verify_known_and_unknown_rom() {
        let roms = [with_crc(0x28, 0x1), with_crc(0x28, 0x2), with_crc(0x10, 0x3)];
        let mut bus = SearchBus::new(&roms);
        let mut search = OneWireSearch::default();
        for &rom in roms.iter() {
            assert_eq!(search.verify(&mut bus, rom), Ok(true));
        }
        assert_eq!(search.verify(&mut bus, with_crc(0x28, 0x4)), Ok(false));
    }
}
