#![allow(dead_code)]

use embedded_onewire::{OneWire, OneWireCrc, OneWireError, OneWireResult, OneWireStatus};

pub struct Presence(bool);

impl OneWireStatus for Presence {
    fn presence(&self) -> bool {
        self.0
    }

    fn shortcircuit(&self) -> bool {
        false
    }
}

/// Builds a ROM code with a valid CRC.
pub fn rom(family: u8, serial: u64) -> u64 {
    let mut bytes = (family as u64 | serial << 8).to_le_bytes();
    bytes[7] = OneWireCrc::compute(&bytes[..7]);
    u64::from_le_bytes(bytes)
}

fn with_crc(mut scratchpad: [u8; 9]) -> [u8; 9] {
    scratchpad[8] = OneWireCrc::compute(&scratchpad[..8]);
    scratchpad
}

/// A simulated DS18x20 sensor.
#[derive(Debug, Clone)]
pub struct Sensor {
    pub rom: u64,
    pub scratchpad: [u8; 9],
    pub eeprom: [u8; 3],
    /// Temperature register and count remain loaded by the next conversion.
    pub conversion: ([u8; 2], u8),
    /// Flip a bit of the CRC byte on every scratchpad read.
    pub corrupt: bool,
}

impl Sensor {
    pub fn ds18b20(serial: u64) -> Self {
        Self {
            rom: rom(0x28, serial),
            scratchpad: with_crc([0x50, 0x05, 0x4b, 0x46, 0x7f, 0xff, 0x0c, 0x10, 0]),
            eeprom: [0x4b, 0x46, 0x7f],
            conversion: ([0x91, 0x01], 0x0c),
            corrupt: false,
        }
    }

    pub fn ds18s20(serial: u64) -> Self {
        Self {
            rom: rom(0x10, serial),
            scratchpad: with_crc([0xaa, 0x00, 0x4b, 0x46, 0xff, 0xff, 0x0c, 0x10, 0]),
            eeprom: [0x4b, 0x46, 0xff],
            conversion: ([0x32, 0x00], 0x0c),
            corrupt: false,
        }
    }

    /// Any device, with the given family code.
    pub fn other(family: u8, serial: u64) -> Self {
        Self {
            rom: rom(family, serial),
            ..Self::ds18b20(serial)
        }
    }

    pub fn with_rom(mut self, rom: u64) -> Self {
        self.rom = rom;
        self
    }

    pub fn with_conversion(mut self, raw: u16, count_remain: u8) -> Self {
        self.conversion = (raw.to_le_bytes(), count_remain);
        self
    }

    pub fn with_configuration(mut self, cfg: u8) -> Self {
        self.scratchpad[4] = cfg;
        self.scratchpad = with_crc(self.scratchpad);
        self
    }

    pub fn corrupted(mut self) -> Self {
        self.corrupt = true;
        self
    }

    fn is_model_s(&self) -> bool {
        self.rom as u8 == 0x10
    }

    fn convert(&mut self) {
        let ([lsb, msb], count_remain) = self.conversion;
        self.scratchpad[0] = lsb;
        self.scratchpad[1] = msb;
        self.scratchpad[6] = count_remain;
        self.scratchpad = with_crc(self.scratchpad);
    }

    fn write(&mut self, offset: usize, byte: u8) {
        // ModelS sensors only have the two alarm registers
        if offset == 2 && self.is_model_s() {
            return;
        }
        self.scratchpad[2 + offset] = byte;
        self.scratchpad = with_crc(self.scratchpad);
    }

    fn read(&self) -> [u8; 9] {
        let mut buf = self.scratchpad;
        if self.corrupt {
            buf[8] ^= 0x01;
        }
        buf
    }

    fn id_bit(&self, bit: u8) -> bool {
        self.rom >> bit & 1 == 1
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Rom,
    MatchRom(Vec<u8>),
    Function,
    Search { bit: u8, slot: u8 },
    WriteScratch(usize),
    Read(Vec<u8>),
}

/// A 1-Wire bus with simulated sensors attached.
///
/// Every byte written by the master is recorded in `written`, and every call into the
/// bus counts as traffic.
#[derive(Debug)]
pub struct FakeBus {
    pub sensors: Vec<Sensor>,
    pub written: Vec<u8>,
    pub traffic: usize,
    /// Every operation fails with a bus error.
    pub broken: bool,
    state: State,
    selected: Vec<usize>,
}

impl FakeBus {
    pub fn new(sensors: Vec<Sensor>) -> Self {
        Self {
            sensors,
            written: Vec::new(),
            traffic: 0,
            broken: false,
            state: State::Idle,
            selected: Vec::new(),
        }
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::new(vec![Sensor::ds18b20(1)])
        }
    }

    /// Whether `pattern` was written to the bus as a contiguous run of bytes.
    pub fn wrote(&self, pattern: &[u8]) -> bool {
        self.written.windows(pattern.len()).any(|w| w == pattern)
    }

    fn access(&mut self) -> OneWireResult<(), ()> {
        self.traffic += 1;
        if self.broken {
            Err(OneWireError::Other(()))
        } else {
            Ok(())
        }
    }

    fn function(&mut self, cmd: u8) {
        self.state = State::Idle;
        match cmd {
            0x44 => {
                for &i in self.selected.iter() {
                    self.sensors[i].convert();
                }
            }
            0xbe => {
                // wired-AND of every selected scratchpad
                let mut buf = [0xff; 9];
                for &i in self.selected.iter() {
                    for (b, s) in buf.iter_mut().zip(self.sensors[i].read()) {
                        *b &= s;
                    }
                }
                self.state = State::Read(buf.into_iter().rev().collect());
            }
            0x4e => self.state = State::WriteScratch(0),
            0x48 => {
                for &i in self.selected.iter() {
                    let sensor = &mut self.sensors[i];
                    sensor.eeprom.copy_from_slice(&sensor.scratchpad[2..5]);
                }
            }
            0xb8 => {
                for &i in self.selected.iter() {
                    let sensor = &mut self.sensors[i];
                    let eeprom = sensor.eeprom;
                    sensor.scratchpad[2..5].copy_from_slice(&eeprom);
                    sensor.scratchpad = with_crc(sensor.scratchpad);
                }
            }
            _ => {}
        }
    }
}

impl OneWire for FakeBus {
    type Status = Presence;
    type BusError = ();

    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError> {
        self.access()?;
        self.state = State::Rom;
        self.selected = (0..self.sensors.len()).collect();
        Ok(Presence(!self.sensors.is_empty()))
    }

    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        self.access()?;
        self.written.push(byte);
        match core::mem::replace(&mut self.state, State::Idle) {
            State::Rom => match byte {
                0x55 => self.state = State::MatchRom(Vec::new()),
                0xcc => self.state = State::Function,
                0xf0 => self.state = State::Search { bit: 0, slot: 0 },
                0xec => {
                    // no sensor is in alarm
                    self.selected.clear();
                    self.state = State::Search { bit: 0, slot: 0 };
                }
                _ => {}
            },
            State::MatchRom(mut rom) => {
                rom.push(byte);
                if rom.len() == 8 {
                    let rom = u64::from_le_bytes(rom.try_into().unwrap());
                    let sensors = &self.sensors;
                    self.selected.retain(|&i| sensors[i].rom == rom);
                    self.state = State::Function;
                } else {
                    self.state = State::MatchRom(rom);
                }
            }
            State::Function => self.function(byte),
            State::WriteScratch(offset) => {
                for &i in self.selected.iter() {
                    self.sensors[i].write(offset, byte);
                }
                if offset < 2 {
                    self.state = State::WriteScratch(offset + 1);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        self.access()?;
        match &mut self.state {
            State::Read(buf) => Ok(buf.pop().unwrap_or(0xff)),
            _ => Ok(0xff),
        }
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        self.access()?;
        if let State::Search { bit: index, slot } = &mut self.state {
            let sensors = &self.sensors;
            let position = *index;
            self.selected.retain(|&i| sensors[i].id_bit(position) == bit);
            *index += 1;
            *slot = 0;
        }
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        self.access()?;
        let State::Search { bit, slot } = &mut self.state else {
            return Ok(true);
        };
        let complement = *slot == 1;
        *slot += 1;
        let bit = *bit;
        Ok(self
            .selected
            .iter()
            .all(|&i| self.sensors[i].id_bit(bit) != complement))
    }
}
