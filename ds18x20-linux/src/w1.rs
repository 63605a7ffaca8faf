//! Access to the DS18x20 sensors exposed by the Linux `w1` subsystem.
//!
//! Every slave gets a directory named after its ROM code, e.g. `28-0000057bc2e5`,
//! and the `w1_slave` file of a thermometer holds the scratchpad:
//!
//! ```text
//! 50 05 4b 46 7f ff 0c 10 1c : crc=1c YES
//! 50 05 4b 46 7f ff 0c 10 1c t=85000
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use ds18x20::Scratchpad;
use embedded_onewire::OneWireCrc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum W1Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid device name {0:?}")]
    InvalidName(String),
    #[error("invalid hex byte {0:?}")]
    InvalidByte(String),
    #[error("expected {expected} bytes, got {got}")]
    Length { expected: usize, got: usize },
}

/// A slave directory of the `w1` subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub rom: u64,
    pub path: PathBuf,
}

/// Rebuilds the ROM code of a device from its directory name. The kernel leaves
/// the CRC out of the name, so it is computed again.
pub fn rom_from_name(name: &str) -> Result<u64, W1Error> {
    let invalid = || W1Error::InvalidName(name.to_owned());
    let (family, serial) = name.split_once('-').ok_or_else(invalid)?;
    if family.len() != 2 || serial.len() != 12 {
        return Err(invalid());
    }
    let family = u8::from_str_radix(family, 16).map_err(|_| invalid())?;
    let serial = u64::from_str_radix(serial, 16).map_err(|_| invalid())?;
    let mut bytes = (family as u64 | serial << 8).to_le_bytes();
    bytes[7] = OneWireCrc::compute(&bytes[..7]);
    Ok(u64::from_le_bytes(bytes))
}

/// Parses nine whitespace separated hex bytes, with or without `0x` prefix.
pub fn parse_hex_bytes(text: &str) -> Result<Scratchpad, W1Error> {
    let bytes = text
        .split_whitespace()
        .map(|byte| {
            let digits = byte.trim_start_matches("0x").trim_start_matches("0X");
            u8::from_str_radix(digits, 16).map_err(|_| W1Error::InvalidByte(byte.to_owned()))
        })
        .collect::<Result<Vec<u8>, _>>()?;
    let got = bytes.len();
    let bytes: [u8; Scratchpad::LEN] = bytes.try_into().map_err(|_| W1Error::Length {
        expected: Scratchpad::LEN,
        got,
    })?;
    Ok(Scratchpad::new(bytes))
}

/// Extracts the scratchpad from the contents of a `w1_slave` file.
///
/// The kernel's own CRC verdict is ignored, the caller checks the CRC.
pub fn parse_w1_slave(contents: &str) -> Result<Scratchpad, W1Error> {
    let line = contents.lines().next().unwrap_or_default();
    let dump = line.split(':').next().unwrap_or_default();
    parse_hex_bytes(dump)
}

/// Lists the slave directories under `dir`, sorted by name.
///
/// Bus masters and entries that are not named after a ROM code are skipped.
pub fn list_devices(dir: &Path) -> Result<Vec<Device>, W1Error> {
    let mut devices = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        match rom_from_name(&name) {
            Ok(rom) => devices.push(Device {
                name,
                rom,
                path: entry.path(),
            }),
            Err(_) => log::trace!("Skipping {:?}", name),
        }
    }
    devices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(devices)
}

/// Reads the scratchpad of a device. Reading `w1_slave` makes the kernel run a conversion.
pub fn read_scratchpad(device: &Device) -> Result<Scratchpad, W1Error> {
    let contents = fs::read_to_string(device.path.join("w1_slave"))?;
    parse_w1_slave(&contents)
}
