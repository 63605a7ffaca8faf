use std::{
    convert::Infallible,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use ds18x20::{Ds18x20, Variant};
use embedded_hal::delay::DelayNs;

mod w1;

/// Reads DS18x20 temperature sensors on Linux
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a scratchpad dump
    Decode {
        /// Family code of the sensor, in hex (e.g. 28)
        #[arg(short, long, value_parser = parse_family)]
        family: Variant,
        /// The nine scratchpad bytes, in hex
        #[arg(required = true, num_args = 1..)]
        bytes: Vec<String>,
        /// Decode even if the scratchpad CRC does not match
        #[arg(long)]
        no_crc: bool,
    },
    /// Read the sensors exposed by the w1 kernel subsystem
    Sysfs {
        /// Path to the w1 devices directory
        #[arg(short, long, default_value = "/sys/bus/w1/devices")]
        path: PathBuf,
        /// Read again every INTERVAL milliseconds
        #[arg(short, long)]
        interval: Option<u32>,
    },
}

/// Family code in hex, accepted only if it belongs to a DS18x20 sensor.
fn parse_family(s: &str) -> Result<Variant, String> {
    let digits = s.trim_start_matches("0x");
    let family =
        u8::from_str_radix(digits, 16).map_err(|e| format!("invalid family code {s:?}: {e}"))?;
    Variant::from_family_code(family)
        .ok_or_else(|| format!("family code {family:#04x} is not a DS18x20 sensor"))
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    match args.command {
        Command::Decode {
            family,
            bytes,
            no_crc,
        } => decode(family, &bytes.join(" "), no_crc),
        Command::Sysfs { path, interval } => sysfs(&path, interval),
    }
}

fn decode(variant: Variant, bytes: &str, no_crc: bool) {
    let scratchpad = w1::parse_hex_bytes(bytes).expect("Failed to parse scratchpad");
    if !scratchpad.is_valid() {
        if no_crc {
            log::warn!("Scratchpad CRC mismatch, decoding anyway");
        } else {
            log::error!("Scratchpad CRC mismatch");
            std::process::exit(1);
        }
    }
    if variant == Variant::ModelB {
        log::info!(
            "Resolution: {} bits",
            scratchpad.configuration().resolution().bits()
        );
    }
    println!("{}", variant.temperature(&scratchpad));
}

fn sysfs(path: &Path, interval: Option<u32>) {
    let mut delay = linux_embedded_hal::Delay;
    loop {
        // Enumerate devices known to the kernel
        let devices = w1::list_devices(path).expect("Failed to list 1-Wire devices");
        log::info!("Found {} devices", devices.len());
        for device in devices.iter() {
            let sensor = match Ds18x20::from_rom::<Infallible>(device.rom) {
                Ok(sensor) => sensor,
                Err(e) => {
                    log::debug!("Skipping {}: {}", device.name, e);
                    continue;
                }
            };
            let Some(variant) = sensor.variant() else {
                continue;
            };
            match w1::read_scratchpad(device) {
                Ok(scratchpad) if scratchpad.is_valid() => {
                    log::info!(
                        "ROM: {:x}, Temperature: {}",
                        device.rom,
                        variant.temperature(&scratchpad)
                    );
                }
                Ok(_) => log::warn!("{}: scratchpad CRC mismatch", device.name),
                Err(e) => log::warn!("{}: {}", device.name, e),
            }
        }
        let Some(interval) = interval else {
            break;
        };
        delay.delay_ms(interval);
    }
}
