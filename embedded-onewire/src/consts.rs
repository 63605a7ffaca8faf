//! Command constants for 1-Wire communication.

/// Command to match a specific ROM address in 1-Wire communication.
/// The bus master sends the 64-bit ROM code after this command, and only the
/// device with that exact code responds to the following function command.
pub const ONEWIRE_MATCH_ROM_CMD: u8 = 0x55;

/// Command to skip ROM addressing in 1-Wire communication.
/// Every device on the bus treats the following function command as addressed
/// to it. Reads after Skip ROM are only meaningful with a single device on the bus.
pub const ONEWIRE_SKIP_ROM_CMD: u8 = 0xcc;

/// Command to search for devices on the 1-Wire bus
pub const ONEWIRE_SEARCH_CMD: u8 = 0xf0;

/// Command to search for devices in alarm state on the 1-Wire bus
pub const ONEWIRE_CONDITIONAL_SEARCH_CMD: u8 = 0xec;
