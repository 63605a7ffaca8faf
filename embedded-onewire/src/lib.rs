#![no_std]
#![deny(missing_docs)]
//! # embedded-onewire
//! A no-std implementation of the 1-Wire protocol.
//!
//! This crate provides a trait-based interface for 1-Wire communication, allowing device drivers to be
//! written once and used with any bus master.
//! The [OneWire] trait defines the basic operations required for 1-Wire communication, such as resetting the bus,
//! writing and reading bytes, writing and reading bits, and addressing devices.
//!
//! The crate also provides the ROM search algorithm for discovering devices on the bus, implemented by
//! the [OneWireSearch] cursor, and the CRC-8 used to protect ROM codes and device memory, [OneWireCrc].

#[cfg(test)]
extern crate std;

pub mod consts;
mod error;
mod search;
mod traits;
mod utils;
pub use consts::*;
pub use error::OneWireError;
pub use search::{OneWireSearch, OneWireSearchIter, OneWireSearchKind};
pub use traits::{OneWire, OneWireStatus};
pub use utils::OneWireCrc;

/// Error type for 1-Wire operations.
pub type OneWireResult<T, E> = Result<T, OneWireError<E>>;
