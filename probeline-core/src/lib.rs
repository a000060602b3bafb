//! Board-agnostic core of the serial debugger
//!
//! This crate contains everything that runs on the device and does not depend
//! on a specific chip:
//!
//! - Typed values and arrays to log
//! - Text formatting of scalars, arrays and bit registers
//! - The [`Debugger`] service that writes log lines to a transport
//! - The breakpoint gate that halts until the host answers `ok`
//! - Debugger configuration

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod debugger;
pub mod format;
pub mod gate;
pub mod value;

#[cfg(test)]
mod mock;

pub use config::{DebuggerConfig, LineEnding};
pub use debugger::Debugger;
pub use gate::{CancelToken, GateOutcome, GateState, Label};
pub use value::{Register, Value, ValueArray, ValueKind};
