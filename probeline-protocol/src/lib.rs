//! Probeline Text Line Protocol
//!
//! This crate defines the line-oriented text protocol between firmware running
//! the debugger and the host-side monitor. The protocol is designed to be
//! readable in a plain serial terminal.
//!
//! # Protocol Overview
//!
//! Device → host, one record per CRLF-terminated line:
//! ```text
//! log <free text>
//! log breakpoint <label>
//! log variable <name> <scalar>
//! log variable <name> [<e0>,<e1>,...,<eN>]
//! ```
//!
//! Host → device: the bare acknowledgement token `ok` (any letter case),
//! which releases a device halted at a breakpoint. Everything else is ignored.
//!
//! The device only ever writes records; the parsing half of this crate is for
//! the host.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod line;
pub mod record;
pub mod session;

pub use line::{LineAssembler, LineError};
pub use record::{Record, RecordError, Scalar, ScalarList, VariableValue};
pub use session::{HostSession, VariableStats};

/// Prefix shared by every device record
pub const LOG_PREFIX: &str = "log";

/// Keyword for variable records (after the log prefix)
pub const VARIABLE_KEYWORD: &str = "variable";

/// Keyword for breakpoint records (after the log prefix)
pub const BREAKPOINT_KEYWORD: &str = "breakpoint";

/// Label written for a breakpoint without id or name
pub const ANONYMOUS_BREAKPOINT_ID: i32 = -1;

/// Token that releases a breakpoint
pub const ACK_TOKEN: &str = "ok";

/// Maximum line length in bytes, including the line terminator
pub const MAX_LINE_LEN: usize = 256;

/// Line terminator written after every record
pub const LINE_TERMINATOR: &str = "\r\n";

/// Check whether received input is the acknowledgement token
///
/// The whole input must match; surrounding whitespace or line endings make it
/// a different token.
pub fn is_ack(input: &[u8]) -> bool {
    input.eq_ignore_ascii_case(ACK_TOKEN.as_bytes())
}
