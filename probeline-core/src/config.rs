//! Debugger configuration
//!
//! The defaults reproduce the wire format host monitors expect; changing
//! them is only useful with a matching host.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of fractional digits for floats
pub const DEFAULT_FLOAT_DECIMALS: u8 = 5;

/// Largest supported number of fractional digits
pub const MAX_FLOAT_DECIMALS: u8 = 9;

/// Default quiet gap, in empty polls, that ends an input token
///
/// Long enough to bridge the gap between two characters at 9600 baud on a
/// 125 MHz core.
pub const DEFAULT_ACK_IDLE_POLLS: u32 = 20_000;

/// Line terminator written after each record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LineEnding {
    /// `\r\n`, what serial terminals and the host monitor expect
    #[default]
    CrLf,
    /// `\n`
    Lf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::CrLf => probeline_protocol::LINE_TERMINATOR,
            LineEnding::Lf => "\n",
        }
    }
}

/// Debugger configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DebuggerConfig {
    /// Fractional digits written for floats (capped at [`MAX_FLOAT_DECIMALS`])
    pub float_decimals: u8,
    /// Terminator appended to every line
    pub line_ending: LineEnding,
    /// Consecutive empty polls after which pending input counts as one
    /// complete token at a breakpoint
    pub ack_idle_polls: u32,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            float_decimals: DEFAULT_FLOAT_DECIMALS,
            line_ending: LineEnding::CrLf,
            ack_idle_polls: DEFAULT_ACK_IDLE_POLLS,
        }
    }
}

impl DebuggerConfig {
    /// Float digits actually used
    pub fn effective_float_decimals(&self) -> u8 {
        self.float_decimals.min(MAX_FLOAT_DECIMALS)
    }
}
