//! Breakpoint gate
//!
//! A breakpoint halts the single thread of control until the host sends the
//! acknowledgement token. The gate busy-waits on the transport: no timeout,
//! no yield to a scheduler. Input that arrives while halted is gathered into
//! one token until the line stays quiet for a configured number of polls;
//! anything other than `ok` (any case) is discarded.
//!
//! The cancellable variant additionally watches a [`CancelToken`], which an
//! interrupt handler or another core can set to end a debug session.

use core::fmt;

use portable_atomic::{AtomicBool, Ordering};
use probeline_hal::SerialRx;
use probeline_protocol::{is_ack, ANONYMOUS_BREAKPOINT_ID};

use crate::config::DEFAULT_ACK_IDLE_POLLS;

/// Bytes kept of one input token; longer tokens can never be `ok`
const ACK_BUFFER_LEN: usize = 16;

/// Gate states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateState {
    /// Program executes normally
    #[default]
    Running,
    /// Halted at a breakpoint, polling for the acknowledgement
    AwaitingAck,
}

/// How a wait at a breakpoint ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateOutcome {
    /// Host acknowledged
    Resumed,
    /// Cancel token was set
    Cancelled,
}

/// Breakpoint label as written on the wire
///
/// An anonymous breakpoint is written with id `-1`, so it cannot be told
/// apart from `Id(-1)` by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Label<'a> {
    Anonymous,
    Id(i32),
    Name(&'a str),
}

impl fmt::Display for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Anonymous => write!(f, "{}", ANONYMOUS_BREAKPOINT_ID),
            Label::Id(id) => write!(f, "{}", id),
            Label::Name(name) => f.write_str(name),
        }
    }
}

/// Flag that ends a cancellable breakpoint wait
///
/// Safe to set from interrupt context. Stays set until [`reset`](Self::reset).
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
}

impl CancelToken {
    pub const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// The gate state machine
#[derive(Debug)]
pub struct BreakpointGate {
    state: GateState,
    idle_polls: u32,
}

impl Default for BreakpointGate {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakpointGate {
    pub fn new() -> Self {
        Self::with_idle_polls(DEFAULT_ACK_IDLE_POLLS)
    }

    /// Create a gate that ends an input token after `idle_polls` empty polls
    pub fn with_idle_polls(idle_polls: u32) -> Self {
        Self {
            state: GateState::Running,
            idle_polls,
        }
    }

    /// Current state
    ///
    /// [`GateState::AwaitingAck`] only holds inside [`wait`](Self::wait); a
    /// single-threaded caller always sees [`GateState::Running`].
    pub fn state(&self) -> GateState {
        self.state
    }

    /// Block until the host acknowledges or `cancel` is set
    ///
    /// Without a cancel token this only returns on acknowledgement.
    pub fn wait<R: SerialRx>(&mut self, rx: &mut R, cancel: Option<&CancelToken>) -> GateOutcome {
        self.state = GateState::AwaitingAck;
        #[cfg(feature = "defmt")]
        defmt::debug!("Halted, waiting for host acknowledgement");

        let outcome = self.wait_for_ack(rx, cancel);

        self.state = GateState::Running;
        #[cfg(feature = "defmt")]
        defmt::debug!("Breakpoint left: {}", outcome);
        outcome
    }

    fn wait_for_ack<R: SerialRx>(&self, rx: &mut R, cancel: Option<&CancelToken>) -> GateOutcome {
        loop {
            // Peek until input is pending
            loop {
                if is_cancelled(cancel) {
                    return GateOutcome::Cancelled;
                }
                if let Ok(true) = rx.poll_available() {
                    break;
                }
                core::hint::spin_loop();
            }

            match self.read_token(rx, cancel) {
                Token::Ack => return GateOutcome::Resumed,
                Token::Cancelled => return GateOutcome::Cancelled,
                Token::Other => {}
            }
        }
    }

    /// Gather input until the line stays quiet for `idle_polls` polls, then
    /// compare the whole token against `ok`
    fn read_token<R: SerialRx>(&self, rx: &mut R, cancel: Option<&CancelToken>) -> Token {
        let mut token = [0u8; ACK_BUFFER_LEN];
        let mut len = 0;
        let mut oversized = false;
        let mut chunk = [0u8; ACK_BUFFER_LEN];

        loop {
            let n = rx.read_available(&mut chunk).unwrap_or(0);
            if n == 0 {
                break;
            }
            if len + n <= token.len() {
                token[len..len + n].copy_from_slice(&chunk[..n]);
                len += n;
            } else {
                // Longer than any acknowledgement; keep draining
                oversized = true;
            }

            match self.await_more(rx, cancel) {
                Some(true) => {}
                Some(false) => break,
                None => return Token::Cancelled,
            }
        }

        if !oversized && is_ack(&token[..len]) {
            return Token::Ack;
        }
        #[cfg(feature = "defmt")]
        {
            if oversized {
                defmt::debug!("Ignoring oversized input token");
            } else {
                defmt::debug!("Ignoring non-acknowledgement input: {=[u8]:a}", &token[..len]);
            }
        }
        Token::Other
    }

    /// Poll until input shows up again or the quiet gap elapses
    ///
    /// Returns `Some(true)` for more input, `Some(false)` for a quiet line
    /// and `None` when cancelled.
    fn await_more<R: SerialRx>(&self, rx: &mut R, cancel: Option<&CancelToken>) -> Option<bool> {
        for _ in 0..self.idle_polls {
            if is_cancelled(cancel) {
                return None;
            }
            if let Ok(true) = rx.poll_available() {
                return Some(true);
            }
            core::hint::spin_loop();
        }
        Some(false)
    }
}

/// Result of reading one input token
enum Token {
    Ack,
    Other,
    Cancelled,
}

fn is_cancelled(cancel: Option<&CancelToken>) -> bool {
    cancel.is_some_and(CancelToken::is_cancelled)
}
