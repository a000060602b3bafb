//! Probeline Hardware Abstraction Layer
//!
//! This crate defines the transport traits the debugger talks through. A
//! transport is any bidirectional character stream (a hardware UART, a USB
//! CDC-ACM port, a test double) that can report whether input is pending
//! without blocking.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Firmware (probeline-firmware, etc.)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  probeline-core (Debugger, gate)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  probeline-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  embedded-io implementors (UARTs, ...)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`transport::SerialTx`], [`transport::SerialRx`] - Character stream halves
//! - [`transport::Transport`] - Combined stream with a readiness check
//!
//! The transport lifecycle (baud rate, pins, open/close) stays with the
//! surrounding firmware.

#![no_std]
#![deny(unsafe_code)]

pub mod transport;

pub use transport::{IoTransport, SerialRx, SerialTx, Transport};
