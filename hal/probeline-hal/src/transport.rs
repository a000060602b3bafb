//! Serial transport abstractions
//!
//! Provides the blocking character-stream traits the debugger needs, plus an
//! adapter for anything implementing the `embedded-io` traits.

use embedded_io::{Read, ReadReady, Write};

/// Serial transmitter
pub trait SerialTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the stream
    ///
    /// Blocks until all data has been written or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Serial receiver
pub trait SerialRx {
    /// Error type for receive operations
    type Error;

    /// Check whether at least one byte can be read without blocking
    fn poll_available(&mut self) -> Result<bool, Self::Error>;

    /// Read the bytes that are currently pending
    ///
    /// Returns the number of bytes copied into `buf`. Returns `Ok(0)` when
    /// nothing is pending; never waits for more input to arrive. Bytes sent
    /// together by the host may show up over several calls.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Combined serial transport
///
/// For streams that provide both directions on a single peripheral.
pub trait Transport: SerialTx + SerialRx {
    /// Check whether the far end is connected and writes should be attempted
    ///
    /// Hardware UARTs have no notion of a connection and are always ready.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Adapter turning an `embedded-io` stream into a [`Transport`]
///
/// Readiness is tracked as a flag owned by the firmware, for example driven
/// by a USB DTR line.
#[derive(Debug)]
pub struct IoTransport<IO> {
    io: IO,
    ready: bool,
}

impl<IO> IoTransport<IO> {
    /// Wrap a stream, reporting it as ready
    pub fn new(io: IO) -> Self {
        Self { io, ready: true }
    }

    /// Update the readiness flag
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Access the wrapped stream
    pub fn inner_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    /// Release the wrapped stream
    pub fn into_inner(self) -> IO {
        self.io
    }
}

impl<IO: Write> SerialTx for IoTransport<IO> {
    type Error = IO::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.io.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.io.flush()
    }
}

impl<IO: Read + ReadReady> SerialRx for IoTransport<IO> {
    type Error = IO::Error;

    fn poll_available(&mut self) -> Result<bool, Self::Error> {
        self.io.read_ready()
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut filled = 0;
        // `read` may block, so only call it while input is known to be pending
        while filled < buf.len() && self.io.read_ready()? {
            let n = self.io.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}

impl<IO: Read + ReadReady + Write> Transport for IoTransport<IO> {
    fn is_ready(&self) -> bool {
        self.ready
    }
}
