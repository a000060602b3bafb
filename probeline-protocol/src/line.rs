//! Line assembly for the host side of the link
//!
//! Serial reads hand over arbitrary chunks. The assembler collects bytes until
//! a line feed, drops the carriage return the device sends before it, and
//! yields complete lines ready for [`Record::parse`](crate::Record::parse).

use heapless::{String, Vec};

use crate::MAX_LINE_LEN;

/// Errors that can occur while assembling lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded [`MAX_LINE_LEN`]; the rest of it is discarded
    LineTooLong,
    /// Completed line is not valid UTF-8
    InvalidUtf8,
}

/// Incremental line splitter
#[derive(Debug, Clone, Default)]
pub struct LineAssembler {
    buffer: Vec<u8, MAX_LINE_LEN>,
    /// Set after an overflow until the next line feed
    discarding: bool,
}

impl LineAssembler {
    /// Create an empty assembler
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            discarding: false,
        }
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    /// Number of bytes of the partial line held so far
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(line))` when a line feed completes a line,
    /// `Ok(None)` when more bytes are needed, or `Err` on overflow or bad
    /// encoding. An overflow is reported once; bytes up to the next line feed
    /// are then skipped so the following line starts clean.
    pub fn feed(&mut self, byte: u8) -> Result<Option<String<MAX_LINE_LEN>>, LineError> {
        if byte == b'\n' {
            if self.discarding {
                self.reset();
                return Ok(None);
            }
            if self.buffer.last() == Some(&b'\r') {
                self.buffer.pop();
            }
            let bytes = core::mem::take(&mut self.buffer);
            return String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| LineError::InvalidUtf8);
        }

        if self.discarding {
            return Ok(None);
        }

        if self.buffer.push(byte).is_err() {
            self.buffer.clear();
            self.discarding = true;
            return Err(LineError::LineTooLong);
        }
        Ok(None)
    }

    /// Feed multiple bytes
    ///
    /// Returns the first complete line and how many bytes were consumed, so
    /// the caller can continue with the remainder.
    pub fn feed_bytes(
        &mut self,
        bytes: &[u8],
    ) -> (usize, Result<Option<String<MAX_LINE_LEN>>, LineError>) {
        for (i, &byte) in bytes.iter().enumerate() {
            match self.feed(byte) {
                Ok(None) => {}
                other => return (i + 1, other),
            }
        }
        (bytes.len(), Ok(None))
    }
}
