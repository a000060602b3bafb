//! Scripted transport for tests
//!
//! Input is a queue of bursts. Each burst becomes visible only after a number
//! of empty polls following the previous one being fully read. By default
//! that gap is longer than the gate's quiet gap, so consecutive bursts are
//! separate tokens; [`MockTransport::with_input_after`] sets a shorter one.

use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use probeline_hal::{SerialRx, SerialTx, Transport};

use crate::config::DEFAULT_ACK_IDLE_POLLS;
use crate::gate::CancelToken;

/// Empty polls between bursts unless given explicitly
pub const DEFAULT_GAP_POLLS: usize = DEFAULT_ACK_IDLE_POLLS as usize * 2;

pub struct MockTransport {
    ready: bool,
    fail_writes: bool,
    written: Vec<u8>,
    writes: usize,
    flushes: usize,
    script: VecDeque<(usize, Vec<u8>)>,
    pending: Vec<u8>,
    idle_polls: usize,
    /// Empty polls since the last burst was drained
    waited: usize,
    polls: usize,
    cancel_after: Option<(usize, &'static CancelToken)>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            ready: true,
            fail_writes: false,
            written: Vec::new(),
            writes: 0,
            flushes: 0,
            script: VecDeque::new(),
            pending: Vec::new(),
            idle_polls: 0,
            waited: 0,
            polls: 0,
            cancel_after: None,
        }
    }

    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Queue one burst of input
    ///
    /// The first burst is available at once; later ones follow after
    /// [`DEFAULT_GAP_POLLS`] empty polls.
    pub fn with_input(self, burst: &[u8]) -> Self {
        let gap = if self.script.is_empty() { 0 } else { DEFAULT_GAP_POLLS };
        self.with_input_after(gap, burst)
    }

    /// Queue one burst arriving `gap` empty polls after the previous one
    pub fn with_input_after(mut self, gap: usize, burst: &[u8]) -> Self {
        self.script.push_back((gap, burst.to_vec()));
        self
    }

    /// Report nothing pending for the first `n` polls
    pub fn with_idle_polls(mut self, n: usize) -> Self {
        self.idle_polls = n;
        self
    }

    /// Set `token` once `n` polls have happened
    pub fn cancel_after_polls(mut self, n: usize, token: &'static CancelToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    pub fn output(&self) -> &str {
        core::str::from_utf8(&self.written).unwrap()
    }

    /// Written lines without their terminators
    pub fn lines(&self) -> Vec<String> {
        self.output()
            .split_terminator("\r\n")
            .map(String::from)
            .collect()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn polls(&self) -> usize {
        self.polls
    }

    /// Bytes not yet read, including queued bursts
    pub fn remaining_input(&self) -> usize {
        self.pending.len() + self.script.iter().map(|(_, b)| b.len()).sum::<usize>()
    }
}

impl SerialTx for MockTransport {
    type Error = ();

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(());
        }
        self.written.extend_from_slice(data);
        self.writes += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}

impl SerialRx for MockTransport {
    type Error = ();

    fn poll_available(&mut self) -> Result<bool, Self::Error> {
        self.polls += 1;
        if let Some((n, token)) = self.cancel_after {
            if self.polls >= n {
                token.cancel();
            }
        }

        if self.pending.is_empty() {
            if self.idle_polls > 0 {
                self.idle_polls -= 1;
                return Ok(false);
            }
            match self.script.front() {
                Some((gap, _)) if self.waited >= *gap => {
                    if let Some((_, next)) = self.script.pop_front() {
                        self.pending = next;
                    }
                    self.waited = 0;
                }
                Some(_) => {
                    self.waited += 1;
                    return Ok(false);
                }
                None => {}
            }
        }
        Ok(!self.pending.is_empty())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        if n > 0 && self.pending.is_empty() {
            self.waited = 0;
        }
        Ok(n)
    }
}

impl Transport for MockTransport {
    fn is_ready(&self) -> bool {
        self.ready
    }
}
