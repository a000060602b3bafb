//! Host-side session bookkeeping
//!
//! Tracks what a monitor needs to present a debug session: which breakpoint
//! the device is halted at, whether breakpoints are answered automatically,
//! and per variable a bounded history of received values with running
//! statistics for numeric ones. Recording can be paused per variable and a
//! history exported as CSV.

use core::fmt::{self, Write};

use heapless::{FnvIndexMap, HistoryBuffer, String};

use crate::record::{Record, VariableValue};
use crate::ACK_TOKEN;

/// Maximum number of variables with statistics (power of two)
pub const MAX_TRACKED_VARIABLES: usize = 16;

/// Maximum stored variable name length
pub const MAX_NAME_LEN: usize = 32;

/// Maximum stored breakpoint label length
pub const MAX_LABEL_LEN: usize = 64;

/// Samples kept per variable; older ones are dropped
pub const HISTORY_LEN: usize = 32;

/// Maximum length of one stored sample
pub const MAX_SAMPLE_LEN: usize = 64;

/// One received value as text; list elements are comma separated
pub type Sample = String<MAX_SAMPLE_LEN>;

/// Running statistics for one numeric variable
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VariableStats {
    pub min: f64,
    pub max: f64,
    pub current: f64,
    pub samples: u32,
}

impl VariableStats {
    fn new(value: f64) -> Self {
        Self {
            min: value,
            max: value,
            current: value,
            samples: 1,
        }
    }

    fn record(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
        self.current = value;
        self.samples = self.samples.saturating_add(1);
    }
}

/// Everything recorded for one variable
#[derive(Debug, Default)]
struct TrackedVariable {
    stats: Option<VariableStats>,
    history: HistoryBuffer<Sample, HISTORY_LEN>,
    paused: bool,
}

impl TrackedVariable {
    fn record(&mut self, value: &VariableValue<'_>) {
        if self.paused {
            return;
        }
        if let Some(v) = value.as_scalar().and_then(|scalar| scalar.as_f64()) {
            match &mut self.stats {
                Some(stats) => stats.record(v),
                None => self.stats = Some(VariableStats::new(v)),
            }
        }
        self.history.write(sample_text(value));
    }

    fn clear(&mut self) {
        self.stats = None;
        self.history.clear();
    }
}

/// Render a value for the history
///
/// Scalars are cut at the sample capacity; lists keep only the elements that
/// fit completely.
fn sample_text(value: &VariableValue<'_>) -> Sample {
    let mut sample = Sample::new();
    match value {
        VariableValue::Scalar(scalar) => {
            let _ = write!(Truncating(&mut sample), "{}", scalar);
        }
        VariableValue::List(list) => {
            for (i, element) in list.iter().enumerate() {
                let mark = sample.len();
                let separator = if i > 0 { "," } else { "" };
                if write!(sample, "{}{}", separator, element).is_err() {
                    sample.truncate(mark);
                    break;
                }
            }
        }
    }
    sample
}

/// Writer that drops whatever does not fit
struct Truncating<'a>(&'a mut Sample);

impl fmt::Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// State of one debug session on the host
#[derive(Debug, Default)]
pub struct HostSession {
    auto_continue: bool,
    halted_at: Option<String<MAX_LABEL_LEN>>,
    variables: FnvIndexMap<String<MAX_NAME_LEN>, TrackedVariable, MAX_TRACKED_VARIABLES>,
}

impl HostSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether breakpoints are acknowledged as soon as they are reported
    pub fn auto_continue(&self) -> bool {
        self.auto_continue
    }

    /// Switch automatic acknowledgement
    ///
    /// Enabling it while the device is halted releases the device; the
    /// returned bytes must then be sent.
    pub fn set_auto_continue(&mut self, enabled: bool) -> Option<&'static [u8]> {
        self.auto_continue = enabled;
        if enabled && self.halted_at.is_some() {
            Some(self.resume())
        } else {
            None
        }
    }

    /// Label of the breakpoint the device waits at, if any
    pub fn halted_at(&self) -> Option<&str> {
        self.halted_at.as_deref()
    }

    /// Release the device
    ///
    /// Returns the acknowledgement bytes to send.
    pub fn resume(&mut self) -> &'static [u8] {
        self.halted_at = None;
        ACK_TOKEN.as_bytes()
    }

    /// Statistics for a variable seen with numeric values
    pub fn stats(&self, name: &str) -> Option<&VariableStats> {
        self.variable(name).and_then(|v| v.stats.as_ref())
    }

    /// Recorded samples of a variable, oldest first
    pub fn history<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.variable(name)
            .into_iter()
            .flat_map(|v| v.history.oldest_ordered().map(|sample| sample.as_str()))
    }

    /// Names of tracked variables in first-seen order
    pub fn tracked(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(|k| k.as_str())
    }

    /// Stop or restart recording a variable
    ///
    /// A variable not seen yet is added so it can be paused up front.
    /// Returns `false` when the tracking table has no room for it.
    pub fn set_paused(&mut self, name: &str, paused: bool) -> bool {
        match self.variable_mut(name) {
            Some(variable) => {
                variable.paused = paused;
                true
            }
            None => false,
        }
    }

    pub fn is_paused(&self, name: &str) -> bool {
        self.variable(name).is_some_and(|v| v.paused)
    }

    /// Write the history of a variable as CSV
    ///
    /// A `value` header followed by one line per sample, oldest first. An
    /// unknown variable produces only the header.
    pub fn export<W: Write>(&self, name: &str, out: &mut W) -> fmt::Result {
        out.write_str("value\n")?;
        for sample in self.history(name) {
            out.write_str(sample)?;
            out.write_char('\n')?;
        }
        Ok(())
    }

    /// Forget the history and statistics of one variable
    pub fn clear_variable(&mut self, name: &str) {
        if let Some(variable) = self.variables.iter_mut().find(|(k, _)| k.as_str() == name) {
            variable.1.clear();
        }
    }

    /// Forget all variables
    pub fn reset(&mut self) {
        self.variables.clear();
    }

    /// Apply a record received from the device
    ///
    /// Returns bytes to send back, which only happens for breakpoints while
    /// auto-continue is enabled.
    pub fn handle(&mut self, record: &Record<'_>) -> Option<&'static [u8]> {
        match record {
            Record::Log(_) => None,
            Record::Variable { name, value } => {
                if let Some(variable) = self.variable_mut(name) {
                    variable.record(value);
                }
                None
            }
            Record::Breakpoint(label) => {
                if self.auto_continue {
                    return Some(self.resume());
                }
                let mut stored = String::new();
                for c in label.chars() {
                    if stored.push(c).is_err() {
                        break;
                    }
                }
                self.halted_at = Some(stored);
                None
            }
        }
    }

    fn variable(&self, name: &str) -> Option<&TrackedVariable> {
        self.variables.iter().find(|(k, _)| k.as_str() == name).map(|(_, v)| v)
    }

    fn variable_mut(&mut self, name: &str) -> Option<&mut TrackedVariable> {
        let key = String::<MAX_NAME_LEN>::try_from(name).ok()?;
        if !self.variables.contains_key(&key) {
            // Table full: further variables go untracked
            self.variables.insert(key.clone(), TrackedVariable::default()).ok()?;
        }
        self.variables.get_mut(&key)
    }
}
