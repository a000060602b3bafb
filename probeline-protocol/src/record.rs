//! Record parsing for device output
//!
//! Record format (one per line, fields separated by single spaces):
//! - `log <text>`: free text
//! - `log breakpoint <label>`: the device halted and waits for `ok`
//! - `log variable <name> <value>`: a scalar or a bracketed list
//!
//! Free text that happens to start with `variable ` or `breakpoint ` is
//! indistinguishable from a real record and is parsed as one.

use core::fmt;

use crate::{BREAKPOINT_KEYWORD, LOG_PREFIX, VARIABLE_KEYWORD};

/// Errors that can occur while parsing a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Line carries no content
    Empty,
    /// Line does not start with the `log` prefix
    UnknownPrefix,
    /// A variable record without name or value
    MissingField,
    /// List value opened with `[` but never closed
    UnterminatedList,
}

/// A parsed device record, borrowing from the line it came from
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Record<'a> {
    /// Free text log
    Log(&'a str),
    /// Logged variable
    Variable {
        name: &'a str,
        value: VariableValue<'a>,
    },
    /// Breakpoint reached; label is an id, a name, or empty
    Breakpoint(&'a str),
}

impl<'a> Record<'a> {
    /// Parse one line of device output
    ///
    /// Trailing `\r` and `\n` are ignored so raw lines can be passed in.
    pub fn parse(line: &'a str) -> Result<Self, RecordError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(RecordError::Empty);
        }

        let body = match line.split_once(' ') {
            Some((LOG_PREFIX, body)) => body,
            None if line == LOG_PREFIX => "",
            _ => return Err(RecordError::UnknownPrefix),
        };

        if let Some(label) = keyword_body(body, BREAKPOINT_KEYWORD) {
            return Ok(Record::Breakpoint(label));
        }

        if let Some(rest) = keyword_body(body, VARIABLE_KEYWORD) {
            let (name, value) = rest.split_once(' ').ok_or(RecordError::MissingField)?;
            if name.is_empty() || value.is_empty() {
                return Err(RecordError::MissingField);
            }
            let value = VariableValue::parse(value)?;
            return Ok(Record::Variable { name, value });
        }

        Ok(Record::Log(body))
    }
}

/// Strip `keyword` and the following space from `body`
fn keyword_body<'a>(body: &'a str, keyword: &str) -> Option<&'a str> {
    if body == keyword {
        return Some("");
    }
    body.strip_prefix(keyword)?.strip_prefix(' ')
}

/// Value part of a variable record
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VariableValue<'a> {
    Scalar(Scalar<'a>),
    List(ScalarList<'a>),
}

impl<'a> VariableValue<'a> {
    /// Parse a value field
    pub fn parse(text: &'a str) -> Result<Self, RecordError> {
        match text.strip_prefix('[') {
            Some(rest) => {
                let inner = rest
                    .strip_suffix(']')
                    .ok_or(RecordError::UnterminatedList)?;
                Ok(VariableValue::List(ScalarList { inner }))
            }
            None => Ok(VariableValue::Scalar(Scalar::parse(text))),
        }
    }

    /// The scalar, if this is not a list
    pub fn as_scalar(&self) -> Option<Scalar<'a>> {
        match self {
            VariableValue::Scalar(scalar) => Some(*scalar),
            VariableValue::List(_) => None,
        }
    }
}

/// A single formatted value
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scalar<'a> {
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Anything that is not a number (characters, `nan`, `inf`)
    Text(&'a str),
}

impl<'a> Scalar<'a> {
    /// Classify a token
    ///
    /// A token with a decimal point is a float; otherwise signed parsing is
    /// tried before unsigned so only values above `i64::MAX` become `UInt`.
    pub fn parse(token: &'a str) -> Self {
        if token.contains('.') {
            if let Ok(value) = token.parse::<f64>() {
                return Scalar::Float(value);
            }
        } else if let Ok(value) = token.parse::<i64>() {
            return Scalar::Int(value);
        } else if let Ok(value) = token.parse::<u64>() {
            return Scalar::UInt(value);
        }
        Scalar::Text(token)
    }

    /// Numeric view of this scalar
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Scalar::Int(v) => Some(v as f64),
            Scalar::UInt(v) => Some(v as f64),
            Scalar::Float(v) => Some(v),
            Scalar::Text(_) => None,
        }
    }
}

impl fmt::Display for Scalar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::UInt(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Text(text) => f.write_str(text),
        }
    }
}

/// Comma separated list of scalars, parsed lazily
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScalarList<'a> {
    inner: &'a str,
}

impl<'a> ScalarList<'a> {
    /// Number of elements
    pub fn len(&self) -> usize {
        if self.inner.is_empty() {
            0
        } else {
            self.inner.split(',').count()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over the elements in order
    pub fn iter(&self) -> impl Iterator<Item = Scalar<'a>> + 'a {
        let inner = self.inner;
        inner
            .split(',')
            .take(if inner.is_empty() { 0 } else { usize::MAX })
            .map(Scalar::parse)
    }
}
