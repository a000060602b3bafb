//! Text formatting of values
//!
//! Output rules:
//! - Integers: base 10, `-` only for negative signed values
//! - Floats: fixed point, a configurable number of fractional digits
//!   (5 by default), ties rounded away from zero
//! - Characters: written literally
//! - Bytes: base 10
//! - Arrays: `[a,b,c]` with no spaces, `[]` when empty
//! - Registers: one byte element per bit, LSB of the first byte first

use core::fmt::{self, Write};

use heapless::Vec;

use crate::config::{DEFAULT_FLOAT_DECIMALS, MAX_FLOAT_DECIMALS};
use crate::value::{Value, ValueArray, ValueKind};

/// Widest register that can be expanded into bits
pub const MAX_REGISTER_BYTES: usize = 8;

/// Bits in the widest register
pub const MAX_REGISTER_BITS: usize = MAX_REGISTER_BYTES * 8;

/// Scaled floats at or above this no longer fit the integer path
const FLOAT_FAST_PATH_LIMIT: f64 = 1.8e19;

/// Write a scalar
pub fn write_value<W: Write>(w: &mut W, value: &Value, float_decimals: u8) -> fmt::Result {
    match *value {
        Value::Int(v) => write!(w, "{}", v),
        Value::UInt(v) => write!(w, "{}", v),
        Value::Long(v) => write!(w, "{}", v),
        Value::ULong(v) => write!(w, "{}", v),
        Value::Float(v) => write_float(w, v, float_decimals),
        Value::Char(c) => w.write_char(c),
        Value::Byte(b) => write!(w, "{}", b),
    }
}

/// Write a float with exactly `decimals` fractional digits
///
/// Rounds half away from zero. Values too large for the integer path fall
/// back to `core::fmt`, which rounds ties to even.
pub fn write_float<W: Write>(w: &mut W, value: f32, decimals: u8) -> fmt::Result {
    if value.is_nan() {
        return w.write_str("nan");
    }
    if value.is_infinite() {
        return w.write_str(if value < 0.0 { "-inf" } else { "inf" });
    }

    let decimals = decimals.min(MAX_FLOAT_DECIMALS);
    let scale = 10u64.pow(decimals as u32);
    let value = value as f64;
    let magnitude = if value < 0.0 { -value } else { value };
    let scaled = magnitude * scale as f64;

    if scaled + 0.5 >= FLOAT_FAST_PATH_LIMIT {
        return write!(w, "{:.*}", decimals as usize, value);
    }

    // Truncation of a non-negative value is floor
    let rounded = (scaled + 0.5) as u64;
    if value < 0.0 {
        w.write_char('-')?;
    }
    write!(w, "{}", rounded / scale)?;
    if decimals > 0 {
        write!(w, ".{:0width$}", rounded % scale, width = decimals as usize)?;
    }
    Ok(())
}

/// Write an array as `[v0,v1,...]`
pub fn write_array<W: Write>(w: &mut W, array: &ValueArray<'_>, float_decimals: u8) -> fmt::Result {
    w.write_char('[')?;
    for (i, value) in array.iter().enumerate() {
        if i > 0 {
            w.write_char(',')?;
        }
        write_value(w, &value, float_decimals)?;
    }
    w.write_char(']')
}

/// Expand register bytes into one `0`/`1` byte per bit
///
/// Bit 0 of byte 0 comes first. Bytes past [`MAX_REGISTER_BYTES`] are
/// ignored.
pub fn register_bits(bytes: &[u8]) -> Vec<u8, MAX_REGISTER_BITS> {
    let mut bits = Vec::new();
    for &byte in bytes.iter().take(MAX_REGISTER_BYTES) {
        for bit in 0..8 {
            // Capacity is exactly MAX_REGISTER_BYTES * 8
            let _ = bits.push((byte >> bit) & 0x1);
        }
    }
    bits
}

/// Write register bytes as a bit array
pub fn write_register<W: Write>(w: &mut W, bytes: &[u8]) -> fmt::Result {
    let bits = register_bits(bytes);
    write_array(w, &ValueArray::Byte(&bits), 0)
}

/// Decode a little-endian value of the given raw kind tag
///
/// Returns `None` for unknown tags, short input and invalid characters.
pub fn decode_raw(tag: u8, bytes: &[u8]) -> Option<Value> {
    fn take<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
        bytes.get(..N)?.try_into().ok()
    }

    let value = match ValueKind::from_tag(tag)? {
        ValueKind::Int => Value::Int(i32::from_le_bytes(take(bytes)?)),
        ValueKind::UInt => Value::UInt(u32::from_le_bytes(take(bytes)?)),
        ValueKind::Long => Value::Long(i64::from_le_bytes(take(bytes)?)),
        ValueKind::ULong => Value::ULong(u64::from_le_bytes(take(bytes)?)),
        ValueKind::Float => Value::Float(f32::from_le_bytes(take(bytes)?)),
        ValueKind::Char => Value::Char(char::from_u32(u32::from_le_bytes(take(bytes)?))?),
        ValueKind::Byte => Value::Byte(*bytes.first()?),
    };
    Some(value)
}

/// Write a raw tagged value; anything undecodable writes nothing
pub fn write_raw<W: Write>(w: &mut W, tag: u8, bytes: &[u8], float_decimals: u8) -> fmt::Result {
    match decode_raw(tag, bytes) {
        Some(value) => write_value(w, &value, float_decimals),
        None => Ok(()),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, DEFAULT_FLOAT_DECIMALS)
    }
}

impl fmt::Display for ValueArray<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_array(f, self, DEFAULT_FLOAT_DECIMALS)
    }
}
