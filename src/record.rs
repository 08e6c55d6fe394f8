//! Parsing of single `key;value` lines.

use std::fmt;

use crate::byte_buffer::ByteBuffer;

pub const DELIMITER: u8 = b';';

/// Integer digits accepted by the fixed-point path; keeps tenths within `i64`.
const MAX_INTEGER_DIGITS: usize = 15;

/// A parsed measurement.
///
/// Values written with at most one fractional digit are kept as exact
/// tenths so that sums stay associative. Anything else the `f64` parser
/// accepts is kept as a float.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Tenths(i64),
    Float(f64),
}

impl Value {
    #[inline]
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Tenths(tenths) => tenths as f64 / 10.0,
            Value::Float(value) => value,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Record<'a> {
    pub key: &'a [u8],
    pub value: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordErrorKind {
    MissingDelimiter,
    EmptyKey,
    InvalidValue,
}

impl fmt::Display for RecordErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            RecordErrorKind::MissingDelimiter => "missing ';' delimiter",
            RecordErrorKind::EmptyKey => "empty key",
            RecordErrorKind::InvalidValue => "value is not a finite number",
        };
        f.write_str(msg)
    }
}

/// Splits `line` on its first `;` and parses the value.
///
/// `line` excludes the `\n` terminator; a trailing `\r` is tolerated.
#[inline]
pub fn parse_record(line: &[u8]) -> Result<Record<'_>, RecordErrorKind> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    let semicolon_pos = line
        .byte_position(DELIMITER)
        .ok_or(RecordErrorKind::MissingDelimiter)?;

    let key = &line[..semicolon_pos];
    if key.is_empty() {
        return Err(RecordErrorKind::EmptyKey);
    }

    let value = parse_value(&line[semicolon_pos + 1..])?;
    Ok(Record { key, value })
}

#[inline]
pub fn parse_value(bytes: &[u8]) -> Result<Value, RecordErrorKind> {
    let bytes = bytes.trim_ascii();

    if let Some(tenths) = parse_tenths(bytes) {
        return Ok(Value::Tenths(tenths));
    }

    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .map(Value::Float)
        .ok_or(RecordErrorKind::InvalidValue)
}

/// Parses `-?D+` or `-?D+.D` into tenths.
#[inline(always)]
fn parse_tenths(bytes: &[u8]) -> Option<i64> {
    let (neg, rest) = match bytes.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, bytes),
    };

    let (int, frac) = match rest {
        [int @ .., b'.', frac] => (int, Some(*frac)),
        _ => (rest, None),
    };

    if int.is_empty() || int.len() > MAX_INTEGER_DIGITS {
        return None;
    }

    let mut value: i64 = 0;
    for &b in int {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + (b - b'0') as i64;
    }

    value *= 10;
    if let Some(frac) = frac {
        if !frac.is_ascii_digit() {
            return None;
        }
        value += (frac - b'0') as i64;
    }

    Some(if neg { -value } else { value })
}
