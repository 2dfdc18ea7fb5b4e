//! Bound SQL values.
//!
//! A [`SqlValue`] is immutable: binding a new value creates a new instance.
//! Whatever a bind had to drop to fit the declared length is recorded on the
//! value as `truncated_count`, and every read returns its own [`Read`] record
//! describing what that read dropped.

use crate::error::TypeError;
use crate::input::SqlInput;
use crate::sql_type::{Family, SqlType};
use std::fmt;
use std::io::{self, Read as _};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Datum {
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
}

/// A typed value owned by one parameter slot or result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlValue {
    ty: SqlType,
    datum: Datum,
    truncated: usize,
    out_of_bounds: bool,
}

/// The outcome of one read: the value and how much the read cut off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read<T> {
    pub value: T,
    pub truncated: usize,
}

impl<T> Read<T> {
    pub fn is_truncated(&self) -> bool {
        self.truncated > 0
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl SqlValue {
    /// Binds `input` to a value of type `ty`.
    ///
    /// `scale` bounds how much a stream input may contribute (bytes for byte
    /// streams, characters for character streams); `None` reads to the end.
    /// Input longer than the declared length is truncated and the excess
    /// recorded, not rejected.
    pub fn set(ty: SqlType, input: SqlInput<'_>, scale: Option<usize>) -> Result<Self, TypeError> {
        match ty.family() {
            Family::Text => Ok(Self::fit_text(ty, text_source(ty, input, scale)?)),
            Family::Binary => Ok(Self::fit_bytes(ty, byte_source(ty, input, scale)?)),
            Family::Integer => Ok(Self::fit_integer(ty, integer_source(ty, input)?)),
        }
    }

    pub(crate) fn fit_text(ty: SqlType, mut text: String) -> Self {
        let max = ty.max_length();
        let chars = text.chars().count();
        let mut truncated = 0;
        if chars > max {
            if let Some((cut, _)) = text.char_indices().nth(max) {
                text.truncate(cut);
            }
            truncated = chars - max;
        }
        if !ty.is_variable() {
            let kept = chars.min(max);
            text.extend(std::iter::repeat(' ').take(max - kept));
        }
        Self {
            ty,
            datum: Datum::Text(text),
            truncated,
            out_of_bounds: false,
        }
    }

    pub(crate) fn fit_bytes(ty: SqlType, mut bytes: Vec<u8>) -> Self {
        let max = ty.max_length();
        let truncated = bytes.len().saturating_sub(max);
        bytes.truncate(max);
        if !ty.is_variable() {
            bytes.resize(max, 0);
        }
        Self {
            ty,
            datum: Datum::Bytes(bytes),
            truncated,
            out_of_bounds: false,
        }
    }

    pub(crate) fn fit_integer(ty: SqlType, value: i128) -> Self {
        let (lo, hi) = ty.integer_range();
        let clamped = value.clamp(lo as i128, hi as i128) as i64;
        Self {
            ty,
            datum: Datum::Int(clamped),
            truncated: 0,
            out_of_bounds: clamped as i128 != value,
        }
    }

    pub(crate) fn datum(&self) -> &Datum {
        &self.datum
    }

    pub fn sql_type(&self) -> SqlType {
        self.ty
    }

    pub fn declared_max_length(&self) -> usize {
        self.ty.max_length()
    }

    /// Length of the held value: characters for text, bytes for binary.
    pub fn actual_length(&self) -> usize {
        match &self.datum {
            Datum::Text(text) => text.chars().count(),
            Datum::Bytes(bytes) => bytes.len(),
            Datum::Int(_) => self.ty.max_length(),
        }
    }

    /// Units dropped when the value was bound.
    pub fn truncated_count(&self) -> usize {
        self.truncated
    }

    /// Whether an integer bind had to saturate to the type's range.
    pub fn out_of_bounds(&self) -> bool {
        self.out_of_bounds
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.datum {
            Datum::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.datum {
            Datum::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.datum {
            Datum::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Reads the value as text, capped at `max_field_size` (0 = unbounded).
    ///
    /// Binary and bit data render as upper-case hex of the capped bytes.
    /// Integers are never capped.
    pub fn get_string(&self, max_field_size: usize) -> Read<String> {
        match &self.datum {
            Datum::Text(text) => {
                let chars = text.chars().count();
                let keep = capped(chars, max_field_size);
                Read {
                    value: text.chars().take(keep).collect(),
                    truncated: chars - keep,
                }
            }
            Datum::Bytes(bytes) => {
                let keep = capped(bytes.len(), max_field_size);
                Read {
                    value: hex::encode_upper(&bytes[..keep]),
                    truncated: bytes.len() - keep,
                }
            }
            Datum::Int(v) => Read {
                value: v.to_string(),
                truncated: 0,
            },
        }
    }

    /// Reads binary or bit data as raw bytes, capped at `max_field_size`.
    pub fn get_bytes(&self, max_field_size: usize) -> Result<Read<Vec<u8>>, TypeError> {
        match &self.datum {
            Datum::Bytes(bytes) => {
                let keep = capped(bytes.len(), max_field_size);
                Ok(Read {
                    value: bytes[..keep].to_vec(),
                    truncated: bytes.len() - keep,
                })
            }
            Datum::Text(_) | Datum::Int(_) => Err(TypeError::TypeMismatch {
                target: SqlType::VarBinary(u16::MAX),
                input: self.ty.name(),
            }),
        }
    }

    pub fn get_i64(&self) -> Result<i64, TypeError> {
        match &self.datum {
            Datum::Int(v) => Ok(*v),
            Datum::Text(text) => text.trim().parse().map_err(|_| TypeError::TypeMismatch {
                target: SqlType::BigInt,
                input: self.ty.name(),
            }),
            Datum::Bytes(_) => Err(TypeError::TypeMismatch {
                target: SqlType::BigInt,
                input: self.ty.name(),
            }),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get_string(0).value)
    }
}

fn capped(len: usize, max_field_size: usize) -> usize {
    if max_field_size == 0 {
        len
    } else {
        len.min(max_field_size)
    }
}

fn text_source(ty: SqlType, input: SqlInput<'_>, scale: Option<usize>) -> Result<String, TypeError> {
    match input {
        SqlInput::Text(text) => Ok(text.to_owned()),
        SqlInput::CharStream(source) => Ok(read_chars(source, scale)?),
        SqlInput::Value(value) => Ok(value.to_string()),
        SqlInput::Int(v) => Ok(v.to_string()),
        SqlInput::Bool(b) => Ok(b.to_string()),
        other @ (SqlInput::Bytes(_) | SqlInput::Stream(_)) => {
            Err(TypeError::mismatch(ty, other.kind()))
        }
    }
}

fn byte_source(ty: SqlType, input: SqlInput<'_>, scale: Option<usize>) -> Result<Vec<u8>, TypeError> {
    match input {
        SqlInput::Text(text) => parse_hex(text).ok_or_else(|| TypeError::mismatch(ty, "non-hex text")),
        SqlInput::Bytes(bytes) => Ok(bytes.to_vec()),
        SqlInput::Stream(source) => Ok(read_bytes(source, scale)?),
        SqlInput::Value(value) => match value.datum() {
            Datum::Bytes(bytes) => Ok(bytes.clone()),
            Datum::Text(_) | Datum::Int(_) => Err(TypeError::mismatch(ty, value.ty.name())),
        },
        other @ (SqlInput::CharStream(_) | SqlInput::Int(_) | SqlInput::Bool(_)) => {
            Err(TypeError::mismatch(ty, other.kind()))
        }
    }
}

fn integer_source(ty: SqlType, input: SqlInput<'_>) -> Result<i128, TypeError> {
    match input {
        SqlInput::Int(v) => Ok(v.into()),
        SqlInput::Bool(b) => Ok(b.into()),
        SqlInput::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| TypeError::mismatch(ty, "non-numeric text")),
        SqlInput::Value(value) => match value.datum() {
            Datum::Int(v) => Ok((*v).into()),
            Datum::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| TypeError::mismatch(ty, "non-numeric text")),
            Datum::Bytes(_) => Err(TypeError::mismatch(ty, value.ty.name())),
        },
        other @ (SqlInput::Bytes(_) | SqlInput::Stream(_) | SqlInput::CharStream(_)) => {
            Err(TypeError::mismatch(ty, other.kind()))
        }
    }
}

/// Parses hex digits in either case; an odd digit count gets a leading zero.
fn parse_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 == 1 {
        hex::decode(format!("0{}", text)).ok()
    } else {
        hex::decode(text).ok()
    }
}

fn read_bytes(source: &mut dyn io::Read, limit: Option<usize>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    match limit {
        Some(n) => (&mut *source).take(n as u64).read_to_end(&mut buf)?,
        None => source.read_to_end(&mut buf)?,
    };
    Ok(buf)
}

fn read_chars(source: &mut dyn io::Read, limit: Option<usize>) -> io::Result<String> {
    let Some(limit) = limit else {
        let mut text = String::new();
        source.read_to_string(&mut text)?;
        return Ok(text);
    };

    // `limit` characters span at most 4 * limit bytes of UTF-8.
    let raw = read_bytes(source, Some(limit.saturating_mul(4)))?;
    let valid = match std::str::from_utf8(&raw) {
        Ok(text) => text,
        // A character cut at the end of the window is fine; anything else is not.
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&raw[..e.valid_up_to()]).map_err(invalid_utf8)?
        }
        Err(e) => return Err(invalid_utf8(e)),
    };
    Ok(valid.chars().take(limit).collect())
}

fn invalid_utf8(e: std::str::Utf8Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}
