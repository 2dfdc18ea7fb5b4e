//! Wire encode/decode of values against row buffers.
//!
//! Fixed-length fields occupy exactly their declared length. Variable-length
//! fields are a big-endian u16 length followed by that many bytes; encode
//! writes only the prefix and the data.

use crate::error::TypeError;
use crate::sql_type::SqlType;
use crate::value::{Datum, SqlValue};
use crate::LENGTH_PREFIX_SIZE;
use hostlink_codepage::TextCodec;

impl SqlValue {
    /// Decodes a value of type `ty` from `raw` at `offset`.
    ///
    /// Text types convert through `codec`; binary and integer types never
    /// touch it.
    pub fn decode(
        ty: SqlType,
        raw: &[u8],
        offset: usize,
        codec: &TextCodec,
    ) -> Result<Self, TypeError> {
        let max = ty.max_length();
        match ty {
            SqlType::Char(_) => {
                let field = fixed(raw, offset, max)?;
                Ok(Self::fit_text(ty, codec.decode(field)))
            }
            SqlType::VarChar(_) => {
                let field = varying(raw, offset, max)?;
                Ok(Self::fit_text(ty, codec.decode(field)))
            }
            SqlType::Binary(_) | SqlType::CharForBitData(_) => {
                Ok(Self::fit_bytes(ty, fixed(raw, offset, max)?.to_vec()))
            }
            SqlType::VarBinary(_) | SqlType::VarCharForBitData(_) => {
                Ok(Self::fit_bytes(ty, varying(raw, offset, max)?.to_vec()))
            }
            SqlType::SmallInt => {
                let field = fixed(raw, offset, 2)?;
                Ok(Self::fit_integer(ty, i16::from_be_bytes([field[0], field[1]]).into()))
            }
            SqlType::Integer => {
                let field = fixed(raw, offset, 4)?;
                let bytes: [u8; 4] = [field[0], field[1], field[2], field[3]];
                Ok(Self::fit_integer(ty, i32::from_be_bytes(bytes).into()))
            }
            SqlType::BigInt => {
                let field = fixed(raw, offset, 8)?;
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(field);
                Ok(Self::fit_integer(ty, i64::from_be_bytes(bytes).into()))
            }
        }
    }

    /// Encodes the value into `raw` at `offset`, returning the bytes written.
    pub fn encode(
        &self,
        raw: &mut [u8],
        offset: usize,
        codec: &TextCodec,
    ) -> Result<usize, TypeError> {
        let ty = self.sql_type();
        let max = ty.max_length();
        match self.datum() {
            Datum::Text(text) => {
                let mut bytes = codec.encode(text);
                if ty.is_variable() {
                    bytes.truncate(max);
                    write_varying(raw, offset, &bytes)
                } else {
                    bytes.resize(max, codec.space());
                    write_fixed(raw, offset, &bytes)
                }
            }
            Datum::Bytes(bytes) => {
                if ty.is_variable() {
                    write_varying(raw, offset, &bytes[..bytes.len().min(max)])
                } else {
                    let mut field = bytes.clone();
                    field.resize(max, 0);
                    write_fixed(raw, offset, &field)
                }
            }
            Datum::Int(v) => match ty {
                SqlType::SmallInt => write_fixed(raw, offset, &(*v as i16).to_be_bytes()),
                SqlType::Integer => write_fixed(raw, offset, &(*v as i32).to_be_bytes()),
                _ => write_fixed(raw, offset, &v.to_be_bytes()),
            },
        }
    }

    /// Number of bytes [`encode`](Self::encode) writes for this value.
    pub fn encoded_len(&self) -> usize {
        if self.sql_type().is_variable() {
            LENGTH_PREFIX_SIZE + self.actual_length()
        } else {
            self.sql_type().max_length()
        }
    }
}

fn span(len: usize, offset: usize, needed: usize) -> Result<std::ops::Range<usize>, TypeError> {
    match offset.checked_add(needed) {
        Some(end) if end <= len => Ok(offset..end),
        _ => Err(TypeError::BufferTooSmall {
            offset,
            needed,
            available: len.saturating_sub(offset),
        }),
    }
}

fn fixed(raw: &[u8], offset: usize, len: usize) -> Result<&[u8], TypeError> {
    Ok(&raw[span(raw.len(), offset, len)?])
}

fn varying(raw: &[u8], offset: usize, max: usize) -> Result<&[u8], TypeError> {
    let prefix = fixed(raw, offset, LENGTH_PREFIX_SIZE)?;
    let length = u16::from_be_bytes([prefix[0], prefix[1]]) as usize;
    if length > max {
        return Err(TypeError::LengthOutOfBounds { length, max });
    }
    fixed(raw, offset + LENGTH_PREFIX_SIZE, length)
}

fn write_fixed(raw: &mut [u8], offset: usize, bytes: &[u8]) -> Result<usize, TypeError> {
    let range = span(raw.len(), offset, bytes.len())?;
    raw[range].copy_from_slice(bytes);
    Ok(bytes.len())
}

fn write_varying(raw: &mut [u8], offset: usize, bytes: &[u8]) -> Result<usize, TypeError> {
    span(raw.len(), offset, LENGTH_PREFIX_SIZE + bytes.len())?;
    write_fixed(raw, offset, &(bytes.len() as u16).to_be_bytes())?;
    write_fixed(raw, offset + LENGTH_PREFIX_SIZE, bytes)?;
    Ok(LENGTH_PREFIX_SIZE + bytes.len())
}
