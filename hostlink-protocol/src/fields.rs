//! Body field readers and writers.
//!
//! Variable text and variable bytes carry a u16 big-endian length prefix.
//! Text is converted through the connection's code page.

use crate::error::ProtocolError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use hostlink_codepage::{TextCodec, BIT_DATA_CCSID};

/// Resolves a descriptor CCSID: 0 and bit data fall back to `default`.
pub fn codec_for(ccsid: u32, default: &TextCodec) -> Result<TextCodec, ProtocolError> {
    if ccsid == 0 || ccsid == BIT_DATA_CCSID || ccsid == default.ccsid() {
        return Ok(default.clone());
    }
    Ok(TextCodec::for_ccsid(ccsid)?)
}

/// Appends body fields to a buffer.
pub struct BodyWriter<'a> {
    buf: BytesMut,
    codec: &'a TextCodec,
}

impl<'a> BodyWriter<'a> {
    pub fn new(codec: &'a TextCodec) -> Self {
        Self {
            buf: BytesMut::with_capacity(64),
            codec,
        }
    }

    pub fn codec(&self) -> &TextCodec {
        self.codec
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.put_u8(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.put_u16(value);
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32(value);
        self
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.buf.put_i32(value);
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.buf.put_u64(value);
        self
    }

    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.buf.put_i64(value);
        self
    }

    /// Writes a count or length that must fit a u16.
    pub fn count(&mut self, field: &'static str, value: usize) -> Result<&mut Self, ProtocolError> {
        let value = u16::try_from(value).map_err(|_| ProtocolError::FieldTooLong {
            field,
            length: value,
        })?;
        Ok(self.u16(value))
    }

    /// Writes a CCSID in its u16 descriptor form.
    pub fn ccsid(&mut self, ccsid: u32) -> Result<&mut Self, ProtocolError> {
        let value = u16::try_from(ccsid).map_err(|_| ProtocolError::InvalidValue {
            field: "ccsid",
            value: ccsid as u64,
        })?;
        Ok(self.u16(value))
    }

    /// Raw bytes, no prefix.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_slice(bytes);
        self
    }

    pub fn var_bytes(
        &mut self,
        field: &'static str,
        bytes: &[u8],
    ) -> Result<&mut Self, ProtocolError> {
        self.count(field, bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(self)
    }

    pub fn var_text(&mut self, field: &'static str, text: &str) -> Result<&mut Self, ProtocolError> {
        let encoded = self.codec.encode(text);
        self.var_bytes(field, &encoded)
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Consumes body fields, failing with `Truncated` when the body runs short.
pub struct BodyReader<'a> {
    buf: Bytes,
    op_code: u16,
    codec: &'a TextCodec,
}

impl<'a> BodyReader<'a> {
    pub fn new(op_code: u16, body: Bytes, codec: &'a TextCodec) -> Self {
        Self {
            buf: body,
            op_code,
            codec,
        }
    }

    pub fn codec(&self) -> &TextCodec {
        self.codec
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, field: &'static str, needed: usize) -> Result<(), ProtocolError> {
        if self.buf.remaining() < needed {
            return Err(ProtocolError::Truncated {
                field,
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn u8(&mut self, field: &'static str) -> Result<u8, ProtocolError> {
        self.need(field, 1)?;
        Ok(self.buf.get_u8())
    }

    pub fn u16(&mut self, field: &'static str) -> Result<u16, ProtocolError> {
        self.need(field, 2)?;
        Ok(self.buf.get_u16())
    }

    pub fn u32(&mut self, field: &'static str) -> Result<u32, ProtocolError> {
        self.need(field, 4)?;
        Ok(self.buf.get_u32())
    }

    pub fn i32(&mut self, field: &'static str) -> Result<i32, ProtocolError> {
        self.need(field, 4)?;
        Ok(self.buf.get_i32())
    }

    pub fn u64(&mut self, field: &'static str) -> Result<u64, ProtocolError> {
        self.need(field, 8)?;
        Ok(self.buf.get_u64())
    }

    pub fn i64(&mut self, field: &'static str) -> Result<i64, ProtocolError> {
        self.need(field, 8)?;
        Ok(self.buf.get_i64())
    }

    /// Takes `len` raw bytes.
    pub fn take(&mut self, field: &'static str, len: usize) -> Result<Bytes, ProtocolError> {
        self.need(field, len)?;
        Ok(self.buf.split_to(len))
    }

    pub fn var_bytes(&mut self, field: &'static str) -> Result<Bytes, ProtocolError> {
        let len = self.u16(field)? as usize;
        self.take(field, len)
    }

    pub fn var_text(&mut self, field: &'static str) -> Result<String, ProtocolError> {
        let raw = self.var_bytes(field)?;
        Ok(self.codec.decode(&raw))
    }

    /// Ensures the whole body was consumed.
    pub fn finish(self) -> Result<(), ProtocolError> {
        if self.buf.has_remaining() {
            return Err(ProtocolError::TrailingBytes {
                op: self.op_code,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }
}
