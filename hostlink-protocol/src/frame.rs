//! DataStream framing.
//!
//! Stream layout (6 bytes header + payload):
//!
//! ```text
//! +--------------+------------+---------+------------------+
//! | total_length | request_id | op_code | body             |
//! |   4 bytes    |  2 bytes   | 2 bytes | total - 8 bytes  |
//! +--------------+------------+---------+------------------+
//! ```
//!
//! `total_length` counts the header itself. All integers are big-endian.

use crate::error::ProtocolError;
use crate::MAX_STREAM_SIZE;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Size of the stream header in bytes (4 + 2 = 6).
pub const HEADER_SIZE: usize = 6;

/// Size of the op code leading every payload.
pub const OP_CODE_SIZE: usize = 2;

/// Smallest legal stream: header plus op code.
pub const MIN_STREAM_SIZE: usize = HEADER_SIZE + OP_CODE_SIZE;

/// One framed datastream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataStream {
    /// Correlates a reply with its request.
    pub request_id: u16,
    /// Identifies the request or reply kind.
    pub op_code: u16,
    /// Op-specific body following the op code.
    pub body: Bytes,
}

impl DataStream {
    pub fn new(request_id: u16, op_code: u16, body: impl Into<Bytes>) -> Self {
        Self {
            request_id,
            op_code,
            body: body.into(),
        }
    }

    /// Payload length: op code plus body.
    pub fn payload_len(&self) -> usize {
        OP_CODE_SIZE + self.body.len()
    }

    /// Value of the `total_length` header field.
    pub fn total_length(&self) -> usize {
        HEADER_SIZE + self.payload_len()
    }

    /// Encodes the stream into bytes.
    pub fn encode(&self) -> Result<BytesMut, ProtocolError> {
        let total = self.total_length();
        if total > MAX_STREAM_SIZE as usize {
            return Err(ProtocolError::StreamTooLarge {
                size: u32::try_from(total).unwrap_or(u32::MAX),
                max: MAX_STREAM_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(total);
        buf.put_u32(total as u32);
        buf.put_u16(self.request_id);
        buf.put_u16(self.op_code);
        buf.put_slice(&self.body);
        Ok(buf)
    }

    /// Validates a header and returns `(total_length, request_id)`.
    pub fn parse_header(header: [u8; HEADER_SIZE]) -> Result<(usize, u16), ProtocolError> {
        let total = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        if total > MAX_STREAM_SIZE {
            return Err(ProtocolError::StreamTooLarge {
                size: total,
                max: MAX_STREAM_SIZE,
            });
        }
        if (total as usize) < MIN_STREAM_SIZE {
            return Err(ProtocolError::StreamTooShort(total));
        }
        let request_id = u16::from_be_bytes([header[4], header[5]]);
        Ok((total as usize, request_id))
    }

    /// Decodes a stream from bytes.
    ///
    /// Returns `Ok(Some(stream))` if a complete stream was decoded,
    /// `Ok(None)` if more data is needed, or `Err` on framing errors.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>, ProtocolError> {
        if buf.len() < HEADER_SIZE {
            return Ok(None);
        }

        let mut header = [0u8; HEADER_SIZE];
        header.copy_from_slice(&buf[..HEADER_SIZE]);
        let (total, request_id) = Self::parse_header(header)?;
        if buf.len() < total {
            return Ok(None);
        }

        buf.advance(HEADER_SIZE);
        let op_code = buf.get_u16();
        let body = buf.split_to(total - MIN_STREAM_SIZE).freeze();

        Ok(Some(Self {
            request_id,
            op_code,
            body,
        }))
    }
}
