//! Stream decoder and blocking stream I/O.

use crate::error::ProtocolError;
use crate::frame::{DataStream, HEADER_SIZE};
use crate::reply::Reply;
use crate::request::Request;
use bytes::{Bytes, BytesMut};
use hostlink_codepage::TextCodec;
use std::io::{Read, Write};

/// Buffers raw bytes and yields complete streams.
pub struct Decoder {
    buffer: BytesMut,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
        }
    }

    /// Appends data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Attempts to decode the next stream from the buffer.
    pub fn decode_stream(&mut self) -> Result<Option<DataStream>, ProtocolError> {
        DataStream::decode(&mut self.buffer)
    }

    /// Attempts to decode the next reply from the buffer.
    pub fn decode_reply(
        &mut self,
        codec: &TextCodec,
    ) -> Result<Option<(u16, Reply)>, ProtocolError> {
        match self.decode_stream()? {
            Some(stream) => Ok(Some((stream.request_id, Reply::decode(&stream, codec)?))),
            None => Ok(None),
        }
    }

    /// Attempts to decode the next request from the buffer.
    pub fn decode_request(
        &mut self,
        codec: &TextCodec,
    ) -> Result<Option<(u16, Request)>, ProtocolError> {
        match self.decode_stream()? {
            Some(stream) => Ok(Some((stream.request_id, Request::decode(&stream, codec)?))),
            None => Ok(None),
        }
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes one stream and flushes.
pub fn write_stream<W: Write + ?Sized>(
    writer: &mut W,
    stream: &DataStream,
) -> Result<(), ProtocolError> {
    let encoded = stream.encode()?;
    writer.write_all(&encoded)?;
    writer.flush()?;
    Ok(())
}

/// Blocks until one complete stream has been read.
pub fn read_stream<R: Read + ?Sized>(reader: &mut R) -> Result<DataStream, ProtocolError> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;
    let (total, request_id) = DataStream::parse_header(header)?;

    let mut payload = vec![0u8; total - HEADER_SIZE];
    reader.read_exact(&mut payload)?;
    let op_code = u16::from_be_bytes([payload[0], payload[1]]);
    let body = Bytes::from(payload).slice(2..);

    Ok(DataStream {
        request_id,
        op_code,
        body,
    })
}
