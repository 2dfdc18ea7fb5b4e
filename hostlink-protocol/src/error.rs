//! Protocol error types.

use hostlink_codepage::CodePageError;
use hostlink_types::TypeError;
use thiserror::Error;

/// Errors raised while framing, encoding or decoding datastreams.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("datastream too large: {size} bytes (max {max})")]
    StreamTooLarge { size: u32, max: u32 },

    #[error("datastream too short: total length {0}")]
    StreamTooShort(u32),

    #[error("unknown reply stream: op code {0:#06x}")]
    UnknownReplyStream(u16),

    #[error("unknown request stream: op code {0:#06x}")]
    UnknownRequestStream(u16),

    #[error("truncated {field}: need {needed} bytes, {remaining} remaining")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("{remaining} unexpected trailing bytes after op code {op:#06x}")]
    TrailingBytes { op: u16, remaining: usize },

    #[error("field {field} too long: {length} bytes (max 65535)")]
    FieldTooLong { field: &'static str, length: usize },

    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: u64 },

    #[error("row length mismatch: layout needs {expected} bytes, stream declares {actual}")]
    RowLength { expected: usize, actual: usize },

    #[error("value error: {0}")]
    Type(#[from] TypeError),

    #[error("code page error: {0}")]
    CodePage(#[from] CodePageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Returns whether the error means the peer is gone or silent.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ProtocolError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }

    /// Returns whether the error is a read or write timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            ProtocolError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}
