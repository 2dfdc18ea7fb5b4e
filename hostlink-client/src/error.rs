//! Client error types.

use crate::config::ConfigError;
use hostlink_codepage::CodePageError;
use hostlink_protocol::ProtocolError;
use hostlink_types::TypeError;
use std::time::Duration;
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("unsupported code page: CCSID {0}")]
    UnsupportedCodePage(u32),

    #[error("connection dropped: {0}")]
    ConnectionDropped(String),

    #[error("unknown reply stream: op code {0:#06x}")]
    UnknownReplyStream(u16),

    #[error("reply out of sequence: expected request id {expected}, got {actual}")]
    OutOfSequence { expected: u16, actual: u16 },

    #[error("handle invalid: connection already released")]
    HandleInvalid,

    #[error("host error (class {class}, code {code}): {message}")]
    Host {
        class: u16,
        code: i32,
        message: String,
    },

    #[error("unexpected {actual} reply to {request}")]
    UnexpectedReply {
        request: &'static str,
        actual: &'static str,
    },

    #[error("no column {index} (result has {count})")]
    NoSuchColumn { index: usize, count: usize },

    #[error("connection pool exhausted: {max} connections in use")]
    PoolExhausted { max: usize },

    #[error("no pooled connection available after {0:?}")]
    PoolTimeout(Duration),

    #[error("connection pool closed")]
    PoolClosed,

    #[error("value error: {0}")]
    Value(TypeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Returns whether the error leaves the connection unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClientError::ConnectionDropped(_)
                | ClientError::UnknownReplyStream(_)
                | ClientError::OutOfSequence { .. }
                | ClientError::Io(_)
                | ClientError::Protocol(_)
                | ClientError::TlsHandshake(_)
        )
    }

    /// Returns whether re-acquiring a fresh connection may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::ConnectionDropped(_) => true,
            ClientError::Io(_) => true,
            ClientError::PoolExhausted { .. } => true,
            ClientError::PoolTimeout(_) => true,
            _ => false,
        }
    }
}

impl From<TypeError> for ClientError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::TypeMismatch { .. } => ClientError::TypeMismatch(err.to_string()),
            TypeError::CodePage(e) => e.into(),
            other => ClientError::Value(other),
        }
    }
}

impl From<CodePageError> for ClientError {
    fn from(err: CodePageError) -> Self {
        match err {
            CodePageError::UnsupportedCodePage(ccsid) => ClientError::UnsupportedCodePage(ccsid),
            other => ClientError::Value(TypeError::CodePage(other)),
        }
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        if err.is_disconnect() || err.is_timeout() {
            return ClientError::ConnectionDropped(err.to_string());
        }
        match err {
            ProtocolError::UnknownReplyStream(op) => ClientError::UnknownReplyStream(op),
            ProtocolError::Type(e) => e.into(),
            ProtocolError::CodePage(e) => e.into(),
            ProtocolError::Io(e) => ClientError::Io(e),
            other => ClientError::Protocol(other),
        }
    }
}
