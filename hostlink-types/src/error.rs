//! Value codec error types.

use crate::sql_type::SqlType;
use hostlink_codepage::CodePageError;
use thiserror::Error;

/// Errors raised while binding, reading, encoding or decoding values.
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("type mismatch: cannot convert {input} to {target}")]
    TypeMismatch {
        target: SqlType,
        input: &'static str,
    },

    #[error("buffer too small: need {needed} bytes at offset {offset}, have {available}")]
    BufferTooSmall {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("length prefix {length} exceeds declared maximum {max}")]
    LengthOutOfBounds { length: usize, max: usize },

    #[error("unknown SQL type id: {0}")]
    UnknownType(u16),

    #[error("row has {actual} values, layout expects {expected}")]
    ColumnCount { expected: usize, actual: usize },

    #[error("I/O error reading value source: {0}")]
    Io(#[from] std::io::Error),

    #[error("code page error: {0}")]
    CodePage(#[from] CodePageError),
}

impl TypeError {
    pub(crate) fn mismatch(target: SqlType, input: &'static str) -> Self {
        TypeError::TypeMismatch { target, input }
    }
}
