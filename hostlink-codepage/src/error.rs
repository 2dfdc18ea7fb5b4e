//! Code-page error types.

use thiserror::Error;

/// Errors raised while looking up tables or converting text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodePageError {
    #[error("unsupported code page: CCSID {0}")]
    UnsupportedCodePage(u32),

    #[error("byte range {offset}..{offset}+{length} exceeds buffer of {available} bytes")]
    OutOfRange {
        offset: usize,
        length: usize,
        available: usize,
    },
}
