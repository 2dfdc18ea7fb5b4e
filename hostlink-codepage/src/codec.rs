//! Text conversion between local strings and host bytes.

use crate::error::CodePageError;
use crate::registry::CodePageRegistry;
use crate::table::CodePageTable;
use std::sync::Arc;

/// Converts text for one CCSID.
///
/// Cloning is cheap; all clones share the cached table.
#[derive(Debug, Clone)]
pub struct TextCodec {
    table: Arc<CodePageTable>,
}

impl TextCodec {
    pub fn for_ccsid(ccsid: u32) -> Result<Self, CodePageError> {
        Ok(Self {
            table: CodePageRegistry::lookup(ccsid)?,
        })
    }

    pub fn ccsid(&self) -> u32 {
        self.table.ccsid()
    }

    pub fn table(&self) -> &CodePageTable {
        &self.table
    }

    /// Host byte used to pad fixed-length text.
    pub fn space(&self) -> u8 {
        self.table.space_byte()
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        self.table.encode(text)
    }

    pub fn encode_into(&self, text: &str, out: &mut Vec<u8>) {
        self.table.encode_into(text, out)
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        self.table.decode(bytes)
    }

    /// Decodes `length` bytes of `bytes` starting at `offset`.
    pub fn decode_at(
        &self,
        bytes: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<String, CodePageError> {
        let range = offset
            .checked_add(length)
            .filter(|&end| end <= bytes.len())
            .map(|end| offset..end)
            .ok_or(CodePageError::OutOfRange {
                offset,
                length,
                available: bytes.len(),
            })?;
        Ok(self.table.decode(&bytes[range]))
    }
}

/// Encodes `text` in the code page identified by `ccsid`.
pub fn encode(ccsid: u32, text: &str) -> Result<Vec<u8>, CodePageError> {
    Ok(TextCodec::for_ccsid(ccsid)?.encode(text))
}

/// Decodes `length` bytes at `offset` from the code page identified by `ccsid`.
pub fn decode(
    ccsid: u32,
    bytes: &[u8],
    offset: usize,
    length: usize,
) -> Result<String, CodePageError> {
    TextCodec::for_ccsid(ccsid)?.decode_at(bytes, offset, length)
}
