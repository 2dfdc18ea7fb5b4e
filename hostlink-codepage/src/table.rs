//! Single-byte code-page tables.

use std::collections::HashMap;
use std::fmt;

/// An immutable mapping between host bytes and local characters for one CCSID.
///
/// Every byte 0x00-0xFF maps to a character. Characters with no byte in the
/// table encode to the table's substitution byte.
pub struct CodePageTable {
    ccsid: u32,
    name: &'static str,
    to_local: [char; 256],
    from_local: HashMap<char, u8>,
    substitution: u8,
    space: u8,
}

impl CodePageTable {
    /// Builds a table from its byte-to-character array.
    ///
    /// When a character appears at several byte positions the lowest byte
    /// wins on encode.
    pub fn new(ccsid: u32, name: &'static str, to_local: [char; 256], substitution: u8) -> Self {
        let mut from_local = HashMap::with_capacity(256);
        for (byte, &ch) in to_local.iter().enumerate() {
            from_local.entry(ch).or_insert(byte as u8);
        }
        let space = from_local.get(&' ').copied().unwrap_or(substitution);

        Self {
            ccsid,
            name,
            to_local,
            from_local,
            substitution,
            space,
        }
    }

    pub fn ccsid(&self) -> u32 {
        self.ccsid
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Byte written for characters the table cannot represent.
    pub fn substitution_byte(&self) -> u8 {
        self.substitution
    }

    /// Encoding of U+0020, used to pad fixed-length text.
    pub fn space_byte(&self) -> u8 {
        self.space
    }

    #[inline]
    pub fn byte_to_char(&self, byte: u8) -> char {
        self.to_local[byte as usize]
    }

    #[inline]
    pub fn char_to_byte(&self, ch: char) -> Option<u8> {
        self.from_local.get(&ch).copied()
    }

    /// Returns whether every character of `text` has a byte in this table.
    pub fn can_encode(&self, text: &str) -> bool {
        text.chars().all(|ch| self.from_local.contains_key(&ch))
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        bytes.iter().map(|&b| self.byte_to_char(b)).collect()
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len());
        self.encode_into(text, &mut out);
        out
    }

    /// Appends the encoding of `text` to `out`.
    pub fn encode_into(&self, text: &str, out: &mut Vec<u8>) {
        out.extend(
            text.chars()
                .map(|ch| self.char_to_byte(ch).unwrap_or(self.substitution)),
        );
    }
}

impl fmt::Debug for CodePageTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodePageTable")
            .field("ccsid", &self.ccsid)
            .field("name", &self.name)
            .field("substitution", &self.substitution)
            .finish()
    }
}
