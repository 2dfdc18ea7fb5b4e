//! Process-wide code-page cache.
//!
//! Each registered CCSID owns one initialize-once slot. The first lookup of a
//! CCSID builds its table; every later lookup, from any thread, returns the
//! same shared instance. Tables are read-only once built.

use crate::error::CodePageError;
use crate::table::CodePageTable;
use crate::tables;
use std::sync::{Arc, OnceLock};

/// Substitution byte (SUB) for EBCDIC tables.
const EBCDIC_SUB: u8 = 0x3F;

/// Substitution byte (SUB) for ASCII-based tables.
const ASCII_SUB: u8 = 0x1A;

struct Entry {
    ccsid: u32,
    build: fn() -> CodePageTable,
    cell: OnceLock<Arc<CodePageTable>>,
}

impl Entry {
    const fn new(ccsid: u32, build: fn() -> CodePageTable) -> Self {
        Self {
            ccsid,
            build,
            cell: OnceLock::new(),
        }
    }

    fn get(&self) -> Arc<CodePageTable> {
        self.cell.get_or_init(|| Arc::new((self.build)())).clone()
    }
}

static REGISTRY: [Entry; 4] = [
    Entry::new(37, build_37),
    Entry::new(500, build_500),
    Entry::new(819, build_819),
    Entry::new(1047, build_1047),
];

fn build_37() -> CodePageTable {
    CodePageTable::new(37, "IBM-037", tables::CCSID_37, EBCDIC_SUB)
}

fn build_500() -> CodePageTable {
    CodePageTable::new(500, "IBM-500", tables::CCSID_500, EBCDIC_SUB)
}

fn build_819() -> CodePageTable {
    CodePageTable::new(819, "ISO-8859-1", tables::ccsid_819(), ASCII_SUB)
}

fn build_1047() -> CodePageTable {
    CodePageTable::new(1047, "IBM-1047", tables::CCSID_1047, EBCDIC_SUB)
}

/// Lookup facade over the process-wide table cache.
pub struct CodePageRegistry;

impl CodePageRegistry {
    /// Returns the shared table for `ccsid`, building it on first use.
    pub fn lookup(ccsid: u32) -> Result<Arc<CodePageTable>, CodePageError> {
        REGISTRY
            .iter()
            .find(|entry| entry.ccsid == ccsid)
            .map(Entry::get)
            .ok_or(CodePageError::UnsupportedCodePage(ccsid))
    }

    pub fn is_supported(ccsid: u32) -> bool {
        REGISTRY.iter().any(|entry| entry.ccsid == ccsid)
    }

    /// CCSIDs with a registered table, in ascending order.
    pub fn ccsids() -> impl Iterator<Item = u32> {
        REGISTRY.iter().map(|entry| entry.ccsid)
    }
}
