//! # hostlink-codepage
//!
//! Host code-page support for hostlink.
//!
//! This crate provides:
//! - Immutable byte/character tables keyed by CCSID
//! - A process-wide, initialize-once table cache
//! - `TextCodec`, the single conversion point for all wire text

pub mod codec;
pub mod error;
pub mod registry;
pub mod table;
mod tables;

pub use codec::{decode, encode, TextCodec};
pub use error::CodePageError;
pub use registry::CodePageRegistry;
pub use table::CodePageTable;

/// CCSID marking data that must never be converted ("bit data").
pub const BIT_DATA_CCSID: u32 = 65535;

/// CCSID used when nothing else has been negotiated.
pub const DEFAULT_CCSID: u32 = 37;
