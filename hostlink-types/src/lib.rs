//! # hostlink-types
//!
//! Typed SQL values and their host wire layouts.
//!
//! This crate provides:
//! - `SqlType`, the closed set of supported wire types and their metadata
//! - `SqlValue`, an immutable bound value with truncation bookkeeping
//! - Encode/decode of values against caller-owned row buffers
//! - `RowLayout` for fixed-width parameter and result rows

pub mod error;
pub mod input;
pub mod layout;
pub mod sql_type;
pub mod value;
mod wire;

pub use error::TypeError;
pub use input::SqlInput;
pub use layout::RowLayout;
pub use sql_type::SqlType;
pub use value::{Read, SqlValue};

/// Size of the length prefix on variable-length fields.
pub const LENGTH_PREFIX_SIZE: usize = 2;
