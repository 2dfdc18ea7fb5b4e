//! Supported wire SQL types and their static metadata.

use crate::error::TypeError;
use crate::LENGTH_PREFIX_SIZE;
use hostlink_codepage::BIT_DATA_CCSID;
use std::fmt;

/// Host type id for fixed-length character data.
pub const CHAR_TYPE_ID: u16 = 452;
/// Host type id for variable-length character data.
pub const VARCHAR_TYPE_ID: u16 = 448;
/// Host type id for fixed-length binary data.
pub const BINARY_TYPE_ID: u16 = 912;
/// Host type id for variable-length binary data.
pub const VARBINARY_TYPE_ID: u16 = 908;
/// Host type id for 2-byte integers.
pub const SMALLINT_TYPE_ID: u16 = 500;
/// Host type id for 4-byte integers.
pub const INTEGER_TYPE_ID: u16 = 496;
/// Host type id for 8-byte integers.
pub const BIGINT_TYPE_ID: u16 = 492;

/// A wire SQL type. Lengths are declared maximums in bytes.
///
/// The set is fixed by the host protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Char(u16),
    VarChar(u16),
    Binary(u16),
    VarBinary(u16),
    /// Character column tagged with CCSID 65535, exposed as hex text.
    CharForBitData(u16),
    VarCharForBitData(u16),
    SmallInt,
    Integer,
    BigInt,
}

/// How a type's values are represented locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    Text,
    Binary,
    Integer,
}

impl SqlType {
    /// Resolves a host column/parameter descriptor.
    ///
    /// The low bit of `type_id` marks a nullable column and is ignored.
    pub fn from_descriptor(type_id: u16, length: u16, ccsid: u32) -> Result<Self, TypeError> {
        let bit_data = ccsid == BIT_DATA_CCSID;
        match type_id & !1 {
            CHAR_TYPE_ID if bit_data => Ok(SqlType::CharForBitData(length)),
            CHAR_TYPE_ID => Ok(SqlType::Char(length)),
            VARCHAR_TYPE_ID if bit_data => Ok(SqlType::VarCharForBitData(length)),
            VARCHAR_TYPE_ID => Ok(SqlType::VarChar(length)),
            BINARY_TYPE_ID => Ok(SqlType::Binary(length)),
            VARBINARY_TYPE_ID => Ok(SqlType::VarBinary(length)),
            SMALLINT_TYPE_ID => Ok(SqlType::SmallInt),
            INTEGER_TYPE_ID => Ok(SqlType::Integer),
            BIGINT_TYPE_ID => Ok(SqlType::BigInt),
            _ => Err(TypeError::UnknownType(type_id)),
        }
    }

    pub fn native_type_id(&self) -> u16 {
        match self {
            SqlType::Char(_) | SqlType::CharForBitData(_) => CHAR_TYPE_ID,
            SqlType::VarChar(_) | SqlType::VarCharForBitData(_) => VARCHAR_TYPE_ID,
            SqlType::Binary(_) => BINARY_TYPE_ID,
            SqlType::VarBinary(_) => VARBINARY_TYPE_ID,
            SqlType::SmallInt => SMALLINT_TYPE_ID,
            SqlType::Integer => INTEGER_TYPE_ID,
            SqlType::BigInt => BIGINT_TYPE_ID,
        }
    }

    /// CCSID to put in a descriptor; bit data always carries 65535.
    pub fn descriptor_ccsid(&self, ccsid: u32) -> u32 {
        match self {
            SqlType::CharForBitData(_) | SqlType::VarCharForBitData(_) => BIT_DATA_CCSID,
            SqlType::Char(_) | SqlType::VarChar(_) => ccsid,
            _ => 0,
        }
    }

    /// Declared maximum length in bytes.
    pub fn max_length(&self) -> usize {
        match *self {
            SqlType::Char(n)
            | SqlType::VarChar(n)
            | SqlType::Binary(n)
            | SqlType::VarBinary(n)
            | SqlType::CharForBitData(n)
            | SqlType::VarCharForBitData(n) => n as usize,
            SqlType::SmallInt => 2,
            SqlType::Integer => 4,
            SqlType::BigInt => 8,
        }
    }

    /// Bytes the type occupies in a row buffer.
    pub fn wire_size(&self) -> usize {
        if self.is_variable() {
            LENGTH_PREFIX_SIZE + self.max_length()
        } else {
            self.max_length()
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(
            self,
            SqlType::VarChar(_) | SqlType::VarBinary(_) | SqlType::VarCharForBitData(_)
        )
    }

    /// Whether values pass through a `TextCodec` on the wire.
    pub fn is_text(&self) -> bool {
        self.family() == Family::Text
    }

    /// Whether values are raw bytes (binary and bit data).
    pub fn is_binary(&self) -> bool {
        self.family() == Family::Binary
    }

    pub fn is_signed(&self) -> bool {
        self.family() == Family::Integer
    }

    pub fn display_size(&self) -> usize {
        match self {
            SqlType::Char(n) | SqlType::VarChar(n) => *n as usize,
            SqlType::Binary(n)
            | SqlType::VarBinary(n)
            | SqlType::CharForBitData(n)
            | SqlType::VarCharForBitData(n) => *n as usize * 2,
            SqlType::SmallInt => 6,
            SqlType::Integer => 11,
            SqlType::BigInt => 20,
        }
    }

    pub fn max_precision(&self) -> usize {
        match self {
            SqlType::SmallInt => 5,
            SqlType::Integer => 10,
            SqlType::BigInt => 19,
            _ => self.max_length(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SqlType::Char(_) => "CHAR",
            SqlType::VarChar(_) => "VARCHAR",
            SqlType::Binary(_) => "BINARY",
            SqlType::VarBinary(_) => "VARBINARY",
            SqlType::CharForBitData(_) => "CHAR FOR BIT DATA",
            SqlType::VarCharForBitData(_) => "VARCHAR FOR BIT DATA",
            SqlType::SmallInt => "SMALLINT",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
        }
    }

    pub(crate) fn family(&self) -> Family {
        match self {
            SqlType::Char(_) | SqlType::VarChar(_) => Family::Text,
            SqlType::Binary(_)
            | SqlType::VarBinary(_)
            | SqlType::CharForBitData(_)
            | SqlType::VarCharForBitData(_) => Family::Binary,
            SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => Family::Integer,
        }
    }

    /// Inclusive value range of integer types.
    pub(crate) fn integer_range(&self) -> (i64, i64) {
        match self {
            SqlType::SmallInt => (i16::MIN as i64, i16::MAX as i64),
            SqlType::Integer => (i32::MIN as i64, i32::MAX as i64),
            _ => (i64::MIN, i64::MAX),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Char(n) => write!(f, "CHAR({})", n),
            SqlType::VarChar(n) => write!(f, "VARCHAR({})", n),
            SqlType::Binary(n) => write!(f, "BINARY({})", n),
            SqlType::VarBinary(n) => write!(f, "VARBINARY({})", n),
            SqlType::CharForBitData(n) => write!(f, "CHAR({}) FOR BIT DATA", n),
            SqlType::VarCharForBitData(n) => write!(f, "VARCHAR({}) FOR BIT DATA", n),
            SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => f.write_str(self.name()),
        }
    }
}
