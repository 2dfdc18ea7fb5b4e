//! Sources a value can be bound from.

use crate::value::SqlValue;
use std::fmt;
use std::io::Read;

/// Input accepted by [`SqlValue::set`].
pub enum SqlInput<'a> {
    /// Text; parsed as hex digits for binary targets.
    Text(&'a str),
    /// Raw bytes.
    Bytes(&'a [u8]),
    /// Byte source, read until exhaustion or the `scale` limit.
    Stream(&'a mut dyn Read),
    /// UTF-8 character source, read until exhaustion or the `scale` limit.
    CharStream(&'a mut dyn Read),
    /// Another bound value.
    Value(&'a SqlValue),
    Int(i64),
    Bool(bool),
}

impl SqlInput<'_> {
    /// Short name of the input kind, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            SqlInput::Text(_) => "text",
            SqlInput::Bytes(_) => "bytes",
            SqlInput::Stream(_) => "byte stream",
            SqlInput::CharStream(_) => "character stream",
            SqlInput::Value(_) => "value",
            SqlInput::Int(_) => "integer",
            SqlInput::Bool(_) => "boolean",
        }
    }
}

impl fmt::Debug for SqlInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlInput::Text(s) => f.debug_tuple("Text").field(s).finish(),
            SqlInput::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            SqlInput::Value(v) => f.debug_tuple("Value").field(v).finish(),
            SqlInput::Int(i) => f.debug_tuple("Int").field(i).finish(),
            SqlInput::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            SqlInput::Stream(_) | SqlInput::CharStream(_) => f.write_str(self.kind()),
        }
    }
}

impl<'a> From<&'a str> for SqlInput<'a> {
    fn from(value: &'a str) -> Self {
        SqlInput::Text(value)
    }
}

impl<'a> From<&'a String> for SqlInput<'a> {
    fn from(value: &'a String) -> Self {
        SqlInput::Text(value)
    }
}

impl<'a> From<&'a [u8]> for SqlInput<'a> {
    fn from(value: &'a [u8]) -> Self {
        SqlInput::Bytes(value)
    }
}

impl<'a> From<&'a Vec<u8>> for SqlInput<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        SqlInput::Bytes(value)
    }
}

impl<'a> From<&'a SqlValue> for SqlInput<'a> {
    fn from(value: &'a SqlValue) -> Self {
        SqlInput::Value(value)
    }
}

impl From<i64> for SqlInput<'_> {
    fn from(value: i64) -> Self {
        SqlInput::Int(value)
    }
}

impl From<i32> for SqlInput<'_> {
    fn from(value: i32) -> Self {
        SqlInput::Int(value.into())
    }
}

impl From<bool> for SqlInput<'_> {
    fn from(value: bool) -> Self {
        SqlInput::Bool(value)
    }
}
