//! Fixed-width row buffers.
//!
//! Parameter rows and result rows place each column in a slot of its type's
//! wire size, in column order. Unused bytes in a variable-length slot stay
//! zero.

use crate::error::TypeError;
use crate::sql_type::SqlType;
use crate::value::SqlValue;
use hostlink_codepage::TextCodec;

#[derive(Debug, Clone)]
struct Slot {
    ty: SqlType,
    offset: usize,
    codec: TextCodec,
}

/// Column types, slot offsets and per-column text codecs for one row shape.
#[derive(Debug, Clone)]
pub struct RowLayout {
    slots: Vec<Slot>,
    row_len: usize,
}

impl RowLayout {
    /// Builds a layout; each column carries the codec for its CCSID.
    pub fn new(columns: impl IntoIterator<Item = (SqlType, TextCodec)>) -> Self {
        let mut row_len = 0;
        let slots = columns
            .into_iter()
            .map(|(ty, codec)| {
                let slot = Slot {
                    ty,
                    offset: row_len,
                    codec,
                };
                row_len += ty.wire_size();
                slot
            })
            .collect();
        Self { slots, row_len }
    }

    pub fn row_len(&self) -> usize {
        self.row_len
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn column_type(&self, index: usize) -> Option<SqlType> {
        self.slots.get(index).map(|slot| slot.ty)
    }

    pub fn offset(&self, index: usize) -> Option<usize> {
        self.slots.get(index).map(|slot| slot.offset)
    }

    pub fn codec(&self, index: usize) -> Option<&TextCodec> {
        self.slots.get(index).map(|slot| &slot.codec)
    }

    /// Encodes one value per column into a fresh row buffer.
    pub fn encode_row(&self, values: &[SqlValue]) -> Result<Vec<u8>, TypeError> {
        if values.len() != self.slots.len() {
            return Err(TypeError::ColumnCount {
                expected: self.slots.len(),
                actual: values.len(),
            });
        }
        let mut row = vec![0u8; self.row_len];
        for (slot, value) in self.slots.iter().zip(values) {
            if value.sql_type() != slot.ty {
                return Err(TypeError::TypeMismatch {
                    target: slot.ty,
                    input: value.sql_type().name(),
                });
            }
            value.encode(&mut row, slot.offset, &slot.codec)?;
        }
        Ok(row)
    }

    /// Decodes every column of the row starting at `raw[0]`.
    pub fn decode_row(&self, raw: &[u8]) -> Result<Vec<SqlValue>, TypeError> {
        if raw.len() < self.row_len {
            return Err(TypeError::BufferTooSmall {
                offset: 0,
                needed: self.row_len,
                available: raw.len(),
            });
        }
        self.slots
            .iter()
            .map(|slot| SqlValue::decode(slot.ty, raw, slot.offset, &slot.codec))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::SqlInput;

    fn layout() -> RowLayout {
        let codec = TextCodec::for_ccsid(37).unwrap();
        RowLayout::new([
            (SqlType::Char(3), codec.clone()),
            (SqlType::VarChar(4), codec.clone()),
            (SqlType::Integer, codec),
        ])
    }

    #[test]
    fn test_offsets() {
        let layout = layout();
        assert_eq!(layout.len(), 3);
        assert_eq!(layout.offset(0), Some(0));
        assert_eq!(layout.offset(1), Some(3));
        assert_eq!(layout.offset(2), Some(9));
        assert_eq!(layout.row_len(), 13);
        assert_eq!(layout.column_type(2), Some(SqlType::Integer));
        assert_eq!(layout.column_type(3), None);
    }

    #[test]
    fn test_row_roundtrip() {
        let layout = layout();
        let values = vec![
            SqlValue::set(SqlType::Char(3), SqlInput::Text("AB"), None).unwrap(),
            SqlValue::set(SqlType::VarChar(4), SqlInput::Text("XY"), None).unwrap(),
            SqlValue::set(SqlType::Integer, SqlInput::Int(7), None).unwrap(),
        ];
        let row = layout.encode_row(&values).unwrap();
        assert_eq!(
            row,
            vec![0xC1, 0xC2, 0x40, 0x00, 0x02, 0xE7, 0xE8, 0x00, 0x00, 0, 0, 0, 7]
        );
        assert_eq!(layout.decode_row(&row).unwrap(), values);
    }

    #[test]
    fn test_encode_row_rejects_wrong_shape() {
        let layout = layout();
        let one = vec![SqlValue::set(SqlType::Char(3), SqlInput::Text("A"), None).unwrap()];
        assert!(matches!(
            layout.encode_row(&one),
            Err(TypeError::ColumnCount {
                expected: 3,
                actual: 1
            })
        ));

        let wrong = vec![
            SqlValue::set(SqlType::Char(3), SqlInput::Text("A"), None).unwrap(),
            SqlValue::set(SqlType::Integer, SqlInput::Int(1), None).unwrap(),
            SqlValue::set(SqlType::Integer, SqlInput::Int(1), None).unwrap(),
        ];
        assert!(matches!(
            layout.encode_row(&wrong),
            Err(TypeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_short_row() {
        assert!(layout().decode_row(&[0u8; 5]).is_err());
    }
}
