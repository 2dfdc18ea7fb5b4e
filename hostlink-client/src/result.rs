//! Statement results.
//!
//! A [`ResultSet`] shares the max field size of the session that produced
//! it. Every read through a [`Row`] applies the cap in effect at the time of
//! the read and reports what that read dropped.

use crate::error::ClientError;
use hostlink_protocol::{ColumnDescriptor, ResultData};
use hostlink_types::{Read, SqlValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Outcome of one executed statement.
#[derive(Debug, Clone)]
pub enum ExecuteResult {
    /// Rows affected.
    Update(i64),
    Query(ResultSet),
}

/// Rows returned by a query.
#[derive(Debug, Clone)]
pub struct ResultSet {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Vec<SqlValue>>,
    max_field_size: Arc<AtomicUsize>,
}

impl ResultSet {
    pub(crate) fn new(data: ResultData, max_field_size: Arc<AtomicUsize>) -> Self {
        Self {
            columns: data.columns,
            rows: data.rows,
            max_field_size,
        }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Index of the first column named `name`, ignoring ASCII case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|col| col.name.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The session cap currently in effect.
    pub fn max_field_size(&self) -> usize {
        self.max_field_size.load(Ordering::Relaxed)
    }

    /// Changes the session cap; 0 is unbounded.
    pub fn set_max_field_size(&self, size: usize) {
        self.max_field_size.store(size, Ordering::Relaxed);
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            values,
            max_field_size: &self.max_field_size,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            values,
            max_field_size: &self.max_field_size,
        })
    }
}

/// One row of a [`ResultSet`].
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    values: &'a [SqlValue],
    max_field_size: &'a AtomicUsize,
}

impl<'a> Row<'a> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The stored value, as bound when the row was decoded.
    pub fn value(&self, index: usize) -> Result<&'a SqlValue, ClientError> {
        self.values.get(index).ok_or(ClientError::NoSuchColumn {
            index,
            count: self.values.len(),
        })
    }

    pub fn get_string(&self, index: usize) -> Result<Read<String>, ClientError> {
        Ok(self.value(index)?.get_string(self.cap()))
    }

    pub fn get_bytes(&self, index: usize) -> Result<Read<Vec<u8>>, ClientError> {
        Ok(self.value(index)?.get_bytes(self.cap())?)
    }

    fn cap(&self) -> usize {
        self.max_field_size.load(Ordering::Relaxed)
    }

    pub fn get_i64(&self, index: usize) -> Result<i64, ClientError> {
        Ok(self.value(index)?.get_i64()?)
    }
}
