use serde::Serialize;

use crate::binlog::column::column_value::ColumnValue;

/// One row image out of a rows event: the values of every column the
/// present-bitmap includes, in column order. NULL columns carry
/// `ColumnValue::Null` so positions always line up with the bitmap.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<ColumnValue>,
}

impl Row {
    pub fn new_row(values: Vec<ColumnValue>) -> Self {
        Row { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[ColumnValue] {
        self.values.as_slice()
    }

    pub fn get(&self, idx: usize) -> Option<&ColumnValue> {
        self.values.get(idx)
    }

    pub fn into_values(self) -> Vec<ColumnValue> {
        self.values
    }
}

/// A text result-set row off the admin connection; one cell per column,
/// NULL cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowString {
    values: Vec<Option<String>>,
}

impl RowString {
    pub fn new_row(values: Vec<Option<String>>) -> Self {
        RowString { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[Option<String>] {
        self.values.as_slice()
    }

    /// Cell as &str, empty when NULL or out of range.
    pub fn get_str(&self, idx: usize) -> &str {
        self.values
            .get(idx)
            .and_then(|v| v.as_deref())
            .unwrap_or("")
    }
}
