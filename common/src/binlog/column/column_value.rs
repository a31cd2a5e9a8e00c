use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::Serialize;

/// A single decoded column value out of a row image.
///
/// Which variant a temporal or decimal column produces depends on the
/// engine flags: `use_decimal` selects `DecimalValue` over the canonical
/// `Decimal` string, `parse_time` selects `DateTime` over the canonical
/// `Text` form. Zero-valued dates (`0000-00-00 ...`) are always `Text`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub enum ColumnValue {
    Null,

    Signed(i64),
    Unsigned(u64),
    Float(f32),
    Double(f64),

    /// Canonical form `[-]int[.frac]`, trailing zeros kept to scale digits
    Decimal(String),
    /// High-precision path, `use_decimal`
    DecimalValue(BigDecimal),

    /// Structured path for DATETIME2/TIMESTAMP2, `parse_time`
    DateTime(NaiveDateTime),

    /// Character data, canonical temporal strings, and JSON text
    Text(String),
    /// Blob, binary and geometry payloads
    Bytes(Vec<u8>),
    /// Big-endian, exactly the declared byte width
    Bit(Vec<u8>),

    Enum(i64),
    Set(i64),
    Year(u16),
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    /// Convenience view for handlers that only care about text-ish values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ColumnValue::Text(s) | ColumnValue::Decimal(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Signed(v) => Some(*v),
            ColumnValue::Enum(v) | ColumnValue::Set(v) => Some(*v),
            ColumnValue::Unsigned(v) => i64::try_from(*v).ok(),
            ColumnValue::Year(v) => Some(*v as i64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::ColumnValue;

    #[test]
    fn accessors() {
        assert!(ColumnValue::Null.is_null());
        assert_eq!(ColumnValue::Signed(-3).as_i64(), Some(-3));
        assert_eq!(ColumnValue::Enum(257).as_i64(), Some(257));
        assert_eq!(
            ColumnValue::Decimal("-10.55".to_string()).as_text(),
            Some("-10.55")
        );
        assert_eq!(ColumnValue::Unsigned(u64::MAX).as_i64(), None);
    }
}
