use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

/// MySQL column type codes as they appear in TABLE_MAP events.
///
/// The metadata width per type (see the table-map decoder):
///   - 2 bytes: `String`, `VarString`, `VarChar`, `Decimal`, `NewDecimal`,
///     `Bit`, and the internal-only `Enum`/`Set` which a binlog smuggles
///     through `String` metadata
///   - 1 byte:  `Float`, `Double`, `Blob`, `Geometry`, `Json`, `Time2`,
///     `DateTime2`, `Timestamp2`
///   - 0 bytes: everything else
///
/// ref: https://dev.mysql.com/doc/dev/mysql-server/latest/classbinary__log_1_1Table__map__event.html
#[derive(
    Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum ColumnType {
    Decimal = 0,
    Tiny = 1,
    Short = 2,
    Long = 3,
    Float = 4,
    Double = 5,
    Null = 6,
    Timestamp = 7,
    LongLong = 8,
    Int24 = 9,
    Date = 10,
    Time = 11,
    DateTime = 12,
    Year = 13,
    /// Internal only, cannot exist in a binlog
    NewDate = 14,
    VarChar = 15,
    Bit = 16,
    Timestamp2 = 17,
    DateTime2 = 18,
    Time2 = 19,
    /// MySQL 8 typed array (used for multi-valued indexes)
    TypedArray = 20,
    Invisible = 243,
    Bool = 244,
    Json = 245,
    NewDecimal = 246,
    /// Internal only; surfaces via `String` metadata
    Enum = 247,
    /// Internal only; surfaces via `String` metadata
    Set = 248,
    TinyBlob = 249,
    MediumBlob = 250,
    LongBlob = 251,
    Blob = 252,
    VarString = 253,
    String = 254,
    Geometry = 255,
}

impl ColumnType {
    /// Is this one of the numeric types the SIGNEDNESS optional-metadata
    /// bitmap covers. YEAR and BIT are not among them.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Tiny
                | ColumnType::Short
                | ColumnType::Int24
                | ColumnType::Long
                | ColumnType::LongLong
                | ColumnType::NewDecimal
                | ColumnType::Float
                | ColumnType::Double
        )
    }

    /// Character-ish columns, the ones DEFAULT_CHARSET/COLUMN_CHARSET
    /// metadata applies to. Enum and set are excluded; they carry their own
    /// charset records.
    pub fn is_character(&self) -> bool {
        matches!(
            self,
            ColumnType::String
                | ColumnType::VarString
                | ColumnType::VarChar
                | ColumnType::Blob
                | ColumnType::TinyBlob
                | ColumnType::MediumBlob
                | ColumnType::LongBlob
        )
    }
}

#[cfg(test)]
mod test {
    use super::ColumnType;

    #[test]
    fn wire_codes_round_trip() {
        assert_eq!(ColumnType::try_from(246u8).unwrap(), ColumnType::NewDecimal);
        assert_eq!(ColumnType::try_from(245u8).unwrap(), ColumnType::Json);
        assert_eq!(u8::from(ColumnType::Geometry), 255);
        assert!(ColumnType::try_from(242u8).is_err());
    }
}
