use std::collections::HashMap;

use serde::Serialize;

use common::binlog::column::column_type::ColumnType;
use common::config::Flavor;
use common::err::replica_error::ReError;

use crate::utils::{bitmap_byte_len, slice_len_enc_num, slice_uint_le};

// Optional metadata TLV codes, MySQL 8.0 / MariaDB 10.5 with
// binlog_row_metadata=FULL (SIGNEDNESS and keys also come with MINIMAL).
// ref: https://github.com/mysql/mysql-server/blob/8.0/libbinlogevents/src/rows_event.cpp
const SIGNEDNESS: u8 = 1;
const DEFAULT_CHARSET: u8 = 2;
const COLUMN_CHARSET: u8 = 3;
const COLUMN_NAME: u8 = 4;
const SET_STR_VALUE: u8 = 5;
const ENUM_STR_VALUE: u8 = 6;
const GEOMETRY_TYPE: u8 = 7;
const SIMPLE_PRIMARY_KEY: u8 = 8;
const PRIMARY_KEY_WITH_PREFIX: u8 = 9;
const ENUM_AND_SET_DEFAULT_CHARSET: u8 = 10;
const ENUM_AND_SET_COLUMN_CHARSET: u8 = 11;
const COLUMN_VISIBILITY: u8 = 12;

/// Schema preamble for the rows events that follow it. Installed into the
/// pump's registry keyed by `table_id` and consulted for every row image.
///
/// The optional-metadata vectors stay empty when the server did not send
/// the block (MySQL 5.7, MariaDB 10.4); the helper accessors then yield
/// `None` so callers can feature-detect.
#[derive(Debug, Serialize, PartialEq, Clone, Default)]
pub struct TableMapEvent {
    pub table_id: u64,
    /// Reserved, always 0 so far
    pub flags: u16,

    pub schema: String,
    pub table: String,

    pub column_count: u64,
    pub column_types: Vec<u8>,
    /// Unpacked per-column metadata, width keyed by type
    pub column_meta: Vec<u16>,
    /// One bit per column, LSB first
    pub null_bitmap: Vec<u8>,

    /// MSB-first bitmap over the numeric columns only
    pub signedness_bitmap: Vec<u8>,
    /// `[default_collation, idx, collation, idx, collation, ...]`
    pub default_charset: Vec<u64>,
    pub column_charset: Vec<u64>,
    pub column_name: Vec<String>,
    pub set_str_value: Vec<Vec<String>>,
    pub enum_str_value: Vec<Vec<String>>,
    pub geometry_type: Vec<u64>,
    pub primary_key: Vec<u64>,
    /// Prefix length per primary-key column, 0 for whole-column keys
    pub primary_key_prefix: Vec<u64>,
    pub enum_set_default_charset: Vec<u64>,
    pub enum_set_column_charset: Vec<u64>,
    /// MSB-first bitmap over all columns, MySQL 8.0.23+
    pub visibility_bitmap: Vec<u8>,

    pub flavor: Flavor,
}

impl TableMapEvent {
    pub fn parse(data: &[u8], flavor: Flavor) -> Result<TableMapEvent, ReError> {
        let mut e = TableMapEvent {
            flavor,
            ..Default::default()
        };
        let mut pos = 0usize;

        e.table_id = slice_uint_le(data, 6)?;
        pos += 6;
        e.flags = slice_uint_le(&data[pos..], 2)? as u16;
        pos += 2;

        let schema_len = *data.get(pos).ok_or_else(ReError::incomplete)? as usize;
        pos += 1;
        e.schema = lossy(data, pos, schema_len)?;
        pos += schema_len + 1; // trailing NUL

        let table_len = *data.get(pos).ok_or_else(ReError::incomplete)? as usize;
        pos += 1;
        e.table = lossy(data, pos, table_len)?;
        pos += table_len + 1;

        let (column_count, _, n) = slice_len_enc_num(tail(data, pos)?)?;
        pos += n;
        e.column_count = column_count;

        e.column_types = slice_vec(data, pos, column_count as usize)?;
        pos += column_count as usize;

        let (meta_len, _, n) = slice_len_enc_num(tail(data, pos)?)?;
        pos += n;
        let meta_block = slice_vec(data, pos, meta_len as usize)?;
        e.decode_meta(&meta_block, pos)?;
        pos += meta_len as usize;

        let bitmap_len = bitmap_byte_len(column_count as usize);
        e.null_bitmap = slice_vec(data, pos, bitmap_len)?;
        pos += bitmap_len;

        if pos < data.len() {
            e.decode_optional_meta(&data[pos..], pos)?;
        }

        Ok(e)
    }

    /// Unpack the packed metadata block into one u16 per column.
    fn decode_meta(&mut self, block: &[u8], base_offset: usize) -> Result<(), ReError> {
        self.column_meta = vec![0u16; self.column_types.len()];
        let mut pos = 0usize;

        for (i, &t) in self.column_types.iter().enumerate() {
            let tp = ColumnType::try_from(t).map_err(|_| {
                ReError::decode(base_offset + pos, format!("unknown column type {}", t))
            })?;
            match tp {
                // 2 bytes, type-and-length packed big-endian style
                ColumnType::String | ColumnType::NewDecimal => {
                    let b = slice_vec(block, pos, 2)?;
                    self.column_meta[i] = (b[0] as u16) << 8 | b[1] as u16;
                    pos += 2;
                }
                // 2 bytes little-endian
                ColumnType::VarString | ColumnType::VarChar | ColumnType::Bit => {
                    self.column_meta[i] = slice_uint_le(tail(block, pos)?, 2)? as u16;
                    pos += 2;
                }
                // 1 byte
                ColumnType::Blob
                | ColumnType::Double
                | ColumnType::Float
                | ColumnType::Geometry
                | ColumnType::Json
                | ColumnType::Time2
                | ColumnType::DateTime2
                | ColumnType::Timestamp2 => {
                    self.column_meta[i] =
                        *block.get(pos).ok_or_else(ReError::incomplete)? as u16;
                    pos += 1;
                }
                // internal-only types never reach a binlog
                ColumnType::NewDate
                | ColumnType::Enum
                | ColumnType::Set
                | ColumnType::TinyBlob
                | ColumnType::MediumBlob
                | ColumnType::LongBlob => {
                    return Err(ReError::decode(
                        base_offset + pos,
                        format!("unsupported type {} in table map", t),
                    ));
                }
                _ => self.column_meta[i] = 0,
            }
        }

        Ok(())
    }

    fn decode_optional_meta(&mut self, data: &[u8], base_offset: usize) -> Result<(), ReError> {
        let mut pos = 0usize;

        while pos < data.len() {
            let t = data[pos];
            pos += 1;
            let (length, _, n) = slice_len_enc_num(tail(data, pos)?)?;
            pos += n;
            let v = slice_vec(data, pos, length as usize)?;
            pos += length as usize;

            match t {
                SIGNEDNESS => self.signedness_bitmap = v,
                DEFAULT_CHARSET => self.default_charset = decode_int_seq(&v)?,
                COLUMN_CHARSET => self.column_charset = decode_int_seq(&v)?,
                COLUMN_NAME => self.column_name = decode_string_seq(&v)?,
                SET_STR_VALUE => self.set_str_value = decode_str_value(&v)?,
                ENUM_STR_VALUE => self.enum_str_value = decode_str_value(&v)?,
                GEOMETRY_TYPE => self.geometry_type = decode_int_seq(&v)?,
                SIMPLE_PRIMARY_KEY => {
                    let keys = decode_int_seq(&v)?;
                    self.primary_key_prefix = vec![0; keys.len()];
                    self.primary_key = keys;
                }
                PRIMARY_KEY_WITH_PREFIX => {
                    let pairs = decode_int_seq(&v)?;
                    if pairs.len() % 2 != 0 {
                        return Err(ReError::decode(
                            base_offset + pos,
                            "odd primary-key-with-prefix payload".to_string(),
                        ));
                    }
                    self.primary_key = pairs.iter().step_by(2).copied().collect();
                    self.primary_key_prefix =
                        pairs.iter().skip(1).step_by(2).copied().collect();
                }
                ENUM_AND_SET_DEFAULT_CHARSET => {
                    self.enum_set_default_charset = decode_int_seq(&v)?
                }
                ENUM_AND_SET_COLUMN_CHARSET => {
                    self.enum_set_column_charset = decode_int_seq(&v)?
                }
                COLUMN_VISIBILITY => self.visibility_bitmap = v,
                // skip unrecognized records
                _ => {}
            }
        }

        Ok(())
    }

    /// Resolve the effective type: a `String` column whose metadata high
    /// byte names enum or set is really that type.
    pub fn real_type(&self, i: usize) -> u8 {
        let t = self.column_types[i];
        if t == u8::from(ColumnType::String) {
            let high = (self.column_meta[i] >> 8) as u8;
            if high == u8::from(ColumnType::Enum) || high == u8::from(ColumnType::Set) {
                return high;
            }
        }
        t
    }

    fn is_numeric_column(&self, i: usize) -> bool {
        ColumnType::try_from(self.real_type(i))
            .map(|t| t.is_numeric())
            .unwrap_or(false)
    }

    fn is_character_column(&self, i: usize) -> bool {
        match ColumnType::try_from(self.real_type(i)) {
            Ok(t) if t.is_character() => true,
            // MariaDB treats geometry as a character field here
            Ok(ColumnType::Geometry) => self.flavor == Flavor::MariaDB,
            _ => false,
        }
    }

    fn is_enum_column(&self, i: usize) -> bool {
        self.real_type(i) == u8::from(ColumnType::Enum)
    }

    fn is_set_column(&self, i: usize) -> bool {
        self.real_type(i) == u8::from(ColumnType::Set)
    }

    fn is_enum_or_set_column(&self, i: usize) -> bool {
        self.is_enum_column(i) || self.is_set_column(i)
    }

    fn is_geometry_column(&self, i: usize) -> bool {
        self.real_type(i) == u8::from(ColumnType::Geometry)
    }

    /// (available, nullable) of column `i`.
    pub fn nullable(&self, i: usize) -> (bool, bool) {
        if self.null_bitmap.len() * 8 < self.column_count as usize {
            return (false, false);
        }
        (true, self.null_bitmap[i / 8] & (1 << (i % 8)) != 0)
    }

    /// column index -> is unsigned, for numeric columns; `None` without
    /// SIGNEDNESS metadata.
    pub fn unsigned_map(&self) -> Option<HashMap<usize, bool>> {
        if self.signedness_bitmap.is_empty() {
            return None;
        }
        let mut p = 0usize;
        let mut ret = HashMap::new();
        for i in 0..self.column_count as usize {
            if !self.is_numeric_column(i) {
                continue;
            }
            if p / 8 >= self.signedness_bitmap.len() {
                break;
            }
            ret.insert(
                i,
                self.signedness_bitmap[p / 8] & (0x80 >> (p % 8)) != 0,
            );
            p += 1;
        }
        Some(ret)
    }

    /// column index -> collation id for character columns.
    pub fn collation_map(&self) -> Option<HashMap<usize, u64>> {
        self.make_collation_map(
            |i| self.is_character_column(i),
            &self.default_charset,
            &self.column_charset,
        )
    }

    /// column index -> collation id for enum/set columns.
    pub fn enum_set_collation_map(&self) -> Option<HashMap<usize, u64>> {
        self.make_collation_map(
            |i| self.is_enum_or_set_column(i),
            &self.enum_set_default_charset,
            &self.enum_set_column_charset,
        )
    }

    fn make_collation_map<F: Fn(usize) -> bool>(
        &self,
        include: F,
        default_charset: &[u64],
        column_charset: &[u64],
    ) -> Option<HashMap<usize, u64>> {
        if !default_charset.is_empty() {
            let default_collation = default_charset[0];
            let mut overrides = HashMap::new();
            for pair in default_charset[1..].chunks(2) {
                if pair.len() == 2 {
                    overrides.insert(pair[0] as usize, pair[1]);
                }
            }

            let mut p = 0usize;
            let mut ret = HashMap::new();
            for i in 0..self.column_count as usize {
                if !include(i) {
                    continue;
                }
                ret.insert(i, *overrides.get(&p).unwrap_or(&default_collation));
                p += 1;
            }
            return Some(ret);
        }

        if !column_charset.is_empty() {
            let mut p = 0usize;
            let mut ret = HashMap::new();
            for i in 0..self.column_count as usize {
                if !include(i) {
                    continue;
                }
                if p >= column_charset.len() {
                    break;
                }
                ret.insert(i, column_charset[p]);
                p += 1;
            }
            return Some(ret);
        }

        None
    }

    /// column index -> allowed enum literals.
    pub fn enum_str_value_map(&self) -> Option<HashMap<usize, Vec<String>>> {
        self.str_value_map(|i| self.is_enum_column(i), &self.enum_str_value)
    }

    /// column index -> allowed set literals.
    pub fn set_str_value_map(&self) -> Option<HashMap<usize, Vec<String>>> {
        self.str_value_map(|i| self.is_set_column(i), &self.set_str_value)
    }

    fn str_value_map<F: Fn(usize) -> bool>(
        &self,
        include: F,
        values: &[Vec<String>],
    ) -> Option<HashMap<usize, Vec<String>>> {
        if values.is_empty() {
            return None;
        }
        let mut p = 0usize;
        let mut ret = HashMap::new();
        for i in 0..self.column_count as usize {
            if !include(i) {
                continue;
            }
            if p >= values.len() {
                break;
            }
            ret.insert(i, values[p].clone());
            p += 1;
        }
        Some(ret)
    }

    /// column index -> geometry subtype.
    pub fn geometry_type_map(&self) -> Option<HashMap<usize, u64>> {
        if self.geometry_type.is_empty() {
            return None;
        }
        let mut p = 0usize;
        let mut ret = HashMap::new();
        for i in 0..self.column_count as usize {
            if !self.is_geometry_column(i) {
                continue;
            }
            if p >= self.geometry_type.len() {
                break;
            }
            ret.insert(i, self.geometry_type[p]);
            p += 1;
        }
        Some(ret)
    }

    /// column index -> visible, MySQL 8.0.23+ invisible columns.
    pub fn visibility_map(&self) -> Option<HashMap<usize, bool>> {
        if self.visibility_bitmap.is_empty() {
            return None;
        }
        let mut ret = HashMap::new();
        for i in 0..self.column_count as usize {
            if i / 8 >= self.visibility_bitmap.len() {
                break;
            }
            ret.insert(i, self.visibility_bitmap[i / 8] & (0x80 >> (i % 8)) != 0);
        }
        Some(ret)
    }
}

fn tail(data: &[u8], pos: usize) -> Result<&[u8], ReError> {
    data.get(pos..).ok_or_else(ReError::incomplete)
}

fn lossy(data: &[u8], pos: usize, len: usize) -> Result<String, ReError> {
    Ok(String::from_utf8_lossy(
        data.get(pos..pos + len).ok_or_else(ReError::incomplete)?,
    )
    .to_string())
}

fn slice_vec(data: &[u8], pos: usize, len: usize) -> Result<Vec<u8>, ReError> {
    Ok(data
        .get(pos..pos + len)
        .ok_or_else(ReError::incomplete)?
        .to_vec())
}

/// A run of length-encoded integers filling the payload.
fn decode_int_seq(v: &[u8]) -> Result<Vec<u64>, ReError> {
    let mut ret = Vec::new();
    let mut pos = 0usize;
    while pos < v.len() {
        let (value, _, n) = slice_len_enc_num(&v[pos..])?;
        ret.push(value);
        pos += n;
    }
    Ok(ret)
}

/// A run of length-encoded strings filling the payload.
fn decode_string_seq(v: &[u8]) -> Result<Vec<String>, ReError> {
    let mut ret = Vec::new();
    let mut pos = 0usize;
    while pos < v.len() {
        let (len, _, n) = slice_len_enc_num(&v[pos..])?;
        pos += n;
        ret.push(String::from_utf8_lossy(
            v.get(pos..pos + len as usize).ok_or_else(ReError::incomplete)?,
        )
        .to_string());
        pos += len as usize;
    }
    Ok(ret)
}

/// Per enum/set column: a count then that many literals.
fn decode_str_value(v: &[u8]) -> Result<Vec<Vec<String>>, ReError> {
    let mut ret = Vec::new();
    let mut pos = 0usize;
    while pos < v.len() {
        let (count, _, n) = slice_len_enc_num(&v[pos..])?;
        pos += n;
        let mut vals = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let (len, _, n) = slice_len_enc_num(&v[pos..])?;
            pos += n;
            vals.push(String::from_utf8_lossy(
                v.get(pos..pos + len as usize)
                    .ok_or_else(ReError::incomplete)?,
            )
            .to_string());
            pos += len as usize;
        }
        ret.push(vals);
    }
    Ok(ret)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_basic() {
        // pets.cats, 4 columns: long, varchar(600), varchar(600), date
        let data = b"\x2d\x0a\x00\x00\x00\x00\x01\x00\x04\x70\x65\x74\x73\x00\
                     \x04\x63\x61\x74\x73\x00\x04\x03\x0f\x0f\x0a\x04\x58\x02\x58\x02\x00";
        let e = TableMapEvent::parse(data, Flavor::MySQL).unwrap();
        assert_eq!(e.table_id, 2605);
        assert_eq!(e.flags, 1);
        assert_eq!(e.schema, "pets");
        assert_eq!(e.table, "cats");
        assert_eq!(e.column_count, 4);
        assert_eq!(e.column_types, vec![0x03, 0x0f, 0x0f, 0x0a]);
        assert_eq!(e.column_meta, vec![0, 600, 600, 0]);
        assert!(e.column_name.is_empty());
        assert_eq!(e.unsigned_map(), None);
    }

    #[test]
    fn nullable_bits() {
        // test.funnytable, one nullable tinyint
        let data = b"\xd3\x01\x00\x00\x00\x00\x01\x00\x04test\x00\x0afunnytable\x00\x01\x01\x00\x01";
        let e = TableMapEvent::parse(data, Flavor::MySQL).unwrap();
        assert_eq!(e.column_count, 1);
        assert_eq!(e.nullable(0), (true, true));
    }
}
