use common::binlog::column::column_type::ColumnType;
use common::binlog::column::column_value::ColumnValue;
use common::err::replica_error::ReError;

use crate::column::datetime;
use crate::column::decimal::decode_decimal;
use crate::column::json::decode_json;
use crate::utils::slice_uint_le;

/// Flags that steer how scalar values materialize.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub use_decimal: bool,
    pub parse_time: bool,
    pub ignore_json_decode_err: bool,
}

/// Decode one column value, returning the value and the bytes consumed.
///
/// `unsigned` comes from the table map SIGNEDNESS metadata and only affects
/// the fixed-width integer types. The legacy `MYSQL_TYPE_STRING` override is
/// resolved first: when the metadata high byte is set it smuggles the real
/// type (enum/set/string) and the length.
pub fn decode_value(
    data: &[u8],
    col_type: u8,
    meta: u16,
    unsigned: bool,
    opts: &DecodeOptions,
) -> Result<(ColumnValue, usize), ReError> {
    let mut tp = col_type;
    let mut length = 0usize;

    if tp == u8::from(ColumnType::String) {
        if meta >= 256 {
            let b0 = (meta >> 8) as u8;
            let b1 = (meta & 0xff) as u8;
            if b0 & 0x30 != 0x30 {
                // up to 1024 bytes: two high length bits hide in the type byte
                length = (b1 as usize) | ((((b0 & 0x30) ^ 0x30) as usize) << 4);
                tp = b0 | 0x30;
            } else {
                length = b1 as usize;
                tp = b0;
            }
        } else {
            length = meta as usize;
        }
    }

    let col_type = ColumnType::try_from(tp)
        .map_err(|_| ReError::decode(0, format!("unknown column type {}", tp)))?;

    match col_type {
        ColumnType::Null => Ok((ColumnValue::Null, 0)),

        ColumnType::Tiny => int_value(data, 1, unsigned),
        ColumnType::Short => int_value(data, 2, unsigned),
        ColumnType::Int24 => int_value(data, 3, unsigned),
        ColumnType::Long => int_value(data, 4, unsigned),
        ColumnType::LongLong => int_value(data, 8, unsigned),

        ColumnType::NewDecimal => {
            let precision = (meta >> 8) as usize;
            let scale = (meta & 0xff) as usize;
            decode_decimal(data, precision, scale, opts.use_decimal)
        }

        ColumnType::Float => {
            let bits = slice_uint_le(data, 4)? as u32;
            Ok((ColumnValue::Float(f32::from_bits(bits)), 4))
        }
        ColumnType::Double => {
            let bits = slice_uint_le(data, 8)?;
            Ok((ColumnValue::Double(f64::from_bits(bits)), 8))
        }

        ColumnType::Bit => {
            let nbits = ((meta >> 8) * 8 + (meta & 0xff)) as usize;
            let n = (nbits + 7) / 8;
            if data.len() < n {
                return Err(ReError::incomplete());
            }
            Ok((ColumnValue::Bit(data[..n].to_vec()), n))
        }

        ColumnType::Timestamp => datetime::decode_timestamp(data, opts.parse_time),
        ColumnType::Timestamp2 => datetime::decode_timestamp2(data, meta, opts.parse_time),
        ColumnType::DateTime => datetime::decode_datetime(data, opts.parse_time),
        ColumnType::DateTime2 => datetime::decode_datetime2(data, meta, opts.parse_time),
        ColumnType::Time => datetime::decode_time(data),
        ColumnType::Time2 => datetime::decode_time2(data, meta),
        ColumnType::Date => datetime::decode_date(data),
        ColumnType::Year => datetime::decode_year(data),

        ColumnType::Enum => {
            let l = (meta & 0xff) as usize;
            match l {
                1 | 2 => Ok((ColumnValue::Enum(slice_uint_le(data, l)? as i64), l)),
                _ => Err(ReError::decode(0, format!("unknown enum width {}", l))),
            }
        }
        ColumnType::Set => {
            let n = (meta & 0xff) as usize;
            if n == 0 || n > 8 {
                return Err(ReError::decode(0, format!("unknown set width {}", n)));
            }
            Ok((ColumnValue::Set(slice_uint_le(data, n)? as i64), n))
        }

        ColumnType::Blob | ColumnType::Geometry => {
            let (payload, n) = length_prefixed(data, meta as usize)?;
            Ok((ColumnValue::Bytes(payload.to_vec()), n))
        }

        ColumnType::VarChar | ColumnType::VarString => decode_string(data, meta as usize),
        ColumnType::String => decode_string(data, length),

        ColumnType::Json => {
            let (payload, n) = length_prefixed(data, meta as usize)?;
            let text = decode_json(payload, opts.ignore_json_decode_err)?;
            Ok((ColumnValue::Text(text), n))
        }

        other => Err(ReError::decode(
            0,
            format!("unsupported column type {:?}", other),
        )),
    }
}

fn int_value(data: &[u8], n: usize, unsigned: bool) -> Result<(ColumnValue, usize), ReError> {
    let raw = slice_uint_le(data, n)?;
    if unsigned {
        return Ok((ColumnValue::Unsigned(raw), n));
    }
    // sign-extend from n bytes
    let shift = 64 - n * 8;
    Ok((ColumnValue::Signed(((raw << shift) as i64) >> shift), n))
}

/// `prefix_len`-byte little-endian length then that many payload bytes.
fn length_prefixed(data: &[u8], prefix_len: usize) -> Result<(&[u8], usize), ReError> {
    if prefix_len == 0 || prefix_len > 4 {
        return Err(ReError::decode(
            0,
            format!("invalid length prefix width {}", prefix_len),
        ));
    }
    let length = slice_uint_le(data, prefix_len)? as usize;
    let payload = data
        .get(prefix_len..prefix_len + length)
        .ok_or_else(ReError::incomplete)?;
    Ok((payload, prefix_len + length))
}

/// Variable-length string: one length byte under 256 max length, two above.
fn decode_string(data: &[u8], max_length: usize) -> Result<(ColumnValue, usize), ReError> {
    let prefix = if max_length < 256 { 1 } else { 2 };
    let (payload, n) = length_prefixed(data, prefix)?;
    Ok((
        ColumnValue::Text(String::from_utf8_lossy(payload).to_string()),
        n,
    ))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn signed_and_unsigned_ints() {
        let (v, n) = decode_value(&[0xff], 1, 0, false, &DecodeOptions::default()).unwrap();
        assert_eq!((v, n), (ColumnValue::Signed(-1), 1));

        let (v, _) = decode_value(&[0xff], 1, 0, true, &DecodeOptions::default()).unwrap();
        assert_eq!(v, ColumnValue::Unsigned(255));

        let (v, n) = decode_value(&[0x8e, 0x3f, 0, 0], 3, 0, false, &DecodeOptions::default())
            .unwrap();
        assert_eq!((v, n), (ColumnValue::Signed(16270), 3));
    }

    #[test]
    fn varchar_short_prefix() {
        // max_length < 256: one length byte
        let (v, n) =
            decode_value(b"\x07Charlie", 15, 100, false, &DecodeOptions::default()).unwrap();
        assert_eq!(v, ColumnValue::Text("Charlie".to_string()));
        assert_eq!(n, 8);

        // two length bytes above 255
        let (v, n) =
            decode_value(b"\x05\x00River", 15, 600, false, &DecodeOptions::default()).unwrap();
        assert_eq!(v, ColumnValue::Text("River".to_string()));
        assert_eq!(n, 7);
    }

    #[test]
    fn string_meta_override_enum() {
        // STRING carrying an enum: meta high byte 0xf7, one byte storage
        let meta = (0xf7u16 << 8) | 0x01;
        let (v, n) = decode_value(&[0x02], 254, meta, false, &DecodeOptions::default()).unwrap();
        assert_eq!((v, n), (ColumnValue::Enum(2), 1));

        // two byte storage
        let meta = (0xf7u16 << 8) | 0x02;
        let (v, n) =
            decode_value(&[0x01, 0x01], 254, meta, false, &DecodeOptions::default()).unwrap();
        assert_eq!((v, n), (ColumnValue::Enum(257), 2));
    }

    #[test]
    fn set_value() {
        let meta = (0xf8u16 << 8) | 0x03;
        let (v, n) =
            decode_value(&[0x05, 0x00, 0x00], 254, meta, false, &DecodeOptions::default())
                .unwrap();
        assert_eq!((v, n), (ColumnValue::Set(5), 3));
    }

    #[test]
    fn blob_two_byte_prefix() {
        let (v, n) = decode_value(b"\x03\x00abcdef", 252, 2, false, &DecodeOptions::default())
            .unwrap();
        assert_eq!(v, ColumnValue::Bytes(b"abc".to_vec()));
        assert_eq!(n, 5);
    }

    #[test]
    fn bit_width() {
        // bit(10): 1 full byte + 2 bits -> meta bytes<<8 | bits
        let meta = (1u16 << 8) | 2;
        let (v, n) = decode_value(&[0x02, 0xff], 16, meta, false, &DecodeOptions::default())
            .unwrap();
        assert_eq!((v, n), (ColumnValue::Bit(vec![0x02, 0xff]), 2));
    }
}
