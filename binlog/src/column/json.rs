use serde_json::{Map, Number, Value};

use common::err::replica_error::ReError;

use crate::column::decimal::decode_decimal_string;
use crate::utils::{slice_uint_be, slice_uint_le};

// Document type tags, one byte at the root and in each value entry.
const JSONB_SMALL_OBJECT: u8 = 0x00;
const JSONB_LARGE_OBJECT: u8 = 0x01;
const JSONB_SMALL_ARRAY: u8 = 0x02;
const JSONB_LARGE_ARRAY: u8 = 0x03;
const JSONB_LITERAL: u8 = 0x04;
const JSONB_INT16: u8 = 0x05;
const JSONB_UINT16: u8 = 0x06;
const JSONB_INT32: u8 = 0x07;
const JSONB_UINT32: u8 = 0x08;
const JSONB_INT64: u8 = 0x09;
const JSONB_UINT64: u8 = 0x0a;
const JSONB_DOUBLE: u8 = 0x0b;
const JSONB_STRING: u8 = 0x0c;
const JSONB_OPAQUE: u8 = 0x0f;

const JSONB_NULL_LITERAL: u8 = 0x00;
const JSONB_TRUE_LITERAL: u8 = 0x01;
const JSONB_FALSE_LITERAL: u8 = 0x02;

// Column type codes reachable inside OPAQUE payloads.
const TYPE_NEWDECIMAL: u8 = 246;
const TYPE_DECIMAL: u8 = 0;
const TYPE_TIME: u8 = 11;
const TYPE_TIME2: u8 = 19;
const TYPE_DATE: u8 = 10;
const TYPE_NEWDATE: u8 = 14;
const TYPE_DATETIME: u8 = 12;
const TYPE_DATETIME2: u8 = 18;
const TYPE_TIMESTAMP: u8 = 7;
const TYPE_TIMESTAMP2: u8 = 17;

/// Decode a binary JSON column payload into canonical minified text.
///
/// An empty payload (a JSON column updated to the SQL NULL tombstone, or a
/// pre-5.7.22 partial update) is the empty string. With `ignore_decode_err`
/// set, corrupt documents come back as the sentinel text "null".
pub fn decode_json(data: &[u8], ignore_decode_err: bool) -> Result<String, ReError> {
    if data.is_empty() {
        return Ok(String::new());
    }

    match decode_jsonb(data[0], &data[1..]) {
        Ok(v) => serde_json::to_string(&v)
            .map_err(|e| ReError::decode(0, format!("json serialize: {}", e))),
        Err(_) if ignore_decode_err => Ok("null".to_string()),
        Err(e) => Err(e),
    }
}

fn decode_jsonb(tp: u8, data: &[u8]) -> Result<Value, ReError> {
    match tp {
        JSONB_SMALL_OBJECT => decode_object(data, false),
        JSONB_LARGE_OBJECT => decode_object(data, true),
        JSONB_SMALL_ARRAY => decode_array(data, false),
        JSONB_LARGE_ARRAY => decode_array(data, true),
        JSONB_LITERAL => decode_literal(first(data)?),
        JSONB_INT16 => Ok(Value::from(slice_uint_le(data, 2)? as u16 as i16)),
        JSONB_UINT16 => Ok(Value::from(slice_uint_le(data, 2)? as u16)),
        JSONB_INT32 => Ok(Value::from(slice_uint_le(data, 4)? as u32 as i32)),
        JSONB_UINT32 => Ok(Value::from(slice_uint_le(data, 4)? as u32)),
        JSONB_INT64 => Ok(Value::from(slice_uint_le(data, 8)? as i64)),
        JSONB_UINT64 => Ok(Value::from(slice_uint_le(data, 8)?)),
        JSONB_DOUBLE => {
            let bits = slice_uint_le(data, 8)?;
            let f = f64::from_bits(bits);
            Ok(Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null))
        }
        JSONB_STRING => {
            let (len, pos) = decode_variable_length(data)?;
            let bytes = slice(data, pos, len)?;
            Ok(Value::String(String::from_utf8_lossy(bytes).to_string()))
        }
        JSONB_OPAQUE => decode_opaque(data),
        _ => Err(ReError::decode(0, format!("invalid json type {}", tp))),
    }
}

fn first(data: &[u8]) -> Result<u8, ReError> {
    data.first().copied().ok_or_else(ReError::incomplete)
}

fn slice(data: &[u8], pos: usize, len: usize) -> Result<&[u8], ReError> {
    pos.checked_add(len)
        .and_then(|end| data.get(pos..end))
        .ok_or_else(ReError::incomplete)
}

fn tail(data: &[u8], pos: usize) -> Result<&[u8], ReError> {
    data.get(pos..).ok_or_else(ReError::incomplete)
}

fn decode_literal(b: u8) -> Result<Value, ReError> {
    match b {
        JSONB_NULL_LITERAL => Ok(Value::Null),
        JSONB_TRUE_LITERAL => Ok(Value::Bool(true)),
        JSONB_FALSE_LITERAL => Ok(Value::Bool(false)),
        _ => Err(ReError::decode(0, format!("invalid json literal {}", b))),
    }
}

/// The high bit of each byte continues the length; 7 value bits per byte,
/// little-endian groups, at most 5 bytes.
fn decode_variable_length(data: &[u8]) -> Result<(usize, usize), ReError> {
    let mut length: u64 = 0;
    for pos in 0..5.min(data.len()) {
        let v = data[pos];
        length |= ((v & 0x7f) as u64) << (7 * pos);
        if v & 0x80 == 0 {
            return Ok((length as usize, pos + 1));
        }
    }
    Err(ReError::decode(0, "invalid json variable length"))
}

fn entry_size(large: bool) -> usize {
    if large {
        4
    } else {
        2
    }
}

fn read_offset_or_inline(data: &[u8], pos: usize, large: bool) -> Result<(u8, u64), ReError> {
    let entry = tail(data, pos)?;
    let tp = first(entry)?;
    let v = slice_uint_le(tail(entry, 1)?, if large { 4 } else { 2 })?;
    Ok((tp, v))
}

fn is_inline(tp: u8, large: bool) -> bool {
    match tp {
        JSONB_LITERAL | JSONB_INT16 | JSONB_UINT16 => true,
        JSONB_INT32 | JSONB_UINT32 => large,
        _ => false,
    }
}

fn decode_inline(tp: u8, raw: u64) -> Result<Value, ReError> {
    match tp {
        JSONB_LITERAL => decode_literal(raw as u8),
        JSONB_INT16 => Ok(Value::from(raw as u16 as i16)),
        JSONB_UINT16 => Ok(Value::from(raw as u16)),
        JSONB_INT32 => Ok(Value::from(raw as u32 as i32)),
        JSONB_UINT32 => Ok(Value::from(raw as u32)),
        _ => Err(ReError::decode(0, format!("json type {} is not inline", tp))),
    }
}

fn decode_object(data: &[u8], large: bool) -> Result<Value, ReError> {
    let w = entry_size(large);

    let count = slice_uint_le(data, w)? as usize;
    let size = slice_uint_le(tail(data, w)?, w)? as usize;
    if size > data.len() {
        return Err(ReError::decode(
            0,
            format!("json object size {} exceeds buffer {}", size, data.len()),
        ));
    }

    // key entries: (offset, len u16); value entries: (type, offset-or-inline)
    let key_entries = 2 * w;
    let value_entries = key_entries + count * (w + 2);

    let mut object = Map::with_capacity(count);
    for i in 0..count {
        let kpos = key_entries + i * (w + 2);
        let key_offset = slice_uint_le(tail(data, kpos)?, w)? as usize;
        let key_len = slice_uint_le(tail(data, kpos + w)?, 2)? as usize;
        let key = String::from_utf8_lossy(slice(data, key_offset, key_len)?).to_string();

        let (tp, raw) = read_offset_or_inline(data, value_entries + i * (w + 1), large)?;
        let value = if is_inline(tp, large) {
            decode_inline(tp, raw)?
        } else {
            decode_jsonb(tp, tail(data, raw as usize)?)?
        };
        object.insert(key, value);
    }

    Ok(Value::Object(object))
}

fn decode_array(data: &[u8], large: bool) -> Result<Value, ReError> {
    let w = entry_size(large);

    let count = slice_uint_le(data, w)? as usize;
    let size = slice_uint_le(tail(data, w)?, w)? as usize;
    if size > data.len() {
        return Err(ReError::decode(
            0,
            format!("json array size {} exceeds buffer {}", size, data.len()),
        ));
    }

    let value_entries = 2 * w;

    let mut array = Vec::with_capacity(count);
    for i in 0..count {
        let (tp, raw) = read_offset_or_inline(data, value_entries + i * (w + 1), large)?;
        let value = if is_inline(tp, large) {
            decode_inline(tp, raw)?
        } else {
            decode_jsonb(tp, tail(data, raw as usize)?)?
        };
        array.push(value);
    }

    Ok(Value::Array(array))
}

fn decode_opaque(data: &[u8]) -> Result<Value, ReError> {
    let tp = first(data)?;
    let (len, pos) = decode_variable_length(&data[1..])?;
    let payload = slice(data, 1 + pos, len)?;

    match tp {
        TYPE_NEWDECIMAL | TYPE_DECIMAL => {
            let precision = first(payload)? as usize;
            let scale = first(&payload[1..])? as usize;
            let (text, _) = decode_decimal_string(&payload[2..], precision, scale)?;
            Ok(Value::String(text))
        }
        TYPE_TIME | TYPE_TIME2 => Ok(Value::String(opaque_time(payload)?)),
        TYPE_DATE | TYPE_NEWDATE | TYPE_DATETIME | TYPE_DATETIME2 | TYPE_TIMESTAMP
        | TYPE_TIMESTAMP2 => Ok(Value::String(opaque_datetime(payload)?)),
        _ => Ok(Value::String(String::from_utf8_lossy(payload).to_string())),
    }
}

fn opaque_time(data: &[u8]) -> Result<String, ReError> {
    let v = slice_uint_le(data, 8)? as i64;
    if v == 0 {
        return Ok("00:00:00".to_string());
    }
    let (sign, v) = if v < 0 { ("-", -v) } else { ("", v) };

    let int_part = v >> 24;
    let hour = (int_part >> 12) % (1 << 10);
    let minute = (int_part >> 6) % (1 << 6);
    let second = int_part % (1 << 6);
    let frac = v % (1 << 24);

    Ok(format!(
        "{}{:02}:{:02}:{:02}.{:06}",
        sign, hour, minute, second, frac
    ))
}

fn opaque_datetime(data: &[u8]) -> Result<String, ReError> {
    let v = slice_uint_le(data, 8)? as i64;
    if v == 0 {
        return Ok("0000-00-00 00:00:00".to_string());
    }

    let sec = v >> 24;
    let frac = v % (1 << 24);

    let ymd = sec >> 17;
    let ym = ymd >> 5;
    let hms = sec % (1 << 17);

    Ok(format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
        ym / 13,
        ym % 13,
        ymd % (1 << 5),
        hms >> 12,
        (hms >> 6) % (1 << 6),
        hms % (1 << 6),
        frac
    ))
}
