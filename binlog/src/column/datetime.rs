use chrono::{NaiveDate, NaiveDateTime};

use common::binlog::column::column_value::ColumnValue;
use common::err::replica_error::ReError;

use crate::utils::{slice_uint_be, slice_uint_le};

// Packed temporal offsets, see
// https://dev.mysql.com/doc/internals/en/date-and-time-data-type-representation.html
const DATETIMEF_INT_OFS: i64 = 0x8000000000;
const TIMEF_OFS: i64 = 0x800000000000;
const TIMEF_INT_OFS: i64 = 0x800000;

/// ".ffffff" truncated to `dec` digits; empty when `dec` is 0.
fn format_frac(frac_us: u32, dec: u16) -> String {
    if dec == 0 {
        return String::new();
    }
    let dec = dec.min(6) as usize;
    let s = format!("{:06}", frac_us);
    format!(".{}", &s[..dec])
}

fn format_zero_time(frac_us: u32, dec: u16) -> ColumnValue {
    ColumnValue::Text(format!("0000-00-00 00:00:00{}", format_frac(frac_us, dec)))
}

/// DATETIME2: 5-byte big-endian sign-flipped integer packing
/// year*13+month / day / hour / minute / second, then 0-3 fractional bytes.
/// Zero date components always come back as the canonical string, whatever
/// `parse_time` says.
pub fn decode_datetime2(
    data: &[u8],
    dec: u16,
    parse_time: bool,
) -> Result<(ColumnValue, usize), ReError> {
    let int_part = slice_uint_be(data, 5)? as i64 - DATETIMEF_INT_OFS;
    let (frac, n): (i64, usize) = match dec {
        1 | 2 => {
            if data.len() < 6 {
                return Err(ReError::incomplete());
            }
            (data[5] as i64 * 10000, 6)
        }
        3 | 4 => (slice_uint_be(&data[5..], 2)? as i64 * 100, 7),
        5 | 6 => (slice_uint_be(&data[5..], 3)? as i64, 8),
        _ => (0, 5),
    };

    if int_part == 0 {
        return Ok((format_zero_time(frac as u32, dec), n));
    }

    let mut tmp = (int_part << 24) + frac;
    if tmp < 0 {
        tmp = -tmp;
    }

    let frac_us = (tmp % (1 << 24)) as u32;
    let ymdhms = tmp >> 24;

    let ymd = ymdhms >> 17;
    let ym = ymd >> 5;
    let hms = ymdhms % (1 << 17);

    let day = (ymd % (1 << 5)) as u32;
    let month = (ym % 13) as u32;
    let year = (ym / 13) as i32;

    let second = (hms % (1 << 6)) as u32;
    let minute = ((hms >> 6) % (1 << 6)) as u32;
    let hour = (hms >> 12) as u32;

    if parse_time && year > 0 && month > 0 && day > 0 {
        let dt = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_micro_opt(hour, minute, second, frac_us));
        if let Some(dt) = dt {
            return Ok((ColumnValue::DateTime(dt), n));
        }
    }

    Ok((
        ColumnValue::Text(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}{}",
            year,
            month,
            day,
            hour,
            minute,
            second,
            format_frac(frac_us, dec)
        )),
        n,
    ))
}

/// TIME2: 3-byte big-endian sign-flipped integer plus fractional bytes.
/// Negative values are the two's complement of the payload; a nonzero
/// fraction borrows one from the integer part. Always yields the canonical
/// `[-]HHH:MM:SS[.frac]` string.
pub fn decode_time2(data: &[u8], dec: u16) -> Result<(ColumnValue, usize), ReError> {
    let (tmp, n): (i64, usize) = match dec {
        1 | 2 => {
            let mut int_part = slice_uint_be(data, 3)? as i64 - TIMEF_INT_OFS;
            if data.len() < 4 {
                return Err(ReError::incomplete());
            }
            let mut frac = data[3] as i64;
            if int_part < 0 && frac != 0 {
                int_part += 1;
                frac -= 0x100;
            }
            (int_part * (1 << 24) + frac * 10000, 4)
        }
        3 | 4 => {
            let mut int_part = slice_uint_be(data, 3)? as i64 - TIMEF_INT_OFS;
            let mut frac = slice_uint_be(&data[3..], 2)? as i64;
            if int_part < 0 && frac != 0 {
                int_part += 1;
                frac -= 0x10000;
            }
            (int_part * (1 << 24) + frac * 100, 5)
        }
        5 | 6 => (slice_uint_be(data, 6)? as i64 - TIMEF_OFS, 6),
        _ => {
            let int_part = slice_uint_be(data, 3)? as i64 - TIMEF_INT_OFS;
            (int_part * (1 << 24), 3)
        }
    };

    if tmp == 0 {
        return Ok((ColumnValue::Text("00:00:00".to_string()), n));
    }

    let (sign, tmp) = if tmp < 0 { ("-", -tmp) } else { ("", tmp) };

    let hms = tmp >> 24;
    let hour = (hms >> 12) % (1 << 10);
    let minute = (hms >> 6) % (1 << 6);
    let second = hms % (1 << 6);
    let frac_us = (tmp % (1 << 24)) as u32;

    let text = if frac_us != 0 {
        format!(
            "{}{:02}:{:02}:{:02}{}",
            sign,
            hour,
            minute,
            second,
            format_frac(frac_us, dec)
        )
    } else {
        format!("{}{:02}:{:02}:{:02}", sign, hour, minute, second)
    };
    Ok((ColumnValue::Text(text), n))
}

/// TIMESTAMP2: big-endian seconds plus fractional bytes.
pub fn decode_timestamp2(
    data: &[u8],
    dec: u16,
    parse_time: bool,
) -> Result<(ColumnValue, usize), ReError> {
    let sec = slice_uint_be(data, 4)? as i64;
    let (usec, n): (i64, usize) = match dec {
        1 | 2 => {
            if data.len() < 5 {
                return Err(ReError::incomplete());
            }
            (data[4] as i64 * 10000, 5)
        }
        3 | 4 => (slice_uint_be(&data[4..], 2)? as i64 * 100, 6),
        5 | 6 => (slice_uint_be(&data[4..], 3)? as i64, 7),
        _ => (0, 4),
    };

    if sec == 0 {
        return Ok((format_zero_time(usec as u32, dec), n));
    }

    let dt = NaiveDateTime::from_timestamp_opt(sec, (usec * 1000) as u32)
        .ok_or_else(|| ReError::decode(0, format!("bad timestamp {}", sec)))?;
    if parse_time {
        Ok((ColumnValue::DateTime(dt), n))
    } else {
        Ok((
            ColumnValue::Text(format!(
                "{}{}",
                dt.format("%Y-%m-%d %H:%M:%S"),
                format_frac(usec as u32, dec)
            )),
            n,
        ))
    }
}

/// Legacy TIMESTAMP: little-endian seconds, no fraction.
pub fn decode_timestamp(data: &[u8], parse_time: bool) -> Result<(ColumnValue, usize), ReError> {
    let sec = slice_uint_le(data, 4)? as i64;
    if sec == 0 {
        return Ok((format_zero_time(0, 0), 4));
    }
    let dt = NaiveDateTime::from_timestamp_opt(sec, 0)
        .ok_or_else(|| ReError::decode(0, format!("bad timestamp {}", sec)))?;
    if parse_time {
        Ok((ColumnValue::DateTime(dt), 4))
    } else {
        Ok((
            ColumnValue::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            4,
        ))
    }
}

/// Legacy DATETIME: decimal-packed u64, `YYYYMMDDhhmmss`.
pub fn decode_datetime(data: &[u8], parse_time: bool) -> Result<(ColumnValue, usize), ReError> {
    let mut v = slice_uint_le(data, 8)?;
    if v == 0 {
        return Ok((format_zero_time(0, 0), 8));
    }

    let d = v / 1_000_000;
    v %= 1_000_000;

    let year = (d / 10000) as i32;
    let month = ((d % 10000) / 100) as u32;
    let day = (d % 100) as u32;
    let hour = (v / 10000) as u32;
    let minute = ((v % 10000) / 100) as u32;
    let second = (v % 100) as u32;

    if parse_time && year > 0 && month > 0 && day > 0 {
        let dt = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second));
        if let Some(dt) = dt {
            return Ok((ColumnValue::DateTime(dt), 8));
        }
    }

    Ok((
        ColumnValue::Text(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            year, month, day, hour, minute, second
        )),
        8,
    ))
}

/// DATE: 3-byte little-endian day/month/year bit pack.
pub fn decode_date(data: &[u8]) -> Result<(ColumnValue, usize), ReError> {
    let v = slice_uint_le(data, 3)? as u32;
    if v == 0 {
        return Ok((ColumnValue::Text("0000-00-00".to_string()), 3));
    }
    let day = v % (1 << 5);
    let month = (v >> 5) % (1 << 4);
    let year = v >> 9;
    Ok((
        ColumnValue::Text(format!("{:04}-{:02}-{:02}", year, month, day)),
        3,
    ))
}

/// Legacy TIME: 3-byte decimal-packed `hhmmss`.
pub fn decode_time(data: &[u8]) -> Result<(ColumnValue, usize), ReError> {
    let v = slice_uint_le(data, 3)? as u32;
    if v == 0 {
        return Ok((ColumnValue::Text("00:00:00".to_string()), 3));
    }
    Ok((
        ColumnValue::Text(format!(
            "{:02}:{:02}:{:02}",
            v / 10000,
            (v % 10000) / 100,
            v % 100
        )),
        3,
    ))
}

/// YEAR: single byte, 1900-based; zero stays zero.
pub fn decode_year(data: &[u8]) -> Result<(ColumnValue, usize), ReError> {
    if data.is_empty() {
        return Err(ReError::incomplete());
    }
    let year = data[0] as u16;
    let v = if year == 0 { 0 } else { year + 1900 };
    Ok((ColumnValue::Year(v), 1))
}
