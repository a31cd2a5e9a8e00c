use std::str::FromStr;

use bigdecimal::BigDecimal;

use common::binlog::column::column_value::ColumnValue;
use common::err::replica_error::ReError;

/// See <a href="https://dev.mysql.com/doc/internals/en/date-and-time-data-type-representation.html">Docs</a>
const DIGITS_PER_INT: usize = 9;

/// Byte width of a decimal digit group holding 0..=9 leading digits.
const COMPRESSED_BYTES: [usize; 10] = [0, 1, 1, 2, 2, 3, 3, 4, 4, 4];

/// Total stored width of a DECIMAL(precision, decimals) value.
pub fn decimal_binary_size(precision: usize, decimals: usize) -> usize {
    let integral = precision - decimals;
    let uncomp_integral = integral / DIGITS_PER_INT;
    let uncomp_fractional = decimals / DIGITS_PER_INT;
    let comp_integral = integral - uncomp_integral * DIGITS_PER_INT;
    let comp_fractional = decimals - uncomp_fractional * DIGITS_PER_INT;

    uncomp_integral * 4
        + COMPRESSED_BYTES[comp_integral]
        + uncomp_fractional * 4
        + COMPRESSED_BYTES[comp_fractional]
}

fn decompress_value(comp_digits: usize, data: &[u8], mask: u8) -> (usize, u32) {
    let size = COMPRESSED_BYTES[comp_digits];
    let mut value = 0u32;
    for i in 0..size {
        value = (value << 8) | (data[i] ^ mask) as u32;
    }
    (size, value)
}

/// Decode the binary DECIMAL format.
///
/// The stored form splits both sides of the point into big-endian 9-digit
/// groups with a compressed head (integral) / tail (fractional) group. The
/// first byte's high bit carries the sign; a negative value stores every
/// byte inverted.
///
/// The canonical text keeps exactly `decimals` fractional digits. Returns
/// the value and the number of bytes consumed.
pub fn decode_decimal(
    data: &[u8],
    precision: usize,
    decimals: usize,
    use_decimal: bool,
) -> Result<(ColumnValue, usize), ReError> {
    let (text, consumed) = decode_decimal_string(data, precision, decimals)?;
    if use_decimal {
        let v = BigDecimal::from_str(&text)
            .map_err(|e| ReError::decode(0, format!("bad decimal {}: {}", text, e)))?;
        Ok((ColumnValue::DecimalValue(v), consumed))
    } else {
        Ok((ColumnValue::Decimal(text), consumed))
    }
}

pub fn decode_decimal_string(
    data: &[u8],
    precision: usize,
    decimals: usize,
) -> Result<(String, usize), ReError> {
    if precision == 0 || precision > 65 || decimals > precision {
        return Err(ReError::decode(
            0,
            format!("invalid decimal metadata ({},{})", precision, decimals),
        ));
    }

    let integral = precision - decimals;
    let uncomp_integral = integral / DIGITS_PER_INT;
    let uncomp_fractional = decimals / DIGITS_PER_INT;
    let comp_integral = integral - uncomp_integral * DIGITS_PER_INT;
    let comp_fractional = decimals - uncomp_fractional * DIGITS_PER_INT;

    let bin_size = decimal_binary_size(precision, decimals);
    if data.len() < bin_size {
        return Err(ReError::decode(
            data.len(),
            format!(
                "decimal({},{}) needs {} bytes, only {} remain",
                precision,
                decimals,
                bin_size,
                data.len()
            ),
        ));
    }

    // the sign transform below mutates, work on a copy
    let mut buf = data[..bin_size].to_vec();

    let negative = buf[0] & 0x80 == 0;
    let mask: u8 = if negative { 0xff } else { 0x00 };
    buf[0] ^= 0x80;

    let mut res = String::with_capacity(precision + 2);
    if negative {
        res.push('-');
    }

    let mut zero_leading = true;
    let (mut pos, value) = decompress_value(comp_integral, &buf, mask);
    if value != 0 {
        zero_leading = false;
        res.push_str(&value.to_string());
    }

    for _ in 0..uncomp_integral {
        let (_, value) = decompress_value(DIGITS_PER_INT, &buf[pos..], mask);
        pos += 4;
        if zero_leading {
            if value != 0 {
                zero_leading = false;
                res.push_str(&value.to_string());
            }
        } else {
            res.push_str(&format!("{:09}", value));
        }
    }

    if zero_leading {
        res.push('0');
    }

    if pos < bin_size {
        res.push('.');

        for _ in 0..uncomp_fractional {
            let (_, value) = decompress_value(DIGITS_PER_INT, &buf[pos..], mask);
            pos += 4;
            res.push_str(&format!("{:09}", value));
        }

        let (size, value) = decompress_value(comp_fractional, &buf[pos..], mask);
        if size > 0 {
            res.push_str(&format!("{:0width$}", value, width = comp_fractional));
            pos += size;
        }
    }

    Ok((res, pos))
}

#[cfg(test)]
mod test {
    use super::*;

    fn dec(data: &[u8], p: usize, s: usize) -> (String, usize) {
        decode_decimal_string(data, p, s).unwrap()
    }

    #[test]
    fn negative_small() {
        assert_eq!(dec(&[117, 200, 127, 255], 4, 2), ("-10.55".to_string(), 2));
    }

    #[test]
    fn positive_padding() {
        assert_eq!(dec(&[128, 1, 128, 0], 4, 2), ("0.01".to_string(), 2));
        assert_eq!(dec(&[128, 0, 0, 12, 128, 0], 7, 3), ("0.012".to_string(), 4));
    }

    #[test]
    fn too_short_input() {
        assert!(decode_decimal_string(&[128], 10, 2).is_err());
    }

    #[test]
    fn big_decimal_path() {
        let (v, pos) = decode_decimal(&[117, 200], 4, 2, true).unwrap();
        assert_eq!(pos, 2);
        match v {
            ColumnValue::DecimalValue(d) => {
                assert_eq!(d, BigDecimal::from_str("-10.55").unwrap())
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
