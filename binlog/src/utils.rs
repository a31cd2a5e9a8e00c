use nom::{
    bytes::complete::{take, take_till},
    combinator::map,
    number::complete::{le_u16, le_u32, le_u64, le_u8},
    IResult,
};

use common::err::replica_error::ReError;

/// extract a string up to the first NUL (or the whole slice)
pub fn extract_string(input: &[u8]) -> String {
    let null_end = input.iter().position(|&c| c == b'\0').unwrap_or(input.len());
    String::from_utf8_lossy(&input[0..null_end]).to_string()
}

/// parse fixed len int, little-endian
///
/// ref: https://dev.mysql.com/doc/internals/en/integer.html#fixed-length-integer
pub fn int_fixed(input: &[u8], len: u8) -> IResult<&[u8], u64> {
    match len {
        1 => map(le_u8, |v| v as u64)(input),
        2 => map(le_u16, |v| v as u64)(input),
        3 | 6 => map(take(len as usize), |s: &[u8]| {
            s.iter()
                .rev()
                .fold(0u64, |acc, &b| (acc << 8) | b as u64)
        })(input),
        4 => map(le_u32, |v| v as u64)(input),
        8 => le_u64(input),
        _ => unreachable!(),
    }
}

/// parse len encoded int, return (used_bytes, value)
///
/// ref: https://dev.mysql.com/doc/internals/en/integer.html#packet-Protocol::LengthEncodedInteger
pub fn read_len_enc_num(input: &[u8]) -> IResult<&[u8], (usize, u64)> {
    match input[0] {
        0..=0xfa => map(le_u8, |num: u8| (1, num as u64))(input),
        0xfb | 0xfc => {
            let (i, _) = take(1usize)(input)?;
            map(le_u16, |num: u16| (3, num as u64))(i)
        }
        0xfd => {
            let (i, _) = take(1usize)(input)?;
            map(take(3usize), |s: &[u8]| {
                (
                    4,
                    s.iter().rev().fold(0u64, |acc, &b| (acc << 8) | b as u64),
                )
            })(i)
        }
        0xfe => {
            let (i, _) = take(1usize)(input)?;
            map(le_u64, |v: u64| (9, v))(i)
        }
        0xff => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        ))),
    }
}

/// parse length encoded string
pub fn read_len_enc_str(input: &[u8]) -> IResult<&[u8], String> {
    let (i, (_, str_len)) = read_len_enc_num(input)?;
    map(take(str_len), |s: &[u8]| {
        String::from_utf8_lossy(s).to_string()
    })(i)
}

/// parse 'null terminated string', consume the null byte
pub fn read_null_term_string(input: &[u8]) -> IResult<&[u8], String> {
    let (i, ret) = map(take_till(|c: u8| c == 0x00), |s| {
        String::from_utf8_lossy(s).to_string()
    })(input)?;
    let (i, _) = take(1usize)(i)?;
    Ok((i, ret))
}

/// fixed len string: one length byte, then that many bytes of value
pub fn read_fixed_len_string(input: &[u8]) -> IResult<&[u8], (u8, String)> {
    let (i, len) = le_u8(input)?;
    map(take(len), move |s: &[u8]| {
        (len, String::from_utf8_lossy(s).to_string())
    })(i)
}

//////////////////////////////////////////////////////////////////////////
// Plain-slice readers for the codec inner loops. These return
// (value, consumed) so rows decoding can keep exact byte offsets for its
// error reports.
//////////////////////////////////////////////////////////////////////////

/// little-endian fixed int off a plain slice
pub fn slice_uint_le(data: &[u8], n: usize) -> Result<u64, ReError> {
    if data.len() < n {
        return Err(ReError::incomplete());
    }
    let mut v = 0u64;
    for i in (0..n).rev() {
        v = (v << 8) | data[i] as u64;
    }
    Ok(v)
}

/// big-endian fixed int off a plain slice
pub fn slice_uint_be(data: &[u8], n: usize) -> Result<u64, ReError> {
    if data.len() < n {
        return Err(ReError::incomplete());
    }
    let mut v = 0u64;
    for &b in &data[..n] {
        v = (v << 8) | b as u64;
    }
    Ok(v)
}

/// length-encoded integer off a plain slice, returns (value, is_null, consumed)
pub fn slice_len_enc_num(data: &[u8]) -> Result<(u64, bool, usize), ReError> {
    if data.is_empty() {
        return Err(ReError::incomplete());
    }
    match data[0] {
        0xfb => Ok((0, true, 1)),
        0xfc => Ok((slice_uint_le(&data[1..], 2)?, false, 3)),
        0xfd => Ok((slice_uint_le(&data[1..], 3)?, false, 4)),
        0xfe => Ok((slice_uint_le(&data[1..], 8)?, false, 9)),
        b => Ok((b as u64, false, 1)),
    }
}

/// bytes needed to hold `n` bits
pub fn bitmap_byte_len(column_count: usize) -> usize {
    (column_count + 7) / 8
}

/// bit `i` of a little-endian packed bitmap
pub fn get_bit(bitmap: &[u8], i: usize) -> bool {
    bitmap[i >> 3] & (1 << (i & 7)) != 0
}

/// number of set bits over the first `count` bits
pub fn bit_count(bitmap: &[u8], count: usize) -> usize {
    (0..count).filter(|&i| get_bit(bitmap, i)).count()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn len_enc_num() {
        let (rest, (used, v)) = read_len_enc_num(&[0xfa, 0x01]).unwrap();
        assert_eq!((used, v), (1, 0xfa));
        assert_eq!(rest, &[0x01]);

        let (_, (used, v)) = read_len_enc_num(&[0xfc, 0x10, 0x27]).unwrap();
        assert_eq!((used, v), (3, 10000));

        let (_, (used, v)) = read_len_enc_num(&[0xfd, 0x01, 0x00, 0x01]).unwrap();
        assert_eq!((used, v), (4, 0x010001));

        let (_, (used, v)) =
            read_len_enc_num(&[0xfe, 1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!((used, v), (9, 1));
    }

    #[test]
    fn fixed_ints() {
        let (_, v) = int_fixed(&[0x2d, 0x0a, 0x00, 0x00, 0x00, 0x00], 6).unwrap();
        assert_eq!(v, 2605);
        assert_eq!(slice_uint_le(&[0x2d, 0x0a, 0x00], 3).unwrap(), 2605);
        assert_eq!(slice_uint_be(&[0x01, 0x00], 2).unwrap(), 256);
    }

    #[test]
    fn null_term_string() {
        let (rest, s) = read_null_term_string(b"pets\0cats").unwrap();
        assert_eq!(s, "pets");
        assert_eq!(rest, b"cats");
    }

    #[test]
    fn bitmaps() {
        // 0b0000_0101: bits 0 and 2
        let bm = [0x05u8];
        assert!(get_bit(&bm, 0));
        assert!(!get_bit(&bm, 1));
        assert!(get_bit(&bm, 2));
        assert_eq!(bit_count(&bm, 8), 2);
        assert_eq!(bitmap_byte_len(9), 2);
    }
}
