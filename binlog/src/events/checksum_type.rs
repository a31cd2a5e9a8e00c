use serde::Serialize;

use common::err::replica_error::ReError;

pub const CHECKSUM_LEN: usize = 4;

/// Binlog checksum algorithm, negotiated with
/// `SET @master_binlog_checksum = @@global.binlog_checksum` and confirmed by
/// the FORMAT_DESCRIPTION event's trailing algorithm byte.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumType {
    #[default]
    None,
    Crc32,
}

impl ChecksumType {
    pub fn from_code(code: u8) -> ChecksumType {
        match code {
            1 => ChecksumType::Crc32,
            _ => ChecksumType::None,
        }
    }

    pub fn from_name(name: &str) -> ChecksumType {
        if name.eq_ignore_ascii_case("CRC32") {
            ChecksumType::Crc32
        } else {
            ChecksumType::None
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChecksumType::None => 0,
            ChecksumType::Crc32 => CHECKSUM_LEN,
        }
    }
}

/// Validate and strip the CRC32 trailer of a raw event (header included).
/// Returns the event bytes without the trailer.
pub fn verify_and_strip<'a>(raw: &'a [u8], alg: ChecksumType) -> Result<&'a [u8], ReError> {
    match alg {
        ChecksumType::None => Ok(raw),
        ChecksumType::Crc32 => {
            if raw.len() < CHECKSUM_LEN {
                return Err(ReError::incomplete());
            }
            let (body, tail) = raw.split_at(raw.len() - CHECKSUM_LEN);
            let expected = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
            let actual = crc32fast::hash(body);
            if expected != actual {
                return Err(ReError::decode(
                    body.len(),
                    format!("checksum mismatch, got {:08x} want {:08x}", actual, expected),
                ));
            }
            Ok(body)
        }
    }
}
