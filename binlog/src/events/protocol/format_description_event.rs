use nom::{
    bytes::complete::take,
    number::complete::{le_u16, le_u32, le_u8},
    IResult,
};
use serde::Serialize;

use crate::events::checksum_type::ChecksumType;
use crate::utils::extract_string;

/// First event of every binlog file; resets all decoding parameters.
///
/// Servers from 5.6.1 on append one checksum-algorithm byte (plus the
/// checksum itself) after the per-type post-header length table.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct FormatDescriptionEvent {
    pub binlog_version: u16,
    pub server_version: String,
    pub create_timestamp: u32,
    pub event_header_length: u8,
    pub event_type_header_lengths: Vec<u8>,
    pub checksum_type: ChecksumType,
}

/// `major*65536 + minor*256 + patch` of the version that introduced the
/// checksum-algorithm byte.
const CHECKSUM_VERSION_PRODUCT: u32 = 5 * 65536 + 6 * 256 + 1;

fn version_product(server_version: &str) -> u32 {
    let mut parts = server_version
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .take(3)
        .map(|s| s.parse::<u32>().unwrap_or(0));

    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);
    major * 65536 + minor * 256 + patch
}

impl FormatDescriptionEvent {
    /// Parses the raw body (its own trailing checksum still attached; the
    /// algorithm byte position depends on the server version).
    pub fn parse(input: &[u8]) -> IResult<&[u8], FormatDescriptionEvent> {
        let (i, binlog_version) = le_u16(input)?;
        let (i, raw_version) = take(50usize)(i)?;
        let server_version = extract_string(raw_version);
        let (i, create_timestamp) = le_u32(i)?;
        let (i, event_header_length) = le_u8(i)?;

        let (event_type_header_lengths, checksum_type) =
            if version_product(&server_version) >= CHECKSUM_VERSION_PRODUCT && i.len() >= 5 {
                // trailing: alg byte + 4-byte checksum of this event
                let alg = i[i.len() - 5];
                (
                    i[..i.len() - 5].to_vec(),
                    ChecksumType::from_code(alg),
                )
            } else {
                (i.to_vec(), ChecksumType::None)
            };

        Ok((
            &[],
            FormatDescriptionEvent {
                binlog_version,
                server_version,
                create_timestamp,
                event_header_length,
                event_type_header_lengths,
                checksum_type,
            },
        ))
    }
}
