use nom::{
    bytes::complete::take,
    number::complete::{le_i64, le_u8},
    IResult,
};
use serde::Serialize;

use crate::gtid::format_sid;

/// GTID_LOG_EVENT / ANONYMOUS_GTID_LOG_EVENT: announces the id of the
/// transaction whose events follow. The logical-clock tail (used by
/// multi-threaded appliers) is optional on the wire.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct GtidEvent {
    pub commit_flag: u8,
    /// canonical textual source id
    pub sid: String,
    pub gno: i64,
    pub last_committed: Option<i64>,
    pub sequence_number: Option<i64>,
}

impl GtidEvent {
    pub fn parse(input: &[u8]) -> IResult<&[u8], GtidEvent> {
        let (i, commit_flag) = le_u8(input)?;
        let (i, sid_raw) = take(16usize)(i)?;
        let mut sid = [0u8; 16];
        sid.copy_from_slice(sid_raw);
        let (i, gno) = le_i64(i)?;

        // logical timestamps were added in 5.7
        let (i, last_committed, sequence_number) = if i.len() >= 17 {
            let (i, _lc_typecode) = le_u8(i)?;
            let (i, last_committed) = le_i64(i)?;
            let (i, sequence_number) = le_i64(i)?;
            (i, Some(last_committed), Some(sequence_number))
        } else {
            (i, None, None)
        };

        Ok((
            i,
            GtidEvent {
                commit_flag,
                sid: format_sid(&sid),
                gno,
                last_committed,
                sequence_number,
            },
        ))
    }
}
