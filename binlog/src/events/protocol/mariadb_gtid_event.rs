use nom::{
    number::complete::{le_u32, le_u64, le_u8},
    IResult,
};
use serde::Serialize;

use crate::gtid::mariadb_gtid_set::{MariadbGtid, MariadbGtidSet};

/// MARIADB_GTID_EVENT: replaces the BEGIN query event per transaction.
/// The server id half of the gtid comes from the common header.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct MariadbGtidEvent {
    pub sequence: u64,
    pub domain_id: u32,
    pub flags: u8,
}

/// FL_STANDALONE: no terminal COMMIT follows.
pub const FL_STANDALONE: u8 = 1;

impl MariadbGtidEvent {
    pub fn parse(input: &[u8]) -> IResult<&[u8], MariadbGtidEvent> {
        let (i, sequence) = le_u64(input)?;
        let (i, domain_id) = le_u32(i)?;
        let (i, flags) = le_u8(i)?;

        Ok((
            i,
            MariadbGtidEvent {
                sequence,
                domain_id,
                flags,
            },
        ))
    }

    pub fn to_gtid(&self, server_id: u32) -> MariadbGtid {
        MariadbGtid {
            domain_id: self.domain_id,
            server_id,
            sequence: self.sequence,
        }
    }
}

/// MARIADB_GTID_LIST_EVENT: the executed state at the head of each file.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct MariadbGtidListEvent {
    pub gtid_set: MariadbGtidSet,
}

impl MariadbGtidListEvent {
    pub fn parse(input: &[u8]) -> IResult<&[u8], MariadbGtidListEvent> {
        let (mut i, count_and_flags) = le_u32(input)?;
        let count = count_and_flags & 0x0fff_ffff;

        let mut gtid_set = MariadbGtidSet::new();
        for _ in 0..count {
            let (rest, domain_id) = le_u32(i)?;
            let (rest, server_id) = le_u32(rest)?;
            let (rest, sequence) = le_u64(rest)?;
            i = rest;
            gtid_set.add(MariadbGtid {
                domain_id,
                server_id,
                sequence,
            });
        }

        Ok((i, MariadbGtidListEvent { gtid_set }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_gtid() {
        let mut body = Vec::new();
        body.extend_from_slice(&577u64.to_le_bytes());
        body.extend_from_slice(&2u32.to_le_bytes());
        body.push(FL_STANDALONE);

        let (_, e) = MariadbGtidEvent::parse(&body).unwrap();
        assert_eq!(e.sequence, 577);
        assert_eq!(e.domain_id, 2);
        assert_eq!(e.to_gtid(7).to_string(), "2-7-577");
    }

    #[test]
    fn parse_gtid_list() {
        let mut body = Vec::new();
        body.extend_from_slice(&2u32.to_le_bytes());
        for (d, s, q) in [(0u32, 1u32, 10u64), (1, 1, 20)] {
            body.extend_from_slice(&d.to_le_bytes());
            body.extend_from_slice(&s.to_le_bytes());
            body.extend_from_slice(&q.to_le_bytes());
        }

        let (_, e) = MariadbGtidListEvent::parse(&body).unwrap();
        assert_eq!(e.gtid_set.to_string(), "0-1-10,1-1-20");
    }
}
