use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::Serialize;

use common::err::replica_error::ReError;

use crate::gtid::interval::Interval;
use crate::gtid::uuid_set::UuidSet;
use crate::gtid::{format_sid, parse_sid};

/// MySQL-flavor executed set: `uuid:i-j[:k-l...][,uuid:...]`.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct MysqlGtidSet {
    pub sets: BTreeMap<String, UuidSet>,
}

impl MysqlGtidSet {
    pub fn new() -> Self {
        MysqlGtidSet {
            sets: BTreeMap::new(),
        }
    }

    /// Parse the `gtid_executed` text form. Newlines between uuid sets (as
    /// the server prints them) are tolerated.
    pub fn parse(text: &str) -> Result<MysqlGtidSet, ReError> {
        let mut sets = BTreeMap::new();
        if !text.trim().is_empty() {
            let cleaned = text.replace('\n', "");
            for part in cleaned.split(',') {
                let us = UuidSet::parse(part.trim())?;
                sets.insert(us.sid.clone(), us);
            }
        }
        Ok(MysqlGtidSet { sets })
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Record one executed transaction.
    pub fn add_gtid(&mut self, sid: &str, gno: i64) -> Result<(), ReError> {
        let sid = format_sid(&parse_sid(sid)?);
        self.sets
            .entry(sid.clone())
            .or_insert_with(|| UuidSet::new(sid, vec![]))
            .add_gno(gno);
        Ok(())
    }

    pub fn contains(&self, other: &MysqlGtidSet) -> bool {
        other.sets.iter().all(|(sid, o)| {
            self.sets
                .get(sid)
                .map(|s| s.contains(o))
                .unwrap_or(false)
        })
    }

    pub fn union(&mut self, other: &MysqlGtidSet) {
        for (sid, o) in &other.sets {
            match self.sets.get_mut(sid) {
                Some(s) => s.union(o),
                None => {
                    self.sets.insert(sid.clone(), o.clone());
                }
            }
        }
    }

    /// Binary form the `COM_BINLOG_DUMP_GTID` command carries:
    /// `n_sids u64 | (sid 16B | n_intervals u64 | (start u64, stop u64)*)*`
    pub fn encode(&self) -> Result<Vec<u8>, ReError> {
        let mut buf = Vec::with_capacity(8 + self.sets.len() * 40);
        buf.extend_from_slice(&(self.sets.len() as u64).to_le_bytes());

        for us in self.sets.values() {
            buf.extend_from_slice(&parse_sid(&us.sid)?);
            buf.extend_from_slice(&(us.intervals.len() as u64).to_le_bytes());
            for iv in &us.intervals {
                buf.extend_from_slice(&(iv.start as u64).to_le_bytes());
                buf.extend_from_slice(&(iv.stop as u64).to_le_bytes());
            }
        }
        Ok(buf)
    }

    /// Inverse of `encode`, used for PREVIOUS_GTIDS bodies.
    pub fn decode(data: &[u8]) -> Result<MysqlGtidSet, ReError> {
        let mut sets = BTreeMap::new();
        let mut pos = 0usize;

        let n_sids = read_u64(data, &mut pos)?;
        for _ in 0..n_sids {
            if data.len() < pos + 16 {
                return Err(ReError::incomplete());
            }
            let mut sid = [0u8; 16];
            sid.copy_from_slice(&data[pos..pos + 16]);
            pos += 16;
            let sid = format_sid(&sid);

            let n_intervals = read_u64(data, &mut pos)?;
            let mut intervals = Vec::with_capacity(n_intervals as usize);
            for _ in 0..n_intervals {
                let start = read_u64(data, &mut pos)? as i64;
                let stop = read_u64(data, &mut pos)? as i64;
                intervals.push(Interval::new(start, stop));
            }
            sets.insert(sid.clone(), UuidSet::new(sid, intervals));
        }

        Ok(MysqlGtidSet { sets })
    }
}

fn read_u64(data: &[u8], pos: &mut usize) -> Result<u64, ReError> {
    let bytes = data
        .get(*pos..*pos + 8)
        .ok_or_else(ReError::incomplete)?;
    *pos += 8;
    Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
}

impl Display for MysqlGtidSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for us in self.sets.values() {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            write!(f, "{}", us)?;
        }
        Ok(())
    }
}
