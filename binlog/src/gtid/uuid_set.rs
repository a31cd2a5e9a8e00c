use std::fmt::{Display, Formatter};

use serde::Serialize;

use common::err::replica_error::ReError;

use crate::gtid::interval::{normalize, Interval};
use crate::gtid::parse_sid;

/// All executed transactions of one source server: its uuid plus a
/// normalized list of gno runs.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct UuidSet {
    pub sid: String,
    pub intervals: Vec<Interval>,
}

impl UuidSet {
    pub fn new(sid: String, mut intervals: Vec<Interval>) -> Self {
        normalize(&mut intervals);
        UuidSet { sid, intervals }
    }

    /// Parse `uuid:1-3:7-9:12`. A bare `uuid` yields no intervals.
    pub fn parse(text: &str) -> Result<UuidSet, ReError> {
        let mut parts = text.split(':');
        let sid_text = parts
            .next()
            .ok_or_else(|| ReError::Error(format!("invalid uuid set {}", text)))?;
        let sid = crate::gtid::format_sid(&parse_sid(sid_text)?);

        let mut intervals = Vec::new();
        for token in parts {
            let range: Vec<&str> = token.split('-').collect();
            let interval = match range.len() {
                1 => {
                    let v: i64 = range[0].parse()?;
                    Interval::new(v, v + 1)
                }
                2 => {
                    let start: i64 = range[0].parse()?;
                    let stop: i64 = range[1].parse()?;
                    Interval::new(start, stop + 1)
                }
                _ => {
                    return Err(ReError::Error(format!(
                        "invalid interval format {}",
                        token
                    )))
                }
            };
            if interval.stop <= interval.start {
                return Err(ReError::Error(format!("invalid interval {}", token)));
            }
            intervals.push(interval);
        }

        Ok(UuidSet::new(sid, intervals))
    }

    /// Record one executed transaction number.
    pub fn add_gno(&mut self, gno: i64) {
        self.intervals.push(Interval::new(gno, gno + 1));
        normalize(&mut self.intervals);
    }

    pub fn push_interval(&mut self, interval: Interval) {
        self.intervals.push(interval);
        normalize(&mut self.intervals);
    }

    /// Every interval of `other` fully covered here.
    pub fn contains(&self, other: &UuidSet) -> bool {
        if self.sid != other.sid {
            return false;
        }
        other
            .intervals
            .iter()
            .all(|o| self.intervals.iter().any(|s| s.contains(o)))
    }

    /// Merge the runs of `other` (same sid assumed).
    pub fn union(&mut self, other: &UuidSet) {
        self.intervals.extend_from_slice(&other.intervals);
        normalize(&mut self.intervals);
    }
}

impl Display for UuidSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sid)?;
        for iv in &self.intervals {
            write!(f, ":{}", iv)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SID: &str = "de278ad0-2106-11e4-9f8e-6edd0ca20947";

    #[test]
    fn parse_and_display() {
        let s = UuidSet::parse(&format!("{}:1-3:7-9", SID)).unwrap();
        assert_eq!(s.to_string(), format!("{}:1-3:7-9", SID));

        let s = UuidSet::parse(&format!("{}:1-3:4", SID)).unwrap();
        assert_eq!(s.to_string(), format!("{}:1-4", SID));
    }

    #[test]
    fn add_gno_extends_runs() {
        let mut s = UuidSet::parse(&format!("{}:1-3", SID)).unwrap();
        s.add_gno(4);
        assert_eq!(s.to_string(), format!("{}:1-4", SID));
        s.add_gno(10);
        assert_eq!(s.to_string(), format!("{}:1-4:10", SID));
    }

    #[test]
    fn containment() {
        let a = UuidSet::parse(&format!("{}:1-10", SID)).unwrap();
        let b = UuidSet::parse(&format!("{}:2-4:7", SID)).unwrap();
        assert!(a.contains(&b));
        assert!(!b.contains(&a));
    }
}
