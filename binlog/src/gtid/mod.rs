use std::fmt::{Display, Formatter};

use serde::Serialize;

use common::config::Flavor;
use common::err::replica_error::ReError;

pub mod gtid_set;
pub mod interval;
pub mod mariadb_gtid_set;
pub mod uuid_set;

pub use gtid_set::MysqlGtidSet;
pub use mariadb_gtid_set::{MariadbGtid, MariadbGtidSet};

/// Parse a textual source id `3E11FA47-71CA-11E1-9E33-C80AA9429562` into its
/// 16 raw bytes. Case-insensitive.
pub fn parse_sid(text: &str) -> Result<[u8; 16], ReError> {
    let hex: String = text.chars().filter(|c| *c != '-').collect();
    if hex.len() != 32 || !hex.is_ascii() {
        return Err(ReError::Error(format!("invalid server uuid {}", text)));
    }
    let mut sid = [0u8; 16];
    for i in 0..16 {
        sid[i] = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|_| ReError::Error(format!("invalid server uuid {}", text)))?;
    }
    Ok(sid)
}

/// Render 16 raw bytes in the canonical 8-4-4-4-12 form, lowercase.
pub fn format_sid(sid: &[u8; 16]) -> String {
    let h: String = sid.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &h[0..8],
        &h[8..12],
        &h[12..16],
        &h[16..20],
        &h[20..32]
    )
}

/// Executed-transaction set, flavor tagged. The engine keeps exactly one of
/// these alongside the file position.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub enum GtidSet {
    MySQL(MysqlGtidSet),
    MariaDB(MariadbGtidSet),
}

impl GtidSet {
    pub fn empty(flavor: Flavor) -> GtidSet {
        match flavor {
            Flavor::MySQL => GtidSet::MySQL(MysqlGtidSet::new()),
            Flavor::MariaDB => GtidSet::MariaDB(MariadbGtidSet::new()),
        }
    }

    pub fn parse(flavor: Flavor, s: &str) -> Result<GtidSet, ReError> {
        match flavor {
            Flavor::MySQL => Ok(GtidSet::MySQL(MysqlGtidSet::parse(s)?)),
            Flavor::MariaDB => Ok(GtidSet::MariaDB(MariadbGtidSet::parse(s)?)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            GtidSet::MySQL(s) => s.is_empty(),
            GtidSet::MariaDB(s) => s.is_empty(),
        }
    }

    /// Does this set cover every transaction of `other` (same flavor).
    pub fn contains(&self, other: &GtidSet) -> bool {
        match (self, other) {
            (GtidSet::MySQL(a), GtidSet::MySQL(b)) => a.contains(b),
            (GtidSet::MariaDB(a), GtidSet::MariaDB(b)) => a.contains(b),
            _ => false,
        }
    }

    /// Merge `other` into this set.
    pub fn union(&mut self, other: &GtidSet) {
        match (self, other) {
            (GtidSet::MySQL(a), GtidSet::MySQL(b)) => a.union(b),
            (GtidSet::MariaDB(a), GtidSet::MariaDB(b)) => a.union(b),
            _ => {}
        }
    }
}

impl Display for GtidSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GtidSet::MySQL(s) => write!(f, "{}", s),
            GtidSet::MariaDB(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sid_round_trip() {
        let text = "3e11fa47-71ca-11e1-9e33-c80aa9429562";
        let sid = parse_sid("3E11FA47-71CA-11E1-9E33-C80AA9429562").unwrap();
        assert_eq!(format_sid(&sid), text);
        assert!(parse_sid("not-a-uuid").is_err());
    }

    #[test]
    fn flavor_mismatch_never_contains() {
        let a = GtidSet::empty(Flavor::MySQL);
        let b = GtidSet::empty(Flavor::MariaDB);
        assert!(!a.contains(&b));
    }
}
