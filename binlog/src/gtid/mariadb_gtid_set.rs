use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::Serialize;

use common::err::replica_error::ReError;

/// One MariaDB transaction id, `domain-server-sequence`.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct MariadbGtid {
    pub domain_id: u32,
    pub server_id: u32,
    pub sequence: u64,
}

impl MariadbGtid {
    pub fn parse(text: &str) -> Result<MariadbGtid, ReError> {
        let parts: Vec<&str> = text.trim().split('-').collect();
        if parts.len() != 3 {
            return Err(ReError::Error(format!("invalid mariadb gtid {}", text)));
        }
        Ok(MariadbGtid {
            domain_id: parts[0].parse()?,
            server_id: parts[1].parse()?,
            sequence: parts[2].parse()?,
        })
    }
}

impl Display for MariadbGtid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.domain_id, self.server_id, self.sequence)
    }
}

/// MariaDB keeps one current gtid per replication domain; a set is the map
/// of domains to their latest transaction.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct MariadbGtidSet {
    pub sets: BTreeMap<u32, MariadbGtid>,
}

impl MariadbGtidSet {
    pub fn new() -> Self {
        MariadbGtidSet {
            sets: BTreeMap::new(),
        }
    }

    pub fn parse(text: &str) -> Result<MariadbGtidSet, ReError> {
        let mut sets = BTreeMap::new();
        if !text.trim().is_empty() {
            for part in text.replace('\n', "").split(',') {
                let gtid = MariadbGtid::parse(part)?;
                sets.insert(gtid.domain_id, gtid);
            }
        }
        Ok(MariadbGtidSet { sets })
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Install the newest transaction of its domain.
    pub fn add(&mut self, gtid: MariadbGtid) {
        self.sets.insert(gtid.domain_id, gtid);
    }

    /// Per-domain sequence dominance.
    pub fn contains(&self, other: &MariadbGtidSet) -> bool {
        other.sets.iter().all(|(domain, o)| {
            self.sets
                .get(domain)
                .map(|s| s.sequence >= o.sequence)
                .unwrap_or(false)
        })
    }

    pub fn union(&mut self, other: &MariadbGtidSet) {
        for (domain, o) in &other.sets {
            match self.sets.get_mut(domain) {
                Some(s) => {
                    if o.sequence > s.sequence {
                        *s = *o;
                    }
                }
                None => {
                    self.sets.insert(*domain, *o);
                }
            }
        }
    }
}

impl Display for MariadbGtidSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for gtid in self.sets.values() {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            write!(f, "{}", gtid)?;
        }
        Ok(())
    }
}
