use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use binlog::gtid::GtidSet;

/// A binlog coordinate: file name plus byte offset. Ordering follows the
/// numeric file suffix first, the offset second, so positions across a
/// rotation still compare correctly.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Position {
    pub name: String,
    pub pos: u32,
}

impl Position {
    pub fn new(name: impl Into<String>, pos: u32) -> Self {
        Position {
            name: name.into(),
            pos,
        }
    }

    /// `mysql-bin.000005` -> 5; files without a numeric suffix sort by name.
    fn suffix(&self) -> Option<u64> {
        self.name.rsplit_once('.').and_then(|(_, s)| s.parse().ok())
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_file = match (self.suffix(), other.suffix()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.name.cmp(&other.name),
        };
        by_file.then(self.pos.cmp(&other.pos))
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.name, self.pos)
    }
}

#[derive(Debug, Default, Clone)]
struct MasterState {
    position: Position,
    gtid_set: Option<GtidSet>,
    timestamp: u32,
}

/// The durable replication coordinates: mutated only by the pump, read by
/// any number of callers. Getters hand out cloned snapshots.
#[derive(Debug, Default)]
pub struct MasterInfo {
    state: Mutex<MasterState>,
}

impl MasterInfo {
    pub fn new() -> Self {
        MasterInfo::default()
    }

    pub fn position(&self) -> Position {
        self.state.lock().unwrap().position.clone()
    }

    pub fn gtid_set(&self) -> Option<GtidSet> {
        self.state.lock().unwrap().gtid_set.clone()
    }

    pub fn timestamp(&self) -> u32 {
        self.state.lock().unwrap().timestamp
    }

    pub fn update(&self, position: Position) {
        self.state.lock().unwrap().position = position;
    }

    pub fn update_gtid_set(&self, gtid_set: GtidSet) {
        self.state.lock().unwrap().gtid_set = Some(gtid_set);
    }

    pub fn update_timestamp(&self, timestamp: u32) {
        self.state.lock().unwrap().timestamp = timestamp;
    }
}
