use serde::Serialize;

use common::err::replica_error::ReError;

use crate::gtid::gtid_set::MysqlGtidSet;

/// First event after the FORMAT_DESCRIPTION in every MySQL binlog file:
/// the full executed set as of file start.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct PreviousGtidsEvent {
    pub gtid_set: MysqlGtidSet,
}

impl PreviousGtidsEvent {
    pub fn parse(input: &[u8]) -> Result<PreviousGtidsEvent, ReError> {
        Ok(PreviousGtidsEvent {
            gtid_set: MysqlGtidSet::decode(input)?,
        })
    }
}
