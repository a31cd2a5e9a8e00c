use common::err::CResult;

use binlog::gtid::gtid_set::MysqlGtidSet;

use crate::commands::COM_BINLOG_DUMP_GTID;

/// COM_BINLOG_DUMP_GTID: stream everything not in the supplied executed
/// set. The file name is left empty so the server picks the right file.
///
/// ref: https://dev.mysql.com/doc/internals/en/com-binlog-dump-gtid.html
#[derive(Debug)]
pub struct DumpBinlogGtidCommand {
    server_id: u32,
}

/// BINLOG_THROUGH_GTID
const BINLOG_DUMP_FLAGS: u16 = 0x04;

impl DumpBinlogGtidCommand {
    pub fn new(server_id: u32) -> Self {
        DumpBinlogGtidCommand { server_id }
    }

    pub fn serialize(&self, gtid_set: &MysqlGtidSet) -> CResult<Vec<u8>> {
        let encoded = gtid_set.encode()?;

        let mut packet = Vec::with_capacity(27 + encoded.len());
        packet.push(COM_BINLOG_DUMP_GTID);
        packet.extend_from_slice(&BINLOG_DUMP_FLAGS.to_le_bytes());
        packet.extend_from_slice(&self.server_id.to_le_bytes());
        packet.extend_from_slice(&0u32.to_le_bytes()); // binlog name length
        packet.extend_from_slice(&4u64.to_le_bytes()); // binlog position
        packet.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
        packet.extend_from_slice(&encoded);
        Ok(packet)
    }
}
