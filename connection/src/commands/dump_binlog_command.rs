use crate::commands::COM_BINLOG_DUMP;

/// COM_BINLOG_DUMP: stream from a (file, position) pair.
///
/// ref: https://dev.mysql.com/doc/internals/en/com-binlog-dump.html
#[derive(Debug)]
pub struct DumpBinlogCommand {
    server_id: u32,
    binlog_filename: String,
    binlog_position: u32,
}

impl DumpBinlogCommand {
    pub fn new(server_id: u32, binlog_filename: String, binlog_position: u32) -> Self {
        DumpBinlogCommand {
            server_id,
            binlog_filename,
            binlog_position,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(11 + self.binlog_filename.len());
        packet.push(COM_BINLOG_DUMP);
        packet.extend_from_slice(&self.binlog_position.to_le_bytes());
        packet.extend_from_slice(&0u16.to_le_bytes()); // flags: block on EOF
        packet.extend_from_slice(&self.server_id.to_le_bytes());
        packet.extend_from_slice(self.binlog_filename.as_bytes());
        packet
    }
}
