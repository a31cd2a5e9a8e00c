pub mod binlog_connection;
pub mod binlog_events;

use binlog::gtid::gtid_set::MysqlGtidSet;
use binlog::gtid::mariadb_gtid_set::MariadbGtidSet;

/// Where the dump should start.
#[derive(Debug, Clone)]
pub enum DumpRequest {
    /// `COM_BINLOG_DUMP` from an explicit (file, position)
    Position { file: String, position: u32 },
    /// `COM_BINLOG_DUMP_GTID` with the executed set
    Gtid(MysqlGtidSet),
    /// MariaDB: `@slave_connect_state` + `COM_BINLOG_DUMP`
    MariadbGtid(MariadbGtidSet),
}
