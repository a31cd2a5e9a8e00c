use common::err::CResult;

use binlog::events::protocol::query_event::QueryEvent;
use binlog::events::protocol::rows_event::RowsEvent;
use binlog::gtid::mariadb_gtid_set::MariadbGtid;
use binlog::gtid::GtidSet;

use crate::master::Position;

/// One observed transaction id, flavor tagged.
#[derive(Debug, Clone, PartialEq)]
pub enum Gtid {
    MySQL { sid: String, gno: i64 },
    MariaDB(MariadbGtid),
}

/// What the engine calls as it pumps the stream. Every method defaults to
/// a no-op success, so implementors pick the callbacks they care about.
/// Returning an error stops the pump and surfaces from `run()`.
pub trait EventHandler: Send {
    /// The stream moved to another binlog file.
    fn on_rotate(&mut self, _position: &Position) -> CResult<()> {
        Ok(())
    }

    /// A DDL statement touched this table; any cached schema was dropped.
    fn on_table_changed(&mut self, _schema: &str, _table: &str) -> CResult<()> {
        Ok(())
    }

    /// A non-transaction-control statement, raw bytes included.
    fn on_ddl(&mut self, _position: &Position, _query: &QueryEvent) -> CResult<()> {
        Ok(())
    }

    /// Exactly one call per WRITE/UPDATE/DELETE event.
    fn on_row(&mut self, _event: &RowsEvent) -> CResult<()> {
        Ok(())
    }

    /// Transaction commit.
    fn on_xid(&mut self, _position: &Position) -> CResult<()> {
        Ok(())
    }

    fn on_gtid(&mut self, _position: &Position, _gtid: &Gtid) -> CResult<()> {
        Ok(())
    }

    /// The durable coordinates advanced. `force` marks points a consumer
    /// should persist immediately (rotate, DDL, shutdown).
    fn on_pos_synced(
        &mut self,
        _position: &Position,
        _gtid_set: Option<&GtidSet>,
        _force: bool,
    ) -> CResult<()> {
        Ok(())
    }
}

/// Satisfies the contract while doing nothing; handy as a default and in
/// tests.
#[derive(Debug, Default)]
pub struct NopEventHandler;

impl EventHandler for NopEventHandler {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nop_handler_accepts_everything() {
        let mut h = NopEventHandler;
        let pos = Position::new("mysql-bin.000001", 4);
        assert!(h.on_rotate(&pos).is_ok());
        assert!(h.on_xid(&pos).is_ok());
        assert!(h.on_pos_synced(&pos, None, true).is_ok());
    }
}
