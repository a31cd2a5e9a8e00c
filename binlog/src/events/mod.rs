use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

pub mod checksum_type;
pub mod event;
pub mod event_header;
pub mod protocol;

/// v4 common header size
pub const EVENT_HEADER_LEN: usize = 19;

/// Binlog event type byte.
///
/// The 160+ range is MariaDB-specific.
/// ref: https://dev.mysql.com/doc/dev/mysql-server/latest/namespacemysql_1_1binlog_1_1event.html
#[derive(
    Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum EventType {
    Unknown = 0,
    StartV3 = 1,
    Query = 2,
    Stop = 3,
    Rotate = 4,
    IntVar = 5,
    Load = 6,
    Slave = 7,
    CreateFile = 8,
    AppendBlock = 9,
    ExecLoad = 10,
    DeleteFile = 11,
    NewLoad = 12,
    Rand = 13,
    UserVar = 14,
    FormatDescription = 15,
    Xid = 16,
    BeginLoadQuery = 17,
    ExecuteLoadQuery = 18,
    TableMap = 19,
    WriteRowsV0 = 20,
    UpdateRowsV0 = 21,
    DeleteRowsV0 = 22,
    WriteRowsV1 = 23,
    UpdateRowsV1 = 24,
    DeleteRowsV1 = 25,
    Incident = 26,
    Heartbeat = 27,
    Ignorable = 28,
    RowsQuery = 29,
    WriteRowsV2 = 30,
    UpdateRowsV2 = 31,
    DeleteRowsV2 = 32,
    Gtid = 33,
    AnonymousGtid = 34,
    PreviousGtids = 35,
    TransactionContext = 36,
    ViewChange = 37,
    XaPrepareLog = 38,
    PartialUpdateRows = 39,
    TransactionPayload = 40,
    HeartbeatLogV2 = 41,

    MariadbAnnotateRows = 160,
    MariadbBinlogCheckpoint = 161,
    MariadbGtid = 162,
    MariadbGtidList = 163,
    MariadbStartEncryption = 164,
    MariadbQueryCompressed = 165,
    MariadbWriteRowsCompressedV1 = 166,
    MariadbUpdateRowsCompressedV1 = 167,
    MariadbDeleteRowsCompressedV1 = 168,
}

impl EventType {
    /// Which kind of row mutation, if this is a rows event at all.
    pub fn rows_kind(&self) -> Option<RowsEventKind> {
        match self {
            EventType::WriteRowsV0
            | EventType::WriteRowsV1
            | EventType::WriteRowsV2
            | EventType::MariadbWriteRowsCompressedV1 => Some(RowsEventKind::Insert),
            EventType::UpdateRowsV0
            | EventType::UpdateRowsV1
            | EventType::UpdateRowsV2
            | EventType::MariadbUpdateRowsCompressedV1 => Some(RowsEventKind::Update),
            EventType::DeleteRowsV0
            | EventType::DeleteRowsV1
            | EventType::DeleteRowsV2
            | EventType::MariadbDeleteRowsCompressedV1 => Some(RowsEventKind::Delete),
            _ => None,
        }
    }

    /// Rows event wire version: v2 carries the extra-data block, v0 carries
    /// no columns-present bitmap flags difference we care about beyond that.
    pub fn rows_version(&self) -> u8 {
        match self {
            EventType::WriteRowsV0 | EventType::UpdateRowsV0 | EventType::DeleteRowsV0 => 0,
            EventType::WriteRowsV1
            | EventType::UpdateRowsV1
            | EventType::DeleteRowsV1
            | EventType::MariadbWriteRowsCompressedV1
            | EventType::MariadbUpdateRowsCompressedV1
            | EventType::MariadbDeleteRowsCompressedV1 => 1,
            _ => 2,
        }
    }

    pub fn is_compressed_rows(&self) -> bool {
        matches!(
            self,
            EventType::MariadbWriteRowsCompressedV1
                | EventType::MariadbUpdateRowsCompressedV1
                | EventType::MariadbDeleteRowsCompressedV1
        )
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum RowsEventKind {
    Insert,
    Update,
    Delete,
}
