use serde::Serialize;

use crate::events::protocol::format_description_event::FormatDescriptionEvent;
use crate::events::protocol::gtid_event::GtidEvent;
use crate::events::protocol::mariadb_gtid_event::{MariadbGtidEvent, MariadbGtidListEvent};
use crate::events::protocol::previous_gtids_event::PreviousGtidsEvent;
use crate::events::protocol::query_event::QueryEvent;
use crate::events::protocol::rotate_event::RotateEvent;
use crate::events::protocol::rows_event::RowsEvent;
use crate::events::protocol::table_map_event::TableMapEvent;
use crate::events::protocol::xid_event::XidEvent;
use crate::events::EventType;

/// The closed set of decoded events the pump dispatches on. The type byte
/// in the common header selects the variant; anything the engine has no
/// use for lands in `Ignored` with its type preserved.
#[derive(Debug, Serialize, Clone)]
pub enum Event {
    Rotate(RotateEvent),
    FormatDescription(FormatDescriptionEvent),
    Query(QueryEvent),
    Xid(XidEvent),
    TableMap(TableMapEvent),
    Rows(RowsEvent),
    Gtid(GtidEvent),
    PreviousGtids(PreviousGtidsEvent),
    MariadbGtid(MariadbGtidEvent),
    MariadbGtidList(MariadbGtidListEvent),
    /// Liveness ping from an idle primary; never advances the position
    Heartbeat,
    Ignored(EventType),
    /// Type byte outside the known range
    Unknown(u8),
}

impl Event {
    pub fn get_type_name(value: &Event) -> &'static str {
        match value {
            Event::Rotate(_) => "RotateEvent",
            Event::FormatDescription(_) => "FormatDescriptionEvent",
            Event::Query(_) => "QueryEvent",
            Event::Xid(_) => "XidEvent",
            Event::TableMap(_) => "TableMapEvent",
            Event::Rows(_) => "RowsEvent",
            Event::Gtid(_) => "GtidEvent",
            Event::PreviousGtids(_) => "PreviousGtidsEvent",
            Event::MariadbGtid(_) => "MariadbGtidEvent",
            Event::MariadbGtidList(_) => "MariadbGtidListEvent",
            Event::Heartbeat => "HeartbeatEvent",
            Event::Ignored(_) => "IgnoredEvent",
            Event::Unknown(_) => "UnknownEvent",
        }
    }
}
