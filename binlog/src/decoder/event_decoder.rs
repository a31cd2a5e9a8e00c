use std::collections::HashMap;

use tracing::debug;

use common::config::Flavor;
use common::err::replica_error::ReError;
use common::err::CResult;

use crate::column::value_decoder::DecodeOptions;
use crate::events::checksum_type::{verify_and_strip, ChecksumType};
use crate::events::event::Event;
use crate::events::event_header::Header;
use crate::events::protocol::format_description_event::FormatDescriptionEvent;
use crate::events::protocol::gtid_event::GtidEvent;
use crate::events::protocol::mariadb_gtid_event::{MariadbGtidEvent, MariadbGtidListEvent};
use crate::events::protocol::previous_gtids_event::PreviousGtidsEvent;
use crate::events::protocol::query_event::QueryEvent;
use crate::events::protocol::rotate_event::RotateEvent;
use crate::events::protocol::rows_event::RowsEvent;
use crate::events::protocol::table_map_event::TableMapEvent;
use crate::events::protocol::xid_event::XidEvent;
use crate::events::{EventType, EVENT_HEADER_LEN};

/// Predicate deciding whether a table's row bodies are worth decoding.
pub type RowsFilter = dyn Fn(&str, &str) -> bool + Send + Sync;

/// Stateful decoder for one replication stream.
///
/// Owns the live table-map registry (keyed by table id, reset whenever a
/// FORMAT_DESCRIPTION arrives) and the negotiated checksum algorithm. The
/// pump is the only caller, so none of this needs locking.
pub struct EventDecoder {
    flavor: Flavor,
    opts: DecodeOptions,
    checksum: ChecksumType,
    tables: HashMap<u64, TableMapEvent>,
    rows_filter: Option<Box<RowsFilter>>,
}

impl EventDecoder {
    pub fn new(flavor: Flavor, opts: DecodeOptions) -> Self {
        EventDecoder {
            flavor,
            opts,
            checksum: ChecksumType::None,
            tables: HashMap::new(),
            rows_filter: None,
        }
    }

    /// Algorithm learned from the variables handshake; the
    /// FORMAT_DESCRIPTION event overrides it once seen.
    pub fn set_checksum(&mut self, checksum: ChecksumType) {
        self.checksum = checksum;
    }

    /// Install the fast-path row filter: excluded tables stop decoding
    /// right after the rows-event header.
    pub fn set_rows_filter(&mut self, filter: Box<RowsFilter>) {
        self.rows_filter = Some(filter);
    }

    /// Decode one raw event (19-byte header included, checksum trailer
    /// still attached).
    pub fn decode(&mut self, raw: &[u8]) -> CResult<(Header, Event)> {
        let (_, header) =
            Header::parse_v4_header(raw).map_err(|e| nom_error("event header", &e))?;

        let event_type = match EventType::try_from(header.event_type) {
            Ok(t) => t,
            Err(_) => return Ok((header.clone(), Event::Unknown(header.event_type))),
        };

        // The format descriptor carries the checksum algorithm itself, so
        // it is parsed before any stripping and resets stream state.
        if event_type == EventType::FormatDescription {
            let (_, fde) = FormatDescriptionEvent::parse(&raw[EVENT_HEADER_LEN..])
                .map_err(|e| nom_error("format description", &e))?;
            debug!(
                server_version = fde.server_version.as_str(),
                checksum = ?fde.checksum_type,
                "format description, decode state reset"
            );
            self.checksum = fde.checksum_type;
            self.tables.clear();
            return Ok((header, Event::FormatDescription(fde)));
        }

        let stripped = verify_and_strip(raw, self.checksum)?;
        let body = &stripped[EVENT_HEADER_LEN.min(stripped.len())..];

        let event = match event_type {
            EventType::Rotate => {
                let (_, e) = RotateEvent::parse(body).map_err(|e| nom_error("rotate", &e))?;
                Event::Rotate(e)
            }
            EventType::Query => {
                let (_, e) = QueryEvent::parse(body).map_err(|e| nom_error("query", &e))?;
                Event::Query(e)
            }
            EventType::Xid => {
                let (_, e) = XidEvent::parse(body).map_err(|e| nom_error("xid", &e))?;
                Event::Xid(e)
            }
            EventType::TableMap => {
                let e = TableMapEvent::parse(body, self.flavor)?;
                self.tables.insert(e.table_id, e.clone());
                Event::TableMap(e)
            }
            EventType::WriteRowsV0
            | EventType::WriteRowsV1
            | EventType::WriteRowsV2
            | EventType::UpdateRowsV0
            | EventType::UpdateRowsV1
            | EventType::UpdateRowsV2
            | EventType::DeleteRowsV0
            | EventType::DeleteRowsV1
            | EventType::DeleteRowsV2
            | EventType::MariadbWriteRowsCompressedV1
            | EventType::MariadbUpdateRowsCompressedV1
            | EventType::MariadbDeleteRowsCompressedV1 => {
                let mut e = RowsEvent::new(event_type)?;
                let filter: Option<&dyn Fn(&str, &str) -> bool> = self
                    .rows_filter
                    .as_deref()
                    .map(|f| f as &dyn Fn(&str, &str) -> bool);
                e.decode(body, &self.tables, &self.opts, filter)?;
                Event::Rows(e)
            }
            EventType::Gtid | EventType::AnonymousGtid => {
                let (_, e) = GtidEvent::parse(body).map_err(|e| nom_error("gtid", &e))?;
                Event::Gtid(e)
            }
            EventType::PreviousGtids => {
                Event::PreviousGtids(PreviousGtidsEvent::parse(body)?)
            }
            EventType::MariadbGtid => {
                let (_, e) =
                    MariadbGtidEvent::parse(body).map_err(|e| nom_error("mariadb gtid", &e))?;
                Event::MariadbGtid(e)
            }
            EventType::MariadbGtidList => {
                let (_, e) = MariadbGtidListEvent::parse(body)
                    .map_err(|e| nom_error("mariadb gtid list", &e))?;
                Event::MariadbGtidList(e)
            }
            EventType::Heartbeat | EventType::HeartbeatLogV2 => Event::Heartbeat,
            other => Event::Ignored(other),
        };

        Ok((header, event))
    }

    pub fn table_by_id(&self, table_id: u64) -> Option<&TableMapEvent> {
        self.tables.get(&table_id)
    }
}

fn nom_error(what: &str, e: &nom::Err<nom::error::Error<&[u8]>>) -> ReError {
    let kind = match e {
        nom::Err::Incomplete(_) => "incomplete".to_string(),
        nom::Err::Error(inner) | nom::Err::Failure(inner) => format!("{:?}", inner.code),
    };
    ReError::Error(format!("{} parse error: {}", what, kind))
}
