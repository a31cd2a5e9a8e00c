use std::collections::HashMap;
use std::io::Read;

use flate2::read::ZlibDecoder;
use serde::Serialize;

use common::binlog::column::column_value::ColumnValue;
use common::binlog::row::row::Row;
use common::err::replica_error::ReError;

use crate::column::value_decoder::{decode_value, DecodeOptions};
use crate::events::protocol::table_map_event::TableMapEvent;
use crate::events::{EventType, RowsEventKind};
use crate::utils::{bit_count, bitmap_byte_len, get_bit, slice_len_enc_num, slice_uint_le};

// Extra-row-info typecodes, MySQL 8.0.16+
const EXTRA_ROW_INFO_NDB: u8 = 0;
const EXTRA_ROW_INFO_PARTITION: u8 = 1;

/// One WRITE/UPDATE/DELETE event: the header identifies the table, the body
/// is a run of row images decoded against the live table map.
///
/// For UPDATE, `rows` holds before/after images as consecutive pairs.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct RowsEvent {
    pub kind: RowsEventKind,
    pub version: u8,
    #[serde(skip)]
    compressed: bool,
    #[serde(skip)]
    needs_bitmap2: bool,

    pub table_id: u64,
    pub flags: u16,

    /// Which partition the rows touched (partitioned tables only)
    pub partition_id: u16,
    /// Source partition of an UPDATE that moved the row
    pub source_partition_id: u16,
    pub ndb_format: u8,
    pub ndb_data: Vec<u8>,

    pub column_count: u64,
    pub columns_present_bitmap1: Vec<u8>,
    /// After-image bitmap, UPDATE only
    pub columns_present_bitmap2: Vec<u8>,

    /// Copied off the table map so the event is self-describing
    pub schema: String,
    pub table: String,

    pub rows: Vec<Row>,
    /// Set when a table filter stopped decode after the header
    pub rows_skipped: bool,
}

impl RowsEvent {
    pub fn new(event_type: EventType) -> Result<RowsEvent, ReError> {
        let kind = event_type.rows_kind().ok_or_else(|| {
            ReError::Error(format!("{:?} is not a rows event", event_type))
        })?;

        Ok(RowsEvent {
            kind,
            version: event_type.rows_version(),
            compressed: event_type.is_compressed_rows(),
            needs_bitmap2: kind == RowsEventKind::Update,
            table_id: 0,
            flags: 0,
            partition_id: 0,
            source_partition_id: 0,
            ndb_format: 0,
            ndb_data: vec![],
            column_count: 0,
            columns_present_bitmap1: vec![],
            columns_present_bitmap2: vec![],
            schema: String::new(),
            table: String::new(),
            rows: vec![],
            rows_skipped: false,
        })
    }

    /// Decode the full event body. `filter` may stop the decode right after
    /// the header (the caller knows the event boundary from the packet, so
    /// nothing else needs to consume the body). On a mid-row error the rows
    /// decoded so far stay behind in `self.rows`.
    pub fn decode(
        &mut self,
        data: &[u8],
        tables: &HashMap<u64, TableMapEvent>,
        opts: &DecodeOptions,
        filter: Option<&dyn Fn(&str, &str) -> bool>,
    ) -> Result<(), ReError> {
        let (pos, table) = self.decode_header(data, tables)?;

        if let Some(filter) = filter {
            if !filter(&self.schema, &self.table) {
                self.rows_skipped = true;
                return Ok(());
            }
        }

        self.decode_data(pos, data, &table, opts)
    }

    /// Header through the present bitmaps. Returns the body offset and a
    /// clone of the governing table map.
    pub fn decode_header(
        &mut self,
        data: &[u8],
        tables: &HashMap<u64, TableMapEvent>,
    ) -> Result<(usize, TableMapEvent), ReError> {
        let mut pos = 0usize;

        self.table_id = slice_uint_le(data, 6)?;
        pos += 6;
        self.flags = slice_uint_le(tail(data, pos)?, 2)? as u16;
        pos += 2;

        if self.version == 2 {
            let extra_len = slice_uint_le(tail(data, pos)?, 2)? as usize;
            if extra_len < 2 {
                return Err(ReError::decode(pos, "bad rows extra data length".to_string()));
            }
            self.decode_extra_data(
                data.get(pos + 2..pos + extra_len)
                    .ok_or_else(ReError::incomplete)?,
                pos,
            )?;
            pos += extra_len;
        }

        let (column_count, _, n) = slice_len_enc_num(tail(data, pos)?)?;
        pos += n;
        self.column_count = column_count;

        let bitmap_len = bitmap_byte_len(column_count as usize);
        self.columns_present_bitmap1 = data
            .get(pos..pos + bitmap_len)
            .ok_or_else(ReError::incomplete)?
            .to_vec();
        pos += bitmap_len;

        if self.needs_bitmap2 {
            self.columns_present_bitmap2 = data
                .get(pos..pos + bitmap_len)
                .ok_or_else(ReError::incomplete)?
                .to_vec();
            pos += bitmap_len;
        }

        let table = tables.get(&self.table_id).ok_or_else(|| {
            ReError::MissingTableMeta(format!(
                "no table map event for table id {}",
                self.table_id
            ))
        })?;
        self.schema = table.schema.clone();
        self.table = table.table.clone();

        Ok((pos, table.clone()))
    }

    /// Typed sub-records inside the v2 extra-data block.
    fn decode_extra_data(&mut self, extra: &[u8], base_offset: usize) -> Result<(), ReError> {
        if extra.is_empty() {
            return Ok(());
        }
        match extra[0] {
            EXTRA_ROW_INFO_NDB => {
                let ndb_len = *extra.get(1).ok_or_else(ReError::incomplete)? as usize;
                if ndb_len < 2 {
                    return Err(ReError::decode(base_offset, "bad ndb info length".to_string()));
                }
                self.ndb_format = *extra.get(2).ok_or_else(ReError::incomplete)?;
                self.ndb_data = extra
                    .get(3..3 + ndb_len - 2)
                    .ok_or_else(ReError::incomplete)?
                    .to_vec();
            }
            EXTRA_ROW_INFO_PARTITION => {
                self.partition_id = slice_uint_le(tail(extra, 1)?, 2)? as u16;
                if self.kind == RowsEventKind::Update && extra.len() >= 5 {
                    self.source_partition_id = slice_uint_le(tail(extra, 3)?, 2)? as u16;
                }
            }
            // forward compatible: unknown typecodes are skipped wholesale
            _ => {}
        }
        Ok(())
    }

    /// The row loop. MariaDB compressed variants inflate the body first.
    pub fn decode_data(
        &mut self,
        pos: usize,
        data: &[u8],
        table: &TableMapEvent,
        opts: &DecodeOptions,
    ) -> Result<(), ReError> {
        let body = tail(data, pos)?;

        let inflated;
        let body: &[u8] = if self.compressed {
            inflated = decompress_mariadb(body)?;
            &inflated
        } else {
            body
        };

        let unsigned_map = table.unsigned_map();

        let mut offset = 0usize;
        while offset < body.len() {
            let before = offset;

            offset += self.decode_image(
                &body[offset..],
                table,
                &self.columns_present_bitmap1.clone(),
                unsigned_map.as_ref(),
                opts,
                pos + offset,
            )?;

            if self.needs_bitmap2 {
                offset += self.decode_image(
                    &body[offset..],
                    table,
                    &self.columns_present_bitmap2.clone(),
                    unsigned_map.as_ref(),
                    opts,
                    pos + offset,
                )?;
            }

            if offset == before {
                return Err(ReError::decode(
                    pos + offset,
                    "row image consumed no bytes".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// One row image against one present-bitmap; returns bytes consumed.
    fn decode_image(
        &mut self,
        data: &[u8],
        table: &TableMapEvent,
        present: &[u8],
        unsigned_map: Option<&HashMap<usize, bool>>,
        opts: &DecodeOptions,
        event_offset: usize,
    ) -> Result<usize, ReError> {
        let column_count = self.column_count as usize;
        let present_count = bit_count(present, column_count);
        let null_len = bitmap_byte_len(present_count);

        let null_bitmap = data.get(..null_len).ok_or_else(ReError::incomplete)?;
        let mut pos = null_len;

        let mut values = Vec::with_capacity(column_count);
        let mut null_index = 0usize;

        for i in 0..column_count {
            if !get_bit(present, i) {
                values.push(ColumnValue::Null);
                continue;
            }

            let is_null = get_bit(null_bitmap, null_index);
            null_index += 1;
            if is_null {
                values.push(ColumnValue::Null);
                continue;
            }

            let unsigned = unsigned_map
                .and_then(|m| m.get(&i).copied())
                .unwrap_or(false);

            let (value, n) = decode_value(
                tail(data, pos)?,
                table.column_types[i],
                table.column_meta[i],
                unsigned,
                opts,
            )
            .map_err(|e| match e {
                ReError::DecodeError { offset, reason } => ReError::DecodeError {
                    offset: event_offset + pos + offset,
                    reason: format!("column {}: {}", i, reason),
                },
                other => other,
            })?;
            values.push(value);
            pos += n;
        }

        self.rows.push(Row::new_row(values));
        Ok(pos)
    }
}

/// MariaDB compressed events: one control byte (algorithm high nibble,
/// length-field width low bits), the uncompressed length, then a zlib
/// stream.
fn decompress_mariadb(data: &[u8]) -> Result<Vec<u8>, ReError> {
    let header = *data.first().ok_or_else(ReError::incomplete)?;
    let algorithm = (header & 0x70) >> 4;
    if algorithm != 0 {
        return Err(ReError::decode(
            0,
            format!("unsupported compression algorithm {}", algorithm),
        ));
    }
    let len_width = (header & 0x07) as usize;

    let mut uncompressed_len = 0usize;
    for &b in data.get(1..1 + len_width).ok_or_else(ReError::incomplete)? {
        uncompressed_len = (uncompressed_len << 8) | b as usize;
    }

    let mut out = Vec::with_capacity(uncompressed_len);
    let mut decoder = ZlibDecoder::new(tail(data, 1 + len_width)?);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ReError::decode(0, format!("zlib inflate: {}", e)))?;
    Ok(out)
}

fn tail(data: &[u8], pos: usize) -> Result<&[u8], ReError> {
    data.get(pos..).ok_or_else(ReError::incomplete)
}
