//! Byte-level decode vectors captured from MySQL 5.7 / 8.0 and MariaDB
//! 10.4 / 10.5 servers, exercising the table-map, rows and column codecs
//! end to end.

use std::collections::HashMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;

use binlog::column::decimal::decode_decimal_string;
use binlog::column::value_decoder::{decode_value, DecodeOptions};
use binlog::events::protocol::rows_event::RowsEvent;
use binlog::events::protocol::table_map_event::TableMapEvent;
use binlog::events::EventType;
use common::binlog::column::column_value::ColumnValue;
use common::config::Flavor;

fn table_map(data: &[u8], flavor: Flavor) -> TableMapEvent {
    TableMapEvent::parse(data, flavor).unwrap()
}

fn decode_rows(tme: &TableMapEvent, event_type: EventType, body: &[u8]) -> RowsEvent {
    decode_rows_opts(tme, event_type, body, &DecodeOptions::default()).unwrap()
}

fn decode_rows_opts(
    tme: &TableMapEvent,
    event_type: EventType,
    body: &[u8],
    opts: &DecodeOptions,
) -> Result<RowsEvent, common::err::replica_error::ReError> {
    let mut tables = HashMap::new();
    tables.insert(tme.table_id, tme.clone());
    let mut e = RowsEvent::new(event_type).unwrap();
    e.decode(body, &tables, opts, None)?;
    Ok(e)
}

fn text(v: &ColumnValue) -> &str {
    match v {
        ColumnValue::Text(s) | ColumnValue::Decimal(s) => s.as_str(),
        other => panic!("expected text-like value, got {:?}", other),
    }
}

#[test]
fn decode_decimal_vectors() {
    let cases: &[(&[u8], usize, usize, &str, usize)] = &[
        (&[117, 200, 127, 255][..], 4, 2, "-10.55", 2),
        (&[127, 255, 244, 127, 245][..], 5, 0, "-11", 3),
        (&[127, 245, 253, 217, 127, 255][..], 7, 3, "-10.550", 4),
        (&[127, 255, 255, 245, 200, 127, 255][..], 10, 2, "-10.55", 5),
        (&[127, 255, 255, 245, 253, 217, 127, 255][..], 10, 3, "-10.550", 6),
        (&[127, 255, 255, 255, 245, 200, 118, 196][..], 13, 2, "-10.55", 6),
        (&[118, 196, 101, 54, 0, 254, 121, 96, 127, 255][..], 15, 14, "-9.99999999999999", 8),
        (&[127, 255, 255, 255, 245, 223, 55, 170, 127, 255, 127, 255][..], 20, 10, "-10.5500000000", 10),
        (&[127, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 245, 255, 41, 39, 127, 255][..], 30, 5, "-10.55000", 15),
        (&[127, 255, 255, 255, 245, 223, 55, 170, 127, 255, 255, 255, 255, 255, 127, 255][..], 30, 20, "-10.55000000000000000000", 14),
        (&[127, 255, 245, 223, 55, 170, 127, 255, 255, 255, 255, 255, 255, 255, 255, 4, 0][..], 30, 25, "-10.5500000000000000000000000", 15),
        (&[128, 1, 128, 0][..], 4, 2, "0.01", 2),
        (&[128, 0, 0, 128, 0][..], 5, 0, "0", 3),
        (&[128, 0, 0, 12, 128, 0][..], 7, 3, "0.012", 4),
        (&[128, 0, 0, 0, 1, 128, 0][..], 10, 2, "0.01", 5),
        (&[128, 0, 0, 0, 0, 12, 128, 0][..], 10, 3, "0.012", 6),
        (&[128, 0, 0, 0, 0, 1, 128, 0][..], 13, 2, "0.01", 6),
        (&[128, 0, 188, 97, 78, 1, 96, 11, 128, 0][..], 15, 14, "0.01234567890123", 8),
        (&[128, 0, 0, 0, 0, 0, 188, 97, 78, 9, 128, 0][..], 20, 10, "0.0123456789", 10),
        (&[128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 211, 128, 0][..], 30, 5, "0.01235", 15),
        (&[128, 0, 0, 0, 0, 0, 188, 97, 78, 53, 183, 191, 135, 89, 128, 0][..], 30, 20, "0.01234567890123456789", 14),
        (&[128, 0, 0, 0, 188, 97, 78, 53, 183, 191, 135, 0, 135, 253, 217, 30, 0][..], 30, 25, "0.0123456789012345678912345", 15),
        (&[227, 99, 128, 48][..], 4, 2, "99.99", 2),
        (&[128, 48, 57, 167, 15][..], 5, 0, "12345", 3),
        (&[167, 15, 3, 231, 128, 0][..], 7, 3, "9999.999", 4),
        (&[128, 0, 48, 57, 0, 128, 0][..], 10, 2, "12345.00", 5),
        (&[128, 0, 48, 57, 0, 0, 128, 0][..], 10, 3, "12345.000", 6),
        (&[128, 0, 0, 48, 57, 0, 137, 59][..], 13, 2, "12345.00", 6),
        (&[137, 59, 154, 201, 255, 1, 134, 159, 128, 0][..], 15, 14, "9.99999999999999", 8),
        (&[128, 0, 0, 48, 57, 0, 0, 0, 0, 0, 128, 0][..], 20, 10, "12345.0000000000", 10),
        (&[128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 48, 57, 0, 0, 0, 128, 0][..], 30, 5, "12345.00000", 15),
        (&[128, 0, 0, 48, 57, 0, 0, 0, 0, 0, 0, 0, 0, 0, 128, 48][..], 30, 20, "12345.00000000000000000000", 14),
        (&[128, 48, 57, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 5, 0][..], 30, 25, "12345.0000000000000000000000000", 15),
        (&[128, 48, 57, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 10, 0][..], 30, 25, "12345.0000000000000000000000000", 15),
        (&[227, 99, 128, 0][..], 4, 2, "99.99", 2),
        (&[128, 0, 123, 128, 123][..], 5, 0, "123", 3),
        (&[128, 123, 1, 194, 128, 0][..], 7, 3, "123.450", 4),
        (&[128, 0, 0, 123, 45, 128, 0][..], 10, 2, "123.45", 5),
        (&[128, 0, 0, 123, 1, 194, 128, 0][..], 10, 3, "123.450", 6),
        (&[128, 0, 0, 0, 123, 45, 137, 59][..], 13, 2, "123.45", 6),
        (&[128, 0, 0, 0, 123, 26, 210, 116, 128, 0, 128, 0][..], 20, 10, "123.4500000000", 10),
        (&[128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 123, 0, 175, 200, 128, 0][..], 30, 5, "123.45000", 15),
        (&[128, 0, 0, 0, 123, 26, 210, 116, 128, 0, 0, 0, 0, 0, 128, 0][..], 30, 20, "123.45000000000000000000", 14),
        (&[128, 0, 123, 26, 210, 116, 128, 0, 0, 0, 0, 0, 0, 0, 0, 10, 0][..], 30, 25, "123.4500000000000000000000000", 15),
        (&[28, 156, 127, 255][..], 4, 2, "-99.99", 2),
        (&[127, 255, 132, 127, 132][..], 5, 0, "-123", 3),
        (&[127, 132, 254, 61, 127, 255][..], 7, 3, "-123.450", 4),
        (&[127, 255, 255, 132, 210, 127, 255][..], 10, 2, "-123.45", 5),
        (&[127, 255, 255, 132, 254, 61, 127, 255][..], 10, 3, "-123.450", 6),
        (&[127, 255, 255, 255, 132, 210, 118, 196][..], 13, 2, "-123.45", 6),
        (&[127, 255, 255, 255, 132, 229, 45, 139, 127, 255, 127, 255][..], 20, 10, "-123.4500000000", 10),
        (&[127, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 132, 255, 80, 55, 127, 255][..], 30, 5, "-123.45000", 15),
        (&[127, 255, 255, 255, 132, 229, 45, 139, 127, 255, 255, 255, 255, 255, 127, 255][..], 30, 20, "-123.45000000000000000000", 14),
        (&[127, 255, 132, 229, 45, 139, 127, 255, 255, 255, 255, 255, 255, 255, 255, 20, 0][..], 30, 25, "-123.4500000000000000000000000", 15),
        (&[128, 0, 128, 0][..], 4, 2, "0.00", 2),
        (&[128, 0, 0, 0, 128, 0][..], 7, 3, "0.000", 4),
        (&[128, 0, 0, 0, 0, 128, 0][..], 10, 2, "0.00", 5),
        (&[128, 0, 0, 0, 0, 0, 128, 0][..], 10, 3, "0.000", 6),
        (&[128, 0, 0, 0, 0, 0, 128, 0][..], 13, 2, "0.00", 6),
        (&[128, 0, 1, 226, 58, 0, 0, 99, 128, 0][..], 15, 14, "0.00012345000099", 8),
        (&[128, 0, 0, 0, 0, 0, 1, 226, 58, 0, 128, 0][..], 20, 10, "0.0001234500", 10),
        (&[128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 12, 128, 0][..], 30, 5, "0.00012", 15),
        (&[128, 0, 0, 0, 0, 0, 1, 226, 58, 0, 15, 18, 2, 0, 128, 0][..], 30, 20, "0.00012345000098765000", 14),
        (&[128, 0, 0, 0, 1, 226, 58, 0, 15, 18, 2, 0, 0, 0, 0, 15, 0][..], 30, 25, "0.0001234500009876500000000", 15),
        (&[128, 0, 0, 0, 1, 226, 58, 0, 15, 18, 2, 0, 0, 0, 0, 22, 0][..], 30, 25, "0.0001234500009876500000000", 15),
        (&[128, 12, 128, 0][..], 4, 2, "0.12", 2),
        (&[128, 0, 0, 123, 128, 0][..], 7, 3, "0.123", 4),
        (&[128, 0, 0, 0, 12, 128, 0][..], 10, 2, "0.12", 5),
        (&[128, 0, 0, 0, 0, 123, 128, 0][..], 10, 3, "0.123", 6),
        (&[128, 0, 0, 0, 0, 12, 128, 7][..], 13, 2, "0.12", 6),
        (&[128, 7, 91, 178, 144, 1, 129, 205, 128, 0][..], 15, 14, "0.12345000098765", 8),
        (&[128, 0, 0, 0, 0, 7, 91, 178, 145, 0, 128, 0][..], 20, 10, "0.1234500010", 10),
        (&[128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 48, 57, 128, 0][..], 30, 5, "0.12345", 15),
        (&[128, 0, 0, 0, 0, 7, 91, 178, 144, 58, 222, 87, 208, 0, 128, 0][..], 30, 20, "0.12345000098765000000", 14),
        (&[128, 0, 0, 7, 91, 178, 144, 58, 222, 87, 208, 0, 0, 0, 0, 30, 0][..], 30, 25, "0.1234500009876500000000000", 15),
        (&[128, 0, 0, 0, 0, 0, 127, 255][..], 13, 2, "0.00", 6),
        (&[127, 255, 255, 255, 243, 255, 121, 59, 127, 255][..], 15, 14, "-0.00000001234500", 8),
        (&[127, 255, 255, 255, 255, 255, 255, 255, 243, 252, 128, 0][..], 20, 10, "-0.0000000123", 10),
        (&[128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 127, 255][..], 30, 5, "0.00000", 15),
        (&[127, 255, 255, 255, 255, 255, 255, 255, 243, 235, 111, 183, 93, 178, 127, 255][..], 30, 20, "-0.00000001234500009877", 14),
        (&[127, 255, 255, 255, 255, 255, 243, 235, 111, 183, 93, 255, 139, 69, 47, 30, 0][..], 30, 25, "-0.0000000123450000987650000", 15),
        (&[227, 99, 129, 134][..], 4, 2, "99.99", 2),
        (&[129, 134, 159, 167, 15][..], 5, 0, "99999", 3),
        (&[167, 15, 3, 231, 133, 245][..], 7, 3, "9999.999", 4),
        (&[133, 245, 224, 255, 99, 128, 152][..], 10, 2, "99999999.99", 5),
        (&[128, 152, 150, 127, 3, 231, 227, 59][..], 10, 3, "9999999.999", 6),
        (&[227, 59, 154, 201, 255, 99, 137, 59][..], 13, 2, "99999999999.99", 6),
        (&[137, 59, 154, 201, 255, 1, 134, 159, 137, 59][..], 15, 14, "9.99999999999999", 8),
        (&[137, 59, 154, 201, 255, 59, 154, 201, 255, 9, 128, 0][..], 20, 10, "9999999999.9999999999", 10),
        (&[128, 0, 0, 0, 0, 0, 4, 210, 29, 205, 139, 148, 0, 195, 80, 137, 59][..], 30, 5, "1234500009876.50000", 15),
        (&[137, 59, 154, 201, 255, 59, 154, 201, 255, 59, 154, 201, 255, 99, 129, 134][..], 30, 20, "9999999999.99999999999999999999", 14),
        (&[129, 134, 159, 59, 154, 201, 255, 59, 154, 201, 255, 0, 152, 150, 127, 30, 0][..], 30, 25, "99999.9999999999999999999999999", 15),
        (&[128, 152, 150, 127, 3, 231, 128, 6][..], 10, 3, "9999999.999", 6),
        (&[128, 6, 159, 107, 199, 11, 137, 59][..], 13, 2, "111111111.11", 6),
        (&[137, 59, 154, 201, 255, 1, 134, 159, 128, 6][..], 15, 14, "9.99999999999999", 8),
        (&[128, 6, 159, 107, 199, 6, 142, 119, 128, 0, 128, 0][..], 20, 10, "111111111.1100000000", 10),
        (&[128, 0, 0, 0, 0, 0, 0, 0, 6, 159, 107, 199, 0, 42, 248, 128, 6][..], 30, 5, "111111111.11000", 15),
        (&[128, 6, 159, 107, 199, 6, 142, 119, 128, 0, 0, 0, 0, 0, 129, 134][..], 30, 20, "111111111.11000000000000000000", 14),
        (&[129, 134, 159, 59, 154, 201, 255, 59, 154, 201, 255, 0, 152, 150, 127, 10, 0][..], 30, 25, "99999.9999999999999999999999999", 15),
        (&[128, 0, 0, 10, 128, 0][..], 7, 3, "0.010", 4),
        (&[128, 0, 0, 0, 0, 10, 128, 0][..], 10, 3, "0.010", 6),
        (&[128, 0, 152, 150, 128, 0, 0, 0, 128, 0][..], 15, 14, "0.01000000000000", 8),
        (&[128, 0, 0, 0, 0, 0, 152, 150, 128, 0, 128, 0][..], 20, 10, "0.0100000000", 10),
        (&[128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 232, 128, 0][..], 30, 5, "0.01000", 15),
        (&[128, 0, 0, 0, 0, 0, 152, 150, 128, 0, 0, 0, 0, 0, 128, 0][..], 30, 20, "0.01000000000000000000", 14),
        (&[128, 0, 0, 0, 152, 150, 128, 0, 0, 0, 0, 0, 0, 0, 0, 7, 0][..], 30, 25, "0.0100000000000000000000000", 15),
        (&[128, 123, 1, 144, 128, 0][..], 7, 3, "123.400", 4),
        (&[128, 0, 0, 123, 40, 128, 0][..], 10, 2, "123.40", 5),
        (&[128, 0, 0, 123, 1, 144, 128, 0][..], 10, 3, "123.400", 6),
        (&[128, 0, 0, 0, 123, 40, 137, 59][..], 13, 2, "123.40", 6),
        (&[128, 0, 0, 0, 123, 23, 215, 132, 0, 0, 128, 0][..], 20, 10, "123.4000000000", 10),
        (&[128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 123, 0, 156, 64, 128, 0][..], 30, 5, "123.40000", 15),
        (&[128, 0, 0, 0, 123, 23, 215, 132, 0, 0, 0, 0, 0, 0, 128, 0][..], 30, 20, "123.40000000000000000000", 14),
        (&[128, 0, 123, 23, 215, 132, 0, 0, 0, 0, 0, 0, 0, 0, 0, 10, 0][..], 30, 25, "123.4000000000000000000000000", 15),
        (&[28, 156, 127, 253][..], 4, 2, "-99.99", 2),
        (&[127, 253, 204, 125, 205][..], 5, 0, "-563", 3),
        (&[125, 205, 253, 187, 127, 255][..], 7, 3, "-562.580", 4),
        (&[127, 255, 253, 205, 197, 127, 255][..], 10, 2, "-562.58", 5),
        (&[127, 255, 253, 205, 253, 187, 127, 255][..], 10, 3, "-562.580", 6),
        (&[127, 255, 255, 253, 205, 197, 118, 196][..], 13, 2, "-562.58", 6),
        (&[127, 255, 255, 253, 205, 221, 109, 230, 255, 255, 127, 255][..], 20, 10, "-562.5800000000", 10),
        (&[127, 255, 255, 255, 255, 255, 255, 255, 255, 255, 253, 205, 255, 29, 111, 127, 255][..], 30, 5, "-562.58000", 15),
        (&[127, 255, 255, 253, 205, 221, 109, 230, 255, 255, 255, 255, 255, 255, 127, 253][..], 30, 20, "-562.58000000000000000000", 14),
        (&[127, 253, 205, 221, 109, 230, 255, 255, 255, 255, 255, 255, 255, 255, 255, 13, 0][..], 30, 25, "-562.5800000000000000000000000", 15),
        (&[28, 156, 127, 241][..], 4, 2, "-99.99", 2),
        (&[127, 241, 140, 113, 140][..], 5, 0, "-3699", 3),
        (&[113, 140, 255, 245, 127, 255][..], 7, 3, "-3699.010", 4),
        (&[127, 255, 241, 140, 254, 127, 255][..], 10, 2, "-3699.01", 5),
        (&[127, 255, 241, 140, 255, 245, 127, 255][..], 10, 3, "-3699.010", 6),
        (&[127, 255, 255, 241, 140, 254, 118, 196][..], 13, 2, "-3699.01", 6),
        (&[127, 255, 255, 241, 140, 255, 103, 105, 127, 255, 127, 255][..], 20, 10, "-3699.0100000000", 10),
        (&[127, 255, 255, 255, 255, 255, 255, 255, 255, 255, 241, 140, 255, 252, 23, 127, 255][..], 30, 5, "-3699.01000", 15),
        (&[127, 255, 255, 241, 140, 255, 103, 105, 127, 255, 255, 255, 255, 255, 127, 241][..], 30, 20, "-3699.01000000000000000000", 14),
        (&[127, 241, 140, 255, 103, 105, 127, 255, 255, 255, 255, 255, 255, 255, 255, 13, 0][..], 30, 25, "-3699.0100000000000000000000000", 15),
        (&[28, 156, 127, 248][..], 4, 2, "-99.99", 2),
        (&[127, 248, 99, 120, 99][..], 5, 0, "-1948", 3),
        (&[120, 99, 255, 115, 127, 255][..], 7, 3, "-1948.140", 4),
        (&[127, 255, 248, 99, 241, 127, 255][..], 10, 2, "-1948.14", 5),
        (&[127, 255, 248, 99, 255, 115, 127, 255][..], 10, 3, "-1948.140", 6),
        (&[127, 255, 255, 248, 99, 241, 118, 196][..], 13, 2, "-1948.14", 6),
        (&[127, 255, 255, 248, 99, 247, 167, 196, 255, 255, 127, 255][..], 20, 10, "-1948.1400000000", 10),
        (&[127, 255, 255, 255, 255, 255, 255, 255, 255, 255, 248, 99, 255, 201, 79, 127, 255][..], 30, 5, "-1948.14000", 15),
        (&[127, 255, 255, 248, 99, 247, 167, 196, 255, 255, 255, 255, 255, 255, 127, 248][..], 30, 20, "-1948.14000000000000000000", 14),
        (&[127, 248, 99, 247, 167, 196, 255, 255, 255, 255, 255, 255, 255, 255, 255, 13, 0][..], 30, 25, "-1948.1400000000000000000000000", 15),
    ];

    for (data, precision, decimals, expected, consumed) in cases {
        let (value, pos) = decode_decimal_string(data, *precision, *decimals).unwrap();
        assert_eq!(&value, expected, "decimal({},{})", precision, decimals);
        assert_eq!(pos, *consumed, "decimal({},{})", precision, decimals);
    }
}

#[test]
fn decode_decimal_by_meta() {
    // (canonical text, stored bytes, table-map meta)
    let cases: &[(&str, &[u8], u16)] = &[
        // DECIMAL(40, 16)
        (
            "123.4560000000000000",
            &[128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 123, 27, 46, 2, 0, 0, 0, 0, 0],
            10256,
        ),
        (
            "0.0000010000000000",
            &[128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 232, 0, 0, 0, 0],
            10256,
        ),
        (
            "100000000.0000000000000000",
            &[128, 0, 0, 0, 0, 0, 0, 5, 245, 225, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            10256,
        ),
        (
            "100000000.0000000200000000",
            &[128, 0, 0, 0, 0, 0, 0, 5, 245, 225, 0, 0, 0, 0, 20, 0, 0, 0, 0],
            10256,
        ),
        (
            "123456.1234567890000000",
            &[128, 0, 0, 0, 0, 0, 0, 0, 1, 226, 64, 7, 91, 205, 21, 0, 0, 0, 0],
            10256,
        ),
        (
            "123456234234234757655.1234567890123456",
            &[128, 0, 123, 27, 49, 148, 250, 13, 254, 30, 23, 7, 91, 205, 21, 0, 1, 226, 64],
            10256,
        ),
        (
            "-123456234234234757655.1234567890123456",
            &[127, 255, 132, 228, 206, 107, 5, 242, 1, 225, 232, 248, 164, 50, 234, 255, 254, 29, 191],
            10256,
        ),
        (
            "0.0000000000000000",
            &[128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            10256,
        ),
        // DECIMAL(60, 0)
        (
            "1000000000000000000000000000000",
            &[128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 232, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            15360,
        ),
        (
            "1",
            &[128, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
            15360,
        ),
        // DECIMAL(30, 30)
        (
            "0.100000000000000000000000000000",
            &[133, 245, 225, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            7710,
        ),
        (
            "0.000000000000001000000000000000",
            &[128, 0, 0, 0, 0, 0, 3, 232, 0, 0, 0, 0, 0, 0],
            7710,
        ),
    ];

    const NEWDECIMAL: u8 = 246;
    for (num, data, meta) in cases {
        let (value, _) =
            decode_value(data, NEWDECIMAL, *meta, false, &DecodeOptions::default()).unwrap();
        assert_eq!(value, ColumnValue::Decimal(num.to_string()));

        let opts = DecodeOptions {
            use_decimal: true,
            ..Default::default()
        };
        let (value, _) = decode_value(data, NEWDECIMAL, *meta, false, &opts).unwrap();
        match value {
            ColumnValue::DecimalValue(d) => {
                assert_eq!(d, BigDecimal::from_str(num).unwrap())
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

#[test]
fn table_map_nullable_bits() {
    let nullables = [true, false, false, true];
    let cases: &[(&[u8], Flavor)] = &[
        // mysql 5.7
        (b"z\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x05_null\x00\x04\x03\x03\x11\xfc\x02\x00\x02\x09", Flavor::MySQL),
        // mysql 8.0
        (b"z\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x05_null\x00\x04\x03\x03\x11\xfc\x02\x00\x02\x09\x01\x01\x00\x02\x01\xe0\x04\x0c\x02c1\x02c2\x02c3\x02c4", Flavor::MySQL),
        // mariadb 10.4
        (b"\x1e\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x05_null\x00\x04\x03\x03\x11\xfc\x02\x00\x02\x09", Flavor::MariaDB),
        // mariadb 10.5
        (b"\x1d\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x05_null\x00\x04\x03\x03\x11\xfc\x02\x00\x02\x09\x01\x01\x00\x02\x01\xe0\x04\x0c\x02c1\x02c2\x02c3\x02c4", Flavor::MariaDB),
    ];
    for (data, flavor) in cases {
        let tme = table_map(data, *flavor);
        assert_eq!(tme.column_count as usize, nullables.len());
        for (i, expected) in nullables.iter().enumerate() {
            assert_eq!(tme.nullable(i), (true, *expected), "column {}", i);
        }
    }
}

#[test]
fn table_map_optional_metadata_names() {
    let col_names = ["b_bit", "n_boolean", "n_tinyint", "n_smallint", "n_mediumint", "n_int", "n_bigint", "n_decimal", "n_float", "n_double", "nu_tinyint", "nu_smallint", "nu_mediumint", "nu_int", "nu_bigint", "nu_decimal", "nu_float", "nu_double", "t_year", "t_date", "t_time", "t_ftime", "t_datetime", "t_fdatetime", "t_timestamp", "t_ftimestamp", "c_char", "c_varchar", "c_binary", "c_varbinary", "c_tinyblob", "c_blob", "c_mediumblob", "c_longblob", "c_tinytext", "c_text", "c_mediumtext", "c_longtext", "e_enum", "s_set", "g_geometry", "j_json"];

    let cases: &[(&[u8], Flavor, bool)] = &[
        // mysql 5.7: no optional metadata block
        (b"u\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x06_types\x00*\x10\x01\x01\x02\x09\x03\x08\xf6\x04\x05\x01\x02\x09\x03\x08\xf6\x04\x05\x0d\x0a\x13\x13\x12\x12\x11\x11\xfe\x0f\xfe\x0f\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfe\xfe\xff\xf5&\x00\x08A\x1e\x04\x08A\x1e\x04\x08\x00\x06\x00\x06\x00\x06\xce\xfc\xfc\x03\xfe@@\x00\x01\x02\x03\x04\x01\x02\x03\x04\xf7\x01\xf8\x01\x04\x04\x00\x00\xfc\xc0\xff\x03", Flavor::MySQL, false),
        // mysql 8.0
        (b"j\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x06_types\x00*\x10\x01\x01\x02\x09\x03\x08\xf6\x04\x05\x01\x02\x09\x03\x08\xf6\x04\x05\x0d\x0a\x13\x13\x12\x12\x11\x11\xfe\x0f\xfe\x0f\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfe\xfe\xff\xf5&\x00\x08A\x1e\x04\x08A\x1e\x04\x08\x00\x06\x00\x06\x00\x06\xce\xfc\xfc\x03\xfe@@\x00\x01\x02\x03\x04\x01\x02\x03\x04\xf7\x01\xf8\x01\x04\x04\x00\x00\xfc\xc3\xff\x03\x01\x03\x00\x7f\x80\x03\x0c\xe0\xe0??????\xe0\xe0\xe0\xe0\x07\x01\x00\x04\xfc\x94\x01\x05b_bit\x09n_boolean\x09n_tinyint\x0an_smallint\x0bn_mediumint\x05n_int\x08n_bigint\x09n_decimal\x07n_float\x08n_double\x0anu_tinyint\x0bnu_smallint\x0cnu_mediumint\x06nu_int\x09nu_bigint\x0anu_decimal\x08nu_float\x09nu_double\x06t_year\x06t_date\x06t_time\x07t_ftime\x0at_datetime\x0bt_fdatetime\x0bt_timestamp\x0ct_ftimestamp\x06c_char\x09c_varchar\x08c_binary\x0bc_varbinary\x0ac_tinyblob\x06c_blob\x0cc_mediumblob\x0ac_longblob\x0ac_tinytext\x06c_text\x0cc_mediumtext\x0ac_longtext\x06e_enum\x05s_set\x0ag_geometry\x06j_json\x0a\x01\xe0\x05\x05\x02\x011\x012\x06\x05\x02\x01a\x01b", Flavor::MySQL, true),
        // mariadb 10.4
        (b"\x1b\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x06_types\x00*\x10\x01\x01\x02\x09\x03\x08\xf6\x04\x05\x01\x02\x09\x03\x08\xf6\x04\x05\x0d\x0a\x13\x13\x12\x12\x11\x11\xfe\x0f\xfe\x0f\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfe\xfe\xff\xfc&\x00\x08A\x1e\x04\x08A\x1e\x04\x08\x00\x06\x00\x06\x00\x06\xce\xfc\xfc\x03\xfe@@\x00\x01\x02\x03\x04\x01\x02\x03\x04\xf7\x01\xf8\x01\x04\x04\x00\x00\xfc\xc0\xff\x03", Flavor::MariaDB, false),
        // mariadb 10.5
        (b"\x1a\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x06_types\x00*\x10\x01\x01\x02\x09\x03\x08\xf6\x04\x05\x01\x02\x09\x03\x08\xf6\x04\x05\x0d\x0a\x13\x13\x12\x12\x11\x11\xfe\x0f\xfe\x0f\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfe\xfe\xff\xfc&\x00\x08A\x1e\x04\x08A\x1e\x04\x08\x00\x06\x00\x06\x00\x06\xce\xfc\xfc\x03\xfe@@\x00\x01\x02\x03\x04\x01\x02\x03\x04\xf7\x01\xf8\x01\x04\x04\x00\x00\xfc\xc0\xff\x03\x01\x03\x00\x7f\xc0\x03\x0e\xe0\xe0??????\xe0\xe0\xe0\xe0?.\x07\x01\x00\x04\xfc\x94\x01\x05b_bit\x09n_boolean\x09n_tinyint\x0an_smallint\x0bn_mediumint\x05n_int\x08n_bigint\x09n_decimal\x07n_float\x08n_double\x0anu_tinyint\x0bnu_smallint\x0cnu_mediumint\x06nu_int\x09nu_bigint\x0anu_decimal\x08nu_float\x09nu_double\x06t_year\x06t_date\x06t_time\x07t_ftime\x0at_datetime\x0bt_fdatetime\x0bt_timestamp\x0ct_ftimestamp\x06c_char\x09c_varchar\x08c_binary\x0bc_varbinary\x0ac_tinyblob\x06c_blob\x0cc_mediumblob\x0ac_longblob\x0ac_tinytext\x06c_text\x0cc_mediumtext\x0ac_longtext\x06e_enum\x05s_set\x0ag_geometry\x06j_json\x0a\x01\xe0\x05\x05\x02\x011\x012\x06\x05\x02\x01a\x01b", Flavor::MariaDB, true),
    ];

    for (data, flavor, has_names) in cases {
        let tme = table_map(data, *flavor);
        assert_eq!(tme.column_count, 42);
        if *has_names {
            assert_eq!(tme.column_name, col_names);
            assert_eq!(tme.set_str_value, vec![vec!["1".to_string(), "2".to_string()]]);
            assert_eq!(tme.enum_str_value, vec![vec!["a".to_string(), "b".to_string()]]);
        } else {
            assert!(tme.column_name.is_empty());
            assert!(tme.set_str_value.is_empty());
            assert!(tme.enum_str_value.is_empty());
        }
    }
}

#[test]
fn table_map_optional_metadata_primary_key() {
    // (data, flavor, primary_key, primary_key_prefix)
    let empty: &[u64] = &[];
    let cases: &[(&[u8], Flavor, &[u64], &[u64])] = &[
        (b"w\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x05_prim\x00\x03\x03\x0f\x08\x02x\x00\x02", Flavor::MySQL, empty, empty),
        (b"l\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x05_prim\x00\x03\x03\x0f\x08\x02x\x00\x02\x01\x01\x00\x02\x01\xe0\x04\x0c\x03id2\x03col\x03id1\x08\x02\x02\x00", Flavor::MySQL, &[2, 0], &[0, 0]),
        (b"\x1c\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x05_prim\x00\x03\x03\x0f\x08\x02x\x00\x02", Flavor::MariaDB, empty, empty),
        (b"\x1b\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x05_prim\x00\x03\x03\x0f\x08\x02x\x00\x02\x01\x01\x00\x02\x01\xe0\x04\x0c\x03id2\x03col\x03id1\x08\x02\x02\x00", Flavor::MariaDB, &[2, 0], &[0, 0]),
        (b"y\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x06_prim2\x00\x04\x03\xfe\x03\x0f\x04\xfe(P\x00\x05", Flavor::MySQL, empty, empty),
        (b"m\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x06_prim2\x00\x04\x03\xfe\x03\x0f\x04\xfe(P\x00\x05\x01\x01\x00\x02\x01\xe0\x04\x12\x04col1\x03id1\x04col2\x03id2\x09\x04\x01\x00\x03\x0a", Flavor::MySQL, &[1, 3], &[0, 10]),
        (b"\x1d\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x06_prim2\x00\x04\x03\xfe\x03\x0f\x04\xfe(P\x00\x05", Flavor::MariaDB, empty, empty),
        (b"\x1c\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x06_prim2\x00\x04\x03\xfe\x03\x0f\x04\xfe(P\x00\x05\x01\x01\x00\x02\x01\xe0\x04\x12\x04col1\x03id1\x04col2\x03id2\x09\x04\x01\x00\x03\x0a", Flavor::MariaDB, &[1, 3], &[0, 10]),
    ];
    for (data, flavor, pk, pk_prefix) in cases {
        let tme = table_map(data, *flavor);
        assert_eq!(tme.primary_key, *pk);
        assert_eq!(tme.primary_key_prefix, *pk_prefix);
    }
}

#[test]
fn table_map_optional_metadata_visibility() {
    let visible_case1: &[(usize, bool)] = &[
        (0, false), (1, true), (2, false), (3, true), (4, true), (5, false),
        (6, false), (7, false), (8, true), (9, false), (10, false),
    ];
    let all_visible: &[(usize, bool)] =
        &[(0, true), (1, true), (2, true), (3, true), (4, true), (5, true),
          (6, true), (7, true), (8, true), (9, true), (10, true)];

    // mysql 8.0 with invisible columns
    let tme = table_map(b"^\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x0b_visibility\x00\x0b\x03\x03\x03\x03\x03\x03\x03\x03\x03\x03\x03\x00\xff\x07\x01\x02\x00\x00\x048\x04col0\x04col1\x04col2\x04col3\x04col4\x04col5\x04col6\x04col7\x04col8\x04col9\x05col10\x0c\x02X\x80", Flavor::MySQL);
    assert_eq!(tme.visibility_bitmap, vec![0x58, 0x80]);
    let map = tme.visibility_map().unwrap();
    for (i, visible) in visible_case1 {
        assert_eq!(map.get(i), Some(visible), "column {}", i);
    }

    // mysql 5.7: no metadata at all
    let tme = table_map(b"m\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x0b_visibility\x00\x0b\x03\x03\x03\x03\x03\x03\x03\x03\x03\x03\x03\x00\xff\x07", Flavor::MySQL);
    assert!(tme.visibility_bitmap.is_empty());
    assert!(tme.visibility_map().is_none());

    // mysql 8.0, everything visible
    let tme = table_map(b"^\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x0b_visibility\x00\x0b\x03\x03\x03\x03\x03\x03\x03\x03\x03\x03\x03\x00\xff\x07\x01\x02\x00\x00\x048\x04col0\x04col1\x04col2\x04col3\x04col4\x04col5\x04col6\x04col7\x04col8\x04col9\x05col10\x0c\x02\xff\xe0", Flavor::MySQL);
    assert_eq!(tme.visibility_bitmap, vec![0xff, 0xe0]);
    let map = tme.visibility_map().unwrap();
    for (i, visible) in all_visible {
        assert_eq!(map.get(i), Some(visible), "column {}", i);
    }

    // mariadb 10.4 / 10.5 never send the bitmap
    let tme = table_map(b"\x12\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x0b_visibility\x00\x0b\x03\x03\x03\x03\x03\x03\x03\x03\x03\x03\x03\x00\xff\x07", Flavor::MariaDB);
    assert!(tme.visibility_map().is_none());
    let tme = table_map(b"\x12\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x0b_visibility\x00\x0b\x03\x03\x03\x03\x03\x03\x03\x03\x03\x03\x03\x00\xff\x07\x01\x02\x00\x00\x048\x04col0\x04col1\x04col2\x04col3\x04col4\x04col5\x04col6\x04col7\x04col8\x04col9\x05col10", Flavor::MariaDB);
    assert!(tme.visibility_map().is_none());
}

#[test]
fn table_map_helper_maps() {
    let mut unsigned = HashMap::new();
    for i in 1..=9 {
        unsigned.insert(i, false);
    }
    for i in 10..=17 {
        unsigned.insert(i, true);
    }

    // collation id 28 = gbk_chinese_ci, 46 = utf8mb4_bin, 63 = binary,
    // 224 = utf8mb4_unicode_ci
    let mut mysql_collation: HashMap<usize, u64> = HashMap::new();
    for (i, c) in [
        (26, 28), (27, 224), (28, 63), (29, 63),
        (30, 63), (31, 63), (32, 63), (33, 63),
        (34, 224), (35, 224), (36, 224), (37, 224),
    ] {
        mysql_collation.insert(i, c);
    }
    // mariadb treats json and geometry as character fields
    let mut mariadb_collation = mysql_collation.clone();
    for (i, c) in [
        (40, 63), (41, 46),
        (44, 63), (45, 63), (46, 63), (47, 63), (48, 63), (49, 63), (50, 63),
    ] {
        mariadb_collation.insert(i, c);
    }

    let enum_set_collation: HashMap<usize, u64> =
        [(38, 224), (39, 224), (42, 28), (43, 28)].into_iter().collect();

    let enum_values: HashMap<usize, Vec<String>> = [
        (38, vec!["a".to_string(), "b".to_string()]),
        (43, vec!["c".to_string(), "d".to_string()]),
    ]
    .into_iter()
    .collect();
    let set_values: HashMap<usize, Vec<String>> = [
        (39, vec!["1".to_string(), "2".to_string()]),
        (42, vec!["3".to_string(), "4".to_string()]),
    ]
    .into_iter()
    .collect();

    let geometry_types: HashMap<usize, u64> = [
        (40, 0), (44, 7), (45, 6), (46, 5), (47, 4), (48, 3), (49, 2), (50, 1),
    ]
    .into_iter()
    .collect();

    // mysql 8.0, binlog_row_metadata=FULL
    let tme = table_map(b"e\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x06_types\x003\x10\x01\x01\x02\x09\x03\x08\xf6\x04\x05\x01\x02\x09\x03\x08\xf6\x04\x05\x0d\x0a\x13\x13\x12\x12\x11\x11\xfe\x0f\xfe\x0f\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfe\xfe\xff\xf5\xfe\xfe\xff\xff\xff\xff\xff\xff\xff1\x00\x08A\x1e\x04\x08A\x1e\x04\x08\x00\x06\x00\x06\x00\x06\xee\xfe\xfc\x03\xfe@@\x00\x01\x02\x03\x04\x01\x02\x03\x04\xf7\x01\xf8\x01\x04\x04\xf8\x01\xf7\x01\x04\x04\x04\x04\x04\x04\x04\x00\x00\xfc\xc3\xff\xff\x07\x01\x03\x00\x7f\x80\x03\x0c\x1c\xe0??????\xe0\xe0\xe0\xe0\x07\x08\x00\x07\x06\x05\x04\x03\x02\x01\x04\xfc\x05\x02\x05b_bit\x09n_boolean\x09n_tinyint\x0an_smallint\x0bn_mediumint\x05n_int\x08n_bigint\x09n_decimal\x07n_float\x08n_double\x0anu_tinyint\x0bnu_smallint\x0cnu_mediumint\x06nu_int\x09nu_bigint\x0anu_decimal\x08nu_float\x09nu_double\x06t_year\x06t_date\x06t_time\x07t_ftime\x0at_datetime\x0bt_fdatetime\x0bt_timestamp\x0ct_ftimestamp\x06c_char\x09c_varchar\x08c_binary\x0bc_varbinary\x0ac_tinyblob\x06c_blob\x0cc_mediumblob\x0ac_longblob\x0ac_tinytext\x06c_text\x0cc_mediumtext\x0ac_longtext\x06e_enum\x05s_set\x0ag_geometry\x06j_json\x06s_set2\x07e_enum2\x14g_geometrycollection\x0eg_multipolygon\x11g_multilinestring\x0cg_multipoint\x09g_polygon\x0cg_linestring\x07g_point\x0b\x04\xe0\xe0\x1c\x1c\x05\x0a\x02\x011\x012\x02\x013\x014\x06\x0a\x02\x01a\x01b\x02\x01c\x01d", Flavor::MySQL);
    assert_eq!(tme.unsigned_map().unwrap(), unsigned);
    assert_eq!(tme.collation_map().unwrap(), mysql_collation);
    assert_eq!(tme.enum_set_collation_map().unwrap(), enum_set_collation);
    assert_eq!(tme.enum_str_value_map().unwrap(), enum_values);
    assert_eq!(tme.set_str_value_map().unwrap(), set_values);
    assert_eq!(tme.geometry_type_map().unwrap(), geometry_types);

    // mariadb 10.5
    let tme = table_map(b"\x1e\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x06_types\x003\x10\x01\x01\x02\x09\x03\x08\xf6\x04\x05\x01\x02\x09\x03\x08\xf6\x04\x05\x0d\x0a\x13\x13\x12\x12\x11\x11\xfe\x0f\xfe\x0f\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfe\xfe\xff\xfc\xfe\xfe\xff\xff\xff\xff\xff\xff\xff1\x00\x08A\x1e\x04\x08A\x1e\x04\x08\x00\x06\x00\x06\x00\x06\xee\xfe\xfc\x03\xfe@@\x00\x01\x02\x03\x04\x01\x02\x03\x04\xf7\x01\xf8\x01\x04\x04\xf8\x01\xf7\x01\x04\x04\x04\x04\x04\x04\x04\x00\x00\xfc\xc0\xff\xff\x07\x01\x03\x00\x7f\xc0\x02\x0f?\x00\x1c\x01\xe0\x08\xe0\x09\xe0\x0a\xe0\x0b\xe0\x0d.\x07\x08\x00\x07\x06\x05\x04\x03\x02\x01\x04\xfc\x05\x02\x05b_bit\x09n_boolean\x09n_tinyint\x0an_smallint\x0bn_mediumint\x05n_int\x08n_bigint\x09n_decimal\x07n_float\x08n_double\x0anu_tinyint\x0bnu_smallint\x0cnu_mediumint\x06nu_int\x09nu_bigint\x0anu_decimal\x08nu_float\x09nu_double\x06t_year\x06t_date\x06t_time\x07t_ftime\x0at_datetime\x0bt_fdatetime\x0bt_timestamp\x0ct_ftimestamp\x06c_char\x09c_varchar\x08c_binary\x0bc_varbinary\x0ac_tinyblob\x06c_blob\x0cc_mediumblob\x0ac_longblob\x0ac_tinytext\x06c_text\x0cc_mediumtext\x0ac_longtext\x06e_enum\x05s_set\x0ag_geometry\x06j_json\x06s_set2\x07e_enum2\x14g_geometrycollection\x0eg_multipolygon\x11g_multilinestring\x0cg_multipoint\x09g_polygon\x0cg_linestring\x07g_point\x0b\x04\xe0\xe0\x1c\x1c\x05\x0a\x02\x011\x012\x02\x013\x014\x06\x0a\x02\x01a\x01b\x02\x01c\x01d", Flavor::MariaDB);
    assert_eq!(tme.unsigned_map().unwrap(), unsigned);
    assert_eq!(tme.collation_map().unwrap(), mariadb_collation);
    assert_eq!(tme.enum_set_collation_map().unwrap(), enum_set_collation);
    assert_eq!(tme.enum_str_value_map().unwrap(), enum_values);
    assert_eq!(tme.set_str_value_map().unwrap(), set_values);
    assert_eq!(tme.geometry_type_map().unwrap(), geometry_types);

    // mysql 5.7 / mariadb 10.4 have no optional metadata
    let tme = table_map(b"q\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x06_types\x003\x10\x01\x01\x02\x09\x03\x08\xf6\x04\x05\x01\x02\x09\x03\x08\xf6\x04\x05\x0d\x0a\x13\x13\x12\x12\x11\x11\xfe\x0f\xfe\x0f\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfe\xfe\xff\xf5\xfe\xfe\xff\xff\xff\xff\xff\xff\xff1\x00\x08A\x1e\x04\x08A\x1e\x04\x08\x00\x06\x00\x06\x00\x06\xee\xfe\xfc\x03\xfe@@\x00\x01\x02\x03\x04\x01\x02\x03\x04\xf7\x01\xf8\x01\x04\x04\xf8\x01\xf7\x01\x04\x04\x04\x04\x04\x04\x04\x00\x00\xfc\xc0\xff\xff\x07", Flavor::MySQL);
    assert!(tme.unsigned_map().is_none());
    assert!(tme.collation_map().is_none());
    assert!(tme.enum_str_value_map().is_none());
    let tme = table_map(b"\x1a\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x06_types\x003\x10\x01\x01\x02\x09\x03\x08\xf6\x04\x05\x01\x02\x09\x03\x08\xf6\x04\x05\x0d\x0a\x13\x13\x12\x12\x11\x11\xfe\x0f\xfe\x0f\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfc\xfe\xfe\xff\xfc\xfe\xfe\xff\xff\xff\xff\xff\xff\xff1\x00\x08A\x1e\x04\x08A\x1e\x04\x08\x00\x06\x00\x06\x00\x06\xee\xfe\xfc\x03\xfe@@\x00\x01\x02\x03\x04\x01\x02\x03\x04\xf7\x01\xf8\x01\x04\x04\xf8\x01\xf7\x01\x04\x04\x04\x04\x04\x04\x04\x00\x00\xfc\xc0\xff\xff\x07", Flavor::MariaDB);
    assert!(tme.unsigned_map().is_none());
    assert!(tme.geometry_type_map().is_none());
}

#[test]
fn json_rows_and_decimal_column() {
    // test.t10 (c1 json, c2 decimal(10,0))
    let tme = table_map(b"m\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x03t10\x00\x02\xf5\xf6\x03\x04\x0a\x00\x03", Flavor::MySQL);

    let bodies: &[&[u8]] = &[
        // (NULL, 1)
        b"m\x00\x00\x00\x00\x00\x01\x00\x02\x00\x02\xff\xfd\x80\x00\x00\x00\x01",
        // ({"key1": "value1", "key2": "value2"}, 1)
        b"m\x00\x00\x00\x00\x00\x01\x00\x02\x00\x02\xff\xfc)\x00\x00\x00\x00\x02\x00(\x00\x12\x00\x04\x00\x16\x00\x04\x00\x0c\x1a\x00\x0c!\x00key1key2\x06value1\x06value2\x80\x00\x00\x00\x01",
    ];
    for body in bodies {
        let e = decode_rows(&tme, EventType::WriteRowsV2, body);
        assert_eq!(text(&e.rows[0].as_slice()[1]), "1");
    }

    let e = decode_rows(&tme, EventType::WriteRowsV2, bodies[1]);
    assert_eq!(
        text(&e.rows[0].as_slice()[0]),
        r#"{"key1":"value1","key2":"value2"}"#
    );

    // a ~2.5KB document crossing the two-byte string length encoding
    let body: &[u8] = b"m\x00\x00\x00\x00\x00\x01\x00\x02\x00\x02\xff\xfc\xd0\x0a\x00\x00\x00\x01\x00\xcf\x0a\x0b\x00\x04\x00\x0c\x0f\x00text\xbe\x15Lorem ipsum dolor sit amet, consectetuer adipiscing elit. Aenean commodo ligula eget dolor. Aenean massa. Cum sociis natoque penatibus et magnis dis parturient montes, nascetur ridiculus mus. Donec quam felis, ultricies nec, pellentesque eu, pretium quis, sem. Nulla consequat massa quis enim. Donec pede justo, fringilla vel, aliquet nec, vulputate eget, arcu. In enim justo, rhoncus ut, imperdiet a, venenatis vitae, justo. Nullam dictum felis eu pede mollis pretium. Integer tincidunt. Cras dapibus. Vivamus elementum semper nisi. Aenean vulputate eleifend tellus. Aenean leo ligula, porttitor eu, consequat vitae, eleifend ac, enim. Aliquam lorem ante, dapibus in, viverra quis, feugiat a, tellus. Phasellus viverra nulla ut metus varius laoreet. Quisque rutrum. Aenean imperdiet. Etiam ultricies nisi vel augue. Curabitur ullamcorper ultricies nisi. Nam eget dui. Etiam rhoncus. Maecenas tempus, tellus eget condimentum rhoncus, sem quam semper libero, sit amet adipiscing sem neque sed ipsum. Nam quam nunc, blandit vel, luctus pulvinar, hendrerit id, lorem. Maecenas nec odio et ante tincidunt tempus. Donec vitae sapien ut libero venenatis faucibus. Nullam quis ante. Etiam sit amet orci eget eros faucibus tincidunt. Duis leo. Sed fringilla mauris sit amet nibh. Donec sodales sagittis magna. Sed consequat, leo eget bibendum sodales, augue velit cursus nunc, quis gravida magna mi a libero. Fusce vulputate eleifend sapien. Vestibulum purus quam, scelerisque ut, mollis sed, nonummy id, metus. Nullam accumsan lorem in dui. Cras ultricies mi eu turpis hendrerit fringilla. Vestibulum ante ipsum primis in faucibus orci luctus et ultrices posuere cubilia Curae; In ac dui quis mi consectetuer lacinia. Nam pretium turpis et arcu. Duis arcu tortor, suscipit eget, imperdiet nec, imperdiet iaculis, ipsum. Sed aliquam ultrices mauris. Integer ante arcu, accumsan a, consectetuer eget, posuere ut, mauris. Praesent adipiscing. Phasellus ullamcorper ipsum rutrum nunc. Nunc nonummy metus. Vestibulum volutpat pretium libero. Cras id dui. Aenean ut eros et nisl sagittis vestibulum. Nullam nulla eros, ultricies sit amet, nonummy id, imperdiet feugiat, pede. Sed lectus. Donec mollis hendrerit risus. Phasellus nec sem in justo pellentesque facilisis. Etiam imperdiet imperdiet orci. Nunc nec neque. Phasellus leo dolor, tempus non, auctor et, hendrerit quis, nisi. Curabitur ligula sapien, tincidunt non, euismod vitae, posuere imperdiet, leo. Maecenas malesuada. Praesent congue erat at massa. Sed cursus turpis vitae tortor. Donec posuere vulputate arcu. Phasellus accumsan cursus velit. Vestibulum ante ipsum primis in faucibus orci luctus et ultrices posuere cubilia Curae; Sed aliquam, nisi quis porttitor congue, elit erat euismod orci, ac\x80\x00\x00\x00e";
    let e = decode_rows(&tme, EventType::WriteRowsV2, body);
    assert_eq!(text(&e.rows[0].as_slice()[1]), "101");
    assert!(text(&e.rows[0].as_slice()[0]).contains("Lorem ipsum dolor sit amet"));

    // use_decimal drives the c2 representation
    let opts = DecodeOptions {
        use_decimal: true,
        ..Default::default()
    };
    let e = decode_rows_opts(&tme, EventType::WriteRowsV2, bodies[0], &opts).unwrap();
    assert_eq!(
        e.rows[0].as_slice()[1],
        ColumnValue::DecimalValue(BigDecimal::from_str("1").unwrap())
    );
}

#[test]
fn json_empty_value_is_empty_text() {
    // test.hj_order_preview: a NOT NULL json column written with no value
    let tme = table_map(b"r\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x10hj_order_preview\x00\x07\x03\x08\x08\xf5\x01\x03\x11\x02\x04\x00\x00", Flavor::MySQL);
    let body: &[u8] = b"r\x00\x00\x00\x00\x00\x01\x00\x02\x00\x07\xff\x80\x01\x00\x00\x00B\xee\x93\x906W\x00\x00A\x10@l\x9a\x85/\x00\x00\x00\x00\x00\x00{\xc36X\x00\x00\x00\x00";
    let e = decode_rows(&tme, EventType::WriteRowsV2, body);
    assert_eq!(e.rows.len(), 1);
    assert_eq!(text(&e.rows[0].as_slice()[3]), "");
}

#[test]
fn json_partial_update_compatibility() {
    // test.t11 (id int, cfg varchar(100), cfg_json json generated, age int)
    let tme = table_map(b"l\x00\x00\x00\x00\x00\x01\x00\x04test\x00\x03t11\x00\x04\x03\x0f\xf5\x03\x03d\x00\x04\x0f", Flavor::MySQL);

    let body: &[u8] = b"l\x00\x00\x00\x00\x00\x01\x00\x02\x00\x04\xff\xf8\x01\x00\x00\x00\x02{}\x05\x00\x00\x00\x00\x00\x00\x04\x00";
    let e = decode_rows(&tme, EventType::WriteRowsV2, body);
    assert_eq!(text(&e.rows[0].as_slice()[2]), "{}");

    // servers after 5.7.22 write both update images correctly: the pair
    // comes back as (before, after)
    let body: &[u8] = b"l\x00\x00\x00\x00\x00\x01\x00\x02\x00\x04\xff\xff\xf8\x01\x00\x00\x00\x02{}\x05\x00\x00\x00\x00\x00\x00\x04\x00\xf8\x01\x00\x00\x00\x0a{\x22a\x22:1234}\x0d\x00\x00\x00\x00\x01\x00\x0c\x00\x0b\x00\x01\x00\x05\xd2\x04a";
    let e = decode_rows(&tme, EventType::UpdateRowsV2, body);
    assert_eq!(e.rows.len(), 2);
    assert_eq!(text(&e.rows[0].as_slice()[2]), "{}");
    assert_eq!(text(&e.rows[1].as_slice()[2]), r#"{"a":1234}"#);

    let body: &[u8] = b"l\x00\x00\x00\x00\x00\x01\x00\x02\x00\x04\xff\xff\xf8\x01\x00\x00\x00\x0a{\x22a\x22:1234}\x0d\x00\x00\x00\x00\x01\x00\x0c\x00\x0b\x00\x01\x00\x05\xd2\x04a\xf8\x01\x00\x00\x00\x02{}\x05\x00\x00\x00\x00\x00\x00\x04\x00";
    let e = decode_rows(&tme, EventType::UpdateRowsV2, body);
    assert_eq!(text(&e.rows[0].as_slice()[2]), r#"{"a":1234}"#);
    assert_eq!(text(&e.rows[1].as_slice()[2]), "{}");

    // before 5.7.22 the before-image may be garbage: without the
    // ride-through flag that's a decode error, with it the sentinel "null"
    let body: &[u8] = b"l\x00\x00\x00\x00\x00\x01\x00\x02\x00\x04\xff\xff\xf8\x01\x00\x00\x00\x02{}\x05\x00\x00\x00\x00\x01\x00\x0c\x00\xf8\x01\x00\x00\x00\x0a{\x22a\x22:1234}\x0d\x00\x00\x00\x00\x01\x00\x0c\x00\x0b\x00\x01\x00\x05\xd2\x04a";
    assert!(
        decode_rows_opts(&tme, EventType::UpdateRowsV2, body, &DecodeOptions::default())
            .is_err()
    );
    let opts = DecodeOptions {
        ignore_json_decode_err: true,
        ..Default::default()
    };
    let e = decode_rows_opts(&tme, EventType::UpdateRowsV2, body, &opts).unwrap();
    assert_eq!(text(&e.rows[0].as_slice()[2]), "null");
    assert_eq!(text(&e.rows[1].as_slice()[2]), r#"{"a":1234}"#);

    // and this corruption happens to parse, yielding a wrong but stable value
    let body: &[u8] = b"l\x00\x00\x00\x00\x00\x01\x00\x02\x00\x04\xff\xff\xf8\x01\x00\x00\x00\x0a{\x22a\x22:1234}\x0d\x00\x00\x00\x00\x00\x00\x04\x00\x00\x00\x01\x00\x05\xd2\x04a\xf8\x01\x00\x00\x00\x02{}\x05\x00\x00\x00\x00\x00\x00\x04\x00";
    let e = decode_rows(&tme, EventType::UpdateRowsV2, body);
    assert_eq!(text(&e.rows[0].as_slice()[2]), "{}");
    assert_eq!(text(&e.rows[1].as_slice()[2]), "{}");
}

#[test]
fn mixed_width_row_regression() {
    // 26 columns of mixed types; decodes without panicking and yields the
    // leading int
    let mut tme = TableMapEvent::default();
    tme.table_id = 1810;
    tme.column_count = 26;
    tme.column_types = vec![
        3, 15, 15, 15, 9, 15, 15, 252, 3, 3, 3, 15, 3, 3, 3, 15, 3, 15, 1, 15, 3, 1, 252,
        15, 15, 15,
    ];
    tme.column_meta = vec![
        0, 108, 60, 765, 0, 765, 765, 4, 0, 0, 0, 765, 0, 0, 0, 3, 0, 3, 0, 765, 0, 0, 2,
        108, 108, 108,
    ];
    tme.null_bitmap = vec![0xff; 4];

    let body: &[u8] = &[
        18, 7, 0, 0, 0, 0, 1, 0, 2, 0, 26, 1, 1, 16, 252, 248, 142, 63, 0, 0, 13, 0, 0, 0,
        13, 0, 0, 0,
    ];
    let e = decode_rows(&tme, EventType::WriteRowsV2, body);
    assert_eq!(e.rows[0].as_slice()[0], ColumnValue::Signed(16270));
}
