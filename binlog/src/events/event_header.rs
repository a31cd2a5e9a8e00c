use nom::{
    number::complete::{le_u16, le_u32, le_u8},
    IResult,
};
use serde::Serialize;

/// Every v4 event opens with a 19-byte common header, little-endian:
///
/// ```text
///                      [startPos : Len]
/// +=====================================+
/// | event  | timestamp         0 : 4    |
/// | header +----------------------------+
/// |        | event_type        4 : 1    |
/// |        +----------------------------+
/// |        | server_id         5 : 4    |
/// |        +----------------------------+
/// |        | event_length      9 : 4    |
/// |        +----------------------------+
/// |        | log_pos          13 : 4    |
/// |        +----------------------------+
/// |        | flags            17 : 2    |
/// +=====================================+
/// ```
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Default)]
pub struct Header {
    /// Creation time, seconds since Unix epoch. Zero on artificial events
    /// the server fabricates mid-stream (fake rotate, heartbeat).
    pub when: u32,

    pub event_type: u8,

    /// Which server originally wrote the event; used to break replication
    /// loops.
    pub server_id: u32,

    /// header + body + checksum
    pub event_length: u32,

    /// File position of the next event, zero on artificial events.
    pub log_pos: u32,

    /// ref: https://mariadb.com/kb/en/2-binlog-event-header/#event-flag
    pub flags: u16,
}

/// LOG_EVENT_ARTIFICIAL_F, set on server-fabricated events.
pub const LOG_EVENT_ARTIFICIAL_F: u16 = 0x20;

impl Header {
    pub fn parse_v4_header(input: &[u8]) -> IResult<&[u8], Header> {
        let (i, when) = le_u32(input)?;
        let (i, event_type) = le_u8(i)?;
        let (i, server_id) = le_u32(i)?;
        let (i, event_length) = le_u32(i)?;
        let (i, log_pos) = le_u32(i)?;
        let (i, flags) = le_u16(i)?;

        Ok((
            i,
            Header {
                when,
                event_type,
                server_id,
                event_length,
                log_pos,
                flags,
            },
        ))
    }

    pub fn is_artificial(&self) -> bool {
        self.flags & LOG_EVENT_ARTIFICIAL_F != 0
    }
}

#[cfg(test)]
mod test {
    use super::Header;

    #[test]
    fn parse_rotate_header() {
        let raw = b"\x00\x00\x00\x00\x04\x01\x00\x00\x00\x2d\x00\x00\x00\x00\x00\x00\x00\x20\x00";
        let (rest, h) = Header::parse_v4_header(raw).unwrap();
        assert!(rest.is_empty());
        assert_eq!(h.when, 0);
        assert_eq!(h.event_type, 4);
        assert_eq!(h.server_id, 1);
        assert_eq!(h.event_length, 45);
        assert_eq!(h.log_pos, 0);
        assert!(h.is_artificial());
    }
}
