use nom::{number::complete::le_u64, IResult};
use serde::Serialize;

/// Emitted when the server switches to the next binlog file, and once as an
/// artificial event right after the dump command (timestamp 0) to announce
/// the current file.
///
/// ref: https://dev.mysql.com/doc/internals/en/rotate-event.html
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct RotateEvent {
    /// First event position inside the next file, practically always 4.
    pub position: u64,
    pub next_binlog: String,
}

impl RotateEvent {
    pub fn parse(input: &[u8]) -> IResult<&[u8], RotateEvent> {
        let (i, position) = le_u64(input)?;
        let next_binlog = String::from_utf8_lossy(i).to_string();

        Ok((&[], RotateEvent { position, next_binlog }))
    }
}

#[cfg(test)]
mod test {
    use super::RotateEvent;

    #[test]
    fn parse_body() {
        let body = b"\x96\x00\x00\x00\x00\x00\x00\x00shop-bin.000005";
        let (_, e) = RotateEvent::parse(body).unwrap();
        assert_eq!(e.position, 150);
        assert_eq!(e.next_binlog, "shop-bin.000005");
    }
}
