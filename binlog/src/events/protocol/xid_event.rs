use nom::{number::complete::le_u64, IResult};
use serde::Serialize;

/// Commit marker of a transaction that touched transactional tables.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct XidEvent {
    pub xid: u64,
}

impl XidEvent {
    pub fn parse(input: &[u8]) -> IResult<&[u8], XidEvent> {
        let (i, xid) = le_u64(input)?;
        Ok((i, XidEvent { xid }))
    }
}

#[cfg(test)]
mod test {
    use super::XidEvent;

    #[test]
    fn parse_body() {
        let (_, e) = XidEvent::parse(b"\x72\x0e\x00\x00\x00\x00\x00\x00").unwrap();
        assert_eq!(e.xid, 0x0e72);
    }
}
