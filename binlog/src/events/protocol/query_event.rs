use nom::{
    bytes::complete::take,
    number::complete::{le_u16, le_u32, le_u8},
    IResult,
};
use serde::Serialize;

/// Statement-based entry: transaction control (`BEGIN`, `COMMIT`,
/// `ROLLBACK`) and DDL travel through it under row-based replication. The
/// status-var block is skipped wholesale; the raw statement bytes are what
/// downstream DDL handling consumes.
///
/// ref: https://dev.mysql.com/doc/internals/en/query-event.html
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct QueryEvent {
    pub thread_id: u32,
    pub execution_time: u32,
    pub error_code: u16,
    pub schema: String,
    pub query: String,
}

impl QueryEvent {
    pub fn parse(input: &[u8]) -> IResult<&[u8], QueryEvent> {
        let (i, thread_id) = le_u32(input)?;
        let (i, execution_time) = le_u32(i)?;
        let (i, schema_length) = le_u8(i)?;
        let (i, error_code) = le_u16(i)?;
        let (i, status_vars_length) = le_u16(i)?;
        let (i, _status_vars) = take(status_vars_length)(i)?;
        let (i, schema_raw) = take(schema_length)(i)?;
        let schema = String::from_utf8_lossy(schema_raw).to_string();
        let (i, _) = take(1usize)(i)?; // NUL after schema
        let query = String::from_utf8_lossy(i).to_string();

        Ok((
            &[],
            QueryEvent {
                thread_id,
                execution_time,
                error_code,
                schema,
                query,
            },
        ))
    }

    /// BEGIN/COMMIT markers are not DDL.
    pub fn is_transaction_control(&self) -> bool {
        let q = self.query.trim_start();
        ["BEGIN", "COMMIT", "ROLLBACK"]
            .iter()
            .any(|k| q.len() >= k.len() && q[..k.len()].eq_ignore_ascii_case(k))
    }
}
