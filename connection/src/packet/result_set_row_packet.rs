use common::binlog::row::row::RowString;
use common::err::replica_error::ReError;
use common::err::CResult;

use binlog::utils::slice_len_enc_num;

/// One text-protocol result row: a length-encoded string per column,
/// 0xfb for NULL cells.
pub fn parse_text_row(packet: &[u8], column_count: usize) -> CResult<RowString> {
    let mut cells = Vec::with_capacity(column_count);
    let mut pos = 0usize;

    for _ in 0..column_count {
        let (len, is_null, n) =
            slice_len_enc_num(packet.get(pos..).ok_or_else(ReError::incomplete)?)?;
        pos += n;
        if is_null {
            cells.push(None);
            continue;
        }
        let bytes = packet
            .get(pos..pos + len as usize)
            .ok_or_else(ReError::incomplete)?;
        pos += len as usize;
        cells.push(Some(String::from_utf8_lossy(bytes).to_string()));
    }

    Ok(RowString::new_row(cells))
}
