use common::err::replica_error::ReError;
use common::err::CResult;

/// Initial handshake (protocol version 10).
///
/// ref: https://dev.mysql.com/doc/dev/mysql-server/latest/page_protocol_connection_phase_packets_protocol_handshake_v10.html
#[derive(Debug, Clone)]
pub struct HandshakePacket {
    pub protocol_version: u8,
    pub server_version: String,
    pub connection_id: u32,
    /// auth-plugin-data part 1 + part 2, trailing NUL dropped
    pub scramble: Vec<u8>,
    pub server_capabilities: u32,
    pub server_collation: u8,
    pub status_flags: u16,
    pub auth_plugin_name: String,
}

impl HandshakePacket {
    pub fn parse(packet: &[u8]) -> CResult<HandshakePacket> {
        let mut pos = 0usize;

        let protocol_version = read_u8(packet, &mut pos)?;
        let server_version = read_null_string(packet, &mut pos)?;
        let connection_id = read_u32(packet, &mut pos)?;

        let mut scramble = read_bytes(packet, &mut pos, 8)?.to_vec();
        pos += 1; // filler

        let cap_low = read_u16(packet, &mut pos)? as u32;
        let server_collation = read_u8(packet, &mut pos)?;
        let status_flags = read_u16(packet, &mut pos)?;
        let cap_high = read_u16(packet, &mut pos)? as u32;
        let server_capabilities = cap_low | (cap_high << 16);

        let auth_data_len = read_u8(packet, &mut pos)? as usize;
        pos += 10; // reserved

        // part 2: max(13, len - 8) bytes, NUL terminated
        let part2_len = auth_data_len.saturating_sub(8).max(13);
        let part2 = read_bytes(packet, &mut pos, part2_len)?;
        let part2 = match part2.last() {
            Some(0) => &part2[..part2.len() - 1],
            _ => part2,
        };
        scramble.extend_from_slice(part2);

        let auth_plugin_name = if pos < packet.len() {
            read_null_string(packet, &mut pos)?
        } else {
            String::new()
        };

        Ok(HandshakePacket {
            protocol_version,
            server_version,
            connection_id,
            scramble,
            server_capabilities,
            server_collation,
            status_flags,
            auth_plugin_name,
        })
    }
}

fn read_u8(data: &[u8], pos: &mut usize) -> CResult<u8> {
    let v = *data.get(*pos).ok_or_else(ReError::incomplete)?;
    *pos += 1;
    Ok(v)
}

fn read_u16(data: &[u8], pos: &mut usize) -> CResult<u16> {
    let b = data.get(*pos..*pos + 2).ok_or_else(ReError::incomplete)?;
    *pos += 2;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(data: &[u8], pos: &mut usize) -> CResult<u32> {
    let b = data.get(*pos..*pos + 4).ok_or_else(ReError::incomplete)?;
    *pos += 4;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn read_bytes<'a>(data: &'a [u8], pos: &mut usize, len: usize) -> CResult<&'a [u8]> {
    let b = data.get(*pos..*pos + len).ok_or_else(ReError::incomplete)?;
    *pos += len;
    Ok(b)
}

fn read_null_string(data: &[u8], pos: &mut usize) -> CResult<String> {
    let rest = data.get(*pos..).ok_or_else(ReError::incomplete)?;
    let end = rest
        .iter()
        .position(|&c| c == 0)
        .ok_or_else(ReError::incomplete)?;
    let s = String::from_utf8_lossy(&rest[..end]).to_string();
    *pos += end + 1;
    Ok(s)
}
