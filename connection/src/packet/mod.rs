use common::err::replica_error::ReError;
use common::err::CResult;

pub mod auth_switch_packet;
pub mod handshake_packet;
pub mod result_set_row_packet;

pub mod response_type {
    pub const OK: u8 = 0x00;
    pub const AUTH_PLUGIN_SWITCH: u8 = 0xfe;
    pub const EOF: u8 = 0xfe;
    pub const ERROR: u8 = 0xff;
}

/// Raise ERR packets as errors, tagging access denials separately so the
/// engine never retries them.
pub fn check_error_packet(packet: &[u8], message: &str) -> CResult<()> {
    if packet.first() == Some(&response_type::ERROR) {
        let code = if packet.len() >= 3 {
            u16::from_le_bytes([packet[1], packet[2]])
        } else {
            0
        };
        // skip the sql-state marker when present
        let body_start = if packet.get(3) == Some(&b'#') { 9 } else { 3 };
        let text = String::from_utf8_lossy(packet.get(body_start..).unwrap_or(&[]));

        // ER_ACCESS_DENIED_ERROR / ER_DBACCESS_DENIED_ERROR
        if code == 1045 || code == 1044 {
            return Err(ReError::Unauthorized(format!("{} {}", message, text)));
        }
        return Err(ReError::ConnectionError(format!(
            "{} code={} {}",
            message, code, text
        )));
    }
    Ok(())
}

/// EOF packets are 0xfe with a short body; 0xfe also prefixes length-encoded
/// 8-byte integers, hence the length guard.
pub fn is_eof_packet(packet: &[u8]) -> bool {
    packet.first() == Some(&response_type::EOF) && packet.len() < 9
}
