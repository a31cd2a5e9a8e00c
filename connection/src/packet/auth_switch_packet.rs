use common::err::replica_error::ReError;
use common::err::CResult;

/// AuthSwitchRequest: the server picked another plugin mid-handshake.
/// Parsed from the packet body after the 0xfe marker byte.
#[derive(Debug, Clone)]
pub struct AuthPluginSwitchPacket {
    pub auth_plugin_name: String,
    pub auth_plugin_data: Vec<u8>,
}

impl AuthPluginSwitchPacket {
    pub fn parse(packet: &[u8]) -> CResult<AuthPluginSwitchPacket> {
        let end = packet
            .iter()
            .position(|&c| c == 0)
            .ok_or_else(ReError::incomplete)?;
        let auth_plugin_name = String::from_utf8_lossy(&packet[..end]).to_string();

        let mut auth_plugin_data = packet[end + 1..].to_vec();
        if auth_plugin_data.last() == Some(&0) {
            auth_plugin_data.pop();
        }

        Ok(AuthPluginSwitchPacket {
            auth_plugin_name,
            auth_plugin_data,
        })
    }
}

#[cfg(test)]
mod test {
    use super::AuthPluginSwitchPacket;

    #[test]
    fn parse_switch() {
        let mut p = b"mysql_native_password\0".to_vec();
        p.extend_from_slice(b"12345678901234567890\0");
        let s = AuthPluginSwitchPacket::parse(&p).unwrap();
        assert_eq!(s.auth_plugin_name, "mysql_native_password");
        assert_eq!(s.auth_plugin_data, b"12345678901234567890");
    }
}
