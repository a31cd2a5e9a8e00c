use crate::commands::{scramble_native, scramble_sha256};
use crate::conn::connection_options::ConnectionOptions;
use crate::declar::auth_plugin_names::{self, AuthPlugin};
use crate::declar::capability_flags;
use crate::packet::handshake_packet::HandshakePacket;
use crate::NULL_TERMINATOR;

/// HandshakeResponse41.
///
/// ref: https://dev.mysql.com/doc/dev/mysql-server/latest/page_protocol_connection_phase_packets_protocol_handshake_response.html
#[derive(Debug)]
pub struct AuthenticateCommand<'a> {
    options: &'a ConnectionOptions,
    handshake: &'a HandshakePacket,
    auth_plugin: AuthPlugin,
    collation: u8,
}

impl<'a> AuthenticateCommand<'a> {
    pub fn new(
        options: &'a ConnectionOptions,
        handshake: &'a HandshakePacket,
        auth_plugin: AuthPlugin,
        collation: u8,
    ) -> Self {
        AuthenticateCommand {
            options,
            handshake,
            auth_plugin,
            collation,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(128);

        packet.extend_from_slice(&capability_flags::client_flags().to_le_bytes());
        packet.extend_from_slice(&0u32.to_le_bytes()); // max packet size: server default
        packet.push(self.collation);
        packet.extend_from_slice(&[0u8; 23]);

        packet.extend_from_slice(self.options.username.as_bytes());
        packet.push(NULL_TERMINATOR);

        let token = match self.auth_plugin {
            AuthPlugin::MySqlNativePassword => {
                scramble_native(&self.options.password, &self.handshake.scramble)
            }
            AuthPlugin::CachingSha2Password => {
                scramble_sha256(&self.options.password, &self.handshake.scramble)
            }
        };
        packet.push(token.len() as u8);
        packet.extend_from_slice(&token);

        let plugin_name = match self.auth_plugin {
            AuthPlugin::MySqlNativePassword => auth_plugin_names::MYSQL_NATIVE_PASSWORD,
            AuthPlugin::CachingSha2Password => auth_plugin_names::CACHING_SHA2_PASSWORD,
        };
        packet.extend_from_slice(plugin_name.as_bytes());
        packet.push(NULL_TERMINATOR);

        packet
    }
}
