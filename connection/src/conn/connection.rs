use openssl::rsa::{Padding, Rsa};
use tracing::debug;

use common::binlog::row::row::RowString;
use common::err::replica_error::ReError;
use common::err::CResult;

use binlog::utils::slice_len_enc_num;

use crate::commands::auth_plugin_switch_command::AuthPluginSwitchCommand;
use crate::commands::authenticate_command::AuthenticateCommand;
use crate::commands::query_command::QueryCommand;
use crate::commands::ssl_request_command::SslRequestCommand;
use crate::commands::xor;
use crate::conn::connection_options::ConnectionOptions;
use crate::conn::packet_channel::PacketChannel;
use crate::declar::auth_plugin_names::{self, AuthPlugin};
use crate::declar::capability_flags::{CLIENT_PROTOCOL_41, CLIENT_SSL};
use crate::packet::auth_switch_packet::AuthPluginSwitchPacket;
use crate::packet::handshake_packet::HandshakePacket;
use crate::packet::result_set_row_packet::parse_text_row;
use crate::packet::{check_error_packet, is_eof_packet, response_type};
use crate::{NULL_TERMINATOR, UTF8_MB4_GENERAL_CI};

/// A synchronous client connection: handshake, auth, text-protocol
/// queries. Both the admin side and the replication stream start out as
/// one of these.
#[derive(Debug)]
pub struct Connection {
    pub options: ConnectionOptions,
    channel: Option<PacketChannel>,
}

impl Connection {
    pub fn new(options: ConnectionOptions) -> Self {
        Self {
            options,
            channel: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    /// Open the socket and run the handshake if not already connected.
    pub fn try_connect(&mut self) -> CResult<()> {
        if self.channel.is_none() {
            let channel = PacketChannel::new(&self.options)?;
            let channel = self.do_handshake(channel)?;
            self.channel = Some(channel);
        }
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            let _ = channel.shutdown();
        }
    }

    /// Give the underlying channel away (the binlog stream takes over).
    pub fn into_channel(mut self) -> CResult<PacketChannel> {
        self.channel
            .take()
            .ok_or_else(|| ReError::ConnectionError("channel not found".to_string()))
    }

    /// Run one text-protocol query, buffering all result rows.
    pub fn query(&mut self, sql: &str) -> CResult<Vec<RowString>> {
        debug!(sql, "query");
        let command = QueryCommand::new(sql.to_string());
        let channel = self.channel_mut()?;
        channel.write_packet(&command.serialize(), 0)?;

        let (packet, _) = channel.read_packet()?;
        check_error_packet(&packet, "Query error.")?;

        // OK packet: statement with no result set
        if packet.first() == Some(&response_type::OK) {
            return Ok(vec![]);
        }

        let (column_count, _, _) = slice_len_enc_num(&packet)?;

        // column definitions, then the terminating EOF
        loop {
            let (packet, _) = channel.read_packet()?;
            check_error_packet(&packet, "Query error.")?;
            if is_eof_packet(&packet) {
                break;
            }
        }

        let mut rows = Vec::new();
        loop {
            let (packet, _) = channel.read_packet()?;
            check_error_packet(&packet, "Query error.")?;
            if is_eof_packet(&packet) {
                break;
            }
            rows.push(parse_text_row(&packet, column_count as usize)?);
        }

        Ok(rows)
    }

    /// `SHOW ... VARIABLES LIKE` convenience: the value cell of the first
    /// row, empty string when the variable does not exist.
    pub fn query_variable(&mut self, sql: &str) -> CResult<String> {
        let rows = self.query(sql)?;
        Ok(rows
            .first()
            .map(|row| row.get_str(1).to_string())
            .unwrap_or_default())
    }

    pub fn write_command(&mut self, packet: &[u8]) -> CResult<()> {
        self.channel_mut()?.write_packet(packet, 0)
    }

    pub fn read_packet_with_check(&mut self, err_message: &str) -> CResult<(Vec<u8>, u8)> {
        let (packet, seq_num) = self.channel_mut()?.read_packet()?;
        check_error_packet(&packet, err_message)?;
        Ok((packet, seq_num))
    }

    fn channel_mut(&mut self) -> CResult<&mut PacketChannel> {
        self.channel
            .as_mut()
            .ok_or_else(|| ReError::ConnectionError("channel not found".to_string()))
    }

    fn do_handshake(&mut self, mut channel: PacketChannel) -> CResult<PacketChannel> {
        let (packet, mut seq_num) = channel.read_packet()?;
        check_error_packet(&packet, "Initial handshake error.")?;
        let handshake = HandshakePacket::parse(&packet)?;

        if handshake.protocol_version != 10u8 {
            return Err(ReError::ConnectionError(format!(
                "Unsupported protocol version {}",
                handshake.protocol_version
            )));
        }
        if handshake.server_capabilities & CLIENT_PROTOCOL_41 == 0 {
            return Err(ReError::ConnectionError(
                "Server does not speak protocol 4.1".to_string(),
            ));
        }

        if let Some(tls) = self.options.tls.clone() {
            if handshake.server_capabilities & CLIENT_SSL == 0 {
                return Err(ReError::ConnectionError(
                    "The server doesn't support SSL encryption".to_string(),
                ));
            }
            let ssl_command = SslRequestCommand::new(UTF8_MB4_GENERAL_CI);
            seq_num += 1;
            channel.write_packet(&ssl_command.serialize(), seq_num)?;
            channel = channel.upgrade_to_ssl(&self.options.hostname.clone(), &tls)?;
        }

        let auth_plugin = Connection::get_auth_plugin(&handshake.auth_plugin_name)?;
        let auth_command = AuthenticateCommand::new(
            &self.options,
            &handshake,
            auth_plugin,
            UTF8_MB4_GENERAL_CI,
        );
        seq_num += 1;
        channel.write_packet(&auth_command.serialize(), seq_num)?;

        let (packet, seq_num) = channel.read_packet()?;
        check_error_packet(&packet, "Authentication error.")?;
        match packet.first().copied().ok_or_else(ReError::incomplete)? {
            response_type::OK => Ok(channel),
            response_type::AUTH_PLUGIN_SWITCH => {
                let switch_packet = AuthPluginSwitchPacket::parse(&packet[1..])?;
                self.handle_auth_plugin_switch(&mut channel, switch_packet, seq_num + 1)?;
                Ok(channel)
            }
            _ => {
                Connection::authenticate_sha_256(
                    &mut channel,
                    &packet,
                    &handshake.scramble,
                    &self.options.password,
                    seq_num + 1,
                )?;
                Ok(channel)
            }
        }
    }

    fn handle_auth_plugin_switch(
        &self,
        channel: &mut PacketChannel,
        switch_packet: AuthPluginSwitchPacket,
        seq_num: u8,
    ) -> CResult<()> {
        let auth_plugin = Connection::get_auth_plugin(&switch_packet.auth_plugin_name)?;
        let command = AuthPluginSwitchCommand::new(
            &self.options.password,
            &switch_packet.auth_plugin_data,
            auth_plugin,
        );
        channel.write_packet(&command.serialize(), seq_num)?;

        let (packet, seq_num) = channel.read_packet()?;
        check_error_packet(&packet, "Authentication switch error.")?;

        if auth_plugin == AuthPlugin::CachingSha2Password {
            Connection::authenticate_sha_256(
                channel,
                &packet,
                &switch_packet.auth_plugin_data,
                &self.options.password,
                seq_num + 1,
            )?;
        }
        Ok(())
    }

    /// caching_sha2_password slow path.
    /// See https://mariadb.com/kb/en/caching_sha2_password-authentication-plugin/
    fn authenticate_sha_256(
        channel: &mut PacketChannel,
        packet: &[u8],
        scramble: &[u8],
        password: &str,
        seq_num: u8,
    ) -> CResult<()> {
        // fast path already succeeded
        if packet.len() >= 2 && packet[0] == 0x01 && packet[1] == 0x03 {
            let (packet, _) = channel.read_packet()?;
            check_error_packet(&packet, "Authentication error.")?;
            return Ok(());
        }

        let mut password = password.as_bytes().to_vec();
        password.push(NULL_TERMINATOR);

        // over TLS the clear password is fine
        if channel.is_ssl() {
            channel.write_packet(&password, seq_num)?;
            let (packet, _) = channel.read_packet()?;
            check_error_packet(&packet, "Sending clear password error.")?;
            return Ok(());
        }

        // request the server RSA public key
        channel.write_packet(&[0x02], seq_num)?;
        let (packet, seq_num) = channel.read_packet()?;
        check_error_packet(&packet, "Requesting caching_sha2_password public key.")?;

        let public_key = packet.get(1..).ok_or_else(ReError::incomplete)?;
        let encrypted_password = xor(&password, scramble);

        let rsa = Rsa::public_key_from_pem(public_key)
            .map_err(|e| ReError::Unauthorized(format!("cannot load server public key: {e}")))?;
        let mut encrypted_body = vec![0u8; rsa.size() as usize];
        rsa.public_encrypt(&encrypted_password, &mut encrypted_body, Padding::PKCS1_OAEP)
            .map_err(|e| ReError::Unauthorized(format!("rsa encrypt failed: {e}")))?;

        channel.write_packet(&encrypted_body, seq_num + 1)?;

        let (packet, _) = channel.read_packet()?;
        check_error_packet(&packet, "Authentication error.")?;
        Ok(())
    }

    fn get_auth_plugin(auth_plugin_name: &str) -> CResult<AuthPlugin> {
        match auth_plugin_name {
            auth_plugin_names::MYSQL_NATIVE_PASSWORD => Ok(AuthPlugin::MySqlNativePassword),
            auth_plugin_names::CACHING_SHA2_PASSWORD => Ok(AuthPlugin::CachingSha2Password),
            other => Err(ReError::Unauthorized(format!(
                "{} auth plugin is not supported",
                other
            ))),
        }
    }
}
