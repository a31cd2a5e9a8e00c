use crate::declar::capability_flags;

/// Short handshake response announcing CLIENT_SSL; the TLS handshake
/// follows immediately after it.
#[derive(Debug)]
pub struct SslRequestCommand {
    collation: u8,
}

impl SslRequestCommand {
    pub fn new(collation: u8) -> Self {
        SslRequestCommand { collation }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(32);
        let flags = capability_flags::client_flags() | capability_flags::CLIENT_SSL;
        packet.extend_from_slice(&flags.to_le_bytes());
        packet.extend_from_slice(&0u32.to_le_bytes());
        packet.push(self.collation);
        packet.extend_from_slice(&[0u8; 23]);
        packet
    }
}
