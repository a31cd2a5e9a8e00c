use crate::commands::COM_REGISTER_SLAVE;

/// COM_REGISTER_SLAVE: announce this client in `SHOW SLAVE HOSTS` before
/// asking for the dump.
///
/// ref: https://dev.mysql.com/doc/internals/en/com-register-slave.html
#[derive(Debug)]
pub struct RegisterReplicaCommand {
    server_id: u32,
    hostname: String,
    port: u16,
}

impl RegisterReplicaCommand {
    pub fn new(server_id: u32, hostname: String, port: u16) -> Self {
        RegisterReplicaCommand {
            server_id,
            hostname,
            port,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(32 + self.hostname.len());
        packet.push(COM_REGISTER_SLAVE);
        packet.extend_from_slice(&self.server_id.to_le_bytes());

        packet.push(self.hostname.len() as u8);
        packet.extend_from_slice(self.hostname.as_bytes());
        // user and password are left for the server to take from the session
        packet.push(0);
        packet.push(0);

        packet.extend_from_slice(&self.port.to_le_bytes());
        packet.extend_from_slice(&0u32.to_le_bytes()); // replication rank, unused
        packet.extend_from_slice(&0u32.to_le_bytes()); // master id, unused

        packet
    }
}

#[cfg(test)]
mod test {
    use super::RegisterReplicaCommand;

    #[test]
    fn serialize_shape() {
        let p = RegisterReplicaCommand::new(1001, "replica-host".to_string(), 3306).serialize();
        assert_eq!(p[0], 0x15);
        assert_eq!(u32::from_le_bytes([p[1], p[2], p[3], p[4]]), 1001);
        assert_eq!(p[5] as usize, "replica-host".len());
    }
}
