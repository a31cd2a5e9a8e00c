use sha1::{Digest, Sha1};
use sha2::Sha256;

pub mod auth_plugin_switch_command;
pub mod authenticate_command;
pub mod dump_binlog_command;
pub mod dump_binlog_gtid_command;
pub mod query_command;
pub mod register_replica_command;
pub mod ssl_request_command;

pub const COM_QUERY: u8 = 0x03;
pub const COM_REGISTER_SLAVE: u8 = 0x15;
pub const COM_BINLOG_DUMP: u8 = 0x12;
pub const COM_BINLOG_DUMP_GTID: u8 = 0x1e;

pub fn xor(left: &[u8], right: &[u8]) -> Vec<u8> {
    left.iter()
        .enumerate()
        .map(|(i, b)| b ^ right[i % right.len()])
        .collect()
}

/// `mysql_native_password`:
/// `SHA1(password) XOR SHA1(seed + SHA1(SHA1(password)))`
pub fn scramble_native(password: &str, seed: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return vec![];
    }
    let hash1 = Sha1::digest(password.as_bytes());
    let hash2 = Sha1::digest(hash1);

    let mut salted = Sha1::new();
    salted.update(seed);
    salted.update(hash2);
    xor(&hash1, &salted.finalize())
}

/// `caching_sha2_password` fast path:
/// `SHA256(password) XOR SHA256(SHA256(SHA256(password)) + seed)`
pub fn scramble_sha256(password: &str, seed: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return vec![];
    }
    let hash1 = Sha256::digest(password.as_bytes());
    let hash2 = Sha256::digest(hash1);

    let mut salted = Sha256::new();
    salted.update(hash2);
    salted.update(seed);
    xor(&hash1, &salted.finalize())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scramble_widths() {
        let seed = b"abcdefghijklmnopqrst";
        assert_eq!(scramble_native("secret", seed).len(), 20);
        assert_eq!(scramble_sha256("secret", seed).len(), 32);
        assert!(scramble_native("", seed).is_empty());
        assert!(scramble_sha256("", seed).is_empty());
    }

    #[test]
    fn xor_cycles_right_operand() {
        assert_eq!(xor(&[0xff, 0x0f, 0xf0], &[0x0f]), vec![0xf0, 0x00, 0xff]);
    }
}
