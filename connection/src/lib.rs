use std::time::Duration;

pub mod binlog;
pub mod commands;
pub mod conn;
pub mod declar;
pub mod packet;

pub const PACKET_HEADER_SIZE: usize = 4;
pub const NULL_TERMINATOR: u8 = 0;

/// utf8mb4_general_ci, the collation every session is opened with
pub const UTF8_MB4_GENERAL_CI: u8 = 45;

/// Extra slack on top of the heartbeat period before a read times out.
pub const TIMEOUT_LATENCY_DELTA: Duration = Duration::from_secs(1);

/// TCP connect timeout for every outbound connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
