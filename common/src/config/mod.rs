use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::err::replica_error::ReError;

/// Server dialect. Affects GTID encoding and a handful of event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    MySQL,
    MariaDB,
}

impl Default for Flavor {
    fn default() -> Self {
        Flavor::MySQL
    }
}

impl Display for Flavor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Flavor::MySQL => write!(f, "mysql"),
            Flavor::MariaDB => write!(f, "mariadb"),
        }
    }
}

/// Replication client configuration.
///
/// `addr` is either `host:port` or a unix socket path. `server_id` must be
/// unique among all replicas attached to the same primary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicaConfig {
    pub addr: String,
    pub user: String,
    pub password: String,
    pub charset: String,
    pub flavor: Flavor,

    pub server_id: u32,

    /// Heartbeat period sent to the server, millis. 0 disables heartbeats.
    pub heartbeat_period_ms: u64,
    /// Read timeout on the replication socket, millis. 0 means no timeout.
    pub read_timeout_ms: u64,

    /// Return `BigDecimal` values instead of canonical decimal strings.
    pub use_decimal: bool,
    /// Return structured time values instead of canonical strings.
    pub parse_time: bool,
    /// Emit the sentinel string "null" for corrupt binary JSON instead of a
    /// decode error. Pre-5.7.22 servers wrote malformed JSON for some
    /// partial updates; the sentinel is not a correct value.
    pub ignore_json_decode_err: bool,

    pub semi_sync_enabled: bool,
    pub max_reconnect_attempts: usize,
    pub disable_retry_sync: bool,

    /// Regular expressions matched against `schema.table`.
    pub include_table_regex: Vec<String>,
    pub exclude_table_regex: Vec<String>,

    /// Demote missing-schema errors to warnings and drop the row event,
    /// negative-caching the miss for `unknown_table_retry_period_ms`.
    pub discard_no_meta_row_event: bool,
    pub unknown_table_retry_period_ms: u64,

    pub tls: Option<TlsConfig>,

    pub dump: DumpConfig,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        ReplicaConfig {
            addr: "127.0.0.1:3306".to_string(),
            user: "root".to_string(),
            password: "".to_string(),
            charset: "utf8mb4".to_string(),
            flavor: Flavor::MySQL,
            server_id: 0,
            heartbeat_period_ms: 60_000,
            read_timeout_ms: 90_000,
            use_decimal: false,
            parse_time: false,
            ignore_json_decode_err: false,
            semi_sync_enabled: false,
            max_reconnect_attempts: 5,
            disable_retry_sync: false,
            include_table_regex: vec![],
            exclude_table_regex: vec![],
            discard_no_meta_row_event: false,
            unknown_table_retry_period_ms: 10_000,
            tls: None,
            dump: DumpConfig::default(),
        }
    }
}

impl ReplicaConfig {
    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_millis(self.heartbeat_period_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        if self.read_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.read_timeout_ms))
        }
    }

    pub fn unknown_table_retry_period(&self) -> Duration {
        Duration::from_millis(self.unknown_table_retry_period_ms)
    }

    /// Splits `addr` into (host, port). A path containing '/' is a unix
    /// socket and keeps the default port.
    pub fn host_port(&self) -> Result<(String, u16), ReError> {
        if self.addr.contains('/') {
            return Ok((self.addr.clone(), 0));
        }
        match self.addr.rsplit_once(':') {
            Some((host, port)) => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| ReError::ConfigError(format!("invalid port in addr {}", self.addr)))?;
                Ok((host.to_string(), port))
            }
            None => Err(ReError::ConfigError(format!(
                "invalid MySQL address format {}, must host:port",
                self.addr
            ))),
        }
    }
}

/// TLS material for both the admin connection and the replication stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub root_cert_path: Option<String>,
    pub skip_domain_validation: bool,
    pub accept_invalid_certs: bool,
}

/// Optional `mysqldump` bootstrap. Disabled when `execution_path` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    pub execution_path: String,

    pub databases: Vec<String>,
    /// When `tables` is non-empty, `table_db` qualifies them and
    /// `databases` is ignored.
    pub tables: Vec<String>,
    pub table_db: String,

    #[serde(rename = "where")]
    pub where_clause: String,
    pub skip_master_data: bool,
    pub max_allowed_packet_mb: usize,
    pub protocol: String,
    pub extra_options: Vec<String>,
    /// Entries are `db,table` pairs.
    pub ignore_tables: Vec<String>,
    pub discard_err: bool,
}

impl Default for DumpConfig {
    fn default() -> Self {
        DumpConfig {
            execution_path: "".to_string(),
            databases: vec![],
            tables: vec![],
            table_db: "".to_string(),
            where_clause: "".to_string(),
            skip_master_data: false,
            max_allowed_packet_mb: 0,
            protocol: "".to_string(),
            extra_options: vec![],
            ignore_tables: vec![],
            discard_err: true,
        }
    }
}

impl DumpConfig {
    pub fn enabled(&self) -> bool {
        !self.execution_path.is_empty()
    }
}

/// Load a `ReplicaConfig` from a TOML file.
pub fn read_config<P: AsRef<Path>>(path: P) -> Result<ReplicaConfig, ReError> {
    let mut file = File::open(path.as_ref())?;
    let mut s = String::new();
    file.read_to_string(&mut s)?;

    toml::from_str(s.as_str()).map_err(|e| ReError::ConfigError(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn host_port_split() {
        let mut c = ReplicaConfig::default();
        assert_eq!(c.host_port().unwrap(), ("127.0.0.1".to_string(), 3306));

        c.addr = "/var/run/mysqld/mysqld.sock".to_string();
        assert_eq!(c.host_port().unwrap().1, 0);

        c.addr = "db.internal".to_string();
        assert!(c.host_port().is_err());
    }

    #[test]
    fn parse_toml() {
        let raw = r#"
            addr = "10.0.0.5:3307"
            user = "repl"
            password = "secret"
            flavor = "mariadb"
            server_id = 1001
            include_table_regex = ["shop\\..*"]

            [dump]
            execution_path = "/usr/bin/mysqldump"
            databases = ["shop"]
        "#;
        let c: ReplicaConfig = toml::from_str(raw).unwrap();
        assert_eq!(c.flavor, Flavor::MariaDB);
        assert_eq!(c.server_id, 1001);
        assert!(c.dump.enabled());
        assert_eq!(c.unknown_table_retry_period_ms, 10_000);
    }
}
