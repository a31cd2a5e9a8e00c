use std::fmt;
use std::io;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use common::config::{Flavor, ReplicaConfig, TlsConfig};
use common::err::CResult;

/// A custom socket factory, e.g. to dial through a proxy or bind a source
/// interface. Falls back to a plain `TcpStream::connect_timeout`.
#[derive(Clone)]
pub struct Dialer(pub Arc<dyn Fn(&str, u16) -> io::Result<TcpStream> + Send + Sync>);

impl fmt::Debug for Dialer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dialer(..)")
    }
}

/// Transport and session knobs for one MySQL connection (admin or
/// replication stream).
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,

    pub flavor: Flavor,
    pub server_id: u32,

    /// 0 disables the server-side heartbeat
    pub heartbeat_period: Duration,
    pub read_timeout: Option<Duration>,
    pub semi_sync: bool,

    pub tls: Option<TlsConfig>,
    pub dialer: Option<Dialer>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        ConnectionOptions {
            hostname: "127.0.0.1".to_string(),
            port: 3306,
            username: "root".to_string(),
            password: "".to_string(),
            flavor: Flavor::MySQL,
            server_id: 0,
            heartbeat_period: Duration::from_secs(60),
            read_timeout: Some(Duration::from_secs(90)),
            semi_sync: false,
            tls: None,
            dialer: None,
        }
    }
}

impl ConnectionOptions {
    pub fn from_config(config: &ReplicaConfig) -> CResult<Self> {
        let (hostname, port) = config.host_port()?;
        Ok(ConnectionOptions {
            hostname,
            port,
            username: config.user.clone(),
            password: config.password.clone(),
            flavor: config.flavor,
            server_id: config.server_id,
            heartbeat_period: config.heartbeat_period(),
            read_timeout: config.read_timeout(),
            semi_sync: config.semi_sync_enabled,
            tls: config.tls.clone(),
            dialer: None,
        })
    }

    pub fn update_auth(&mut self, username: String, password: String) {
        self.username = username;
        self.password = password;
    }
}
