use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use common::config::{DumpConfig, Flavor, ReplicaConfig};
use common::err::replica_error::ReError;
use common::err::CResult;

use crate::master::Position;

lazy_static! {
    static ref MASTER_POS_RE: Regex = Regex::new(
        r"CHANGE MASTER TO MASTER_LOG_FILE='([^']+)', MASTER_LOG_POS=(\d+)"
    )
    .unwrap();
    static ref GTID_PURGED_RE: Regex =
        Regex::new(r#"SET @@GLOBAL\.[Gg][Tt][Ii][Dd]_[Pp][Uu][Rr][Gg][Ee][Dd]\s*=\s*'([^']*)'"#)
            .unwrap();
}

/// What the dump header yielded: the coordinates syncing continues from.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DumpOutcome {
    pub position: Option<Position>,
    pub gtid_purged: Option<String>,
}

/// Thin wrapper around an external `mysqldump` binary. Only the binlog
/// coordinates in the dump header matter here; the data itself streams to
/// the consumer the caller wires up (or the void).
#[derive(Debug)]
pub struct Dumper {
    execution_path: String,
    addr: String,
    user: String,
    password: String,
    charset: String,
    flavor: Flavor,
    config: DumpConfig,
}

impl Dumper {
    /// `None` when no dump binary is configured.
    pub fn from_config(config: &ReplicaConfig) -> Option<Dumper> {
        if !config.dump.enabled() {
            return None;
        }
        Some(Dumper {
            execution_path: config.dump.execution_path.clone(),
            addr: config.addr.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            charset: config.charset.clone(),
            flavor: config.flavor,
            config: config.dump.clone(),
        })
    }

    fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some((host, port)) = self.addr.rsplit_once(':') {
            args.push(format!("--host={}", host));
            args.push(format!("--port={}", port));
        } else {
            args.push(format!("--socket={}", self.addr));
        }
        args.push(format!("--user={}", self.user));
        args.push(format!("--password={}", self.password));
        if !self.charset.is_empty() {
            args.push(format!("--default-character-set={}", self.charset));
        }
        if !self.config.skip_master_data {
            args.push("--master-data=2".to_string());
        }
        if self.config.max_allowed_packet_mb > 0 {
            args.push(format!(
                "--max-allowed-packet={}M",
                self.config.max_allowed_packet_mb
            ));
        }
        if !self.config.protocol.is_empty() {
            args.push(format!("--protocol={}", self.config.protocol));
        }
        args.push("--single-transaction".to_string());
        args.push("--hex-blob".to_string());

        if !self.config.where_clause.is_empty() {
            args.push(format!("--where={}", self.config.where_clause));
        }
        for ignore in &self.config.ignore_tables {
            if let Some((db, table)) = ignore.split_once(',') {
                args.push(format!("--ignore-table={}.{}", db, table));
            }
        }
        args.extend(self.config.extra_options.iter().cloned());

        if !self.config.tables.is_empty() {
            args.push(self.config.table_db.clone());
            args.extend(self.config.tables.iter().cloned());
        } else if !self.config.databases.is_empty() {
            args.push("--databases".to_string());
            args.extend(self.config.databases.iter().cloned());
        } else {
            args.push("--all-databases".to_string());
        }

        args
    }

    /// Run the dump to completion, scanning its output for the
    /// `CHANGE MASTER TO` / `gtid_purged` header lines.
    pub fn run(&self) -> CResult<DumpOutcome> {
        let args = self.build_args();
        info!(path = self.execution_path.as_str(), "starting mysqldump");
        debug!(?args, "mysqldump arguments");

        let mut child = Command::new(&self.execution_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(if self.config.discard_err {
                Stdio::null()
            } else {
                Stdio::inherit()
            })
            .spawn()
            .map_err(|e| {
                ReError::ConfigError(format!(
                    "cannot start {}: {}",
                    self.execution_path, e
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReError::Error("mysqldump stdout unavailable".to_string()))?;

        let mut outcome = DumpOutcome::default();
        for line in BufReader::new(stdout).lines() {
            let line = line?;
            parse_header_line(&line, &mut outcome);
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(ReError::Error(format!(
                "mysqldump exited with {}",
                status
            )));
        }

        if self.flavor == Flavor::MariaDB && outcome.gtid_purged.is_none() {
            debug!("mariadb dump carried no gtid state, position only");
        }

        info!(position = ?outcome.position, "mysqldump finished");
        Ok(outcome)
    }
}

/// Position and gtid lines appear once near the top of the dump.
pub fn parse_header_line(line: &str, outcome: &mut DumpOutcome) {
    if outcome.position.is_none() {
        if let Some(caps) = MASTER_POS_RE.captures(line) {
            let pos = caps[2].parse().unwrap_or(0);
            outcome.position = Some(Position::new(caps[1].to_string(), pos));
        }
    }
    if outcome.gtid_purged.is_none() {
        if let Some(caps) = GTID_PURGED_RE.captures(line) {
            outcome.gtid_purged = Some(caps[1].replace(['\n', ' '], ""));
        }
    }
}
