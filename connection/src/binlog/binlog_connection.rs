use tracing::{debug, info, warn};

use common::config::Flavor;
use common::err::CResult;

use binlog::decoder::event_decoder::{EventDecoder, RowsFilter};
use binlog::events::checksum_type::ChecksumType;
use binlog::column::value_decoder::DecodeOptions;

use crate::binlog::binlog_events::BinlogEvents;
use crate::binlog::DumpRequest;
use crate::commands::dump_binlog_command::DumpBinlogCommand;
use crate::commands::dump_binlog_gtid_command::DumpBinlogGtidCommand;
use crate::commands::register_replica_command::RegisterReplicaCommand;
use crate::conn::connection::Connection;
use crate::conn::connection_options::ConnectionOptions;

/// Sets a replication session up: checksum and heartbeat negotiation,
/// semi-sync, replica registration, then the dump command. Consumed by
/// `start_dump`, which hands the socket to the event stream.
#[derive(Debug)]
pub struct BinlogConnection {
    conn: Connection,
}

impl BinlogConnection {
    pub fn new(options: &ConnectionOptions) -> Self {
        Self {
            conn: Connection::new(options.clone()),
        }
    }

    /// Register as a replica and start pulling events from `request`.
    pub fn start_dump(
        mut self,
        request: &DumpRequest,
        decode_opts: DecodeOptions,
        rows_filter: Option<Box<RowsFilter>>,
    ) -> CResult<BinlogEvents> {
        self.conn.try_connect()?;

        let options = self.conn.options.clone();

        let checksum = self.negotiate_checksum()?;
        self.negotiate_heartbeat()?;
        let semi_sync = self.negotiate_semi_sync()?;

        if options.flavor == Flavor::MariaDB {
            self.conn.query("SET @mariadb_slave_capability = 4")?;
        }

        self.register_replica(&options)?;
        let start_file = self.send_dump_command(request, &options)?;

        let mut decoder = EventDecoder::new(options.flavor, decode_opts);
        decoder.set_checksum(checksum);
        if let Some(filter) = rows_filter {
            decoder.set_rows_filter(filter);
        }

        info!(
            flavor = %options.flavor,
            server_id = options.server_id,
            semi_sync,
            "binlog dump started"
        );

        Ok(BinlogEvents::new(
            self.conn.into_channel()?,
            decoder,
            semi_sync,
            start_file,
        ))
    }

    /// Announce we understand whatever checksum the server writes, and
    /// learn which one that is.
    fn negotiate_checksum(&mut self) -> CResult<ChecksumType> {
        self.conn
            .query("SET @master_binlog_checksum = @@global.binlog_checksum")?;
        let rows = self.conn.query("SELECT @@global.binlog_checksum")?;
        let name = rows
            .first()
            .map(|row| row.get_str(0).to_string())
            .unwrap_or_default();
        let checksum = ChecksumType::from_name(&name);
        debug!(?checksum, "binlog checksum negotiated");
        Ok(checksum)
    }

    fn negotiate_heartbeat(&mut self) -> CResult<()> {
        let period = self.conn.options.heartbeat_period;
        if period.is_zero() {
            return Ok(());
        }
        self.conn.query(&format!(
            "SET @master_heartbeat_period = {}",
            period.as_nanos()
        ))?;
        Ok(())
    }

    /// Semi-sync only engages when the primary has the plugin enabled.
    fn negotiate_semi_sync(&mut self) -> CResult<bool> {
        if !self.conn.options.semi_sync {
            return Ok(false);
        }
        let enabled = self
            .conn
            .query_variable("SHOW VARIABLES LIKE 'rpl_semi_sync_master_enabled'")?;
        if !enabled.eq_ignore_ascii_case("ON") {
            warn!("semi-sync requested but the primary has it disabled");
            return Ok(false);
        }
        self.conn.query("SET @rpl_semi_sync_slave = 1")?;
        Ok(true)
    }

    fn register_replica(&mut self, options: &ConnectionOptions) -> CResult<()> {
        let command = RegisterReplicaCommand::new(
            options.server_id,
            String::new(), // report_host is left for the server to fill
            options.port,
        );
        self.conn.write_command(&command.serialize())?;
        self.conn.read_packet_with_check("Register replica error.")?;
        Ok(())
    }

    /// Send the dump command; returns the file name the stream starts in
    /// (empty for GTID dumps until the fake rotate announces it).
    fn send_dump_command(
        &mut self,
        request: &DumpRequest,
        options: &ConnectionOptions,
    ) -> CResult<String> {
        match request {
            DumpRequest::Position { file, position } => {
                let command =
                    DumpBinlogCommand::new(options.server_id, file.clone(), *position);
                self.conn.write_command(&command.serialize())?;
                Ok(file.clone())
            }
            DumpRequest::Gtid(gtid_set) => {
                let command = DumpBinlogGtidCommand::new(options.server_id);
                self.conn.write_command(&command.serialize(gtid_set)?)?;
                Ok(String::new())
            }
            DumpRequest::MariadbGtid(gtid_set) => {
                self.conn.query(&format!(
                    "SET @slave_connect_state = '{}'",
                    gtid_set
                ))?;
                self.conn.query("SET @slave_gtid_strict_mode = 0")?;
                let command =
                    DumpBinlogCommand::new(options.server_id, String::new(), 4);
                self.conn.write_command(&command.serialize())?;
                Ok(String::new())
            }
        }
    }
}
