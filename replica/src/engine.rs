use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};

use common::config::{Flavor, ReplicaConfig};
use common::err::replica_error::ReError;
use common::err::CResult;

use binlog::column::value_decoder::DecodeOptions;
use binlog::events::event::Event;
use binlog::events::event_header::Header;
use binlog::gtid::GtidSet;

use connection::binlog::binlog_connection::BinlogConnection;
use connection::binlog::DumpRequest;
use connection::conn::connection_options::{ConnectionOptions, Dialer};

use crate::dump::Dumper;
use crate::filter::TableFilter;
use crate::handler::{EventHandler, Gtid};
use crate::master::{MasterInfo, Position};
use crate::schema::{AdminConnection, SchemaCache, TableSchema};

lazy_static! {
    /// Just enough DDL recognition to keep the schema cache honest; the
    /// statement itself is passed through raw.
    static ref DDL_TABLE_RE: Regex = Regex::new(
        r"(?i)^\s*(?:alter|create|drop|truncate|rename)\s+table\s+(?:if\s+(?:not\s+)?exists\s+)?`?([A-Za-z0-9_$]+)`?(?:\.`?([A-Za-z0-9_$]+)`?)?"
    )
    .unwrap();
}

/// Engine lifecycle, one way only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaState {
    Created,
    Dumping,
    Syncing,
    Stopping,
    Closed,
}

/// The replication engine: orchestrates the optional dump bootstrap, then
/// pumps the binlog stream, dispatching to the handler and advancing the
/// position tracker.
///
/// `run()` blocks the calling thread; `close()` may be called from any
/// other thread and is idempotent. The pump notices the stop flag at the
/// next event boundary (heartbeats bound the wait).
pub struct BinlogReplica {
    config: ReplicaConfig,
    master: MasterInfo,
    admin: AdminConnection,
    cache: SchemaCache,
    filter: Option<Arc<TableFilter>>,
    handler: Mutex<Box<dyn EventHandler>>,

    state: Mutex<ReplicaState>,
    running: AtomicBool,
    dumped: AtomicBool,
    /// estimated replication delay, seconds
    delay: AtomicU32,
    dialer: Mutex<Option<Dialer>>,
}

impl BinlogReplica {
    pub fn new(config: ReplicaConfig, handler: Box<dyn EventHandler>) -> CResult<Self> {
        if config.server_id == 0 {
            return Err(ReError::ConfigError(
                "server_id is required and must be nonzero".to_string(),
            ));
        }

        let filter = TableFilter::from_config(&config)?.map(Arc::new);
        let admin = AdminConnection::new(ConnectionOptions::from_config(&config)?);

        Ok(BinlogReplica {
            cache: SchemaCache::new(&config),
            admin,
            filter,
            master: MasterInfo::new(),
            handler: Mutex::new(handler),
            state: Mutex::new(ReplicaState::Created),
            running: AtomicBool::new(false),
            dumped: AtomicBool::new(false),
            delay: AtomicU32::new(0),
            dialer: Mutex::new(None),
            config,
        })
    }

    /// Route all outbound sockets through a custom factory (proxying,
    /// source binding). Call before `run()`.
    pub fn set_dialer(&self, dialer: Dialer) {
        self.admin.set_dialer(dialer.clone());
        *self.dialer.lock().unwrap() = Some(dialer);
    }

    pub fn state(&self) -> ReplicaState {
        *self.state.lock().unwrap()
    }

    /// Estimated replication delay in seconds.
    pub fn delay(&self) -> u32 {
        self.delay.load(Ordering::Relaxed)
    }

    pub fn synced_position(&self) -> Position {
        self.master.position()
    }

    pub fn synced_gtid_set(&self) -> Option<GtidSet> {
        self.master.gtid_set()
    }

    pub fn synced_timestamp(&self) -> u32 {
        self.master.timestamp()
    }

    /// Column metadata for handlers wanting schema context. Honors the
    /// table filter and the negative cache.
    pub fn get_table(&self, db: &str, table: &str) -> CResult<Arc<TableSchema>> {
        self.cache
            .get_table(&self.admin, self.filter.as_deref(), db, table)
    }

    pub fn clear_table_cache(&self, db: &str, table: &str) {
        self.cache.clear_table(db, table);
    }

    pub fn set_table_cache(&self, db: &str, table: &str, schema: Arc<TableSchema>) {
        self.cache.set_table(db, table, schema);
    }

    /// Dump (when configured and no prior position is set), then stream
    /// until an error or `close()`.
    pub fn run(&self) -> CResult<()> {
        self.running.store(true, Ordering::SeqCst);
        self.master.update_timestamp(now_unix());

        let result = self.run_inner();
        self.set_state(ReplicaState::Closed);
        match &result {
            Err(e) if !matches!(e, ReError::StreamClosed) => {
                error!(error = %e, "replica terminated");
            }
            _ => info!("replica closed cleanly"),
        }
        result
    }

    /// Skip the dump and stream from an explicit position.
    pub fn run_from(&self, position: Position) -> CResult<()> {
        self.master.update(position);
        self.dumped.store(true, Ordering::SeqCst);
        self.run()
    }

    /// Skip the dump and stream from an executed GTID set.
    pub fn start_from_gtid(&self, gtid_set: GtidSet) -> CResult<()> {
        self.master.update_gtid_set(gtid_set);
        self.dumped.store(true, Ordering::SeqCst);
        self.run()
    }

    /// Stop the pump and release the admin connection. Safe to call more
    /// than once and from any thread.
    pub fn close(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("closing replica");
        self.set_state(ReplicaState::Stopping);
        self.admin.close();

        let pos = self.master.position();
        let gtid = self.master.gtid_set();
        if let Err(e) = self
            .handler
            .lock()
            .unwrap()
            .on_pos_synced(&pos, gtid.as_ref(), true)
        {
            warn!(error = %e, "final on_pos_synced failed");
        }
    }

    fn run_inner(&self) -> CResult<()> {
        self.check_binlog_row_format()?;

        if !self.dumped.swap(true, Ordering::SeqCst) {
            self.set_state(ReplicaState::Dumping);
            self.try_dump()?;
        }

        if !self.is_running() {
            return Ok(());
        }

        self.set_state(ReplicaState::Syncing);
        self.run_sync_binlog()
    }

    fn set_state(&self, state: ReplicaState) {
        *self.state.lock().unwrap() = state;
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn check_binlog_row_format(&self) -> CResult<()> {
        let rows = self
            .admin
            .execute("SHOW GLOBAL VARIABLES LIKE 'binlog_format'")?;
        let format = rows
            .first()
            .map(|r| r.get_str(1).to_string())
            .unwrap_or_default();
        if !format.eq_ignore_ascii_case("ROW") {
            return Err(ReError::BinlogFormatMismatch(format));
        }
        Ok(())
    }

    /// Bootstrap coordinates from `mysqldump` output when configured and
    /// no prior position or GTID set exists.
    fn try_dump(&self) -> CResult<()> {
        let has_state = !self.master.position().name.is_empty()
            || self.master.gtid_set().map(|g| !g.is_empty()).unwrap_or(false);
        if has_state {
            return Ok(());
        }

        let dumper = match Dumper::from_config(&self.config) {
            Some(d) => d,
            None => return Ok(()),
        };

        let outcome = dumper.run()?;
        if let Some(gtid_text) = outcome.gtid_purged {
            let set = GtidSet::parse(self.config.flavor, &gtid_text)?;
            self.master.update_gtid_set(set);
        }
        if let Some(position) = outcome.position {
            self.master.update(position);
        }
        Ok(())
    }

    /// The reconnection state machine around the pump.
    fn run_sync_binlog(&self) -> CResult<()> {
        let mut attempts = 0usize;

        loop {
            match self.sync_once() {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if !self.is_running() {
                        return Ok(());
                    }
                    let retriable = e.is_transport() && !self.config.disable_retry_sync;
                    if !retriable || attempts >= self.config.max_reconnect_attempts {
                        return Err(e);
                    }
                    attempts += 1;
                    let backoff = Duration::from_secs(1 << attempts.min(6));
                    warn!(
                        error = %e,
                        attempt = attempts,
                        backoff_secs = backoff.as_secs(),
                        "binlog stream dropped, reconnecting"
                    );
                    thread::sleep(backoff);
                }
            }
        }
    }

    fn dump_request(&self) -> DumpRequest {
        match self.master.gtid_set() {
            Some(GtidSet::MySQL(set)) if !set.is_empty() => DumpRequest::Gtid(set),
            Some(GtidSet::MariaDB(set)) if !set.is_empty() => DumpRequest::MariadbGtid(set),
            _ => {
                let pos = self.master.position();
                DumpRequest::Position {
                    file: pos.name,
                    position: pos.pos.max(4),
                }
            }
        }
    }

    /// One connected pump session; returns Ok on clean shutdown, the
    /// terminal error otherwise.
    fn sync_once(&self) -> CResult<()> {
        let mut options = ConnectionOptions::from_config(&self.config)?;
        options.dialer = self.dialer.lock().unwrap().clone();
        let request = self.dump_request();
        info!(request = ?request, "starting sync");

        let decode_opts = DecodeOptions {
            use_decimal: self.config.use_decimal,
            parse_time: self.config.parse_time,
            ignore_json_decode_err: self.config.ignore_json_decode_err,
        };

        let rows_filter = self.filter.clone().map(|f| {
            Box::new(move |schema: &str, table: &str| {
                f.matches(&format!("{}.{}", schema, table))
            }) as Box<dyn Fn(&str, &str) -> bool + Send + Sync>
        });

        let mut events =
            BinlogConnection::new(&options).start_dump(&request, decode_opts, rows_filter)?;

        // gtid of the transaction currently being applied; merged into the
        // tracked set at commit
        let mut pending_gtid: Option<Gtid> = None;

        while let Some(item) = events.next() {
            if !self.is_running() {
                events.shutdown();
                return Ok(());
            }

            let (header, event) = item?;
            self.update_delay(&header);

            if let Err(e) = self.dispatch(&header, event, &events.current_file().to_string(), &mut pending_gtid) {
                events.shutdown();
                return Err(e);
            }
        }

        // EOF from a non-blocking dump or a closed socket
        Err(ReError::StreamClosed)
    }

    /// Handler failures are terminal whatever their inner kind; tagging
    /// them keeps the reconnect machinery from retrying them.
    fn call_handler<F>(&self, f: F) -> CResult<()>
    where
        F: FnOnce(&mut dyn EventHandler) -> CResult<()>,
    {
        let mut handler = self.handler.lock().unwrap();
        f(handler.as_mut()).map_err(|e| match e {
            ReError::HandlerError(_) => e,
            other => ReError::HandlerError(other.to_string()),
        })
    }

    /// Event-type dispatch, handler invocation and tracker advancement.
    fn dispatch(
        &self,
        header: &Header,
        event: Event,
        current_file: &str,
        pending_gtid: &mut Option<Gtid>,
    ) -> CResult<()> {
        let mut save_pos = false;
        let mut force = false;

        let mut pos = self.master.position();
        pos.pos = header.log_pos;
        if pos.name.is_empty() {
            pos.name = current_file.to_string();
        }

        match event {
            Event::Rotate(e) => {
                pos = Position::new(e.next_binlog.clone(), e.position as u32);
                info!(position = %pos, "rotate binlog");
                save_pos = true;
                force = true;
                self.call_handler(|h| h.on_rotate(&pos))?;
            }

            Event::FormatDescription(_) | Event::TableMap(_) => {
                // decode-side state only; nothing to dispatch
            }

            Event::Rows(e) => {
                if !e.rows_skipped {
                    // honor the schema-cache policy before dispatching
                    match self.get_table(&e.schema, &e.table) {
                        Ok(_) => {
                            self.call_handler(|h| h.on_row(&e))?;
                        }
                        Err(
                            ReError::ExcludedTable(_)
                            | ReError::TableNotExist(_)
                            | ReError::MissingTableMeta(_),
                        ) => {
                            debug!(
                                schema = e.schema.as_str(),
                                table = e.table.as_str(),
                                "row event dropped"
                            );
                        }
                        Err(err) => return Err(err),
                    }
                }
                return Ok(());
            }

            Event::Xid(_) => {
                save_pos = true;
                self.commit_pending_gtid(pending_gtid);
                self.call_handler(|h| h.on_xid(&pos))?;
            }

            Event::Query(e) => {
                if e.is_transaction_control() {
                    let q = e.query.trim_start();
                    if starts_with_ignore_case(q, "COMMIT") {
                        self.commit_pending_gtid(pending_gtid);
                        save_pos = true;
                    } else if starts_with_ignore_case(q, "ROLLBACK") {
                        *pending_gtid = None;
                    }
                } else {
                    // DDL: drop whatever schema knowledge it invalidated
                    save_pos = true;
                    force = true;
                    self.commit_pending_gtid(pending_gtid);
                    self.invalidate_schema(&e.schema, &e.query)?;
                    self.call_handler(|h| h.on_ddl(&pos, &e))?;
                }
            }

            Event::Gtid(e) => {
                let gtid = Gtid::MySQL {
                    sid: e.sid.clone(),
                    gno: e.gno,
                };
                self.call_handler(|h| h.on_gtid(&pos, &gtid))?;
                *pending_gtid = Some(gtid);
            }

            Event::MariadbGtid(e) => {
                let gtid = Gtid::MariaDB(e.to_gtid(header.server_id));
                self.call_handler(|h| h.on_gtid(&pos, &gtid))?;
                *pending_gtid = Some(gtid);
            }

            Event::PreviousGtids(e) => {
                if self.config.flavor == Flavor::MySQL {
                    self.merge_gtid_sets(GtidSet::MySQL(e.gtid_set));
                }
            }

            Event::MariadbGtidList(e) => {
                self.merge_gtid_sets(GtidSet::MariaDB(e.gtid_set));
            }

            Event::Heartbeat => {
                // liveness only; the primary is idle
                self.master.update_timestamp(now_unix());
                return Ok(());
            }

            Event::Ignored(_) | Event::Unknown(_) => return Ok(()),
        }

        if save_pos {
            // artificial events carry no position to persist
            if header.log_pos != 0 || force {
                self.master.update(pos.clone());
            }
            if header.when != 0 {
                self.master.update_timestamp(header.when);
            }
            let gtid = self.master.gtid_set();
            self.call_handler(|h| h.on_pos_synced(&pos, gtid.as_ref(), force))?;
        }

        Ok(())
    }

    /// Fold the transaction's gtid into the durable set at commit time.
    fn commit_pending_gtid(&self, pending: &mut Option<Gtid>) {
        let Some(gtid) = pending.take() else {
            return;
        };
        let mut set = self
            .master
            .gtid_set()
            .unwrap_or_else(|| GtidSet::empty(self.config.flavor));
        match (&mut set, gtid) {
            (GtidSet::MySQL(set), Gtid::MySQL { sid, gno }) => {
                if let Err(e) = set.add_gtid(&sid, gno) {
                    warn!(error = %e, "cannot record gtid");
                }
            }
            (GtidSet::MariaDB(set), Gtid::MariaDB(gtid)) => set.add(gtid),
            _ => {}
        }
        self.master.update_gtid_set(set);
    }

    fn merge_gtid_sets(&self, incoming: GtidSet) {
        match self.master.gtid_set() {
            Some(mut current) => {
                current.union(&incoming);
                self.master.update_gtid_set(current);
            }
            None => self.master.update_gtid_set(incoming),
        }
    }

    /// DDL invalidates cached column metadata. A light pattern match finds
    /// the touched table for a targeted flush; anything unrecognized flushes
    /// the whole cache.
    fn invalidate_schema(&self, default_schema: &str, query: &str) -> CResult<()> {
        match DDL_TABLE_RE.captures(query) {
            Some(caps) => {
                let (db, table) = match caps.get(2) {
                    Some(table) => (caps[1].to_string(), table.as_str().to_string()),
                    None => (default_schema.to_string(), caps[1].to_string()),
                };
                self.cache.clear_table(&db, &table);
                self.call_handler(|h| h.on_table_changed(&db, &table))?;
            }
            None => self.cache.clear_all(),
        }
        Ok(())
    }

    fn update_delay(&self, header: &Header) {
        if header.when == 0 {
            return;
        }
        let delay = now_unix().saturating_sub(header.when);
        self.delay.store(delay, Ordering::Relaxed);
    }
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.get(..prefix.len())
            .map_or(false, |p| p.eq_ignore_ascii_case(prefix))
}

fn now_unix() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::handler::NopEventHandler;
    use binlog::gtid::MysqlGtidSet;

    #[test]
    fn server_id_is_required() {
        let config = ReplicaConfig::default();
        assert!(matches!(
            BinlogReplica::new(config, Box::new(NopEventHandler)),
            Err(ReError::ConfigError(_))
        ));
    }

    #[test]
    fn ddl_table_extraction() {
        let caps = DDL_TABLE_RE.captures("ALTER TABLE shop.orders ADD COLUMN x int").unwrap();
        assert_eq!(&caps[1], "shop");
        assert_eq!(caps.get(2).unwrap().as_str(), "orders");

        let caps = DDL_TABLE_RE
            .captures("create table if not exists `orders` (id int)")
            .unwrap();
        assert_eq!(&caps[1], "orders");
        assert!(caps.get(2).is_none());

        assert!(DDL_TABLE_RE.captures("GRANT ALL ON *.* TO 'x'").is_none());
    }

    #[test]
    fn dump_request_prefers_gtid() {
        let config = ReplicaConfig {
            server_id: 1001,
            ..Default::default()
        };
        let replica = BinlogReplica::new(config, Box::new(NopEventHandler)).unwrap();

        match replica.dump_request() {
            DumpRequest::Position { position, .. } => assert_eq!(position, 4),
            other => panic!("unexpected {:?}", other),
        }

        let set = GtidSet::MySQL(
            MysqlGtidSet::parse("de278ad0-2106-11e4-9f8e-6edd0ca20947:1-3").unwrap(),
        );
        replica.master.update_gtid_set(set);
        assert!(matches!(replica.dump_request(), DumpRequest::Gtid(_)));
    }

    #[test]
    fn close_is_idempotent() {
        let config = ReplicaConfig {
            server_id: 1001,
            ..Default::default()
        };
        let replica = BinlogReplica::new(config, Box::new(NopEventHandler)).unwrap();
        replica.running.store(true, Ordering::SeqCst);
        replica.close();
        replica.close();
        assert_eq!(replica.state(), ReplicaState::Stopping);
    }

    #[test]
    fn delay_tracks_event_timestamps() {
        let config = ReplicaConfig {
            server_id: 1001,
            ..Default::default()
        };
        let replica = BinlogReplica::new(config, Box::new(NopEventHandler)).unwrap();
        let header = Header {
            when: now_unix() - 5,
            ..Default::default()
        };
        replica.update_delay(&header);
        assert!(replica.delay() >= 5);

        // artificial events leave the gauge alone
        let before = replica.delay();
        replica.update_delay(&Header::default());
        assert_eq!(replica.delay(), before);
    }
}
