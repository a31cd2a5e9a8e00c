use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, warn};

use common::binlog::row::row::RowString;
use common::config::ReplicaConfig;
use common::err::replica_error::ReError;
use common::err::CResult;

use connection::conn::connection::Connection;
use connection::conn::connection_options::{ConnectionOptions, Dialer};

use crate::filter::TableFilter;

/// The managed-MySQL health-check table whose metadata cannot be queried
/// on RDS-like deployments; a stand-in schema is cached instead.
pub const HA_HEALTH_CHECK_SCHEMA: &str = "mysql.ha_health_check";

/// One column definition as `SHOW FULL COLUMNS` reports it.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct TableColumn {
    pub name: String,
    /// e.g. `bigint(20) unsigned`
    pub raw_type: String,
    pub collation: String,
    pub nullable: bool,
    /// PRI / UNI / MUL / empty
    pub key: String,
    pub is_auto_increment: bool,
    pub is_unsigned: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct TableSchema {
    pub schema: String,
    pub name: String,
    pub columns: Vec<TableColumn>,
}

impl TableSchema {
    pub fn add_column(&mut self, name: &str, raw_type: &str, collation: &str, key: &str) {
        self.columns.push(TableColumn {
            name: name.to_string(),
            raw_type: raw_type.to_string(),
            collation: collation.to_string(),
            nullable: false,
            key: key.to_string(),
            is_auto_increment: false,
            is_unsigned: raw_type.contains("unsigned"),
        });
    }

    pub fn primary_key_columns(&self) -> Vec<&TableColumn> {
        self.columns.iter().filter(|c| c.key == "PRI").collect()
    }
}

/// The administrative connection: serialized behind a mutex, reopened and
/// retried up to three times when the server drops it mid-command.
#[derive(Debug)]
pub struct AdminConnection {
    options: Mutex<ConnectionOptions>,
    conn: Mutex<Option<Connection>>,
}

const ADMIN_RETRIES: usize = 3;

impl AdminConnection {
    pub fn new(options: ConnectionOptions) -> Self {
        AdminConnection {
            options: Mutex::new(options),
            conn: Mutex::new(None),
        }
    }

    /// Install a custom socket factory; takes effect on the next reopen.
    pub fn set_dialer(&self, dialer: Dialer) {
        self.options.lock().unwrap().dialer = Some(dialer);
    }

    pub fn execute(&self, sql: &str) -> CResult<Vec<RowString>> {
        let options = self.options.lock().unwrap().clone();
        let mut guard = self.conn.lock().unwrap();

        let mut last_err = None;
        for _ in 0..ADMIN_RETRIES {
            if guard.is_none() {
                let mut conn = Connection::new(options.clone());
                match conn.try_connect() {
                    Ok(()) => *guard = Some(conn),
                    Err(e) if e.is_transport() => {
                        last_err = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            match guard.as_mut().unwrap().query(sql) {
                Ok(rows) => return Ok(rows),
                Err(e) if e.is_transport() => {
                    warn!(error = %e, "admin connection dropped, reopening");
                    if let Some(mut dead) = guard.take() {
                        dead.close();
                    }
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err
            .unwrap_or_else(|| ReError::BadConnection("admin connection exhausted".to_string())))
    }

    pub fn close(&self) {
        if let Some(mut conn) = self.conn.lock().unwrap().take() {
            conn.close();
        }
    }
}

/// `"schema.table" -> columns`, many concurrent readers, misses resolved
/// over the admin connection. Optionally remembers failed fetches for a
/// while so a hot unknown table does not hammer the server.
#[derive(Debug)]
pub struct SchemaCache {
    tables: RwLock<HashMap<String, Arc<TableSchema>>>,
    error_times: RwLock<HashMap<String, Instant>>,
    retry_period: Duration,
    discard_no_meta: bool,
}

impl SchemaCache {
    pub fn new(config: &ReplicaConfig) -> Self {
        SchemaCache {
            tables: RwLock::new(HashMap::new()),
            error_times: RwLock::new(HashMap::new()),
            retry_period: config.unknown_table_retry_period(),
            discard_no_meta: config.discard_no_meta_row_event,
        }
    }

    pub fn get_table(
        &self,
        admin: &AdminConnection,
        filter: Option<&TableFilter>,
        db: &str,
        table: &str,
    ) -> CResult<Arc<TableSchema>> {
        let key = format!("{}.{}", db, table);

        if let Some(filter) = filter {
            if !filter.matches(&key) {
                return Err(ReError::ExcludedTable(key));
            }
        }

        if let Some(t) = self.tables.read().unwrap().get(&key) {
            return Ok(t.clone());
        }

        if self.discard_no_meta {
            let errors = self.error_times.read().unwrap();
            if let Some(last) = errors.get(&key) {
                if last.elapsed() < self.retry_period {
                    return Err(ReError::MissingTableMeta(key));
                }
            }
        }

        match self.fetch_table(admin, db, table) {
            Ok(schema) => {
                let schema = Arc::new(schema);
                self.tables
                    .write()
                    .unwrap()
                    .insert(key.clone(), schema.clone());
                if self.discard_no_meta {
                    self.error_times.write().unwrap().remove(&key);
                }
                Ok(schema)
            }
            Err(e) => {
                if !self.table_exists(admin, db, table).unwrap_or(true) {
                    return Err(ReError::TableNotExist(key));
                }

                // Managed MySQL health checks: metadata is unreadable there
                // and the heartbeat interval is short, so fake the table
                // instead of logging a miss every second.
                if key == HA_HEALTH_CHECK_SCHEMA {
                    let mut mock = TableSchema {
                        schema: db.to_string(),
                        name: table.to_string(),
                        columns: vec![],
                    };
                    mock.add_column("id", "bigint(20)", "", "");
                    mock.add_column("type", "char(1)", "", "");
                    let mock = Arc::new(mock);
                    self.tables.write().unwrap().insert(key, mock.clone());
                    return Ok(mock);
                }

                if self.discard_no_meta {
                    self.error_times
                        .write()
                        .unwrap()
                        .insert(key.clone(), Instant::now());
                    error!(key = key.as_str(), error = %e, "get table meta failed");
                    return Err(ReError::MissingTableMeta(key));
                }
                Err(e)
            }
        }
    }

    fn fetch_table(
        &self,
        admin: &AdminConnection,
        db: &str,
        table: &str,
    ) -> CResult<TableSchema> {
        let rows = admin.execute(&format!(
            "SHOW FULL COLUMNS FROM `{}`.`{}`",
            escape_ident(db),
            escape_ident(table)
        ))?;
        if rows.is_empty() {
            return Err(ReError::MissingTableMeta(format!("{}.{}", db, table)));
        }

        let mut schema = TableSchema {
            schema: db.to_string(),
            name: table.to_string(),
            columns: Vec::with_capacity(rows.len()),
        };
        for row in rows {
            schema.columns.push(column_from_row(&row));
        }
        Ok(schema)
    }

    fn table_exists(&self, admin: &AdminConnection, db: &str, table: &str) -> CResult<bool> {
        let rows = admin.execute(&format!(
            "SELECT count(*) FROM information_schema.tables \
             WHERE table_schema = '{}' AND table_name = '{}'",
            escape_string(db),
            escape_string(table)
        ))?;
        Ok(rows.first().map(|r| r.get_str(0) != "0").unwrap_or(false))
    }

    /// Drop a cached entry, DDL handlers call this.
    pub fn clear_table(&self, db: &str, table: &str) {
        let key = format!("{}.{}", db, table);
        self.tables.write().unwrap().remove(&key);
        if self.discard_no_meta {
            self.error_times.write().unwrap().remove(&key);
        }
    }

    pub fn clear_all(&self) {
        self.tables.write().unwrap().clear();
        if self.discard_no_meta {
            self.error_times.write().unwrap().clear();
        }
    }

    /// Prime an entry without touching the server.
    pub fn set_table(&self, db: &str, table: &str, schema: Arc<TableSchema>) {
        let key = format!("{}.{}", db, table);
        self.tables.write().unwrap().insert(key.clone(), schema);
        if self.discard_no_meta {
            self.error_times.write().unwrap().remove(&key);
        }
    }
}

fn column_from_row(row: &RowString) -> TableColumn {
    // SHOW FULL COLUMNS: Field, Type, Collation, Null, Key, Default,
    // Extra, Privileges, Comment
    let raw_type = row.get_str(1).to_string();
    TableColumn {
        name: row.get_str(0).to_string(),
        is_unsigned: raw_type.contains("unsigned"),
        raw_type,
        collation: row.get_str(2).to_string(),
        nullable: row.get_str(3).eq_ignore_ascii_case("YES"),
        key: row.get_str(4).to_string(),
        is_auto_increment: row.get_str(6).contains("auto_increment"),
    }
}

fn escape_ident(s: &str) -> String {
    s.replace('`', "``")
}

fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod test {
    use super::*;

    fn column_row(cells: &[Option<&str>]) -> RowString {
        RowString::new_row(cells.iter().map(|c| c.map(|s| s.to_string())).collect())
    }

    #[test]
    fn column_parsing() {
        let row = column_row(&[
            Some("id"),
            Some("bigint(20) unsigned"),
            None,
            Some("NO"),
            Some("PRI"),
            None,
            Some("auto_increment"),
            Some(""),
            Some(""),
        ]);
        let col = column_from_row(&row);
        assert_eq!(col.name, "id");
        assert!(col.is_unsigned);
        assert!(!col.nullable);
        assert!(col.is_auto_increment);
        assert_eq!(col.key, "PRI");
    }

    #[test]
    fn mock_schema_shape() {
        let mut mock = TableSchema {
            schema: "mysql".to_string(),
            name: "ha_health_check".to_string(),
            columns: vec![],
        };
        mock.add_column("id", "bigint(20)", "", "");
        mock.add_column("type", "char(1)", "", "");
        assert_eq!(mock.columns.len(), 2);
        assert!(!mock.columns[0].is_unsigned);
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_ident("we`ird"), "we``ird");
        assert_eq!(escape_string("o'brien"), "o\\'brien");
    }

    #[test]
    fn cache_prime_and_clear() {
        let cache = SchemaCache::new(&ReplicaConfig::default());
        let schema = Arc::new(TableSchema {
            schema: "shop".to_string(),
            name: "orders".to_string(),
            columns: vec![],
        });
        cache.set_table("shop", "orders", schema);
        assert!(cache.tables.read().unwrap().contains_key("shop.orders"));
        cache.clear_table("shop", "orders");
        assert!(!cache.tables.read().unwrap().contains_key("shop.orders"));
    }
}
