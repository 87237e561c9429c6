//! Schema store
//!
//! `SchemaStore` is the only component that touches the user database. It owns
//! one writer connection and a small pool of query-only reader connections,
//! and a process-wide read/write gate: reads share the gate, every DDL/DML
//! statement takes it exclusively. Each statement runs in autocommit mode, so a
//! successful call is already committed when it returns.

use crate::config::SqlscribeConfig;
use crate::database::core::{quote_identifier, sanitize_identifier, DatabaseConn, DatabaseLocation};
use crate::database::result::{CellValue, ColumnInfo, ResultSet};
use crate::error::{ConsoleError, ConsoleResult};
use anyhow::Result;
use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::{Batch, Connection};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

/// Number of VM instructions between deadline checks
const PROGRESS_INTERVAL: i32 = 1000;

/// Tuning knobs for a [`SchemaStore`]
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Reader connections kept open between queries
    pub max_readers: usize,
    /// Deadline for a single read query
    pub query_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_readers: 4,
            query_timeout: Duration::from_secs(30),
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &SqlscribeConfig) -> Self {
        Self {
            max_readers: config.max_readers,
            query_timeout: config.query_timeout(),
        }
    }
}

/// Accessor over the persisted user database
pub struct SchemaStore {
    location: DatabaseLocation,
    options: StoreOptions,
    gate: RwLock<()>,
    writer: Mutex<DatabaseConn>,
    readers: Mutex<Vec<DatabaseConn>>,
}

impl SchemaStore {
    /// Open (or create) the store at `location`
    pub fn open(location: DatabaseLocation, options: StoreOptions) -> Result<Self> {
        let writer = DatabaseConn::open(&location)?;
        tracing::info!("opened user database at {}", location.describe());
        Ok(Self {
            location,
            options,
            gate: RwLock::new(()),
            writer: Mutex::new(writer),
            readers: Mutex::new(Vec::new()),
        })
    }

    /// Open the database file named by the configuration
    pub fn from_config(config: &SqlscribeConfig) -> Result<Self> {
        Self::open(
            DatabaseLocation::file(config.database_path.as_str()),
            StoreOptions::from_config(config),
        )
    }

    /// Open a fresh in-memory store with default options
    pub fn open_in_memory() -> Result<Self> {
        Self::open(DatabaseLocation::memory(), StoreOptions::default())
    }

    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// User table names, sorted by name
    pub fn list_tables(&self) -> ConsoleResult<Vec<String>> {
        self.with_reader(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
                 ORDER BY name",
            )?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(names)
        })
    }

    /// Whether a table with exactly this name exists
    pub fn table_exists(&self, table: &str) -> ConsoleResult<bool> {
        self.with_reader(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// Column names and declared types, in declaration order
    ///
    /// An unknown table yields an empty list.
    pub fn describe(&self, table: &str) -> ConsoleResult<Vec<ColumnInfo>> {
        self.with_reader(|conn| {
            let mut stmt =
                conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
            let columns = stmt
                .query_map([table], |row| {
                    Ok(ColumnInfo {
                        name: row.get(0)?,
                        declared_type: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(columns)
        })
    }

    /// Every row of `table`
    pub fn read_all(&self, table: &str) -> ConsoleResult<ResultSet> {
        let table = sanitize_identifier("table name", table)?;
        self.execute_query(&format!("SELECT * FROM {}", quote_identifier(table)))
    }

    /// Run a single read-only statement and collect its rows
    ///
    /// The text must compile to exactly one statement that the engine reports
    /// as read-only; anything else is a policy violation and is not run. The
    /// statement is interrupted once the configured query deadline passes.
    pub fn execute_query(&self, statement: &str) -> ConsoleResult<ResultSet> {
        debug!("query: {}", statement);
        let timeout = self.options.query_timeout;
        self.with_reader(|conn| run_read_only(conn, statement, timeout))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Execute a schema statement (CREATE/DROP TABLE)
    pub fn execute_ddl(&self, statement: &str) -> ConsoleResult<()> {
        debug!("ddl: {}", statement);
        self.with_writer(|conn| {
            conn.execute(statement, [])?;
            Ok(())
        })
    }

    /// Execute a data statement with positional parameters bound in order
    pub fn execute_dml(&self, statement: &str, params: &[String]) -> ConsoleResult<usize> {
        debug!("dml: {} ({} params)", statement, params.len());
        self.with_writer(|conn| {
            let changed = conn.execute(statement, rusqlite::params_from_iter(params.iter()))?;
            Ok(changed)
        })
    }

    // =========================================================================
    // Connection handling
    // =========================================================================

    fn with_writer<T>(
        &self,
        f: impl FnOnce(&Connection) -> ConsoleResult<T>,
    ) -> ConsoleResult<T> {
        let _exclusive = self.gate.write().unwrap_or_else(PoisonError::into_inner);
        let writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        f(&writer.conn)
    }

    fn with_reader<T>(
        &self,
        f: impl FnOnce(&Connection) -> ConsoleResult<T>,
    ) -> ConsoleResult<T> {
        let _shared = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        let reader = self.checkout_reader()?;
        let result = f(&reader.conn);
        self.checkin_reader(reader);
        result
    }

    fn checkout_reader(&self) -> ConsoleResult<DatabaseConn> {
        let pooled = self
            .readers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        match pooled {
            Some(reader) => Ok(reader),
            None => DatabaseConn::open_reader(&self.location)
                .map_err(|e| ConsoleError::SqlExecution(e.to_string())),
        }
    }

    fn checkin_reader(&self, reader: DatabaseConn) {
        let mut pool = self.readers.lock().unwrap_or_else(PoisonError::into_inner);
        if pool.len() < self.options.max_readers {
            pool.push(reader);
        }
    }
}

fn run_read_only(conn: &Connection, sql: &str, timeout: Duration) -> ConsoleResult<ResultSet> {
    let mut batch = Batch::new(conn, sql);
    let mut stmt = batch.next()?.ok_or_else(|| {
        ConsoleError::PolicyViolation("query text contains no statement".to_string())
    })?;
    if !matches!(batch.next(), Ok(None)) {
        return Err(ConsoleError::PolicyViolation(
            "only a single statement may be run".to_string(),
        ));
    }
    if !stmt.readonly() {
        return Err(ConsoleError::PolicyViolation(
            "statement would modify the database".to_string(),
        ));
    }

    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let width = columns.len();
    let mut result = ResultSet::new(columns);

    // a timeout too large to represent never interrupts
    if let Some(deadline) = Instant::now().checked_add(timeout) {
        let _ = conn.progress_handler(PROGRESS_INTERVAL, Some(move || Instant::now() > deadline));
    }

    let collected = (|| -> rusqlite::Result<()> {
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(CellValue::from(row.get_ref(i)?));
            }
            result.rows.push(values);
        }
        Ok(())
    })();

    let _ = conn.progress_handler(0, None::<fn() -> bool>);

    match collected {
        Ok(()) => Ok(result),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::OperationInterrupted =>
        {
            Err(ConsoleError::timeout("query", timeout))
        }
        Err(e) => Err(e.into()),
    }
}
