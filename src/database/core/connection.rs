//! Database connection management
//!
//! This module provides the connection wrapper used by the schema store, both
//! for the single writer connection and for the pooled read-only connections.

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};

static MEMORY_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Where a database lives
///
/// In-memory databases use a named shared-cache URI so that every connection
/// opened for the same location sees the same tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// A database file on disk
    File(String),
    /// A named in-memory database, alive while at least one connection is open
    SharedMemory(String),
}

impl DatabaseLocation {
    /// A file-backed location
    pub fn file(path: impl Into<String>) -> Self {
        Self::File(path.into())
    }

    /// A fresh in-memory location, unique within the process
    pub fn memory() -> Self {
        let n = MEMORY_DB_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::SharedMemory(format!("sqlscribe-mem-{}-{}", std::process::id(), n))
    }

    fn open_target(&self) -> String {
        match self {
            Self::File(path) => path.clone(),
            Self::SharedMemory(name) => format!("file:{}?mode=memory&cache=shared", name),
        }
    }

    /// Human-readable description, used in logs and error messages
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.clone(),
            Self::SharedMemory(name) => format!("memory:{}", name),
        }
    }
}

/// Core database connection wrapper
///
/// `DatabaseConn` provides a thin wrapper around SQLite connections,
/// handling both file-based and in-memory databases with consistent
/// configuration and error handling.
pub struct DatabaseConn {
    pub conn: Connection,
}

impl DatabaseConn {
    /// Open a read-write connection at the given location
    pub fn open(location: &DatabaseLocation) -> Result<Self> {
        let db = DatabaseConn {
            conn: Self::connect(location)?,
        };
        db.configure()?;
        Ok(db)
    }

    /// Open a connection that refuses to modify the database
    ///
    /// Readers skip the journal-mode switch (it is a write) and enable
    /// `query_only`, so any statement that would change the database fails.
    pub fn open_reader(location: &DatabaseLocation) -> Result<Self> {
        let db = DatabaseConn {
            conn: Self::connect(location)?,
        };
        db.conn
            .execute("PRAGMA temp_store=MEMORY", [])
            .map_err(|e| anyhow!("Failed to set temp store: {}", e))?;
        db.conn
            .execute("PRAGMA query_only=ON", [])
            .map_err(|e| anyhow!("Failed to enable query_only: {}", e))?;
        Ok(db)
    }

    /// Create a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&DatabaseLocation::memory())
    }

    fn connect(location: &DatabaseLocation) -> Result<Connection> {
        let target = location.open_target();
        Connection::open(&target)
            .map_err(|e| anyhow!("Failed to open database at '{}': {}", location.describe(), e))
    }

    /// Configure the database with optimal settings
    fn configure(&self) -> Result<()> {
        // Enable WAL mode for better concurrent read/write performance
        let _: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .map_err(|e| anyhow!("Failed to set journal mode: {}", e))?;

        // Use NORMAL synchronous mode (good balance of safety and performance)
        self.conn
            .execute("PRAGMA synchronous=NORMAL", [])
            .map_err(|e| anyhow!("Failed to set synchronous mode: {}", e))?;

        // Store temp tables in memory
        self.conn
            .execute("PRAGMA temp_store=MEMORY", [])
            .map_err(|e| anyhow!("Failed to set temp store: {}", e))?;

        // Enable foreign keys
        self.conn
            .execute("PRAGMA foreign_keys=ON", [])
            .map_err(|e| anyhow!("Failed to enable foreign keys: {}", e))?;

        Ok(())
    }

    /// Execute a SQL statement
    pub fn execute(&self, sql: &str) -> Result<usize> {
        self.conn
            .execute(sql, [])
            .map_err(|e| anyhow!("Failed to execute SQL: {}", e))
    }

    /// Check if a table exists in the database
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let count: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table_name],
                |row| row.get(0),
            )
            .map_err(|e| anyhow!("Failed to check table existence: {}", e))?;
        Ok(count > 0)
    }
}
