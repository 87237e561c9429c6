//! Database module
//!
//! This module provides all access to the user database, organized into:
//!
//! - **core**: connection wrapper, database locations, identifier sanitization
//! - **store**: `SchemaStore`, the accessor every console operation goes through
//! - **result**: tabular result types returned by reads
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── connection  # SQLite DatabaseConn wrapper (writer + query-only readers)
//! │   └── identifier  # allow-listed identifier handling
//! │
//! ├── store           # SchemaStore: list/describe/read + DDL/DML/query
//! └── result          # ResultSet, CellValue, ColumnInfo
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use sqlscribe::database::SchemaStore;
//!
//! let store = SchemaStore::open_in_memory()?;
//! store.execute_ddl(r#"CREATE TABLE "t" ("a" INTEGER)"#)?;
//! store.execute_dml(r#"INSERT INTO "t" VALUES (?)"#, &["5".to_string()])?;
//!
//! for table in store.list_tables()? {
//!     let rows = store.read_all(&table)?;
//!     println!("{}: {} rows", table, rows.row_count());
//! }
//! ```

pub mod core;
pub mod result;
pub mod store;

pub use self::core::{quote_identifier, sanitize_identifier, DatabaseConn, DatabaseLocation};
pub use result::{CellValue, ColumnInfo, ResultSet};
pub use store::{SchemaStore, StoreOptions};
