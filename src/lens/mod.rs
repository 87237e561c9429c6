//! Lens module
//!
//! Lenses hold the business logic of the console. Each one borrows the shared
//! [`SchemaStore`](crate::database::SchemaStore) and exposes a narrow set of
//! operations that the command dispatcher, the CLI and the WebSocket handlers
//! all go through.
//!
//! | Lens | Purpose | Feature |
//! |------|---------|---------|
//! | `TableBuilder` | validate column specs, `CREATE TABLE` | core |
//! | `RowWriter` | type-aware `INSERT` | core |
//! | `QueryGate` | read-only `SELECT` execution | core |
//! | `AdminGate` | login and confirmed `DROP TABLE` | core |
//! | `TranslationEngine` | natural language to SQL | core (`t5` for the T5 backend) |
//!
//! # Usage
//!
//! ```rust,ignore
//! use sqlscribe::lens::query_gate::QueryGate;
//! use sqlscribe::lens::table_builder::{ColumnSpec, TableBuilder};
//!
//! TableBuilder::new(&store).create_table("t", &[ColumnSpec::new("a", "INTEGER")])?;
//! let rows = QueryGate::new(&store).run_select("SELECT * FROM t")?;
//! ```

pub mod utils;

pub mod admin;
pub mod query_gate;
pub mod row_writer;
pub mod table_builder;
pub mod translate;
